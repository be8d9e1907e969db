//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, one worker task per connection)
//!     → request.rs (request line, header drain, read timeout)
//!     → [routing layer: static or dynamic]
//!         static  → static_files.rs + mime.rs
//!         dynamic → routing::dispatcher
//!     → response.rs (status line, minimal headers, body)
//!     → Close
//! ```

pub mod mime;
pub mod request;
pub mod response;
pub mod server;
pub mod static_files;

pub use mime::mime_type;
pub use request::{read_request, Request, RequestError};
pub use response::Response;
pub use server::{HttpServer, ServerError};
pub use static_files::{StaticFile, StaticFiles};
