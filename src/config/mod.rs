//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, PORT override)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → handed to HttpServer::bind once, before accepting
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the server is bound
//! - All fields have defaults so an absent file means "defaults"
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, ServerConfig, StaticFilesConfig,
    TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
