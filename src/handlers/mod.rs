//! Application controllers shipped with the server.

pub mod greeting;

pub use greeting::GreetingController;
