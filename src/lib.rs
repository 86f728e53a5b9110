//! Reading curator library crate
//!
//! Re-exports core modules for integration tests and external use.

pub mod config;
pub mod error;
pub mod loader;
pub mod recommendation;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use recommendation::*;
