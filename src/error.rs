//! Error types for the reading curator
//!
//! - `thiserror` for the error enum, `anyhow` only at the binary edge
//! - Content invariant violations are fatal and surface at load time
//! - "No recommendation" is never an error; callers get `None` or an empty list

use std::borrow::Cow;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for curator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the curator
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Configuration error: {message}")]
    Config {
        message: Cow<'static, str>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: &'static str },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig {
        key: &'static str,
        message: Cow<'static, str>,
    },

    // ========================================================================
    // Catalog Errors
    // ========================================================================
    #[error("Invalid content item {id}: {message}")]
    InvalidContent {
        id: String,
        message: Cow<'static, str>,
    },

    #[error("Duplicate content id: {id}")]
    DuplicateContentId { id: String },

    // ========================================================================
    // I/O and Serialization Errors
    // ========================================================================
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create an invalid content error
    pub fn invalid_content(id: impl Into<String>, message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidContent {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error bound to the file that failed
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this error should be logged at error level
    pub fn is_error_level(&self) -> bool {
        matches!(
            self,
            Error::InvalidContent { .. }
                | Error::DuplicateContentId { .. }
                | Error::Io { .. }
                | Error::Other(_)
        )
    }

    /// Get a stable error code for machine-readable output
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } | Error::MissingEnvVar { .. } | Error::InvalidConfig { .. } => {
                "CONFIG_ERROR"
            }
            Error::InvalidContent { .. } | Error::DuplicateContentId { .. } => "CONTENT_ERROR",
            Error::Io { .. } => "IO_ERROR",
            Error::Json(_) | Error::Toml(_) => "SERIALIZATION_ERROR",
            Error::Other(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_level() {
        assert!(Error::invalid_content("r1", "negative minutes").is_error_level());
        assert!(!Error::MissingEnvVar { var: "X" }.is_error_level());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::DuplicateContentId {
                id: "r1".to_string()
            }
            .error_code(),
            "CONTENT_ERROR"
        );
        assert_eq!(
            Error::InvalidConfig {
                key: "CURATOR_TOP_K",
                message: "must be positive".into()
            }
            .error_code(),
            "CONFIG_ERROR"
        );
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert_eq!(Error::from(json_err).error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_invalid_content_message() {
        let err = Error::invalid_content("r7", "eligible weeks are empty");
        assert_eq!(
            err.to_string(),
            "Invalid content item r7: eligible weeks are empty"
        );
    }
}
