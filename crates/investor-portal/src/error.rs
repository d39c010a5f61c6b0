//! Portal setup errors.
//!
//! Operation failures use [`investor_types::PortalError`]; these cover
//! configuration and wiring before a session exists.

use investor_providers::BackendError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid URL in {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("backend setup failed: {0}")]
    Backend(#[from] BackendError),
}

/// Errors from the advisory session cache. Never fatal to an operation.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_display_names_field() {
        let err = ConfigError::InvalidUrl {
            field: "backend.url",
            source: url::ParseError::RelativeUrlWithoutBase,
        };
        assert!(err.to_string().contains("backend.url"));
    }
}
