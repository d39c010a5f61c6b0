//! Configuration for the investor portal

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Environment variable prefix, e.g. `INVESTOR_PORTAL_BACKEND__URL`.
pub const ENV_PREFIX: &str = "INVESTOR_PORTAL";

/// Main portal configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Backend collaborator
    #[serde(default)]
    pub backend: BackendConfig,

    /// Portal URL handling
    #[serde(default)]
    pub portal: PortalSettings,

    /// Identity verification
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Advisory session cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which backend implementation to talk to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process reference backend (development/testing)
    #[default]
    Memory,
    /// REST backend over HTTP
    Http,
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Base URL of the REST backend
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Bearer session token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Memory,
            url: default_backend_url(),
            request_timeout_secs: default_request_timeout(),
            token: None,
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Portal URL settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSettings {
    /// Page the verification provider returns to
    #[serde(default = "default_portal_url")]
    pub base_url: String,

    /// Query parameter marking a return from verification
    #[serde(default = "default_return_param")]
    pub return_param: String,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            base_url: default_portal_url(),
            return_param: default_return_param(),
        }
    }
}

/// Identity verification configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Enable the operator-confirmed bypass. Never on in production.
    #[serde(default)]
    pub allow_operator_override: bool,
}

/// Advisory cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_cache_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_backend_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_portal_url() -> String {
    "http://localhost:3000/investors".to_string()
}

fn default_return_param() -> String {
    investor_providers::DEFAULT_RETURN_PARAM.to_string()
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(".investor-portal/session.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PortalConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `INVESTOR_PORTAL_*` environment variables (`__` between sections).
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&PortalConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: PortalConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parsed portal base URL
    pub fn portal_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.portal.base_url).map_err(|source| ConfigError::InvalidUrl {
            field: "portal.base_url",
            source,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.portal_url()?;
        if self.backend.kind == BackendKind::Http {
            Url::parse(&self.backend.url).map_err(|source| ConfigError::InvalidUrl {
                field: "backend.url",
                source,
            })?;
        }
        if self.portal.return_param.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "portal.return_param must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PortalConfig::default();
        assert_eq!(config.backend.kind, BackendKind::Memory);
        assert_eq!(config.portal.return_param, "verification_return");
        assert!(!config.verification.allow_operator_override);
        assert!(config.cache.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = PortalConfig::load(None).unwrap();
        assert_eq!(config.backend.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.portal_url().unwrap().path(), "/investors");
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
[backend]
kind = "http"
url = "https://api.fund.test"

[verification]
allow_operator_override = true

[logging]
json = true
"#
        )
        .unwrap();

        let config = PortalConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.backend.kind, BackendKind::Http);
        assert_eq!(config.backend.url, "https://api.fund.test");
        assert!(config.verification.allow_operator_override);
        assert!(config.logging.json);
        // Untouched sections keep their defaults.
        assert_eq!(config.portal.return_param, "verification_return");
    }

    #[test]
    fn test_invalid_portal_url_rejected() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "[portal]\nbase_url = \"not a url\"").unwrap();

        let err = PortalConfig::load(file.path().to_str()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { field: "portal.base_url", .. }));
    }
}
