//! Bridge configuration
//!
//! Loaded from YAML, then overridden by environment variables
//! (precedence: `.env` < file < environment).

use super::credentials::Credentials;
use super::environment::EnvironmentOverrides;
use crate::error::{BridgeError, Result};
use crate::registry::types::ApiDocument;
use crate::utils::NameFormat;
use reqwest::header::HeaderName;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Base URL used when neither an override nor document servers exist
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// When the mutating-action confirmation gate is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationTiming {
    /// The request is sent first; a 2xx text response is then replaced by the
    /// confirmation request unless the call carried `__confirmed: true`
    #[default]
    AfterResponse,
    /// Unconfirmed mutating calls are answered with the confirmation request
    /// without contacting the upstream API
    BeforeRequest,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level when `RUST_LOG` is unset
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Replaces every server URL declared by the document
    pub base_url: Option<String>,
    /// Header used by the legacy API-key fallback
    pub api_key_header: Option<String>,
    /// Gate POST/PUT/DELETE calls behind `__confirmed: true`
    pub confirm_dangerous_actions: bool,
    pub confirmation_timing: ConfirmationTiming,
    /// Log outbound requests and responses
    pub log_http: bool,
    /// Per-call deadline for the default transport
    pub request_timeout_secs: Option<u64>,
    /// Tag allow-list; empty means no filtering
    pub tags: Vec<String>,
    pub tool_name_format: Option<NameFormat>,
    /// Collect tool summaries instead of registering tools
    pub dry_run: bool,
    /// Pretty-print dry-run output
    pub pretty_print: bool,
    /// Document version shown in tool annotation titles
    pub version: Option<String>,
    pub logging: LoggingConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_header: None,
            confirm_dangerous_actions: true,
            confirmation_timing: ConfirmationTiming::default(),
            log_http: false,
            request_timeout_secs: None,
            tags: Vec::new(),
            tool_name_format: None,
            dry_run: false,
            pretty_print: false,
            version: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Load `.env` into the process environment if present
    pub fn load_env_file() {
        match dotenvy::dotenv() {
            Ok(path) => info!("Loaded environment variables from {}", path.display()),
            Err(e) if e.not_found() => debug!("No .env file found, skipping"),
            Err(e) => warn!("Failed to load .env: {}", e),
        }
    }

    /// Load configuration from a YAML file, then apply environment overrides.
    /// A missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_env_file();

        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| BridgeError::config(format!("Failed to read config file: {}", e)))?;
            Self::from_yaml_str(&content)?
        } else {
            warn!("Config file {} not found, using defaults", path.display());
            Self::default()
        };

        EnvironmentOverrides::load()?.apply_to_config(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from YAML text without consulting the environment
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| BridgeError::config(format!("Failed to parse config file: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            Url::parse(base_url)
                .map_err(|e| BridgeError::config(format!("Invalid base_url '{}': {}", base_url, e)))?;
        }

        if let Some(header) = &self.api_key_header {
            HeaderName::from_bytes(header.as_bytes())
                .map_err(|_| BridgeError::config(format!("Invalid api_key_header '{}'", header)))?;
        }

        if self.request_timeout_secs == Some(0) {
            return Err(BridgeError::config("request_timeout_secs must be greater than zero"));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Candidate base URLs: the override, else every non-empty document
    /// server URL, else the local default.
    pub fn resolve_base_urls(&self, document: &ApiDocument) -> Vec<String> {
        document.base_urls(self.base_url.as_deref())
    }

    /// Process credentials from the environment, with this config's API-key
    /// header applied when the environment does not name one
    pub fn credentials(&self) -> Credentials {
        let mut credentials = Credentials::from_env();
        if credentials.api_key_header.is_none() {
            credentials.api_key_header = self.api_key_header.clone();
        }
        credentials
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::types::ServerEntry;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert!(config.confirm_dangerous_actions);
        assert_eq!(config.confirmation_timing, ConfirmationTiming::AfterResponse);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml() {
        let config = BridgeConfig::from_yaml_str(
            r#"
base_url: https://api.example.com/v1
confirm_dangerous_actions: false
confirmation_timing: before_request
tags: [pets, store]
tool_name_format: snake
request_timeout_secs: 10
logging:
  format: json
"#,
        )
        .unwrap();

        assert_eq!(config.base_url.as_deref(), Some("https://api.example.com/v1"));
        assert!(!config.confirm_dangerous_actions);
        assert_eq!(config.confirmation_timing, ConfirmationTiming::BeforeRequest);
        assert_eq!(config.tags, vec!["pets", "store"]);
        assert_eq!(config.tool_name_format, Some(NameFormat::Snake));
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(10)));
        assert!(config.logging.is_json());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_url = BridgeConfig {
            base_url: Some("not a url".into()),
            ..Default::default()
        };
        assert!(bad_url.validate().is_err());

        let bad_timeout = BridgeConfig {
            request_timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(bad_timeout.validate().is_err());

        let bad_header = BridgeConfig {
            api_key_header: Some("bad header".into()),
            ..Default::default()
        };
        assert!(bad_header.validate().is_err());
    }

    #[test]
    fn test_resolve_base_urls() {
        let mut document = ApiDocument::default();
        let config = BridgeConfig::default();
        assert_eq!(config.resolve_base_urls(&document), vec![DEFAULT_BASE_URL.to_string()]);

        document.servers = vec![
            ServerEntry { url: "https://a.example.com".into(), description: None },
            ServerEntry { url: "https://b.example.com".into(), description: None },
        ];
        assert_eq!(config.resolve_base_urls(&document).len(), 2);

        let overridden = BridgeConfig {
            base_url: Some("https://override.example.com".into()),
            ..Default::default()
        };
        assert_eq!(
            overridden.resolve_base_urls(&document),
            vec!["https://override.example.com".to_string()]
        );
    }
}
