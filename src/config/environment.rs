//! Environment variable integration for the bridge configuration

use super::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use std::env;
use tracing::{debug, info, warn};

/// Environment variable names used by the bridge
pub struct EnvVars;

impl EnvVars {
    pub const BASE_URL: &'static str = "OPENAPI_BASE_URL";
    pub const API_KEY: &'static str = "API_KEY";
    pub const API_KEY_HEADER: &'static str = "API_KEY_HEADER";
    pub const BEARER_TOKEN: &'static str = "BEARER_TOKEN";
    pub const BASIC_AUTH: &'static str = "BASIC_AUTH";
    pub const LOG_HTTP: &'static str = "MCP_LOG_HTTP";
    pub const DEBUG: &'static str = "DEBUG";
    pub const REQUEST_TIMEOUT: &'static str = "OPENAPI_REQUEST_TIMEOUT_SECS";
}

/// Environment configuration overrides
#[derive(Debug, Clone, Default)]
pub struct EnvironmentOverrides {
    pub base_url: Option<String>,
    pub api_key_header: Option<String>,
    /// Set when `MCP_LOG_HTTP` or `DEBUG` is non-empty
    pub log_http: bool,
    pub request_timeout_secs: Option<u64>,
}

impl EnvironmentOverrides {
    /// Load environment variable overrides
    pub fn load() -> Result<Self> {
        let mut overrides = EnvironmentOverrides::default();

        if let Some(base_url) = non_empty_var(EnvVars::BASE_URL) {
            debug!("Environment override: {}={}", EnvVars::BASE_URL, base_url);
            overrides.base_url = Some(base_url);
        }

        if let Some(header) = non_empty_var(EnvVars::API_KEY_HEADER) {
            debug!("Environment override: {}={}", EnvVars::API_KEY_HEADER, header);
            overrides.api_key_header = Some(header);
        }

        overrides.log_http = non_empty_var(EnvVars::LOG_HTTP).is_some() || non_empty_var(EnvVars::DEBUG).is_some();

        if let Some(timeout) = non_empty_var(EnvVars::REQUEST_TIMEOUT) {
            match timeout.parse::<u64>() {
                Ok(secs) if secs > 0 => {
                    debug!("Environment override: {}={}", EnvVars::REQUEST_TIMEOUT, secs);
                    overrides.request_timeout_secs = Some(secs);
                }
                _ => {
                    warn!("Invalid {}: {} (expected a positive integer)", EnvVars::REQUEST_TIMEOUT, timeout);
                    return Err(BridgeError::config(format!(
                        "Invalid {}: {} (expected a positive number of seconds)",
                        EnvVars::REQUEST_TIMEOUT,
                        timeout
                    )));
                }
            }
        }

        Ok(overrides)
    }

    /// Apply environment overrides to a config
    pub fn apply_to_config(&self, config: &mut BridgeConfig) {
        if let Some(base_url) = &self.base_url {
            if config.base_url.as_deref() != Some(base_url.as_str()) {
                info!("Environment override: base_url set to {}", base_url);
            }
            config.base_url = Some(base_url.clone());
        }

        if let Some(header) = &self.api_key_header {
            config.api_key_header = Some(header.clone());
        }

        if self.log_http && !config.log_http {
            info!("Environment override: HTTP logging enabled");
            config.log_http = true;
        }

        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout_secs = Some(secs);
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
