//! Error types and handling for the OpenAPI bridge

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Main error type for the OpenAPI bridge
///
/// Upstream HTTP failures and argument validation failures are *not* errors at
/// this level: they are returned to the caller as error tool results. Only
/// configuration, request construction and transport problems surface here.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Registration errors
    #[error("Registry error: {message}")]
    Registry { message: String },

    /// Validation schema errors (schema could not be compiled, etc.)
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Outbound request could not be assembled (bad base URL, bad header, ...)
    #[error("Request construction error: {message}")]
    RequestBuild { message: String },

    /// Transport level failures (network, DNS, timeout)
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// A credential could not be placed on the wire
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Tool lookup errors at the hosting layer
    #[error("Tool not found: {name}")]
    ToolNotFound { name: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BridgeError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a registry error
    pub fn registry<S: Into<String>>(message: S) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a request construction error
    pub fn request_build<S: Into<String>>(message: S) -> Self {
        Self::RequestBuild {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a timeout error (using transport error type)
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: format!("Timeout: {}", message.into()),
        }
    }

    /// Create an authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a tool-not-found error
    pub fn tool_not_found<S: Into<String>>(name: S) -> Self {
        Self::ToolNotFound { name: name.into() }
    }

    /// Whether the failure happened on the wire rather than while building the call
    pub fn is_transport(&self) -> bool {
        matches!(self, BridgeError::Transport { .. } | BridgeError::Http(_))
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            BridgeError::Config { .. } => "config",
            BridgeError::Registry { .. } => "registry",
            BridgeError::Validation { .. } => "validation",
            BridgeError::RequestBuild { .. } => "request_build",
            BridgeError::Transport { .. } => "transport",
            BridgeError::Auth { .. } => "auth",
            BridgeError::ToolNotFound { .. } => "tool_not_found",
            BridgeError::Io(_) => "io",
            BridgeError::Serde(_) => "serialization",
            BridgeError::Yaml(_) => "yaml",
            BridgeError::Http(_) => "http",
        }
    }
}

impl From<url::ParseError> for BridgeError {
    fn from(e: url::ParseError) -> Self {
        BridgeError::request_build(format!("Invalid URL: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(BridgeError::config("x").category(), "config");
        assert_eq!(BridgeError::request_build("x").category(), "request_build");
        assert_eq!(BridgeError::timeout("slow").category(), "transport");
        assert!(BridgeError::timeout("slow").is_transport());
        assert!(!BridgeError::request_build("bad").is_transport());
        assert_eq!(BridgeError::auth("bad header").category(), "auth");
    }

    #[test]
    fn test_url_parse_error_is_request_build() {
        let err: BridgeError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, BridgeError::RequestBuild { .. }));
        assert!(err.to_string().contains("Invalid URL"));
    }
}
