//! Configuration module for the OpenAPI bridge
//!
//! Configuration file loading, environment overrides and credential channels.

mod config;
pub mod credentials;
pub mod environment;

// Re-export the main configuration types
pub use config::{BridgeConfig, ConfirmationTiming, LoggingConfig, DEFAULT_BASE_URL};
pub use credentials::Credentials;
pub use environment::{EnvVars, EnvironmentOverrides};
