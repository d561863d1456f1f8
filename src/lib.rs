//! OpenAPI bridge - exposes HTTP APIs described by an interface-description
//! document as schema-validated tools
//!
//! Each operation becomes one tool whose arguments are checked against a JSON
//! Schema assembled from the operation's parameters and request body. Calls
//! are turned into authenticated HTTP requests and the responses are rendered
//! back as text or, for binary payloads, base64 envelopes.

pub mod config;
pub mod error;
pub mod mcp;
pub mod registry;
pub mod routing;
pub mod startup;
pub mod utils;

pub use config::{BridgeConfig, Credentials};
pub use error::{BridgeError, Result};
pub use mcp::{ToolHost, ToolRegistry, ToolResult};
pub use registry::{ApiDocument, Operation, RegistrarOptions, ToolRegistrar};
pub use routing::{HttpTransport, InvocationContext, ReqwestTransport};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "openapi-bridge.yaml";
