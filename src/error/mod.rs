//! Error handling module for the OpenAPI bridge

mod error;

// Re-export the main error types and utilities
pub use error::{BridgeError, Result};
