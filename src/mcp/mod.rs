//! Tool hosting surface: tool/result types, the host seam and argument validation

pub mod host;
pub mod types;
pub mod validation;

pub use host::{ResourceHandler, ToolHandler, ToolHost, ToolRegistry};
pub use types::{Resource, ResourceContent, Tool, ToolAnnotations, ToolContent, ToolResult};
pub use validation::{ArgumentValidator, ArgumentViolation};
