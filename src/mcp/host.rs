//! Seam between the registrar and the hosting runtime
//!
//! The runtime that frames tool calls on the wire implements [`ToolHost`].
//! [`ToolRegistry`] is the in-process implementation used to drive calls
//! directly.

use super::types::{Resource, ResourceContent, Tool, ToolResult};
use crate::error::{BridgeError, Result};
use crate::routing::types::InvocationContext;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Callable bound to one registered tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Map<String, Value>, context: &InvocationContext) -> Result<ToolResult>;
}

/// Producer of one resource's content
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn read(&self) -> Result<ResourceContent>;
}

/// Registration target for tools and resources
pub trait ToolHost: Send + Sync {
    fn add_tool(&mut self, tool: Tool, handler: Arc<dyn ToolHandler>);
    fn add_resource(&mut self, resource: Resource, handler: Arc<dyn ResourceHandler>);
}

struct RegisteredTool {
    tool: Tool,
    handler: Arc<dyn ToolHandler>,
}

struct RegisteredResource {
    resource: Resource,
    handler: Arc<dyn ResourceHandler>,
}

/// In-process tool host
///
/// Registering a name twice replaces the earlier tool but keeps its listing
/// position.
#[derive(Default)]
pub struct ToolRegistry {
    order: Vec<String>,
    tools: HashMap<String, RegisteredTool>,
    resources: Vec<RegisteredResource>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tool definitions in registration order
    pub fn list_tools(&self) -> Vec<Tool> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|entry| entry.tool.clone())
            .collect()
    }

    pub fn get_tool(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name).map(|entry| &entry.tool)
    }

    pub fn tool_count(&self) -> usize {
        self.order.len()
    }

    pub fn list_resources(&self) -> Vec<Resource> {
        self.resources.iter().map(|entry| entry.resource.clone()).collect()
    }

    /// Invoke a tool by name. `null` arguments are treated as an empty object.
    pub async fn call_tool(&self, name: &str, arguments: Value, context: &InvocationContext) -> Result<ToolResult> {
        let entry = self
            .tools
            .get(name)
            .ok_or_else(|| BridgeError::tool_not_found(name))?;

        let arguments = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(BridgeError::validation(format!(
                    "Tool arguments must be a JSON object, got: {}",
                    other
                )))
            }
        };

        debug!("Calling tool '{}'", name);
        entry.handler.call(arguments, context).await
    }

    pub async fn read_resource(&self, uri: &str) -> Result<ResourceContent> {
        let entry = self
            .resources
            .iter()
            .find(|entry| entry.resource.uri == uri)
            .ok_or_else(|| BridgeError::registry(format!("Resource not found: {}", uri)))?;
        entry.handler.read().await
    }
}

impl ToolHost for ToolRegistry {
    fn add_tool(&mut self, tool: Tool, handler: Arc<dyn ToolHandler>) {
        let name = tool.name.clone();
        if self.tools.contains_key(&name) {
            warn!("Tool '{}' registered more than once; the last registration wins", name);
        } else {
            self.order.push(name.clone());
        }
        self.tools.insert(name, RegisteredTool { tool, handler });
    }

    fn add_resource(&mut self, resource: Resource, handler: Arc<dyn ResourceHandler>) {
        self.resources.retain(|entry| entry.resource.uri != resource.uri);
        self.resources.push(RegisteredResource { resource, handler });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo(&'static str);

    #[async_trait]
    impl ToolHandler for Echo {
        async fn call(&self, arguments: Map<String, Value>, _context: &InvocationContext) -> Result<ToolResult> {
            Ok(ToolResult::text(format!("{}:{}", self.0, Value::Object(arguments))))
        }
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let mut registry = ToolRegistry::new();
        registry.add_tool(Tool::new("a", "first", json!({})), Arc::new(Echo("first")));
        registry.add_tool(Tool::new("b", "other", json!({})), Arc::new(Echo("other")));
        registry.add_tool(Tool::new("a", "second", json!({})), Arc::new(Echo("second")));

        let names: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["a", "b"]);

        let result = registry
            .call_tool("a", Value::Null, &InvocationContext::default())
            .await
            .unwrap();
        assert_eq!(result.text_content(), "second:{}");
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_arguments() {
        let mut registry = ToolRegistry::new();
        registry.add_tool(Tool::new("a", "first", json!({})), Arc::new(Echo("a")));
        let ctx = InvocationContext::default();

        assert!(matches!(
            registry.call_tool("missing", json!({}), &ctx).await,
            Err(BridgeError::ToolNotFound { .. })
        ));
        assert!(matches!(
            registry.call_tool("a", json!([1, 2]), &ctx).await,
            Err(BridgeError::Validation { .. })
        ));
    }
}
