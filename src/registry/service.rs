//! Tool registrar
//!
//! Turns the document's operations into tools on a [`ToolHost`], each bound
//! to a [`RequestDispatcher`], then adds the `externalDocs` and `info`
//! meta-tools and, when operations look time-related, the current-time
//! resource.

use super::description::generate_description;
use super::schema::{build_input_schema, ValidationSchema};
use super::types::{ApiDocument, ApiInfo, ExternalDocs, HttpMethod, Operation, SchemaObject};
use crate::config::{BridgeConfig, ConfirmationTiming, Credentials};
use crate::error::{BridgeError, Result};
use crate::mcp::{Resource, ResourceContent, ResourceHandler, Tool, ToolAnnotations, ToolHandler, ToolHost, ToolResult};
use crate::routing::dispatcher::{DispatchEnvironment, DispatcherOptions, RequestDispatcher};
use crate::routing::transport::HttpTransport;
use crate::routing::types::InvocationContext;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Name of the API metadata meta-tool
pub const INFO_TOOL: &str = "info";

/// Name of the external documentation meta-tool
pub const EXTERNAL_DOCS_TOOL: &str = "externalDocs";

/// URI of the current-time resource
pub const TIMESTAMP_URI: &str = "timestamp://current";

/// Maps an operation identifier to the registered tool name
pub type NameFormatter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Rewrites an assembled input schema; receives the operation identifier
pub type SchemaPostProcessor = Arc<dyn Fn(&str, ValidationSchema) -> ValidationSchema + Send + Sync>;

/// Options controlling one registration pass
#[derive(Clone)]
pub struct RegistrarOptions {
    /// Tag allow-list; empty disables filtering
    pub tags: Vec<String>,
    pub name_format: Option<NameFormatter>,
    pub post_process_schema: Option<SchemaPostProcessor>,
    pub dry_run: bool,
    pub pretty_print: bool,
    pub confirm_dangerous_actions: bool,
    pub confirmation_timing: ConfirmationTiming,
    /// Document version shown in annotation titles
    pub version: Option<String>,
    /// Replaces every server URL declared by the document
    pub base_url: Option<String>,
    pub log_http: bool,
    pub request_timeout: Option<Duration>,
}

impl Default for RegistrarOptions {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            name_format: None,
            post_process_schema: None,
            dry_run: false,
            pretty_print: false,
            confirm_dangerous_actions: true,
            confirmation_timing: ConfirmationTiming::default(),
            version: None,
            base_url: None,
            log_http: false,
            request_timeout: None,
        }
    }
}

impl fmt::Debug for RegistrarOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrarOptions")
            .field("tags", &self.tags)
            .field("name_format", &self.name_format.is_some())
            .field("post_process_schema", &self.post_process_schema.is_some())
            .field("dry_run", &self.dry_run)
            .field("pretty_print", &self.pretty_print)
            .field("confirm_dangerous_actions", &self.confirm_dangerous_actions)
            .field("confirmation_timing", &self.confirmation_timing)
            .field("version", &self.version)
            .field("base_url", &self.base_url)
            .field("log_http", &self.log_http)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl RegistrarOptions {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            tags: config.tags.clone(),
            name_format: config
                .tool_name_format
                .map(|format| Arc::new(move |name: &str| format.apply(name)) as NameFormatter),
            post_process_schema: None,
            dry_run: config.dry_run,
            pretty_print: config.pretty_print,
            confirm_dangerous_actions: config.confirm_dangerous_actions,
            confirmation_timing: config.confirmation_timing,
            version: config.version.clone(),
            base_url: config.base_url.clone(),
            log_http: config.log_http,
            request_timeout: config.request_timeout(),
        }
    }

    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_name_format<F>(mut self, format: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.name_format = Some(Arc::new(format));
        self
    }

    pub fn with_post_process_schema<F>(mut self, post_process: F) -> Self
    where
        F: Fn(&str, ValidationSchema) -> ValidationSchema + Send + Sync + 'static,
    {
        self.post_process_schema = Some(Arc::new(post_process));
        self
    }

    pub fn with_dry_run(mut self, pretty_print: bool) -> Self {
        self.dry_run = true;
        self.pretty_print = pretty_print;
        self
    }

    pub fn with_confirmation(mut self, enabled: bool) -> Self {
        self.confirm_dangerous_actions = enabled;
        self
    }

    pub fn with_confirmation_timing(mut self, timing: ConfirmationTiming) -> Self {
        self.confirmation_timing = timing;
        self
    }

    pub fn with_version<S: Into<String>>(mut self, version: S) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Whether the tag filter admits the operation.
    ///
    /// Any shared tag is enough; an untagged operation never passes an active
    /// filter.
    pub fn admits(&self, operation: &Operation) -> bool {
        self.tags.is_empty() || operation.tags.iter().any(|tag| self.tags.contains(tag))
    }

    /// Registered name for an operation identifier
    pub fn tool_name(&self, operation_id: &str) -> String {
        match &self.name_format {
            Some(format) => format(operation_id),
            None => operation_id.to_string(),
        }
    }

    fn annotation_title(&self, tags: &[String]) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(version) = self.version.as_deref().filter(|v| !v.is_empty()) {
            parts.push(format!("OpenAPI {}", version));
        }
        if !tags.is_empty() {
            parts.push(format!("Tags: {}", tags.join(", ")));
        }
        (!parts.is_empty()).then(|| parts.join(" | "))
    }

    fn dispatcher_options(&self) -> DispatcherOptions {
        DispatcherOptions {
            confirm_dangerous_actions: self.confirm_dangerous_actions,
            confirmation_timing: self.confirmation_timing,
            log_http: self.log_http,
            request_timeout: self.request_timeout,
        }
    }
}

/// Outcome of a registration pass
#[derive(Debug, Clone, Default)]
pub struct RegistrationReport {
    /// Names in registration order, meta-tools included
    pub tool_names: Vec<String>,
    /// Rendered tool summaries, only in dry-run mode
    pub dry_run_output: Option<String>,
    /// Whether the current-time resource was registered
    pub timestamp_resource: bool,
}

/// Registers operations as tools
pub struct ToolRegistrar {
    options: RegistrarOptions,
}

impl ToolRegistrar {
    pub fn new(options: RegistrarOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RegistrarOptions {
        &self.options
    }

    /// Register every admitted operation plus the meta-tools.
    ///
    /// Names are not deduplicated; the host decides what a repeated name
    /// means.
    pub fn register(
        &self,
        host: &mut dyn ToolHost,
        operations: &[Operation],
        document: Arc<ApiDocument>,
        transport: Arc<dyn HttpTransport>,
        credentials: Credentials,
    ) -> Result<RegistrationReport> {
        let base_urls = document.base_urls(self.options.base_url.as_deref());
        let env = DispatchEnvironment {
            document: Arc::clone(&document),
            base_urls: Arc::new(base_urls),
            credentials: Arc::new(credentials),
            transport,
            options: self.options.dispatcher_options(),
        };

        let mut report = RegistrationReport::default();
        let mut summaries = Vec::new();

        for operation in operations {
            if !self.options.admits(operation) {
                debug!("Skipping '{}': no tag matches the filter", operation.operation_id);
                continue;
            }

            let mut schema = build_input_schema(&operation.parameters, operation.request_body.as_ref());
            if let Some(post_process) = &self.options.post_process_schema {
                schema = post_process(&operation.operation_id, schema);
            }
            let description = generate_description(operation, &schema);
            let name = self.options.tool_name(&operation.operation_id);

            if self.options.dry_run {
                summaries.push(json!({
                    "name": name,
                    "description": description,
                    "tags": operation.tags,
                    "inputSchema": schema.to_value(),
                }));
                report.tool_names.push(name);
                continue;
            }

            let mut annotations = ToolAnnotations {
                title: self.options.annotation_title(&operation.tags),
                ..Default::default()
            };
            if operation.method.is_read_only() {
                annotations.read_only_hint = Some(true);
            }
            if operation.method == HttpMethod::Delete {
                annotations.destructive_hint = Some(true);
            }

            let tool = Tool::new(name.clone(), description, schema.to_value()).with_annotations(annotations);
            let dispatcher = RequestDispatcher::new(
                name.clone(),
                Arc::new(operation.clone()),
                Arc::new(schema),
                env.clone(),
            )?;
            host.add_tool(tool, Arc::new(dispatcher));
            report.tool_names.push(name);
        }

        if self.options.dry_run {
            let rendered = if self.options.pretty_print {
                serde_json::to_string_pretty(&summaries)?
            } else {
                serde_json::to_string(&summaries)?
            };
            report.dry_run_output = Some(rendered);
            info!("Dry run: {} tool(s) summarized", report.tool_names.len());
            return Ok(report);
        }

        if let Some(docs) = document.external_docs.clone().filter(|d| !d.url.is_empty()) {
            host.add_tool(self.meta_tool(EXTERNAL_DOCS_TOOL, EXTERNAL_DOCS_DESCRIPTION), Arc::new(ExternalDocsTool { docs }));
            report.tool_names.push(EXTERNAL_DOCS_TOOL.to_string());
        }

        host.add_tool(
            self.meta_tool(INFO_TOOL, INFO_DESCRIPTION),
            Arc::new(InfoTool {
                info: document.info.clone(),
            }),
        );
        report.tool_names.push(INFO_TOOL.to_string());

        if operations.iter().any(has_date_time_parameters) {
            host.add_resource(timestamp_resource(), Arc::new(TimestampResource));
            report.timestamp_resource = true;
        }

        info!("Registered {} tool(s)", report.tool_names.len());
        Ok(report)
    }

    fn meta_tool(&self, name: &str, description: &str) -> Tool {
        let title = self.options.version.as_deref().filter(|v| !v.is_empty()).map(|v| format!("OpenAPI {}", v));
        Tool::new(name, description, ValidationSchema::empty_object().to_value()).with_annotations(ToolAnnotations {
            title,
            ..Default::default()
        })
    }
}

/// Check that every admitted operation produced a tool and that the `info`
/// meta-tool is present. Lists every missing name in the error.
pub fn verify_registration(operations: &[Operation], tool_names: &[String], options: &RegistrarOptions) -> Result<()> {
    let registered: HashSet<&str> = tool_names.iter().map(String::as_str).collect();
    let mut missing: Vec<String> = operations
        .iter()
        .filter(|op| options.admits(op))
        .map(|op| options.tool_name(&op.operation_id))
        .filter(|name| !registered.contains(name.as_str()))
        .collect();
    if !registered.contains(INFO_TOOL) {
        missing.push(INFO_TOOL.to_string());
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(BridgeError::registry(format!("Missing tools: {}", missing.join(", "))))
    }
}

const INFO_DESCRIPTION: &str = "Show API metadata: title, version, description, and terms of service.";
const EXTERNAL_DOCS_DESCRIPTION: &str = "Show the OpenAPI external documentation URL and description.";

struct InfoTool {
    info: ApiInfo,
}

#[async_trait]
impl ToolHandler for InfoTool {
    async fn call(&self, _arguments: Map<String, Value>, _context: &InvocationContext) -> Result<ToolResult> {
        let info = &self.info;
        let lines: Vec<String> = [
            ("Title", Some(info.title.as_str())),
            ("Version", Some(info.version.as_str())),
            ("Description", info.description.as_deref()),
            ("Terms of Service", info.terms_of_service.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.filter(|v| !v.is_empty()).map(|v| format!("{}: {}", label, v)))
        .collect();
        Ok(ToolResult::text(lines.join("\n")))
    }
}

struct ExternalDocsTool {
    docs: ExternalDocs,
}

#[async_trait]
impl ToolHandler for ExternalDocsTool {
    async fn call(&self, _arguments: Map<String, Value>, _context: &InvocationContext) -> Result<ToolResult> {
        let mut text = format!("External documentation URL: {}", self.docs.url);
        if let Some(description) = self.docs.description.as_deref().filter(|d| !d.is_empty()) {
            text.push_str("\nDescription: ");
            text.push_str(description);
        }
        Ok(ToolResult::text(text))
    }
}

fn timestamp_resource() -> Resource {
    Resource {
        uri: TIMESTAMP_URI.to_string(),
        name: "Current Unix Timestamp".to_string(),
        description: Some(
            "Provides the current Unix timestamp in seconds to help the AI understand the current date and time"
                .to_string(),
        ),
        mime_type: Some("application/json".to_string()),
    }
}

struct TimestampResource;

#[async_trait]
impl ResourceHandler for TimestampResource {
    async fn read(&self) -> Result<ResourceContent> {
        let now = chrono::Local::now();
        let body = json!({
            "unix_timestamp": now.timestamp(),
            "iso8601": now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "timezone": now.format("%Z").to_string(),
        });
        Ok(ResourceContent {
            uri: TIMESTAMP_URI.to_string(),
            mime_type: Some("application/json".to_string()),
            text: serde_json::to_string(&body)?,
        })
    }
}

const TIME_NAME_HINTS: [&str; 6] = ["date", "time", "created_at", "updated_at", "start_time", "end_time"];

/// Heuristic: does the operation take something date or time shaped?
pub fn has_date_time_parameters(operation: &Operation) -> bool {
    let by_parameter = operation.parameters.iter().any(|param| {
        let name = param.name.to_lowercase();
        if TIME_NAME_HINTS.iter().any(|hint| name.contains(hint)) {
            return true;
        }
        param.schema.as_ref().is_some_and(|schema| {
            is_date_format(schema)
                || (schema.is_type("integer") && (name.contains("time") || name.contains("timestamp")))
        })
    });
    if by_parameter {
        return true;
    }

    operation.request_body.as_ref().is_some_and(|body| {
        body.content
            .values()
            .filter_map(|media| media.schema.as_ref())
            .any(schema_has_date_time)
    })
}

fn is_date_format(schema: &SchemaObject) -> bool {
    matches!(schema.format.as_deref(), Some("date") | Some("date-time"))
}

fn schema_has_date_time(schema: &SchemaObject) -> bool {
    is_date_format(schema)
        || schema.properties.iter().flat_map(|p| p.values()).any(schema_has_date_time)
        || schema.items.as_deref().is_some_and(schema_has_date_time)
        || schema
            .all_of
            .iter()
            .chain(&schema.any_of)
            .chain(&schema.one_of)
            .any(schema_has_date_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::types::{Parameter, ParameterLocation, RequestBody};

    fn tagged(id: &str, tags: &[&str]) -> Operation {
        Operation::new(id, HttpMethod::Get, format!("/{}", id)).with_tags(tags.iter().copied())
    }

    #[test]
    fn test_tag_filter_is_any_match() {
        let options = RegistrarOptions::default().with_tags(["A", "B"]);
        assert!(options.admits(&tagged("a", &["A"])));
        assert!(options.admits(&tagged("ca", &["C", "A"])));
        assert!(!options.admits(&tagged("c", &["C"])));
        assert!(!options.admits(&tagged("none", &[])));
        assert!(RegistrarOptions::default().admits(&tagged("none", &[])));
    }

    #[test]
    fn test_annotation_title() {
        let options = RegistrarOptions::default().with_version("1.2");
        assert_eq!(
            options.annotation_title(&["pets".to_string(), "store".to_string()]).as_deref(),
            Some("OpenAPI 1.2 | Tags: pets, store")
        );
        assert_eq!(RegistrarOptions::default().annotation_title(&[]), None);
    }

    #[test]
    fn test_date_time_heuristic() {
        let by_name = Operation::new("a", HttpMethod::Get, "/a").with_parameter(Parameter::new(
            "created_at",
            ParameterLocation::Query,
            SchemaObject::of_type("string"),
        ));
        assert!(has_date_time_parameters(&by_name));

        let by_body = Operation::new("b", HttpMethod::Post, "/b").with_request_body(RequestBody::json(
            SchemaObject::of_type("object").with_property(
                "when",
                SchemaObject::of_type("array").with_items(SchemaObject::of_type("string").with_format("date")),
            ),
            true,
        ));
        assert!(has_date_time_parameters(&by_body));

        let plain = Operation::new("c", HttpMethod::Get, "/c").with_parameter(Parameter::new(
            "limit",
            ParameterLocation::Query,
            SchemaObject::of_type("integer"),
        ));
        assert!(!has_date_time_parameters(&plain));
    }

    #[tokio::test]
    async fn test_info_tool_text() {
        let tool = InfoTool {
            info: ApiInfo {
                title: "Pets".to_string(),
                version: "1.0".to_string(),
                description: None,
                terms_of_service: Some("https://example.com/tos".to_string()),
            },
        };
        let result = tool.call(Map::new(), &InvocationContext::new()).await.unwrap();
        assert_eq!(
            result.text_content(),
            "Title: Pets\nVersion: 1.0\nTerms of Service: https://example.com/tos"
        );
    }

    #[tokio::test]
    async fn test_timestamp_resource_is_json() {
        let content = TimestampResource.read().await.unwrap();
        let value: Value = serde_json::from_str(&content.text).unwrap();
        assert!(value["unix_timestamp"].as_i64().unwrap() > 0);
        assert!(value["iso8601"].is_string());
    }
}
