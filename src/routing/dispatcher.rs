//! Request dispatcher
//!
//! One dispatcher is bound to each operation tool. A call runs
//! validate -> build -> authenticate -> send -> classify, with the mutating
//! action confirmation gate evaluated according to [`ConfirmationTiming`].
//! Nothing here is mutated after construction, so a dispatcher serves
//! concurrent calls through `&self`.

use super::auth::{apply_authentication, RequestParts};
use super::guidance::{validation_failure_text, GuidanceContext};
use super::transport::HttpTransport;
use super::types::{HttpRequest, HttpResponse, InvocationContext, PayloadKind};
use crate::config::{ConfirmationTiming, Credentials};
use crate::error::{BridgeError, Result};
use crate::mcp::{ArgumentValidator, ToolHandler, ToolResult};
use crate::registry::description::display_value;
use crate::registry::schema::{ValidationSchema, REQUEST_BODY_KEY};
use crate::registry::types::{ApiDocument, Operation, ParameterLocation};
use crate::startup::logger::{log_http_request, log_http_response};
use crate::utils::{build_parameter_name_mapping, unescape_parameter_name, ParameterNameMapping};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::seq::SliceRandom;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Argument marker that passes the confirmation gate
pub const CONFIRMED_KEY: &str = "__confirmed";

/// Argument accepted for streaming clients; the response is formatted the same
pub const STREAM_KEY: &str = "stream";

/// `Accept` header sent with every request
pub const ACCEPT_VALUE: &str = "application/json, application/vnd.api+json";

/// Behaviour switches shared by all dispatchers of one registration
#[derive(Debug, Clone)]
pub struct DispatcherOptions {
    pub confirm_dangerous_actions: bool,
    pub confirmation_timing: ConfirmationTiming,
    pub log_http: bool,
    /// Used when the invocation context carries no deadline
    pub request_timeout: Option<Duration>,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            confirm_dangerous_actions: true,
            confirmation_timing: ConfirmationTiming::AfterResponse,
            log_http: false,
            request_timeout: None,
        }
    }
}

/// Read-only state shared by every dispatcher created in one registration
#[derive(Clone)]
pub struct DispatchEnvironment {
    pub document: Arc<ApiDocument>,
    /// Never empty; one is picked at random per call
    pub base_urls: Arc<Vec<String>>,
    /// Process credentials, overlaid by request-scoped ones
    pub credentials: Arc<Credentials>,
    pub transport: Arc<dyn HttpTransport>,
    pub options: DispatcherOptions,
}

/// Callable behind one operation tool
pub struct RequestDispatcher {
    tool_name: String,
    operation: Arc<Operation>,
    schema: Arc<ValidationSchema>,
    validator: ArgumentValidator,
    /// Escaped schema key -> declared parameter name
    names: ParameterNameMapping,
    env: DispatchEnvironment,
}

impl RequestDispatcher {
    pub fn new(
        tool_name: impl Into<String>,
        operation: Arc<Operation>,
        schema: Arc<ValidationSchema>,
        env: DispatchEnvironment,
    ) -> Result<Self> {
        if env.base_urls.is_empty() {
            return Err(BridgeError::config("At least one base URL is required"));
        }
        let validator = ArgumentValidator::new(&schema)?;
        let names = build_parameter_name_mapping(&operation.parameters);
        Ok(Self {
            tool_name: tool_name.into(),
            operation,
            schema,
            validator,
            names,
            env,
        })
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Re-key arguments by declared parameter name. An escaped key wins over
    /// a literal declared key for the same parameter.
    pub fn declared_arguments(&self, arguments: &Map<String, Value>) -> Map<String, Value> {
        let mut declared = Map::new();
        for (key, value) in arguments {
            if self.names.contains_key(key) {
                declared.insert(unescape_parameter_name(key, &self.names), value.clone());
            } else {
                declared.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        declared
    }

    fn needs_confirmation(&self, arguments: &Map<String, Value>) -> bool {
        self.env.options.confirm_dangerous_actions
            && self.operation.method.is_mutating()
            && arguments.get(CONFIRMED_KEY) != Some(&Value::Bool(true))
    }

    fn confirmation_request(&self) -> ToolResult {
        ToolResult::text(format!(
            "⚠️  CONFIRMATION REQUIRED\n\nAction: {}\nThis action is irreversible. Proceed?\n\nTo confirm, retry the call with {{\"{}\": true}} added to your arguments.",
            self.tool_name, CONFIRMED_KEY
        ))
    }

    /// Run one invocation.
    ///
    /// Validation failures and upstream non-2xx responses come back as error
    /// results; request construction and transport failures are `Err`.
    pub async fn dispatch(&self, arguments: &Map<String, Value>, context: &InvocationContext) -> Result<ToolResult> {
        let violations = self.validator.validate(&Value::Object(arguments.clone()));
        if !violations.is_empty() {
            debug!("Rejected arguments for '{}': {} violation(s)", self.tool_name, violations.len());
            return Ok(ToolResult::error(validation_failure_text(
                &self.tool_name,
                &violations,
                &self.schema,
            )));
        }

        let gated = self.needs_confirmation(arguments);
        if gated && self.env.options.confirmation_timing == ConfirmationTiming::BeforeRequest {
            return Ok(self.confirmation_request());
        }
        if arguments.get(STREAM_KEY) == Some(&Value::Bool(true)) {
            debug!("'{}' called with stream=true; responding with the standard envelope", self.tool_name);
        }

        let credentials = self.env.credentials.overlay(&context.credentials);
        let timeout = context.timeout.or(self.env.options.request_timeout);
        let request = self.build_request(arguments, &credentials, timeout)?;
        let method = request.method;
        let url = request.url.clone();

        if self.env.options.log_http {
            log_http_request(&request);
        }
        let response = self.env.transport.send(request).await?;
        if self.env.options.log_http {
            log_http_response(&response);
        }

        let kind = PayloadKind::classify(response.content_type());
        if !response.is_success() {
            return Ok(self.error_result(arguments, &response, kind, &url));
        }
        if kind == PayloadKind::Binary {
            return Ok(self.binary_result(&response));
        }

        if gated {
            return Ok(self.confirmation_request());
        }

        Ok(ToolResult::text(format!(
            "HTTP {} {}\nStatus: {}\nResponse:\n{}",
            method,
            url,
            response.status.as_u16(),
            response.body_text()
        )))
    }

    /// Assemble the outbound request: path, query, body, auth, then header
    /// and cookie parameters.
    pub fn build_request(
        &self,
        arguments: &Map<String, Value>,
        credentials: &Credentials,
        timeout: Option<Duration>,
    ) -> Result<HttpRequest> {
        let op = &self.operation;
        let arguments = &self.declared_arguments(arguments);

        let mut path = op.path.clone();
        for param in op.parameters_in(&ParameterLocation::Path) {
            if let Some(value) = arguments.get(&param.name) {
                let rendered = format_parameter_value(value, param.is_integer());
                path = path.replace(&format!("{{{}}}", param.name), &urlencoding::encode(&rendered));
            }
        }

        let base_url = self
            .env
            .base_urls
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| BridgeError::config("At least one base URL is required"))?;
        let mut url = join_url(base_url, &path)?;

        let query: Vec<(String, String)> = op
            .parameters_in(&ParameterLocation::Query)
            .filter_map(|param| {
                arguments.get(&param.name)
                    .map(|value| (param.name.clone(), format_parameter_value(value, param.is_integer())))
            })
            .collect();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let mut parts = RequestParts::new(url);

        let mut body = None;
        if let Some((media_type, content)) = op.request_body.as_ref().and_then(|b| b.json_content()) {
            if content.schema.is_some() {
                if let Some(payload) = arguments.get(REQUEST_BODY_KEY).filter(|v| !v.is_null()) {
                    body = Some(serde_json::to_vec(payload)?);
                    parts.headers.insert(CONTENT_TYPE, HeaderValue::from_static(media_type));
                }
            }
        }
        parts.headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));

        apply_authentication(&mut parts, &op.security, &self.env.document.security_schemes, credentials)?;

        for param in &op.parameters {
            let Some(value) = arguments.get(&param.name) else {
                continue;
            };
            let rendered = format_parameter_value(value, param.is_integer());
            match param.location {
                ParameterLocation::Header => parts.set_header(&param.name, &rendered)?,
                ParameterLocation::Cookie => parts.add_cookie(&param.name, &rendered),
                _ => {}
            }
        }

        let (url, headers) = parts.finish()?;
        Ok(HttpRequest {
            method: op.method,
            url,
            headers,
            body,
            timeout,
        })
    }

    fn error_result(&self, arguments: &Map<String, Value>, response: &HttpResponse, kind: PayloadKind, url: &Url) -> ToolResult {
        let op = &self.operation;
        let status = response.status;
        let body_text = if kind == PayloadKind::Binary {
            String::new()
        } else {
            response.body_text()
        };
        let suggestion = GuidanceContext {
            operation: op,
            schema: &self.schema,
            arguments,
            response_body: &body_text,
            status,
        }
        .suggestion();
        let reason = status.canonical_reason().unwrap_or("Unknown Status");
        let summary = op.summary_or_description();

        if kind == PayloadKind::Binary {
            let file = BinaryPayload::from_response(response);
            return ToolResult::json(
                json!({
                    "type": "api_response",
                    "error": {
                        "code": "http_error",
                        "http_status": status.as_u16(),
                        "message": format!("{} (HTTP {})", reason, status.as_u16()),
                        "details": "Binary response (see file_base64)",
                        "suggestion": suggestion,
                        "mime_type": file.mime_type,
                        "file_base64": file.base64,
                        "file_name": file.file_name,
                        "operation": {
                            "id": op.operation_id,
                            "summary": summary,
                            "description": op.description.as_deref().unwrap_or(""),
                        },
                    },
                }),
                true,
            );
        }

        warn!("'{}' failed upstream with HTTP {}", self.tool_name, status.as_u16());
        let mut text = format!("HTTP {} {}\nError: {} (HTTP {})", op.method, url, reason, status.as_u16());
        if !body_text.is_empty() {
            text.push_str("\nDetails: ");
            text.push_str(&body_text);
        }
        text.push_str("\nSuggestion: ");
        text.push_str(&suggestion);
        text.push_str(&format!("\nOperation: {} ({})", op.operation_id, summary));
        ToolResult::error(text)
    }

    fn binary_result(&self, response: &HttpResponse) -> ToolResult {
        let op = &self.operation;
        let file = BinaryPayload::from_response(response);
        ToolResult::json(
            json!({
                "type": "api_response",
                "http_status": response.status.as_u16(),
                "mime_type": file.mime_type,
                "file_base64": file.base64,
                "file_name": file.file_name,
                "operation": {
                    "id": op.operation_id,
                    "summary": op.summary.as_deref().unwrap_or(""),
                    "description": op.description.as_deref().unwrap_or(""),
                },
            }),
            false,
        )
    }
}

#[async_trait]
impl ToolHandler for RequestDispatcher {
    async fn call(&self, arguments: Map<String, Value>, context: &InvocationContext) -> Result<ToolResult> {
        self.dispatch(&arguments, context).await
    }
}

struct BinaryPayload {
    mime_type: String,
    base64: String,
    file_name: String,
}

impl BinaryPayload {
    fn from_response(response: &HttpResponse) -> Self {
        Self {
            mime_type: response.content_type().to_string(),
            base64: STANDARD.encode(&response.body),
            file_name: response
                .content_disposition()
                .and_then(disposition_filename)
                .unwrap_or_else(|| "file".to_string()),
        }
    }
}

/// `attachment; filename="report.pdf"` -> `report.pdf`
fn disposition_filename(disposition: &str) -> Option<String> {
    let (_, rest) = disposition.split_once("filename=")?;
    let name = rest.split(';').next().unwrap_or(rest).trim().trim_matches('"');
    (!name.is_empty()).then(|| name.to_string())
}

/// Render a parameter value for a path, query, header or cookie slot.
///
/// Integer-typed parameters never carry a decimal point (`5.0` -> `"5"`).
pub fn format_parameter_value(value: &Value, is_integer: bool) -> String {
    if is_integer {
        if let Value::Number(number) = value {
            if let Some(i) = number.as_i64() {
                return i.to_string();
            }
            if let Some(u) = number.as_u64() {
                return u.to_string();
            }
            if let Some(f) = number.as_f64() {
                return (f.trunc() as i64).to_string();
            }
        }
    }
    display_value(value)
}

/// Append `path` to the base URL's path with exactly one `/` between them
fn join_url(base_url: &str, path: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    let joined = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_formatting() {
        assert_eq!(format_parameter_value(&json!(5.0), true), "5");
        assert_eq!(format_parameter_value(&json!(5), true), "5");
        assert_eq!(format_parameter_value(&json!(7.9), true), "7");
        assert_eq!(format_parameter_value(&json!(5.5), false), "5.5");
        assert_eq!(format_parameter_value(&json!("abc"), true), "abc");
        assert_eq!(format_parameter_value(&json!(true), false), "true");
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://api.example.com/v1/", "/pets/5").unwrap().as_str(),
            "https://api.example.com/v1/pets/5"
        );
        assert_eq!(
            join_url("https://api.example.com", "pets").unwrap().as_str(),
            "https://api.example.com/pets"
        );
        assert!(matches!(join_url("::not a url", "/pets"), Err(BridgeError::RequestBuild { .. })));
    }

    #[test]
    fn test_disposition_filename() {
        assert_eq!(disposition_filename("attachment; filename=\"report.pdf\"").as_deref(), Some("report.pdf"));
        assert_eq!(disposition_filename("attachment; filename=a.bin; size=3").as_deref(), Some("a.bin"));
        assert_eq!(disposition_filename("inline"), None);
    }
}
