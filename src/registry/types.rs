//! Interface-description document types
//!
//! These are the in-memory shapes handed over by the document extraction step.
//! They are immutable once built and shared read-only between the registrar and
//! every dispatcher created from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Media type preferred for JSON request bodies
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// JSON:API media type, accepted as a fallback for request bodies
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

/// HTTP method of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
}

impl HttpMethod {
    /// Upper-case wire spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Methods gated behind the confirmation flow and flagged in descriptions
    pub fn is_mutating(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Delete)
    }

    /// Methods that never change server state
    pub fn is_read_only(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head | HttpMethod::Options)
    }

    /// Convert into the HTTP client's method type
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
            HttpMethod::Trace => reqwest::Method::TRACE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "TRACE" => Ok(HttpMethod::Trace),
            other => Err(format!("Unsupported HTTP method: {}", other)),
        }
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

/// Where a parameter travels in the outbound request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    /// Any location the dispatcher cannot place (e.g. Swagger 2 `formData`)
    Other(String),
}

impl ParameterLocation {
    pub fn as_str(&self) -> &str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
            ParameterLocation::Other(other) => other,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ParameterLocation::Other(_))
    }
}

impl From<String> for ParameterLocation {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "path" => ParameterLocation::Path,
            "query" => ParameterLocation::Query,
            "header" => ParameterLocation::Header,
            "cookie" => ParameterLocation::Cookie,
            _ => ParameterLocation::Other(value),
        }
    }
}

impl From<ParameterLocation> for String {
    fn from(location: ParameterLocation) -> Self {
        location.as_str().to_string()
    }
}

/// `type` keyword of a source schema: a single name or (OpenAPI 3.1) a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    Single(String),
    Multiple(Vec<String>),
}

impl SchemaType {
    /// The first declared type name
    pub fn first(&self) -> Option<&str> {
        match self {
            SchemaType::Single(name) => Some(name.as_str()),
            SchemaType::Multiple(names) => names.first().map(String::as_str),
        }
    }
}

/// A schema node as written in the interface-description document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaObject {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enumeration: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaObject>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaObject>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaObject>,
    /// Carried opaquely; never interpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Value>,
}

impl SchemaObject {
    /// Schema with a single declared type
    pub fn of_type<S: Into<String>>(schema_type: S) -> Self {
        Self {
            schema_type: Some(SchemaType::Single(schema_type.into())),
            ..Default::default()
        }
    }

    pub fn with_format<S: Into<String>>(mut self, format: S) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enumeration = values;
        self
    }

    pub fn with_property<S: Into<String>>(mut self, name: S, schema: SchemaObject) -> Self {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), schema);
        self
    }

    pub fn with_required<S: Into<String>>(mut self, name: S) -> Self {
        self.required.push(name.into());
        self
    }

    pub fn with_items(mut self, items: SchemaObject) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    /// First declared type name, if any
    pub fn primary_type(&self) -> Option<&str> {
        self.schema_type.as_ref().and_then(SchemaType::first)
    }

    pub fn is_type(&self, name: &str) -> bool {
        self.primary_type() == Some(name)
    }
}

/// One operation parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Declared name; the escaped form is derived from it
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaObject>,
    /// Overrides the schema's own description when non-empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Parameter {
    pub fn new<S: Into<String>>(name: S, location: ParameterLocation, schema: SchemaObject) -> Self {
        Self {
            name: name.into(),
            location,
            required: false,
            schema: Some(schema),
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether the parameter's value schema is integer-typed
    pub fn is_integer(&self) -> bool {
        self.schema.as_ref().map_or(false, |s| s.is_type("integer"))
    }
}

/// Media type entry of a request body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaObject>,
}

/// Request body declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

impl RequestBody {
    /// Body with a single `application/json` entry
    pub fn json(schema: SchemaObject, required: bool) -> Self {
        let mut content = BTreeMap::new();
        content.insert(
            JSON_MEDIA_TYPE.to_string(),
            MediaType {
                schema: Some(schema),
            },
        );
        Self {
            required,
            description: None,
            content,
        }
    }

    /// Locate the JSON-compatible entry: `application/json` first, then
    /// `application/vnd.api+json`. Media type parameters after `;` are ignored
    /// for matching. Returns the base media type and its entry.
    pub fn json_content(&self) -> Option<(&'static str, &MediaType)> {
        [JSON_MEDIA_TYPE, JSON_API_MEDIA_TYPE]
            .into_iter()
            .find_map(|wanted| self.content_by_type(wanted).map(|mt| (wanted, mt)))
    }

    fn content_by_type(&self, wanted: &str) -> Option<&MediaType> {
        if let Some(exact) = self.content.get(wanted) {
            return Some(exact);
        }
        self.content
            .iter()
            .find(|(name, _)| base_media_type(name).eq_ignore_ascii_case(wanted))
            .map(|(_, media_type)| media_type)
    }
}

/// Media type without its `;`-separated parameters
pub fn base_media_type(media_type: &str) -> &str {
    media_type
        .split_once(';')
        .map_or(media_type, |(base, _)| base)
        .trim()
}

/// One security alternative: scheme name -> scopes.
/// Any single scheme of the alternative satisfies it.
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

/// One API operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: String,
    pub method: HttpMethod,
    /// Path template with `{param}` placeholders
    pub path: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub security: Vec<SecurityRequirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Operation {
    pub fn new<S: Into<String>, P: Into<String>>(operation_id: S, method: HttpMethod, path: P) -> Self {
        Self {
            operation_id: operation_id.into(),
            method,
            path: path.into(),
            parameters: Vec::new(),
            request_body: None,
            security: Vec::new(),
            summary: None,
            description: None,
            tags: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_request_body(mut self, body: RequestBody) -> Self {
        self.request_body = Some(body);
        self
    }

    pub fn with_security(mut self, requirement: SecurityRequirement) -> Self {
        self.security.push(requirement);
        self
    }

    pub fn with_summary<S: Into<String>>(mut self, summary: S) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Parameters placed at the given location, in declaration order
    pub fn parameters_in<'a>(&'a self, location: &'a ParameterLocation) -> impl Iterator<Item = &'a Parameter> + 'a {
        self.parameters.iter().filter(move |p| &p.location == location)
    }

    /// Summary if present, else description, else empty
    pub fn summary_or_description(&self) -> &str {
        non_empty(self.summary.as_deref())
            .or_else(|| non_empty(self.description.as_deref()))
            .unwrap_or("")
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Location of an API key credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

/// A security scheme from the document's component table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SecurityScheme {
    /// HTTP authentication (`bearer` or `basic`)
    #[serde(rename = "http")]
    Http { scheme: String },
    /// API key in a header, query parameter or cookie
    #[serde(rename = "apiKey")]
    ApiKey {
        name: String,
        #[serde(rename = "in")]
        location: ApiKeyLocation,
    },
    /// OAuth 2.0; satisfied by a bearer credential
    #[serde(rename = "oauth2")]
    OAuth2 {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flows: Option<Value>,
    },
    /// OpenID Connect; never satisfied by the supported credential channels
    #[serde(rename = "openIdConnect")]
    OpenIdConnect {
        #[serde(rename = "openIdConnectUrl", default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

impl SecurityScheme {
    pub fn bearer() -> Self {
        SecurityScheme::Http {
            scheme: "bearer".to_string(),
        }
    }

    pub fn basic() -> Self {
        SecurityScheme::Http {
            scheme: "basic".to_string(),
        }
    }

    pub fn api_key<S: Into<String>>(name: S, location: ApiKeyLocation) -> Self {
        SecurityScheme::ApiKey {
            name: name.into(),
            location,
        }
    }
}

/// API metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
}

/// One server entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// External documentation reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalDocs {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Document-level data the registrar and dispatcher need besides operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDocument {
    #[serde(default)]
    pub info: ApiInfo,
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    #[serde(default)]
    pub security_schemes: HashMap<String, SecurityScheme>,
}

impl ApiDocument {
    /// Non-empty server URLs in declaration order
    pub fn server_urls(&self) -> Vec<String> {
        self.servers
            .iter()
            .map(|s| s.url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Candidate base URLs: the override, else every non-empty server URL,
    /// else the local default
    pub fn base_urls(&self, override_url: Option<&str>) -> Vec<String> {
        if let Some(url) = override_url.map(str::trim).filter(|u| !u.is_empty()) {
            return vec![url.to_string()];
        }
        let servers = self.server_urls();
        if servers.is_empty() {
            vec![crate::config::DEFAULT_BASE_URL.to_string()]
        } else {
            servers
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_deserializes_from_document_spelling() {
        let op: Operation = serde_json::from_value(json!({
            "operationId": "getPet",
            "method": "get",
            "path": "/pets/{petId}",
            "parameters": [
                {"name": "petId", "in": "path", "required": true, "schema": {"type": "integer"}},
                {"name": "session", "in": "cookie", "schema": {"type": ["string", "null"]}},
                {"name": "upload", "in": "formData"}
            ],
            "security": [{"ApiKeyAuth": []}],
            "tags": ["pets"]
        }))
        .unwrap();

        assert_eq!(op.method, HttpMethod::Get);
        assert_eq!(op.parameters[0].location, ParameterLocation::Path);
        assert!(op.parameters[0].is_integer());
        assert_eq!(op.parameters[1].schema.as_ref().unwrap().primary_type(), Some("string"));
        assert_eq!(op.parameters[2].location, ParameterLocation::Other("formData".to_string()));
        assert!(op.security[0].contains_key("ApiKeyAuth"));
    }

    #[test]
    fn test_security_scheme_tags() {
        let schemes: HashMap<String, SecurityScheme> = serde_json::from_value(json!({
            "bearer": {"type": "http", "scheme": "bearer"},
            "key": {"type": "apiKey", "name": "X-Key", "in": "header"},
            "oauth": {"type": "oauth2", "flows": {}}
        }))
        .unwrap();

        assert_eq!(schemes["bearer"], SecurityScheme::bearer());
        assert_eq!(schemes["key"], SecurityScheme::api_key("X-Key", ApiKeyLocation::Header));
        assert!(matches!(schemes["oauth"], SecurityScheme::OAuth2 { .. }));
    }

    #[test]
    fn test_json_content_prefers_application_json() {
        let mut body = RequestBody::default();
        body.content.insert(JSON_API_MEDIA_TYPE.to_string(), MediaType::default());
        body.content.insert("application/json; charset=utf-8".to_string(), MediaType::default());

        let (media_type, _) = body.json_content().unwrap();
        assert_eq!(media_type, JSON_MEDIA_TYPE);

        body.content.remove("application/json; charset=utf-8");
        let (media_type, _) = body.json_content().unwrap();
        assert_eq!(media_type, JSON_API_MEDIA_TYPE);

        body.content.clear();
        body.content.insert("text/plain".to_string(), MediaType::default());
        assert!(body.json_content().is_none());
    }

    #[test]
    fn test_mutating_methods() {
        assert!(HttpMethod::Post.is_mutating());
        assert!(HttpMethod::Put.is_mutating());
        assert!(HttpMethod::Delete.is_mutating());
        assert!(!HttpMethod::Patch.is_mutating());
        assert!(!HttpMethod::Get.is_mutating());
    }

    #[test]
    fn test_server_urls_skip_empty() {
        let doc = ApiDocument {
            servers: vec![
                ServerEntry { url: "https://a.example.com".into(), description: None },
                ServerEntry { url: "  ".into(), description: None },
            ],
            ..Default::default()
        };
        assert_eq!(doc.server_urls(), vec!["https://a.example.com".to_string()]);
    }
}
