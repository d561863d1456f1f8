//! Tool-host data types
//!
//! The shapes handed to the hosting runtime: tool definitions with their input
//! schemas and annotations, call results, and resources.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (unique identifier)
    pub name: String,
    /// Agent-facing description
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    /// JSON Schema for input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub annotations: Option<ToolAnnotations>,
}

impl Tool {
    pub fn new<N: Into<String>, D: Into<String>>(name: N, description: D, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema,
            annotations: None,
        }
    }

    pub fn with_annotations(mut self, annotations: ToolAnnotations) -> Self {
        self.annotations = Some(annotations);
        self
    }

    /// Title from the annotations, if any
    pub fn title(&self) -> Option<&str> {
        self.annotations.as_ref().and_then(|a| a.title.as_deref())
    }
}

/// Tool annotations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolAnnotations {
    /// Display title
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub title: Option<String>,
    /// Tool never changes server state
    #[serde(rename = "readOnlyHint", skip_serializing_if = "Option::is_none", default)]
    pub read_only_hint: Option<bool>,
    /// Tool may delete data
    #[serde(rename = "destructiveHint", skip_serializing_if = "Option::is_none", default)]
    pub destructive_hint: Option<bool>,
}

impl ToolAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.read_only_hint.is_none() && self.destructive_hint.is_none()
    }
}

/// One content item of a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    /// Plain text
    #[serde(rename = "text")]
    Text { text: String },
    /// Structured JSON payload
    #[serde(rename = "json")]
    Json { json: Value },
}

impl ToolContent {
    pub fn text<S: Into<String>>(text: S) -> Self {
        ToolContent::Text { text: text.into() }
    }

    /// Text rendition; JSON payloads are pretty-printed
    pub fn as_text(&self) -> String {
        match self {
            ToolContent::Text { text } => text.clone(),
            ToolContent::Json { json } => serde_json::to_string_pretty(json).unwrap_or_else(|_| json.to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ToolContent::Json { json } => Some(json),
            ToolContent::Text { .. } => None,
        }
    }
}

/// Result of one tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Error flag seen by the calling agent
    #[serde(rename = "isError")]
    pub is_error: bool,
    pub content: Vec<ToolContent>,
}

impl ToolResult {
    /// Successful result with text content
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            is_error: false,
            content: vec![ToolContent::text(text)],
        }
    }

    /// Error result with text content
    pub fn error<S: Into<String>>(text: S) -> Self {
        Self {
            is_error: true,
            content: vec![ToolContent::text(text)],
        }
    }

    /// Structured JSON result
    pub fn json(value: Value, is_error: bool) -> Self {
        Self {
            is_error,
            content: vec![ToolContent::Json { json: value }],
        }
    }

    /// All content joined as text
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .map(ToolContent::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// First structured payload, if any
    pub fn json_content(&self) -> Option<&Value> {
        self.content.iter().find_map(ToolContent::as_json)
    }
}

/// Resource definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub uri: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none", default)]
    pub mime_type: Option<String>,
}

/// Resource content returned from a read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContent {
    pub uri: String,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none", default)]
    pub mime_type: Option<String>,
    pub text: String,
}
