//! Translation of document schemas into tool input schemas
//!
//! Every operation gets one object schema whose properties are its parameters
//! (keyed by escaped name) plus an optional `requestBody` property.

use super::types::{base_media_type, Parameter, RequestBody, SchemaObject, JSON_API_MEDIA_TYPE, JSON_MEDIA_TYPE};
use crate::utils::escape_parameter_name;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Property key carrying the JSON request body
pub const REQUEST_BODY_KEY: &str = "requestBody";

/// Description forced onto the request body property
pub const REQUEST_BODY_DESCRIPTION: &str = "The JSON request body.";

/// Canonical validation schema node
///
/// Serializes to plain JSON Schema. Empty fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enumeration: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, ValidationSchema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ValidationSchema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<ValidationSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<ValidationSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<ValidationSchema>,
    /// Opaque annotation, not evaluated by validators
    #[serde(rename = "x-discriminator", default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Value>,
}

impl ValidationSchema {
    /// Empty object schema (`{"type": "object", "properties": {}}`)
    pub fn empty_object() -> Self {
        Self {
            schema_type: Some("object".to_string()),
            properties: Some(BTreeMap::new()),
            ..Default::default()
        }
    }

    /// Object properties, or an empty map
    pub fn property_map(&self) -> &BTreeMap<String, ValidationSchema> {
        static EMPTY: BTreeMap<String, ValidationSchema> = BTreeMap::new();
        self.properties.as_ref().unwrap_or(&EMPTY)
    }

    pub fn property(&self, name: &str) -> Option<&ValidationSchema> {
        self.properties.as_ref().and_then(|p| p.get(name))
    }

    /// Node describing the instance at JSON pointer `path`, walking
    /// `properties` for names and `items` for array indices
    pub fn node_at(&self, path: &str) -> Option<&ValidationSchema> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| match segment.parse::<usize>() {
                Ok(_) if node.items.is_some() => node.items.as_deref(),
                _ => node.property(segment),
            })
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Property names that are not in the required list, in key order
    pub fn optional_names(&self) -> impl Iterator<Item = &String> {
        self.property_map().keys().filter(move |name| !self.is_required(name))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

/// Translate one document schema node. Absent input yields absent output.
pub fn translate_schema(source: Option<&SchemaObject>) -> Option<ValidationSchema> {
    let source = source?;
    let mut node = ValidationSchema::default();

    if !source.all_of.is_empty() {
        node.all_of = translate_members(&source.all_of);
    }
    if !source.one_of.is_empty() {
        warn!("oneOf used in schema; only basic support is provided");
        node.one_of = translate_members(&source.one_of);
    }
    if !source.any_of.is_empty() {
        warn!("anyOf used in schema; only basic support is provided");
        node.any_of = translate_members(&source.any_of);
    }
    if let Some(discriminator) = &source.discriminator {
        warn!("discriminator used in schema; only basic support is provided");
        node.discriminator = Some(discriminator.clone());
    }

    node.schema_type = source.primary_type().map(str::to_string);
    node.format = source.format.clone().filter(|f| !f.is_empty());
    node.description = source.description.clone().filter(|d| !d.is_empty());
    node.enumeration = source.enumeration.clone();
    node.default = source.default.clone();
    if let Some(example) = &source.example {
        node.examples = vec![example.clone()];
    }

    if source.is_type("object") {
        if let Some(properties) = &source.properties {
            node.properties = Some(
                properties
                    .iter()
                    .map(|(name, sub)| (name.clone(), translate_schema(Some(sub)).unwrap_or_default()))
                    .collect(),
            );
            node.required = source.required.clone();
        }
    }

    if source.is_type("array") {
        if let Some(items) = &source.items {
            node.items = translate_schema(Some(items)).map(Box::new);
        }
    }

    Some(node)
}

fn translate_members(members: &[SchemaObject]) -> Vec<ValidationSchema> {
    members
        .iter()
        .map(|member| translate_schema(Some(member)).unwrap_or_default())
        .collect()
}

/// Combine an operation's parameters and request body into its input schema.
///
/// The result is always `type: object`; `required` is omitted when empty.
pub fn build_input_schema(parameters: &[Parameter], request_body: Option<&RequestBody>) -> ValidationSchema {
    let mut schema = ValidationSchema::empty_object();
    let mut properties = BTreeMap::new();
    let mut required = Vec::new();

    for param in parameters {
        if !param.location.is_supported() {
            warn!(
                "Parameter '{}' uses unsupported location '{}'; skipping",
                param.name,
                param.location.as_str()
            );
            continue;
        }

        if let Some(source) = &param.schema {
            if source.is_type("string") && source.format.as_deref() == Some("binary") {
                warn!(
                    "Parameter '{}' uses 'string' with 'binary' format; non-JSON body types are not fully supported",
                    param.name
                );
            }
        }

        let Some(mut prop) = translate_schema(param.schema.as_ref()) else {
            continue;
        };
        if let Some(description) = param.description.as_deref().filter(|d| !d.is_empty()) {
            prop.description = Some(description.to_string());
        }

        let escaped = escape_parameter_name(&param.name);
        if param.required {
            required.push(escaped.clone());
        }
        properties.insert(escaped, prop);
    }

    if let Some(body) = request_body {
        for media_type in body.content.keys() {
            let base = base_media_type(media_type);
            if !base.eq_ignore_ascii_case(JSON_MEDIA_TYPE) && !base.eq_ignore_ascii_case(JSON_API_MEDIA_TYPE) {
                warn!(
                    "Request body uses media type '{}'; only '{}' and '{}' are fully supported",
                    media_type, JSON_MEDIA_TYPE, JSON_API_MEDIA_TYPE
                );
            }
        }

        let body_schema = body
            .json_content()
            .and_then(|(_, media_type)| translate_schema(media_type.schema.as_ref()));
        if let Some(mut prop) = body_schema {
            prop.description = Some(REQUEST_BODY_DESCRIPTION.to_string());
            properties.insert(REQUEST_BODY_KEY.to_string(), prop);
            if body.required {
                required.push(REQUEST_BODY_KEY.to_string());
            }
        }
    }

    schema.properties = Some(properties);
    schema.required = required;
    schema
}
