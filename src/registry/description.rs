//! Agent-facing tool descriptions and synthesized example arguments

use super::schema::ValidationSchema;
use super::types::{HttpMethod, Operation};
use serde_json::{json, Map, Value};

/// Fixed UUID used for `format: uuid` examples
pub const EXAMPLE_UUID: &str = "123e4567-e89b-12d3-a456-426614174000";

/// Synthesize one plausible value for a property schema.
///
/// Precedence: first enum value, then the declared example, then a value
/// derived from the type. Unknown or absent types yield `None`.
pub fn example_value(schema: &ValidationSchema) -> Option<Value> {
    if let Some(first) = schema.enumeration.first() {
        return Some(first.clone());
    }
    if let Some(example) = schema.examples.first() {
        return Some(example.clone());
    }

    let value = match schema.schema_type.as_deref()? {
        "string" => {
            let text = match schema.format.as_deref() {
                Some("email") => "user@example.com",
                Some("uri") | Some("url") => "https://example.com",
                Some("date") => "2024-01-01",
                Some("date-time") => "2024-01-01T00:00:00Z",
                Some("uuid") => EXAMPLE_UUID,
                _ => "example_string",
            };
            Value::String(text.to_string())
        }
        "number" => json!(123.45),
        "integer" => json!(123),
        "boolean" => Value::Bool(true),
        "array" => match &schema.items {
            Some(items) => Value::Array(vec![example_value(items).unwrap_or(Value::Null)]),
            None => json!(["item1", "item2"]),
        },
        "object" => json!({"key": "value"}),
        _ => return None,
    };
    Some(value)
}

/// Example arguments: every required property, then optional properties
/// while fewer than `max_optional` were added and the total stays below
/// `max_total`.
pub fn example_arguments(schema: &ValidationSchema, max_optional: usize, max_total: usize) -> Map<String, Value> {
    let mut args = Map::new();
    for name in &schema.required {
        if let Some(prop) = schema.property(name) {
            args.insert(name.clone(), example_value(prop).unwrap_or(Value::Null));
        }
    }

    let mut added = 0;
    for name in schema.optional_names() {
        if added >= max_optional || args.len() >= max_total {
            break;
        }
        if let Some(prop) = schema.property(name) {
            args.insert(name.clone(), example_value(prop).unwrap_or(Value::Null));
            added += 1;
        }
    }
    args
}

/// Render a JSON value the way it reads in prose: strings bare, null empty,
/// everything else as JSON text.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `  - name (type): description [values: a, b]`
fn describe_property(name: &str, prop: &ValidationSchema) -> String {
    let mut line = format!("\n  - {}", name);
    if let Some(schema_type) = &prop.schema_type {
        line.push_str(&format!(" ({})", schema_type));
    }
    if let Some(description) = prop.description.as_deref().filter(|d| !d.is_empty()) {
        line.push_str(": ");
        line.push_str(description);
    }
    if !prop.enumeration.is_empty() {
        let values: Vec<String> = prop.enumeration.iter().map(display_value).collect();
        line.push_str(&format!(" [values: {}]", values.join(", ")));
    }
    line
}

/// Build the tool description for an operation and its input schema
pub fn generate_description(op: &Operation, schema: &ValidationSchema) -> String {
    let mut desc = String::new();

    if let Some(text) = op.description.as_deref().filter(|d| !d.is_empty()) {
        desc.push_str(text);
    } else if let Some(text) = op.summary.as_deref().filter(|s| !s.is_empty()) {
        desc.push_str(text);
    }

    if !op.security.is_empty() {
        let schemes: Vec<&str> = op
            .security
            .iter()
            .flat_map(|alternative| alternative.keys().map(String::as_str))
            .collect();
        desc.push_str("\n\nAUTHENTICATION: ");
        desc.push_str(&format!("Required ({}). ", schemes.join(" OR ")));
        desc.push_str("Set environment variables: API_KEY, BEARER_TOKEN, or BASIC_AUTH");
    }

    let properties = schema.property_map();
    if !properties.is_empty() {
        desc.push_str("\n\nPARAMETERS:");

        let required: Vec<&String> = schema.required.iter().filter(|name| properties.contains_key(*name)).collect();
        if !required.is_empty() {
            desc.push_str("\n• Required:");
            for name in required {
                desc.push_str(&describe_property(name, &properties[name]));
            }
        }

        let optional: Vec<&String> = schema.optional_names().collect();
        if !optional.is_empty() {
            desc.push_str("\n• Optional:");
            for name in optional {
                desc.push_str(&describe_property(name, &properties[name]));
            }
        }
    }

    let example = Value::Object(example_arguments(schema, 2, 3));
    desc.push_str(&format!("\n\nEXAMPLE: call {} {}", op.operation_id, example));

    if matches!(op.method, HttpMethod::Get | HttpMethod::Post | HttpMethod::Put) {
        desc.push_str("\n\nRESPONSE: Returns HTTP status, headers, and response body. ");
        desc.push_str("Success responses (2xx) return the data. ");
        desc.push_str("Error responses include troubleshooting guidance.");
    }

    if op.method.is_mutating() {
        desc.push_str("\n\n⚠️  SAFETY: This operation modifies data. ");
        desc.push_str("You will be asked to confirm before execution.");
    }

    desc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::schema::build_input_schema;
    use crate::registry::types::{Parameter, ParameterLocation, SchemaObject, SecurityRequirement};

    fn string_with_format(format: &str) -> ValidationSchema {
        ValidationSchema {
            schema_type: Some("string".into()),
            format: Some(format.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_example_value_precedence() {
        let with_enum = ValidationSchema {
            schema_type: Some("string".into()),
            enumeration: vec![json!("available"), json!("sold")],
            examples: vec![json!("pending")],
            ..Default::default()
        };
        assert_eq!(example_value(&with_enum), Some(json!("available")));

        let with_example = ValidationSchema {
            schema_type: Some("integer".into()),
            examples: vec![json!(42)],
            ..Default::default()
        };
        assert_eq!(example_value(&with_example), Some(json!(42)));
    }

    #[test]
    fn test_example_value_by_type_and_format() {
        assert_eq!(example_value(&string_with_format("email")), Some(json!("user@example.com")));
        assert_eq!(example_value(&string_with_format("url")), Some(json!("https://example.com")));
        assert_eq!(example_value(&string_with_format("date-time")), Some(json!("2024-01-01T00:00:00Z")));
        assert_eq!(example_value(&string_with_format("uuid")), Some(json!(EXAMPLE_UUID)));
        assert_eq!(example_value(&string_with_format("byte")), Some(json!("example_string")));

        let typed = |t: &str| ValidationSchema {
            schema_type: Some(t.into()),
            ..Default::default()
        };
        assert_eq!(example_value(&typed("number")), Some(json!(123.45)));
        assert_eq!(example_value(&typed("integer")), Some(json!(123)));
        assert_eq!(example_value(&typed("boolean")), Some(json!(true)));
        assert_eq!(example_value(&typed("array")), Some(json!(["item1", "item2"])));
        assert_eq!(example_value(&typed("object")), Some(json!({"key": "value"})));
        assert_eq!(example_value(&typed("null")), None);
        assert_eq!(example_value(&ValidationSchema::default()), None);

        let array_of_ints = ValidationSchema {
            schema_type: Some("array".into()),
            items: Some(Box::new(typed("integer"))),
            ..Default::default()
        };
        assert_eq!(example_value(&array_of_ints), Some(json!([123])));
    }

    #[test]
    fn test_example_arguments_cap() {
        let params: Vec<Parameter> = ["a", "b", "c", "d"]
            .iter()
            .map(|n| Parameter::new(*n, ParameterLocation::Query, SchemaObject::of_type("string")))
            .collect();
        let schema = build_input_schema(&params, None);
        assert_eq!(example_arguments(&schema, 2, 3).len(), 2);

        let mut required = params.clone();
        for p in required.iter_mut().take(3) {
            p.required = true;
        }
        let schema = build_input_schema(&required, None);
        let args = example_arguments(&schema, 2, 3);
        assert_eq!(args.len(), 3);
        assert!(!args.contains_key("d"));
    }

    #[test]
    fn test_description_sections() {
        let mut security = SecurityRequirement::new();
        security.insert("ApiKeyAuth".to_string(), vec![]);
        let op = Operation::new("updatePet", HttpMethod::Put, "/pets/{petId}")
            .with_summary("Update a pet")
            .with_security(security)
            .with_parameter(
                Parameter::new("petId", ParameterLocation::Path, SchemaObject::of_type("integer"))
                    .required()
                    .with_description("Pet id"),
            )
            .with_parameter(Parameter::new(
                "status",
                ParameterLocation::Query,
                SchemaObject::of_type("string").with_enum(vec![json!("available"), json!("sold")]),
            ));
        let schema = build_input_schema(&op.parameters, None);

        let desc = generate_description(&op, &schema);
        assert!(desc.starts_with("Update a pet\n\nAUTHENTICATION: Required (ApiKeyAuth)."));
        assert!(desc.contains("\n• Required:\n  - petId (integer): Pet id"));
        assert!(desc.contains("\n• Optional:\n  - status (string) [values: available, sold]"));
        assert!(desc.contains(r#"EXAMPLE: call updatePet {"petId":123,"status":"available"}"#));
        assert!(desc.contains("RESPONSE: Returns HTTP status"));
        assert!(desc.ends_with("You will be asked to confirm before execution."));
    }

    #[test]
    fn test_description_for_read_only_operation() {
        let op = Operation::new("ping", HttpMethod::Head, "/ping").with_description("Ping");
        let desc = generate_description(&op, &build_input_schema(&[], None));

        assert_eq!(desc, "Ping\n\nEXAMPLE: call ping {}");
    }
}
