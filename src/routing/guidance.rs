//! Troubleshooting text for failed calls
//!
//! Produced only for non-2xx upstream responses and for argument validation
//! failures. All example arguments come from the same example-value rule used
//! for tool descriptions.

use crate::mcp::validation::qualified_name;
use crate::mcp::ArgumentViolation;
use crate::registry::description::{display_value, example_arguments, example_value};
use crate::registry::schema::ValidationSchema;
use crate::registry::types::{Operation, ParameterLocation};
use crate::utils::get_parameter_value;
use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::fmt::Write;

/// Suggestion used for statuses without a dedicated guide
pub const GENERIC_SUGGESTION: &str = "Check the input parameters, authentication, and consult the tool schema. See the OpenAPI documentation for more details.";

/// Inputs shared by every guide
pub struct GuidanceContext<'a> {
    pub operation: &'a Operation,
    pub schema: &'a ValidationSchema,
    pub arguments: &'a Map<String, Value>,
    pub response_body: &'a str,
    pub status: StatusCode,
}

impl GuidanceContext<'_> {
    /// Guidance text keyed by status class
    pub fn suggestion(&self) -> String {
        match self.status.as_u16() {
            400 => self.bad_request(),
            401 | 403 => self.auth_failure(),
            404 => self.not_found(),
            code if code >= 500 => self.server_error(),
            _ => GENERIC_SUGGESTION.to_string(),
        }
    }

    fn operation_line(&self, out: &mut String) {
        let _ = write!(out, "OPERATION: {}", self.operation.operation_id);
        if let Some(summary) = self.operation.summary.as_deref().filter(|s| !s.is_empty()) {
            let _ = write!(out, " - {}", summary);
        }
        out.push('\n');
    }

    fn current_arguments(&self, out: &mut String, heading: &str) {
        if self.arguments.is_empty() {
            return;
        }
        let pretty = serde_json::to_string_pretty(self.arguments).unwrap_or_default();
        let _ = write!(out, "{}:\n{}\n\n", heading, pretty);
    }

    fn server_details(&self, out: &mut String) {
        if !self.response_body.is_empty() {
            let _ = write!(out, "SERVER ERROR DETAILS:\n{}\n\n", self.response_body);
        }
    }

    fn example_call(&self, max_optional: usize) -> String {
        let example = Value::Object(example_arguments(self.schema, max_optional, usize::MAX));
        let pretty = serde_json::to_string_pretty(&example).unwrap_or_default();
        format!("call {} {}", self.operation.operation_id, pretty)
    }

    fn property_line(&self, name: &str, prop: &ValidationSchema) -> String {
        let mut line = format!("  - {}", name);
        if let Some(schema_type) = &prop.schema_type {
            let _ = write!(line, " ({})", schema_type);
        }
        if self.schema.is_required(name) {
            line.push_str(" [REQUIRED]");
        }
        if let Some(description) = prop.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = write!(line, ": {}", description);
        }
        if !prop.enumeration.is_empty() {
            let values: Vec<String> = prop.enumeration.iter().map(display_value).collect();
            let _ = write!(line, " | Valid values: {}", values.join(", "));
        }
        line
    }

    fn required_lines(&self, out: &mut String, suffix: &str) {
        for name in &self.schema.required {
            if let Some(prop) = self.schema.property(name) {
                let _ = write!(out, "  - {}", name);
                if let Some(schema_type) = &prop.schema_type {
                    let _ = write!(out, " ({})", schema_type);
                }
                if let Some(description) = prop.description.as_deref().filter(|d| !d.is_empty()) {
                    let _ = write!(out, ": {}", description);
                }
                out.push_str(suffix);
                out.push('\n');
            }
        }
    }

    fn bad_request(&self) -> String {
        let mut out = String::from("BAD REQUEST (400): The API call failed due to incorrect or invalid parameters.\n\n");
        self.operation_line(&mut out);
        if let Some(description) = self.operation.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(out, "DESCRIPTION: {}", description);
        }
        out.push('\n');

        let properties = self.schema.property_map();
        if !properties.is_empty() {
            out.push_str("PARAMETER REQUIREMENTS:\n");
            if !self.schema.required.is_empty() {
                out.push_str("• Required parameters:\n");
                self.required_lines(&mut out, "");
                out.push('\n');
            }
            out.push_str("• All available parameters:\n");
            for (name, prop) in properties {
                out.push_str(&self.property_line(name, prop));
                out.push('\n');
            }
            out.push('\n');
        }

        self.current_arguments(&mut out, "YOUR CURRENT ARGUMENTS");
        self.server_details(&mut out);

        out.push_str("EXAMPLE CORRECT USAGE:\n");
        let _ = write!(out, "{}\n\n", self.example_call(3));

        out.push_str("TROUBLESHOOTING STEPS:\n");
        out.push_str("1. Verify all required parameters are provided\n");
        out.push_str("2. Check parameter types match the schema (string, number, boolean, etc.)\n");
        out.push_str("3. Ensure enum values are from the allowed list\n");
        out.push_str("4. Validate parameter formats (dates, emails, URLs, etc.)\n");
        out.push_str("5. Check for missing or incorrectly named parameters\n");
        out.push_str("6. Review the server error details above for specific validation failures\n");
        out
    }

    fn auth_failure(&self) -> String {
        let unauthorized = self.status == StatusCode::UNAUTHORIZED;
        let mut out = if unauthorized {
            String::from("AUTHENTICATION REQUIRED (401): Your request lacks valid authentication credentials.\n\n")
        } else {
            String::from("AUTHORIZATION FAILED (403): You don't have permission to access this resource.\n\n")
        };
        self.operation_line(&mut out);
        out.push('\n');

        out.push_str("AUTHENTICATION METHODS:\n");
        if self.operation.security.is_empty() {
            out.push_str("• Check the OpenAPI spec for security requirements\n");
            out.push_str("• This operation may require global authentication\n");
        } else {
            out.push_str("This operation requires one of the following authentication methods:\n");
            for (i, alternative) in self.operation.security.iter().enumerate() {
                let names: Vec<&str> = alternative.keys().map(String::as_str).collect();
                let _ = writeln!(out, "{}. {}", i + 1, names.join(" + "));
            }
        }
        out.push('\n');

        out.push_str("AUTHENTICATION SETUP:\n");
        out.push_str("Set one of these environment variables based on your API:\n\n");
        out.push_str("• API Key Authentication:\n");
        out.push_str("  export API_KEY=\"your-api-key-here\"\n");
        out.push_str("  # Common header names: X-API-Key, Authorization, Api-Key\n\n");
        out.push_str("• Bearer Token Authentication:\n");
        out.push_str("  export BEARER_TOKEN=\"your-bearer-token-here\"\n");
        out.push_str("  # Sets Authorization: Bearer <token>\n\n");
        out.push_str("• Basic Authentication:\n");
        out.push_str("  export BASIC_AUTH=\"username:password\"\n");
        out.push_str("  # Sets Authorization: Basic <base64-encoded-credentials>\n\n");

        self.server_details(&mut out);

        out.push_str("TROUBLESHOOTING STEPS:\n");
        if unauthorized {
            out.push_str("1. Verify you have set the correct authentication environment variable\n");
            out.push_str("2. Check that your API key/token is valid and not expired\n");
            out.push_str("3. Ensure the authentication method matches what the API expects\n");
            out.push_str("4. Test your credentials with a simple API call (like GET /health)\n");
            out.push_str("5. Check the API documentation for required authentication format\n");
            out.push_str("6. Verify the API endpoint URL is correct\n");
        } else {
            out.push_str("1. Verify your account has permission to access this resource\n");
            out.push_str("2. Check if your API key has the required scopes/permissions\n");
            out.push_str("3. Ensure you're accessing the correct resource ID/path\n");
            out.push_str("4. Contact the API provider to verify your account permissions\n");
            out.push_str("5. Check if there are rate limits or usage restrictions\n");
            out.push_str("6. Verify your subscription/plan includes access to this endpoint\n");
        }
        out
    }

    fn not_found(&self) -> String {
        let mut out = String::from("RESOURCE NOT FOUND (404): The requested resource could not be found.\n\n");
        self.operation_line(&mut out);
        let _ = write!(out, "PATH: {} {}\n\n", self.operation.method, self.operation.path);

        self.current_arguments(&mut out, "YOUR CURRENT ARGUMENTS");

        let path_params: Vec<&str> = self
            .operation
            .parameters_in(&ParameterLocation::Path)
            .map(|p| p.name.as_str())
            .collect();
        if !path_params.is_empty() {
            out.push_str("PATH PARAMETERS IN THIS ENDPOINT:\n");
            for name in &path_params {
                let value = get_parameter_value(self.arguments, name)
                    .map(display_value)
                    .unwrap_or_else(|| "NOT_PROVIDED".to_string());
                let _ = writeln!(out, "• {}: {}", name, value);
            }
            out.push('\n');
        }

        self.server_details(&mut out);

        out.push_str("TROUBLESHOOTING STEPS:\n");
        out.push_str("1. Verify all path parameters are correct and exist:\n");
        if path_params.is_empty() {
            out.push_str("   - Verify the endpoint path is correct\n");
        } else {
            for name in &path_params {
                let _ = writeln!(out, "   - Check that {} exists and is accessible", name);
            }
        }
        out.push_str("2. Ensure you're using the correct resource identifiers\n");
        out.push_str("3. Check if the resource was recently deleted or moved\n");
        out.push_str("4. Verify you have permission to access this resource\n");
        out.push_str("5. Try listing resources first to find valid identifiers\n");
        out.push_str("6. Check the API documentation for correct endpoint paths\n");
        out.push_str("7. Ensure you're using the correct API base URL\n");
        out
    }

    fn server_error(&self) -> String {
        let code = self.status.as_u16();
        let mut out = format!(
            "SERVER ERROR ({}): The server encountered an error processing your request.\n\n",
            code
        );
        self.operation_line(&mut out);
        out.push('\n');

        match code {
            500 => out.push_str(
                "ERROR TYPE: Internal Server Error\nThis indicates a problem with the server's code or configuration.\n\n",
            ),
            502 => out.push_str(
                "ERROR TYPE: Bad Gateway\nThe server received an invalid response from an upstream server.\n\n",
            ),
            503 => out.push_str("ERROR TYPE: Service Unavailable\nThe server is temporarily unable to handle the request.\n\n"),
            504 => out.push_str(
                "ERROR TYPE: Gateway Timeout\nThe server didn't receive a timely response from an upstream server.\n\n",
            ),
            _ => {
                let _ = write!(
                    out,
                    "ERROR TYPE: Server Error ({})\nAn unexpected server-side error occurred.\n\n",
                    code
                );
            }
        }

        self.server_details(&mut out);
        self.current_arguments(&mut out, "YOUR REQUEST DETAILS");

        out.push_str("IMMEDIATE ACTIONS:\n");
        match code {
            500 => {
                out.push_str("1. Retry the request after a short delay (server issue)\n");
                out.push_str("2. Check if the request data is valid and within expected limits\n");
                out.push_str("3. Report the error to the API provider with request details\n");
            }
            502 | 503 | 504 => {
                out.push_str("1. Wait and retry after a few seconds (temporary issue)\n");
                out.push_str("2. Check the API status page for known outages\n");
                out.push_str("3. Implement exponential backoff for retries\n");
            }
            _ => {
                out.push_str("1. Retry the request after a brief delay\n");
                out.push_str("2. Check if this is a known issue with the API\n");
            }
        }

        out.push_str("\nTROUBLESHOOTING STEPS:\n");
        out.push_str("1. Verify your request parameters are valid and properly formatted\n");
        out.push_str("2. Check for any size limits on request data\n");
        out.push_str("3. Ensure you're not hitting rate limits\n");
        out.push_str("4. Try with a simpler request to isolate the issue\n");
        out.push_str("5. Check the API's status page or documentation for known issues\n");
        out.push_str("6. Monitor if the error persists or is intermittent\n");
        out.push_str("7. Contact the API provider's support with error details\n");

        out.push_str("\nRETRY STRATEGY:\n");
        out.push_str("• Wait 1-2 seconds and retry once\n");
        out.push_str("• If it fails again, wait longer (exponential backoff)\n");
        out.push_str("• Maximum 3-5 retry attempts\n");
        out.push_str("• Report persistent errors to the API provider\n");

        if !self.schema.property_map().is_empty() {
            out.push_str("\nTOOL USAGE INFORMATION:\n");
            let _ = writeln!(out, "Tool Name: {}", self.operation.operation_id);
            if !self.schema.required.is_empty() {
                out.push_str("Required Parameters (mandatory for all calls):\n");
                self.required_lines(&mut out, " [MANDATORY]");
            }
            out.push_str("\nExample Usage (retry with these correct parameters):\n");
            let _ = writeln!(out, "{}", self.example_call(2));
        }
        out
    }
}

/// Error text for arguments rejected by the input schema: one line per
/// violation, then a retry suggestion covering every schema property.
pub fn validation_failure_text(tool_name: &str, violations: &[ArgumentViolation], schema: &ValidationSchema) -> String {
    let mut lines = Vec::with_capacity(violations.len());
    for violation in violations {
        let line = match violation {
            ArgumentViolation::MissingRequired { path, name } => missing_required_line(path, name, schema),
            other => other.to_string(),
        };
        if !line.is_empty() {
            lines.push(line);
        }
    }

    let example: Map<String, Value> = schema
        .property_map()
        .iter()
        .map(|(name, prop)| (name.clone(), example_value(prop).unwrap_or(Value::Null)))
        .collect();

    format!(
        "{}\n\nTry again with: call {} {}",
        lines.join("\n").trim(),
        tool_name,
        Value::Object(example)
    )
}

fn missing_required_line(path: &str, name: &str, schema: &ValidationSchema) -> String {
    let display_name = qualified_name(path, name);
    let Some(prop) = schema.node_at(path).and_then(|parent| parent.property(name)) else {
        return format!("Missing required parameter: '{}'", display_name);
    };

    let mut info = prop.description.clone().filter(|d| !d.is_empty()).unwrap_or_default();
    if let Some(schema_type) = &prop.schema_type {
        if !info.is_empty() {
            info.push_str(", ");
        }
        let _ = write!(info, "type: {}", schema_type);
    }

    if info.is_empty() {
        format!("Missing required parameter: '{}'", display_name)
    } else {
        format!(
            "Missing required parameter: '{}' ({}). Please provide this parameter.",
            display_name, info
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::schema::build_input_schema;
    use crate::registry::types::{HttpMethod, Parameter, SchemaObject};
    use serde_json::json;

    fn operation() -> Operation {
        Operation::new("getOwnerPet", HttpMethod::Get, "/owners/{ownerId}/pets/{pet[id]}")
            .with_summary("Find a pet")
            .with_parameter(
                Parameter::new("ownerId", ParameterLocation::Path, SchemaObject::of_type("integer"))
                    .required()
                    .with_description("Owner id"),
            )
            .with_parameter(Parameter::new("pet[id]", ParameterLocation::Path, SchemaObject::of_type("string")).required())
            .with_parameter(Parameter::new("verbose", ParameterLocation::Query, SchemaObject::of_type("boolean")))
    }

    fn guidance(status: u16, arguments: &Map<String, Value>) -> String {
        let op = operation();
        let schema = build_input_schema(&op.parameters, None);
        GuidanceContext {
            operation: &op,
            schema: &schema,
            arguments,
            response_body: "{\"error\":\"nope\"}",
            status: StatusCode::from_u16(status).unwrap(),
        }
        .suggestion()
    }

    #[test]
    fn test_not_found_lists_path_parameters() {
        let args = json!({"ownerId": 7}).as_object().cloned().unwrap();
        let text = guidance(404, &args);

        assert!(text.starts_with("RESOURCE NOT FOUND (404)"));
        assert!(text.contains("PATH: GET /owners/{ownerId}/pets/{pet[id]}"));
        assert!(text.contains("• ownerId: 7\n"));
        assert!(text.contains("• pet[id]: NOT_PROVIDED\n"));
        assert!(text.contains("SERVER ERROR DETAILS:\n{\"error\":\"nope\"}"));
    }

    #[test]
    fn test_not_found_resolves_escaped_argument() {
        let args = json!({"pet_id_": "abc"}).as_object().cloned().unwrap();
        assert!(guidance(404, &args).contains("• pet[id]: abc\n"));
    }

    #[test]
    fn test_status_classes() {
        let args = Map::new();
        assert!(guidance(400, &args).contains("• All available parameters:\n  - ownerId (integer) [REQUIRED]: Owner id"));
        assert!(guidance(401, &args).starts_with("AUTHENTICATION REQUIRED (401)"));
        assert!(guidance(403, &args).contains("AUTHORIZATION FAILED (403)"));
        let server = guidance(503, &args);
        assert!(server.contains("ERROR TYPE: Service Unavailable"));
        assert!(server.contains("  - ownerId (integer): Owner id [MANDATORY]"));
        assert_eq!(guidance(409, &args), GENERIC_SUGGESTION);
    }

    #[test]
    fn test_validation_failure_text() {
        let op = operation();
        let schema = build_input_schema(&op.parameters, None);
        let violations = vec![
            ArgumentViolation::MissingRequired {
                path: String::new(),
                name: "ownerId".into(),
            },
            ArgumentViolation::MissingRequired {
                path: String::new(),
                name: "unknown".into(),
            },
        ];

        let text = validation_failure_text("getOwnerPet", &violations, &schema);
        assert!(text.starts_with(
            "Missing required parameter: 'ownerId' (Owner id, type: integer). Please provide this parameter.\nMissing required parameter: 'unknown'"
        ));
        assert!(text.ends_with(
            r#"Try again with: call getOwnerPet {"ownerId":123,"pet_id_":"example_string","verbose":true}"#
        ));
    }
}
