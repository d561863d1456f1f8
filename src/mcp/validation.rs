//! Argument validation against a tool's input schema
//!
//! Wraps the JSON Schema validator and reduces its native error shapes to
//! [`ArgumentViolation`], which is all the guidance text depends on.

use crate::error::{BridgeError, Result};
use crate::registry::schema::ValidationSchema;
use jsonschema::error::ValidationErrorKind;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One reason an argument object was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentViolation {
    /// A required property is absent from the object at `path`
    MissingRequired { path: String, name: String },
    /// A value has the wrong JSON type
    TypeMismatch { path: String, message: String },
    /// A value is outside its enum
    EnumViolation { path: String, allowed: Vec<Value>, message: String },
    /// Anything else the validator reports
    Other { message: String },
}

impl fmt::Display for ArgumentViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentViolation::MissingRequired { path, name } => {
                write!(f, "Missing required parameter: '{}'", qualified_name(path, name))
            }
            ArgumentViolation::TypeMismatch { path, message } | ArgumentViolation::EnumViolation { path, message, .. } => {
                if path.is_empty() {
                    f.write_str(message)
                } else {
                    write!(f, "{}: {}", path, message)
                }
            }
            ArgumentViolation::Other { message } => f.write_str(message),
        }
    }
}

/// Dotted name of `name` inside the object at JSON pointer `path`.
///
/// Array indices are dropped, so `/requestBody/tags/0` with `id` reads as
/// `requestBody.tags.id`.
pub fn qualified_name(path: &str, name: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && segment.parse::<usize>().is_err())
        .chain(std::iter::once(name))
        .collect::<Vec<_>>()
        .join(".")
}

/// Compiled input schema, shared by every call of one tool
#[derive(Clone)]
pub struct ArgumentValidator {
    compiled: Arc<JSONSchema>,
}

impl fmt::Debug for ArgumentValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentValidator").finish_non_exhaustive()
    }
}

impl ArgumentValidator {
    /// Compile the schema once at registration time
    pub fn new(schema: &ValidationSchema) -> Result<Self> {
        let document = schema.to_value();
        let compiled = JSONSchema::compile(&document)
            .map_err(|e| BridgeError::validation(format!("Invalid input schema: {}", e)))?;
        Ok(Self {
            compiled: Arc::new(compiled),
        })
    }

    /// Validate an argument object; an empty list means valid
    pub fn validate(&self, arguments: &Value) -> Vec<ArgumentViolation> {
        match self.compiled.validate(arguments) {
            Ok(()) => Vec::new(),
            Err(errors) => {
                let violations: Vec<ArgumentViolation> = errors
                    .map(|error| {
                        let path = error.instance_path.to_string();
                        let message = error.to_string();
                        match error.kind {
                            ValidationErrorKind::Required { property } => ArgumentViolation::MissingRequired {
                                path,
                                name: property.as_str().map(str::to_string).unwrap_or_else(|| property.to_string()),
                            },
                            ValidationErrorKind::Type { .. } => ArgumentViolation::TypeMismatch { path, message },
                            ValidationErrorKind::Enum { options } => ArgumentViolation::EnumViolation {
                                path,
                                allowed: options.as_array().cloned().unwrap_or_default(),
                                message,
                            },
                            _ => ArgumentViolation::Other { message },
                        }
                    })
                    .collect();
                debug!("Argument validation failed with {} violation(s)", violations.len());
                violations
            }
        }
    }
}
