//! Operation to tool translation: document types, schema assembly,
//! descriptions and the registrar

pub mod description;
pub mod schema;
pub mod service;
pub mod types;

pub use description::{example_value, generate_description};
pub use schema::{build_input_schema, translate_schema, ValidationSchema};
pub use service::{
    has_date_time_parameters, verify_registration, RegistrarOptions, RegistrationReport, ToolRegistrar,
};
pub use types::*;
