//! Shared utilities for the OpenAPI bridge
//!
//! Name handling used by both the registrar (build time) and the dispatcher
//! (call time).

pub mod name_escaper;
pub mod name_sanitizer;

pub use name_escaper::{
    build_parameter_name_mapping,
    escape_parameter_name,
    get_parameter_value,
    unescape_parameter_name,
    ParameterNameMapping,
};
pub use name_sanitizer::{to_camel_case, to_snake_case, NameFormat};
