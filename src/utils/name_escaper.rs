//! Reversible escaping of parameter names that are not valid schema keys
//!
//! Deep-object style names such as `filter[created_at]` become
//! `filter_created_at_`. The trailing underscore marks the name as escaped, so
//! an escaped name never equals a plain declared name without brackets.

use crate::registry::types::Parameter;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Escaped name -> declared name, for one operation
pub type ParameterNameMapping = HashMap<String, String>;

fn needs_escaping(name: &str) -> bool {
    name.contains('[') || name.contains(']')
}

/// Escape a declared parameter name for use as a schema property key.
///
/// Names without brackets are returned unchanged.
pub fn escape_parameter_name(name: &str) -> String {
    if !needs_escaping(name) {
        return name.to_string();
    }

    let mut escaped = name.replace(['[', ']'], "_");
    if !escaped.ends_with('_') {
        escaped.push('_');
    }
    escaped
}

/// Resolve an escaped name back to its declared name.
///
/// Unknown names are treated as already canonical.
pub fn unescape_parameter_name(escaped: &str, mapping: &ParameterNameMapping) -> String {
    mapping
        .get(escaped)
        .cloned()
        .unwrap_or_else(|| escaped.to_string())
}

/// Build the escaped -> declared table for an operation's parameters.
///
/// Only names that actually change are recorded. When two declared names
/// escape to the same key, the later parameter wins.
pub fn build_parameter_name_mapping(parameters: &[Parameter]) -> ParameterNameMapping {
    parameters
        .iter()
        .filter_map(|p| {
            let escaped = escape_parameter_name(&p.name);
            (escaped != p.name).then(|| (escaped, p.name.clone()))
        })
        .collect()
}

/// Look up an argument by the escaped form of `declared_name`, falling back to
/// the declared name itself.
pub fn get_parameter_value<'a>(args: &'a Map<String, Value>, declared_name: &str) -> Option<&'a Value> {
    args.get(&escape_parameter_name(declared_name))
        .or_else(|| args.get(declared_name))
}
