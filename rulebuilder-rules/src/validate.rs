//! Structural and completeness checks for rule documents.
//!
//! Validation never fails: problems are reported as an ordered list of
//! messages and an empty list means the rule is complete. Action fields are
//! not inspected beyond counting the actions.

use serde_json::Value;

use crate::rule::Rule;

pub const INVALID_STRUCTURE: &str = "invalid conditions structure";
pub const EMPTY_GROUP: &str = "at least one condition required in the group";
pub const MISSING_FIELD: &str = "condition missing field";
pub const MISSING_VALUE: &str = "condition missing value";
pub const NO_ACTIONS: &str = "at least one action required";

/// Validates a typed rule. Produces the same messages as [`validate_document`].
pub fn validate(rule: &Rule) -> Vec<String> {
    validate_document(&rule.to_value())
}

/// Validates an untyped rule document, tolerating any shape.
pub fn validate_document(document: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    match document.get("conditions") {
        Some(conditions) => {
            check_root(conditions, &mut errors);
            check_conditions(conditions, &mut errors);
        }
        None => errors.push(INVALID_STRUCTURE.to_string()),
    }

    let action_count = document
        .get("actions")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    if action_count == 0 {
        errors.push(NO_ACTIONS.to_string());
    }

    errors
}

/// A root group whose `children` is missing or not a sequence counts as empty
/// and is reported; nested groups of that shape are skipped instead.
fn check_root(conditions: &Value, errors: &mut Vec<String>) {
    match conditions.get("type").and_then(Value::as_str) {
        None => errors.push(INVALID_STRUCTURE.to_string()),
        Some("group") => {
            let child_count = conditions
                .get("children")
                .and_then(Value::as_array)
                .map_or(0, Vec::len);
            if child_count == 0 {
                errors.push(EMPTY_GROUP.to_string());
            }
        }
        Some("condition") => {}
        Some(other) => errors.push(format!("unrecognized condition type: {}", other)),
    }
}

fn check_conditions(node: &Value, errors: &mut Vec<String>) {
    match node.get("type").and_then(Value::as_str) {
        Some("condition") => {
            if is_blank(node.get("field")) {
                errors.push(MISSING_FIELD.to_string());
            }
            if is_blank(node.get("value")) {
                errors.push(MISSING_VALUE.to_string());
            }
        }
        Some("group") => {
            if let Some(children) = node.get("children").and_then(Value::as_array) {
                for child in children {
                    check_conditions(child, errors);
                }
            }
        }
        _ => {}
    }
}

/// Absent, `null` and `""` count as blank. `"0"`, numbers and booleans do not.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}
