use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::RuleError;
use crate::fields::{FieldCatalog, FieldSpec};
use crate::rule::Rule;

const RULE_DOCUMENT: &str = "rule document";
const FIELD_CATALOG: &str = "field catalog";

/// Reads a rule document from a `.json`, `.yaml` or `.yml` file.
pub fn load_rule(path: impl AsRef<Path>) -> Result<Rule, RuleError> {
    let path = path.as_ref();
    let raw = read(path)?;
    let rule: Rule = parse(&raw, path, RULE_DOCUMENT)?;
    debug!(path = %path.display(), conditions = rule.conditions.condition_count(), actions = rule.actions.len(), "loaded rule document");
    Ok(rule)
}

/// Reads an untyped rule document, for validation of documents that may not deserialize.
pub fn load_document(path: impl AsRef<Path>) -> Result<serde_json::Value, RuleError> {
    let path = path.as_ref();
    let raw = read(path)?;
    parse(&raw, path, RULE_DOCUMENT)
}

/// Reads a field catalog written either as `{fields: [...]}` or as a bare list.
pub fn load_fields(path: impl AsRef<Path>) -> Result<FieldCatalog, RuleError> {
    let path = path.as_ref();
    let raw = read(path)?;
    let fields = parse_fields(&raw, path)?;
    deduplicate(&fields)?;
    Ok(FieldCatalog::new(fields))
}

fn read(path: &Path) -> Result<String, RuleError> {
    if !path.exists() {
        return Err(RuleError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|err| RuleError::read(path, err))
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("json")
}

fn parse<T: DeserializeOwned>(raw: &str, path: &Path, what: &'static str) -> Result<T, RuleError> {
    if is_json(path) {
        serde_json::from_str(raw).map_err(|err| RuleError::malformed(path, what, err.to_string()))
    } else {
        serde_yaml::from_str(raw).map_err(|err| RuleError::malformed(path, what, err.to_string()))
    }
}

fn parse_fields(raw: &str, path: &Path) -> Result<Vec<FieldSpec>, RuleError> {
    let mut attempts = Vec::new();

    if let Ok(doc) = parse::<FieldDocument>(raw, path, FIELD_CATALOG) {
        return Ok(doc.fields);
    }

    attempts.push("fields document".to_string());

    if let Ok(list) = parse::<Vec<FieldSpec>>(raw, path, FIELD_CATALOG) {
        return Ok(list);
    }

    attempts.push("list".to_string());

    let message = format!("matched none of the {:?} layouts", attempts);
    Err(RuleError::malformed(path, FIELD_CATALOG, message))
}

fn deduplicate(fields: &[FieldSpec]) -> Result<(), RuleError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.name.as_str()) {
            return Err(RuleError::DuplicateField {
                name: field.name.clone(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct FieldDocument {
    fields: Vec<FieldSpec>,
}
