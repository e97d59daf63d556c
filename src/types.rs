//! Core types shared by crawlers, tasks and versions.

use std::collections::BTreeMap;

/// Heterogeneous value stored in crawler variables, tags and task options.
pub type Value = serde_json::Value;

/// Name → value mapping, ordered by name so serialization is reproducible.
pub type VarMap = BTreeMap<String, Value>;

/// Metadata recorded for a single published file.
pub type FileMetadata = serde_json::Map<String, Value>;

/// Render a value as plain text: strings verbatim, everything else as JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
