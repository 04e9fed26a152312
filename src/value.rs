//! Conversions from front matter and records into template values.

use crate::document::Document;
use gtmpl::Value;
use serde_yaml::{Mapping, Value as Yaml};
use std::collections::HashMap;

/// The data context handed to a template render.
pub type Locals = HashMap<String, Value>;

impl From<&Document> for Value {
    /// Converts a [`Document`] into an object holding its author fields and
    /// its `_path`, `_collection`, and (if present) `_content` fields.
    fn from(doc: &Document) -> Value {
        Value::Object(from_mapping(&doc.to_mapping()))
    }
}

/// Converts a YAML value into a template value.
pub fn from_yaml(yaml: &Yaml) -> Value {
    match yaml {
        Yaml::Null => Value::Nil,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                Value::from(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(seq) => Value::Array(seq.iter().map(from_yaml).collect()),
        Yaml::Mapping(m) => Value::Object(from_mapping(m)),
    }
}

/// Converts a YAML mapping into template locals. Scalar keys are
/// stringified; entries with sequence or mapping keys are skipped.
pub fn from_mapping(m: &Mapping) -> Locals {
    m.iter()
        .filter_map(|(k, v)| Some((key_string(k)?, from_yaml(v))))
        .collect()
}

fn key_string(key: &Yaml) -> Option<String> {
    match key {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Null => Some(String::from("null")),
        Yaml::Sequence(_) | Yaml::Mapping(_) => None,
    }
}
