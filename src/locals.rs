//! Resolves the locals a template sees when rendering a single document.

use crate::collection::Collections;
use crate::value::{from_mapping, Locals};
use gtmpl::Value;
use serde_yaml::Mapping;

/// Merges, in increasing precedence, `base`, the collection record for
/// `key` (if the document belongs to a collection), and the document's own
/// front matter. The merge is shallow, so author-specified front matter
/// overrides computed fields on collision.
///
/// `frontmatter` is the front matter the caller extracted for this document;
/// when it is `None` the front matter recorded during assembly is used.
pub fn resolve_locals(
    collections: &Collections,
    key: &str,
    base: Locals,
    frontmatter: Option<&Mapping>,
) -> Locals {
    let entry = collections.get(key);
    let mut locals = base;
    if let Some(entry) = entry {
        if let Value::Object(record) = Value::from(&entry.document) {
            locals.extend(record);
        }
    }
    if let Some(frontmatter) = frontmatter.or(entry.map(|e| &e.frontmatter)) {
        locals.extend(from_mapping(frontmatter));
    }
    locals
}
