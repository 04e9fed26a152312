//! Defines the [`Document`] type, the record produced for each source file in
//! a collection.

use serde_yaml::{Mapping, Value};

/// The key under which a document's final site-relative output path is
/// exposed to templates.
pub const PATH_KEY: &str = "_path";

/// The key under which a document's owning collection is exposed.
pub const COLLECTION_KEY: &str = "_collection";

/// The key under which a markdown document's rendered body is exposed.
pub const CONTENT_KEY: &str = "_content";

/// Keys the collection pipeline owns. Author fields with these names are
/// replaced by the computed values.
pub const RESERVED_KEYS: [&str; 3] = [PATH_KEY, COLLECTION_KEY, CONTENT_KEY];

/// A document record: the author's front matter fields plus the fields the
/// pipeline computes. Records are mutated by a collection's `transform` and
/// `permalinks` steps and are read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The final site-relative output path, always ending in `.html`.
    pub path: String,

    /// The name of the owning collection.
    pub collection: String,

    /// The rendered HTML body, present for markdown sources.
    pub content: Option<String>,

    /// The author-defined front matter fields.
    pub fields: Mapping,
}

impl Document {
    /// Builds a record from front matter. Any reserved keys in `fields` are
    /// moved into their typed counterparts or dropped.
    pub fn new(collection: &str, path: &str, mut fields: Mapping) -> Document {
        let content = match fields.remove(&key(CONTENT_KEY)) {
            Some(Value::String(content)) => Some(content),
            _ => None,
        };
        fields.remove(&key(PATH_KEY));
        fields.remove(&key(COLLECTION_KEY));
        Document {
            path: path.to_owned(),
            collection: collection.to_owned(),
            content,
            fields,
        }
    }

    /// Looks up an author field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(&key(field))
    }

    /// Sets an author field, returning the previous value.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key(field), value.into())
    }

    /// Returns the author fields with the computed fields merged in, as the
    /// templating layer sees them.
    pub fn to_mapping(&self) -> Mapping {
        let mut m = self.fields.clone();
        m.insert(key(PATH_KEY), Value::String(self.path.clone()));
        m.insert(key(COLLECTION_KEY), Value::String(self.collection.clone()));
        if let Some(content) = &self.content {
            m.insert(key(CONTENT_KEY), Value::String(content.clone()));
        }
        m
    }
}

fn key(k: &str) -> Value {
    Value::String(k.to_owned())
}
