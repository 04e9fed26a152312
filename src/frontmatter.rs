//! Splits source documents into YAML front matter and a body. A document with
//! front matter is structured as follows:
//!
//! 1. Opening fence (a line containing exactly `---`)
//! 2. YAML mapping
//! 3. Closing fence (`---`)
//! 4. Body
//!
//! For example:
//!
//! ```md
//! ---
//! title: Hello, world!
//! tags: [greet]
//! ---
//! # Hello
//!
//! World
//! ```
//!
//! Only `\n`-terminated fence lines are recognized; documents with `\r\n`
//! fences are treated as having no front matter.

use crate::document::CONTENT_KEY;
use crate::markdown;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

const FENCE: &str = "---";

/// A document split into its front matter and its effective body.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// The parsed front matter. Empty if the document has none.
    pub metadata: Mapping,

    /// The text rendering should operate on.
    pub body: String,
}

impl Extracted {
    /// Renders the markdown body into the `_content` field of the metadata
    /// and substitutes `layout` as the effective body, so that rendering
    /// operates on the layout with `_content` available to it.
    pub fn apply_layout(mut self, layout: &str) -> Extracted {
        self.metadata.insert(
            Value::String(CONTENT_KEY.to_owned()),
            Value::String(markdown::to_html(&self.body)),
        );
        self.body = layout.to_owned();
        self
    }
}

/// Extracts the front matter from `source`. Documents without a leading
/// fenced block yield empty metadata and the whole source as the body.
pub fn extract(source: &str) -> Result<Extracted, Error> {
    match split(source) {
        None => Ok(Extracted {
            metadata: Mapping::new(),
            body: source.to_owned(),
        }),
        Some((yaml, body)) => Ok(Extracted {
            metadata: parse(yaml)?,
            body: body.to_owned(),
        }),
    }
}

/// Parses a front matter block into a mapping. A blank block is an empty
/// mapping.
pub fn parse(yaml: &str) -> Result<Mapping, Error> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str(yaml)? {
        Value::Mapping(m) => Ok(m),
        Value::Null => Ok(Mapping::new()),
        Value::Bool(_) => Err(Error::NotAMapping("a boolean")),
        Value::Number(_) => Err(Error::NotAMapping("a number")),
        Value::String(_) => Err(Error::NotAMapping("a string")),
        Value::Sequence(_) => Err(Error::NotAMapping("a sequence")),
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_end_matches(|c| c == ' ' || c == '\t') == FENCE
}

/// Returns the (yaml, body) slices of `source`, or `None` if it doesn't open
/// with a fence or the fence is never closed.
fn split(source: &str) -> Option<(&str, &str)> {
    let (first, _) = source.split_once('\n')?;
    if !is_fence(first) {
        return None;
    }

    let yaml_start = first.len() + 1;
    let mut line_start = yaml_start;
    while line_start < source.len() {
        let (line, next) = match source[line_start..].find('\n') {
            Some(i) => (&source[line_start..line_start + i], line_start + i + 1),
            None => (&source[line_start..], source.len()),
        };
        if is_fence(line) {
            return Some((&source[yaml_start..line_start], &source[next..]));
        }
        line_start = next;
    }
    None
}

/// Represents an error parsing front matter.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the front matter isn't valid YAML.
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Returned when the front matter is valid YAML but not a mapping.
    #[error("front matter must be a mapping, found {0}")]
    NotAMapping(&'static str),
}
