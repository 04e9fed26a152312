//! The markdown-to-HTML primitive. Rendering is pure and infallible.

use pulldown_cmark::{html, Options, Parser};
use std::path::Path;

/// File extensions treated as markdown sources.
pub const MARKDOWN_EXTENSIONS: [&str; 3] = ["md", "markdown", "mdown"];

/// Returns true if `path` has one of the [`MARKDOWN_EXTENSIONS`].
pub fn is_markdown(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => MARKDOWN_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Converts `markdown` to an HTML string.
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}
