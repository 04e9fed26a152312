//! The template-rendering primitive. Templates use Go template syntax (see
//! [`gtmpl`]); locals are exposed as fields of the dot, e.g.
//! `{{ ._path }}` or `{{ range ._collections.posts }}`.

use crate::error::{Error, Result};
use crate::value::Locals;
use gtmpl::{Context, Template, Value};
use std::path::Path;

/// Parses `source` into a template that can be executed many times.
pub fn parse(source: &str) -> std::result::Result<Template, String> {
    let mut template = Template::default();
    template.parse(source).map_err(|e| e.to_string())?;
    Ok(template)
}

/// Executes a parsed template with `locals` as its data.
pub fn execute(template: &Template, locals: Locals) -> std::result::Result<String, String> {
    let context = Context::from(Value::Object(locals)).map_err(|e| e.to_string())?;
    let mut out: Vec<u8> = Vec::new();
    template
        .execute(&mut out, &context)
        .map_err(|e| e.to_string())?;
    String::from_utf8(out).map_err(|e| e.to_string())
}

/// Parses and executes `template` with `locals` as its data. Errors are
/// returned as messages; callers attach the template's identity.
pub fn render(template: &str, locals: Locals) -> std::result::Result<String, String> {
    execute(&parse(template)?, locals)
}

/// Loads a template's source from disk.
pub fn load(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::io(path, e))
}
