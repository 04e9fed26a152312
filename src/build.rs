//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building a site from its collections: assembling the documents
//! ([`crate::collection`]), paginating the collections that ask for it
//! ([`crate::paginate`]), rendering every document and page, and writing the
//! results to the output directory.
//!
//! Everything is rendered before anything is written, so a failing document
//! or page leaves no partial output behind.

use crate::collection::{assemble, Collections, Entry};
use crate::config::{Config, ConfigError};
use crate::error::{Error, Result};
use crate::locals::resolve_locals;
use crate::markdown;
use crate::paginate::{add_pages_to, paginate_all, render_pages};
use crate::template;
use crate::value::Locals;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// What a build produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// The number of documents written.
    pub documents: usize,

    /// The number of pagination pages written.
    pub pages: usize,
}

/// Builds the site described by `config` into `output_directory`. The
/// directory is removed and recreated, so nothing from a previous build
/// survives. An output directory that contains the root is refused.
pub fn build_site(config: &Config, output_directory: &Path) -> Result<Summary> {
    check_output(&config.root, output_directory)?;
    let collections = assemble(config)?;
    let pages = paginate_all(config, &collections);

    let mut data = Locals::new();
    collections.add_data_to(&mut data);
    add_pages_to(&pages, &mut data);

    let mut outputs: Vec<(String, String)> = Vec::new();
    for name in collections.names() {
        let has_layout = config
            .collections
            .get(name)
            .map_or(false, |c| c.markdown_layout.is_some());
        for entry in collections.entries(name) {
            let output = render_document(&collections, entry, has_layout, &data)?;
            outputs.push((entry.document.path.clone(), output));
        }
    }
    let documents = outputs.len();

    for (name, collection_pages) in &pages {
        let settings = match config.collections.get(name).and_then(|c| c.paginate.as_ref()) {
            Some(settings) => settings,
            None => continue,
        };
        let source = template::load(&config.root.join(&settings.template))?;
        for page in render_pages(name, collection_pages, &source, &data)? {
            outputs.push((page.path, page.output));
        }
    }
    let pages = outputs.len() - documents;

    rmdir(output_directory)?;
    write_outputs(output_directory, &outputs)?;

    info!(
        "Wrote {} documents and {} pages to `{}`",
        documents,
        pages,
        output_directory.display()
    );
    Ok(Summary { documents, pages })
}

/// Renders one document. Markdown documents without a layout are written as
/// their rendered HTML; everything else is rendered as a template with the
/// document's resolved locals.
fn render_document(
    collections: &Collections,
    entry: &Entry,
    has_layout: bool,
    data: &Locals,
) -> Result<String> {
    if !has_layout && markdown::is_markdown(&entry.source) {
        return Ok(entry.document.content.clone().unwrap_or_default());
    }
    let locals = resolve_locals(collections, &entry.relative_path, data.clone(), None);
    template::render(&entry.body, locals).map_err(|message| Error::Template {
        name: entry.relative_path.clone(),
        message,
    })
}

fn write_outputs(output_directory: &Path, outputs: &[(String, String)]) -> Result<()> {
    let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
    for (path, contents) in outputs {
        let file_path = output_directory.join(path.trim_start_matches('/'));
        if let Some(dir) = file_path.parent() {
            if seen_dirs.insert(dir.to_owned()) {
                std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
            }
        }
        std::fs::write(&file_path, contents).map_err(|e| Error::io(&file_path, e))?;
    }
    Ok(())
}

// The output directory is deleted before writing, so it must not be the root
// or any of its ancestors.
fn check_output(root: &Path, output_directory: &Path) -> Result<()> {
    let output = match output_directory.canonicalize() {
        Ok(output) => output,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io(output_directory, e)),
    };
    let root = root.canonicalize().map_err(|e| Error::io(root, e))?;
    if root.starts_with(&output) {
        return Err(ConfigError::OutputContainsRoot { output, root }.into());
    }
    Ok(())
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::io(dir, e)),
        },
    }
}
