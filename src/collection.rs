//! The collection assembler. For each configured collection it resolves the
//! file set, extracts and transforms each document's front matter, computes
//! its output path, and records it both in the collection's ordered sequence
//! and in a path index keyed by the source's root-relative path.
//!
//! Reading and front matter extraction run on a worker pool; everything that
//! depends on order (transforms, permalinks, indexing) runs afterwards, in
//! glob order, on the calling thread.

use crate::config::{Collection, Config};
use crate::discover::{self, to_slash};
use crate::document::Document;
use crate::error::{BoxError, Error, Result};
use crate::frontmatter;
use crate::markdown;
use crate::permalink::FormatError;
use crate::template;
use crate::value::Locals;
use gtmpl::Value;
use rayon::prelude::*;
use serde_yaml::Mapping;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The key under which every collection's documents are published to the
/// shared data context.
pub const COLLECTIONS_KEY: &str = "_collections";

const HTML_EXTENSION: &str = "html";

/// One assembled source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The absolute path of the source file.
    pub source: PathBuf,

    /// The source's path relative to the root, `/`-separated.
    pub relative_path: String,

    /// The front matter exactly as extracted, before any transform.
    pub frontmatter: Mapping,

    /// The text to render for this document: the layout's source for
    /// markdown documents in a collection with a layout, otherwise the body
    /// following the front matter.
    pub body: String,

    /// The finished record.
    pub document: Document,
}

/// Records that a permalink function moved a document's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remap {
    /// The absolute path of the source file.
    pub source: PathBuf,

    /// The default output path derived from the source path.
    pub original: String,

    /// The output path computed by the permalink function.
    pub path: String,
}

/// The result of assembling every configured collection.
#[derive(Debug, Default)]
pub struct Collections {
    collections: BTreeMap<String, Vec<Entry>>,
    index: HashMap<String, (String, usize)>,
    remaps: Vec<Remap>,
}

impl Collections {
    /// The names of the collections that resolved to at least one file.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// The entries of a collection in glob order. Unknown or dropped
    /// collections have no entries.
    pub fn entries(&self, collection: &str) -> &[Entry] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The records of a collection in glob order.
    pub fn documents(&self, collection: &str) -> Vec<&Document> {
        self.entries(collection).iter().map(|e| &e.document).collect()
    }

    /// Every entry across every collection.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.collections.values().flatten()
    }

    /// Looks up an entry by the root-relative path of its source file.
    pub fn get(&self, relative_path: &str) -> Option<&Entry> {
        let (collection, i) = self.index.get(relative_path)?;
        self.collections.get(collection)?.get(*i)
    }

    /// The output remappings made by permalink functions, for the host's
    /// output-writing step.
    pub fn remaps(&self) -> &[Remap] {
        &self.remaps
    }

    /// Converts every collection into an object mapping collection names to
    /// arrays of records.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.collections
                .iter()
                .map(|(name, entries)| {
                    let docs = entries.iter().map(|e| Value::from(&e.document)).collect();
                    (name.clone(), Value::Array(docs))
                })
                .collect(),
        )
    }

    /// Publishes every collection under [`COLLECTIONS_KEY`] in `data`, so
    /// that any template can enumerate any collection.
    pub fn add_data_to(&self, data: &mut Locals) {
        data.insert(COLLECTIONS_KEY.to_owned(), self.to_value());
    }
}

/// Assembles every collection in `config`. Any failing document aborts the
/// whole assembly.
pub fn assemble(config: &Config) -> Result<Collections> {
    config.validate()?;
    let root = std::fs::canonicalize(&config.root).map_err(|e| Error::io(&config.root, e))?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads.unwrap_or(0))
        .build()?;

    let mut collections = Collections::default();
    for (name, collection) in &config.collections {
        let files = discover::glob(&root, &collection.files, &config.ignore)?;
        if files.is_empty() {
            warn!(
                "Empty collection `{}` at path \"{}\"; skipping",
                name, collection.files
            );
            continue;
        }

        let layout = match &collection.markdown_layout {
            Some(path) => Some(template::load(&root.join(path))?),
            None => None,
        };

        let sources: Vec<Source> = pool.install(|| {
            files
                .par_iter()
                .map(|path| Source::read(&root, path, layout.as_deref()))
                .collect::<Result<Vec<Source>>>()
        })?;

        let mut entries = Vec::with_capacity(sources.len());
        for source in sources {
            entries.push(source.into_entry(name, collection, &mut collections.remaps)?);
        }
        info!("Assembled collection `{}` ({} documents)", name, entries.len());

        for (i, entry) in entries.iter().enumerate() {
            collections
                .index
                .insert(entry.relative_path.clone(), (name.clone(), i));
        }
        collections.collections.insert(name.clone(), entries);
    }
    Ok(collections)
}

/// Replaces the extension of the last path component with `.html`, adding
/// one if there is none.
pub fn normalize_extension(path: &str) -> String {
    let file_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => format!("{}.{}", &path[..file_start + dot], HTML_EXTENSION),
        _ => format!("{}.{}", path, HTML_EXTENSION),
    }
}

/// A source file after the order-independent read step.
struct Source {
    path: PathBuf,
    relative_path: String,
    frontmatter: Mapping,
    body: String,
    content: Option<String>,
}

impl Source {
    fn read(root: &Path, path: &Path, layout: Option<&str>) -> Result<Source> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut extracted = frontmatter::extract(&contents).map_err(|e| Error::Parse {
            path: path.to_owned(),
            source: e,
        })?;

        // With a layout, the rendered body travels in the front matter as
        // `_content` and the layout becomes the body.
        let content = match (markdown::is_markdown(path), layout) {
            (true, Some(layout)) => {
                extracted = extracted.apply_layout(layout);
                None
            }
            (true, None) => Some(markdown::to_html(&extracted.body)),
            (false, _) => None,
        };

        let relative_path = match path.strip_prefix(root) {
            Ok(relative) => to_slash(relative),
            Err(_) => path.to_string_lossy().into_owned(),
        };

        Ok(Source {
            path: path.to_owned(),
            relative_path,
            frontmatter: extracted.metadata,
            body: extracted.body,
            content,
        })
    }

    fn into_entry(self, name: &str, collection: &Collection, remaps: &mut Vec<Remap>) -> Result<Entry> {
        let default_path = normalize_extension(&self.relative_path);
        let mut document = Document::new(name, &default_path, self.frontmatter.clone());
        if self.content.is_some() {
            document.content = self.content;
        }

        if let Some(transform) = &collection.transform {
            document = transform(document).map_err(|source| Error::Transform {
                path: self.path.clone(),
                source,
            })?;
        }

        if let Some(permalinks) = &collection.permalinks {
            let out = permalinks(&self.path, &document)
                .map_err(|source| permalink_error(&self.path, source))?;
            document.path = normalize_extension(&out);
            remaps.push(Remap {
                source: self.path.clone(),
                original: default_path,
                path: document.path.clone(),
            });
        }

        debug!("Processed `{}` -> `{}`", self.relative_path, document.path);
        Ok(Entry {
            source: self.path,
            relative_path: self.relative_path,
            frontmatter: self.frontmatter,
            body: self.body,
            document,
        })
    }
}

// Formatter failures keep their own error kind; anything else a permalink
// function returns is wrapped with the source path.
fn permalink_error(path: &Path, source: BoxError) -> Error {
    match source.downcast::<FormatError>() {
        Ok(err) => Error::Format(*err),
        Err(source) => Error::Permalink {
            path: path.to_owned(),
            source,
        },
    }
}
