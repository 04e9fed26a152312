//! Collection configuration. Collections can be configured programmatically
//! (with closures for `transform`, `permalinks`, and page output paths) or
//! loaded from a `quire.yaml` project file, which selects a built-in
//! permalink [`Style`] and describes page output paths as patterns.

use crate::discover;
use crate::document::Document;
use crate::error::BoxError;
use crate::permalink::Style;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The name of the project file.
pub const PROJECT_FILE: &str = "quire.yaml";

/// The default number of documents per page.
pub const DEFAULT_PER_PAGE: usize = 10;

/// Rewrites a collection's documents after their front matter is read.
pub type TransformFn = Box<dyn Fn(Document) -> Result<Document, BoxError> + Send + Sync>;

/// Computes a document's output path from its absolute source path.
pub type PermalinkFn = Box<dyn Fn(&Path, &Document) -> Result<String, BoxError> + Send + Sync>;

/// Computes a page's output path from its 1-based page number.
pub type OutputFn = Box<dyn Fn(usize) -> String + Send + Sync>;

/// Pagination settings for a collection.
pub struct Paginate {
    /// The template every page is rendered through, relative to the root.
    pub template: PathBuf,

    /// The number of documents per page. Must be at least 1.
    pub per_page: usize,

    /// Computes each page's output path.
    pub output: OutputFn,
}

impl Paginate {
    pub fn new<F>(template: impl Into<PathBuf>, output: F) -> Paginate
    where
        F: Fn(usize) -> String + Send + Sync + 'static,
    {
        Paginate {
            template: template.into(),
            per_page: DEFAULT_PER_PAGE,
            output: Box::new(output),
        }
    }

    pub fn per_page(mut self, per_page: usize) -> Paginate {
        self.per_page = per_page;
        self
    }
}

/// A named group of source documents sharing processing rules.
pub struct Collection {
    /// Glob pattern selecting the collection's files, relative to the root.
    pub files: String,
    pub transform: Option<TransformFn>,
    pub permalinks: Option<PermalinkFn>,

    /// A layout substituted for the body of markdown documents, relative to
    /// the root.
    pub markdown_layout: Option<PathBuf>,
    pub paginate: Option<Paginate>,
}

impl Collection {
    pub fn new(files: impl Into<String>) -> Collection {
        Collection {
            files: files.into(),
            transform: None,
            permalinks: None,
            markdown_layout: None,
            paginate: None,
        }
    }

    pub fn transform<F>(mut self, f: F) -> Collection
    where
        F: Fn(Document) -> Result<Document, BoxError> + Send + Sync + 'static,
    {
        self.transform = Some(Box::new(f));
        self
    }

    pub fn permalinks<F>(mut self, f: F) -> Collection
    where
        F: Fn(&Path, &Document) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        self.permalinks = Some(Box::new(f));
        self
    }

    /// Uses one of the built-in date formatters for permalinks.
    pub fn permalink_style(mut self, style: Style) -> Collection {
        self.permalinks = Some(style.into_permalink_fn());
        self
    }

    pub fn markdown_layout(mut self, layout: impl Into<PathBuf>) -> Collection {
        self.markdown_layout = Some(layout.into());
        self
    }

    pub fn paginate(mut self, paginate: Paginate) -> Collection {
        self.paginate = Some(paginate);
        self
    }
}

/// The full configuration for one build.
pub struct Config {
    /// The directory collection patterns, layouts, and templates are
    /// resolved against.
    pub root: PathBuf,

    /// Patterns excluded from every collection.
    pub ignore: Vec<String>,

    /// The number of threads used to read sources. `None` uses one per core.
    pub threads: Option<usize>,

    pub collections: BTreeMap<String, Collection>,

    // Set while `collections` holds only the default `posts` collection.
    defaulted: bool,
}

impl Config {
    /// Creates a configuration with the default `posts` collection
    /// (`posts/**`) and the default ignore pattern (`**/_*`). The first call
    /// to [`Config::collection`] replaces the default collection.
    pub fn new(root: impl Into<PathBuf>) -> Config {
        Config {
            root: root.into(),
            ignore: default_ignore(),
            threads: None,
            collections: default_collections()
                .into_iter()
                .map(|(name, spec)| (name, Collection::new(spec.files)))
                .collect(),
            defaulted: true,
        }
    }

    pub fn collection(mut self, name: impl Into<String>, collection: Collection) -> Config {
        if self.defaulted {
            self.collections.clear();
            self.defaulted = false;
        }
        self.collections.insert(name.into(), collection);
        self
    }

    pub fn ignore(mut self, patterns: Vec<String>) -> Config {
        self.ignore = patterns;
        self
    }

    pub fn threads(mut self, threads: usize) -> Config {
        self.threads = Some(threads);
        self
    }

    /// Checks the configuration before any file is read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pattern in &self.ignore {
            check_pattern("ignore", pattern)?;
        }
        for (name, collection) in &self.collections {
            if collection.files.trim().is_empty() {
                return Err(ConfigError::EmptyPattern(name.clone()));
            }
            check_pattern(name, &collection.files)?;
            if let Some(paginate) = &collection.paginate {
                if paginate.per_page < 1 {
                    return Err(ConfigError::ZeroPageSize(name.clone()));
                }
                if paginate.template.as_os_str().is_empty() {
                    return Err(ConfigError::MissingTemplate(name.clone()));
                }
            }
        }
        Ok(())
    }

    /// Searches `dir` and its ancestors for a [`PROJECT_FILE`] and loads the
    /// first one found.
    pub fn from_directory(dir: &Path) -> Result<Config, ConfigError> {
        let path = dir.join(PROJECT_FILE);
        if path.is_file() {
            Config::from_project_file(&path)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(ConfigError::ProjectFileNotFound),
            }
        }
    }

    /// Loads a project file. Patterns and paths in the file are relative to
    /// the directory containing it.
    pub fn from_project_file(path: &Path) -> Result<Config, ConfigError> {
        let file = std::fs::File::open(path).map_err(|e| ConfigError::Io {
            path: path.to_owned(),
            source: e,
        })?;
        let project: Project = serde_yaml::from_reader(file).map_err(|e| ConfigError::Yaml {
            path: path.to_owned(),
            source: e,
        })?;
        let root = match path.parent() {
            Some(root) => root.to_owned(),
            None => return Err(ConfigError::NoParent(path.to_owned())),
        };

        let mut collections = BTreeMap::new();
        for (name, spec) in project.collections {
            let collection = spec.into_collection(&name)?;
            collections.insert(name, collection);
        }

        let config = Config {
            root,
            ignore: project.ignore,
            threads: project.threads,
            collections,
            defaulted: false,
        };
        config.validate()?;
        Ok(config)
    }
}

fn check_pattern(owner: &str, pattern: &str) -> Result<(), ConfigError> {
    match glob::Pattern::new(discover::trim_current_dir(pattern)) {
        Ok(_) => Ok(()),
        Err(e) => Err(ConfigError::InvalidPattern {
            owner: owner.to_owned(),
            pattern: pattern.to_owned(),
            message: e.msg.to_owned(),
        }),
    }
}

fn default_ignore() -> Vec<String> {
    vec![String::from("**/_*")]
}

fn default_collections() -> BTreeMap<String, CollectionSpec> {
    let mut m = BTreeMap::new();
    m.insert(
        String::from("posts"),
        CollectionSpec {
            files: String::from("posts/**"),
            permalinks: None,
            markdown_layout: None,
            paginate: None,
        },
    );
    m
}

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(DEFAULT_PER_PAGE)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    #[serde(default = "default_ignore")]
    ignore: Vec<String>,

    #[serde(default)]
    threads: Option<usize>,

    #[serde(default = "default_collections")]
    collections: BTreeMap<String, CollectionSpec>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct CollectionSpec {
    files: String,

    #[serde(default)]
    permalinks: Option<Style>,

    #[serde(default)]
    markdown_layout: Option<PathBuf>,

    #[serde(default)]
    paginate: Option<PaginateSpec>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct PaginateSpec {
    template: PathBuf,

    #[serde(default)]
    per_page: PageSize,

    /// An output path pattern in which `{}` is replaced by the page number.
    output: String,
}

impl CollectionSpec {
    fn into_collection(self, name: &str) -> Result<Collection, ConfigError> {
        let mut collection = Collection::new(self.files);
        if let Some(style) = self.permalinks {
            collection = collection.permalink_style(style);
        }
        if let Some(layout) = self.markdown_layout {
            collection = collection.markdown_layout(layout);
        }
        if let Some(spec) = self.paginate {
            if !spec.output.contains("{}") {
                return Err(ConfigError::MissingPagePlaceholder {
                    collection: name.to_owned(),
                    output: spec.output,
                });
            }
            let output = spec.output;
            collection = collection.paginate(
                Paginate::new(spec.template, move |page| output.replace("{}", &page.to_string()))
                    .per_page(spec.per_page.0),
            );
        }
        Ok(collection)
    }
}

/// Represents an invalid configuration. These are raised before any source
/// file is read.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Returned when a collection's `files` pattern is blank.
    #[error("collection `{0}` has an empty `files` pattern")]
    EmptyPattern(String),

    /// Returned when a glob pattern can't be parsed.
    #[error("invalid pattern `{pattern}` in `{owner}`: {message}")]
    InvalidPattern {
        owner: String,
        pattern: String,
        message: String,
    },

    /// Returned when pagination asks for fewer than one document per page.
    #[error("collection `{0}`: `perPage` must be at least 1")]
    ZeroPageSize(String),

    /// Returned when pagination names no template.
    #[error("collection `{0}`: pagination requires a `template`")]
    MissingTemplate(String),

    /// Returned when a project file's page output pattern lacks `{}`.
    #[error("collection `{collection}`: paginate `output` pattern `{output}` must contain `{{}}`")]
    MissingPagePlaceholder { collection: String, output: String },

    /// Returned when the output directory is the root or one of its
    /// ancestors, which a build would delete.
    #[error("output directory `{}` contains the project root `{}`", output.display(), root.display())]
    OutputContainsRoot { output: PathBuf, root: PathBuf },

    /// Returned when no project file exists in the directory or any parent.
    #[error("could not find `{}` in any parent directory", PROJECT_FILE)]
    ProjectFileNotFound,

    /// Returned when the project file has no parent directory.
    #[error("can't get parent directory for project file `{}`", .0.display())]
    NoParent(PathBuf),

    /// Returned when the project file can't be opened.
    #[error("opening project file `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Returned when the project file isn't valid (including unknown keys
    /// and wrong types).
    #[error("loading project file `{}`: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = Config::new("/site");
        assert_eq!(vec!["**/_*".to_owned()], config.ignore);
        assert_eq!(1, config.collections.len());
        assert_eq!("posts/**", config.collections["posts"].files);

        let config = config.collection("notes", Collection::new("notes/*.md"));
        assert_eq!(
            vec!["notes".to_owned()],
            config.collections.keys().cloned().collect::<Vec<String>>()
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_page_size() {
        let config = Config::new("/site").collection(
            "posts",
            Collection::new("posts/**")
                .paginate(Paginate::new("posts/_t.html", |n| format!("p{}.html", n)).per_page(0)),
        );
        match config.validate() {
            Err(ConfigError::ZeroPageSize(name)) => assert_eq!("posts", name),
            other => panic!("wanted ZeroPageSize; found {:?}", other),
        }
    }

    #[test]
    fn test_validate_patterns() {
        let config = Config::new("/site").collection("posts", Collection::new("  "));
        assert!(matches!(config.validate(), Err(ConfigError::EmptyPattern(_))));

        let config = Config::new("/site").collection("posts", Collection::new("posts/[a"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_from_project_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join(PROJECT_FILE),
            "collections:\n  posts:\n    files: posts/**\n    permalinks: date\n    markdownLayout: _layout.html\n    paginate:\n      template: posts/_template.html\n      perPage: 2\n      output: posts/p{}.html\n",
        )?;
        let nested = dir.path().join("posts").join("drafts");
        fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested)?;
        assert_eq!(dir.path(), config.root);
        assert_eq!(vec!["**/_*".to_owned()], config.ignore);

        let posts = &config.collections["posts"];
        assert!(posts.permalinks.is_some());
        assert_eq!(Some(PathBuf::from("_layout.html")), posts.markdown_layout);
        let paginate = posts.paginate.as_ref().ok_or("missing paginate")?;
        assert_eq!(2, paginate.per_page);
        assert_eq!("posts/p3.html", (paginate.output)(3));
        Ok(())
    }

    #[test]
    fn test_project_file_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(PROJECT_FILE);
        fs::write(
            &path,
            "collections:\n  posts:\n    files: posts/**\n    paginate:\n      template: t.html\n      output: p{}.html\n",
        )?;
        let config = Config::from_project_file(&path)?;
        let paginate = config.collections["posts"].paginate.as_ref().ok_or("missing")?;
        assert_eq!(DEFAULT_PER_PAGE, paginate.per_page);

        fs::write(&path, "threads: 2\n")?;
        let config = Config::from_project_file(&path)?;
        assert_eq!(Some(2), config.threads);
        assert_eq!("posts/**", config.collections["posts"].files);
        Ok(())
    }

    #[test]
    fn test_project_file_rejects_unknown_keys() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(PROJECT_FILE);
        fs::write(&path, "collections:\n  posts:\n    files: posts/**\n    sort: date\n")?;
        assert!(matches!(
            Config::from_project_file(&path),
            Err(ConfigError::Yaml { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_project_file_requires_page_placeholder() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(PROJECT_FILE);
        fs::write(
            &path,
            "collections:\n  posts:\n    files: posts/**\n    paginate:\n      template: t.html\n      output: page.html\n",
        )?;
        assert!(matches!(
            Config::from_project_file(&path),
            Err(ConfigError::MissingPagePlaceholder { .. })
        ));
        Ok(())
    }
}
