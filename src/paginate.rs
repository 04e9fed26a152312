//! Splits a collection's ordered documents into fixed-size pages, each of
//! which is rendered through the collection's pagination template with links
//! to its neighbours.
//!
//! Page templates see the shared data context plus:
//!
//! * `_currentPage`: `{page, path, posts}` for the page being rendered
//! * `prev`, `next`: the neighbouring pages in the same shape, or nil
//! * `_pages`: every paginated collection's pages, keyed by collection

use crate::collection::Collections;
use crate::config::Config;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::template;
use crate::value::Locals;
use gtmpl::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// The key under which all paginated collections' pages are published.
pub const PAGES_KEY: &str = "_pages";

/// The key under which a page template finds the page being rendered.
pub const CURRENT_PAGE_KEY: &str = "_currentPage";

/// One page of a paginated collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    /// The 1-based page number.
    pub page: usize,

    /// The page's output path.
    pub path: String,

    /// The documents on this page, in collection order.
    pub documents: Vec<&'a Document>,
}

impl Page<'_> {
    /// Converts the page into an object with `page`, `path`, and `posts`
    /// fields.
    pub fn to_value(&self) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("page".to_owned(), Value::from(self.page as u64));
        m.insert("path".to_owned(), Value::String(self.path.clone()));
        m.insert(
            "posts".to_owned(),
            Value::Array(self.documents.iter().map(|d| Value::from(*d)).collect()),
        );
        Value::Object(m)
    }
}

/// A rendered page, ready to be written to `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub page: usize,
    pub path: String,
    pub output: String,
}

/// Splits `documents` into pages of at most `per_page` documents. The first
/// page always exists, so an empty collection yields one empty page.
pub fn paginate<'a>(
    collection: &str,
    documents: &[&'a Document],
    per_page: usize,
    output: &dyn Fn(usize) -> String,
) -> Vec<Page<'a>> {
    let per_page = per_page.max(1);
    let mut pages = vec![Page {
        page: 1,
        path: output(1),
        documents: Vec::with_capacity(per_page),
    }];

    for doc in documents {
        let full = pages.last().map_or(true, |p| p.documents.len() == per_page);
        if full {
            let page = pages.len() + 1;
            pages.push(Page {
                page,
                path: output(page),
                documents: Vec::with_capacity(per_page),
            });
        }
        if let Some(current) = pages.last_mut() {
            current.documents.push(*doc);
        }
    }

    debug!(
        "Paginated collection `{}`: {} documents into {} pages",
        collection,
        documents.len(),
        pages.len()
    );
    pages
}

/// Paginates every collection in `config` that asks for it. A paginated
/// collection that resolved to no files still gets its one empty page.
pub fn paginate_all<'a>(
    config: &Config,
    collections: &'a Collections,
) -> BTreeMap<String, Vec<Page<'a>>> {
    config
        .collections
        .iter()
        .filter_map(|(name, collection)| {
            let settings = collection.paginate.as_ref()?;
            let documents = collections.documents(name);
            let pages = paginate(name, &documents, settings.per_page, &*settings.output);
            Some((name.clone(), pages))
        })
        .collect()
}

/// Publishes every collection's pages under [`PAGES_KEY`] in `data`.
pub fn add_pages_to(pages: &BTreeMap<String, Vec<Page>>, data: &mut Locals) {
    let value = pages
        .iter()
        .map(|(name, pages)| {
            (
                name.clone(),
                Value::Array(pages.iter().map(Page::to_value).collect()),
            )
        })
        .collect();
    data.insert(PAGES_KEY.to_owned(), Value::Object(value));
}

/// The locals for rendering `pages[i]`: `base` plus the page itself and its
/// neighbours.
pub fn page_locals(pages: &[Page], i: usize, base: &Locals) -> Locals {
    let neighbour = |j: Option<usize>| match j.and_then(|j| pages.get(j)) {
        Some(page) => page.to_value(),
        None => Value::Nil,
    };

    let mut locals = base.clone();
    if let Some(page) = pages.get(i) {
        locals.insert(CURRENT_PAGE_KEY.to_owned(), page.to_value());
    }
    locals.insert("next".to_owned(), neighbour(i.checked_add(1)));
    locals.insert("prev".to_owned(), neighbour(i.checked_sub(1)));
    locals
}

/// Renders each page exactly once through `template`, which is parsed once
/// up front. If any page fails, no output is returned and the error names the
/// page; a template that doesn't parse fails on the first page.
pub fn render_pages(
    collection: &str,
    pages: &[Page],
    template: &str,
    base: &Locals,
) -> Result<Vec<Rendered>> {
    let render_error = |page: &Page, message: String| Error::Render {
        collection: collection.to_owned(),
        page: page.page,
        path: page.path.clone(),
        message,
    };

    let first = match pages.first() {
        Some(first) => first,
        None => return Ok(Vec::new()),
    };
    let template = template::parse(template).map_err(|message| render_error(first, message))?;

    pages
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let output = template::execute(&template, page_locals(pages, i, base))
                .map_err(|message| render_error(page, message))?;
            debug!("Rendered page {} of `{}` -> `{}`", page.page, collection, page.path);
            Ok(Rendered {
                page: page.page,
                path: page.path.clone(),
                output,
            })
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::collection::assemble;
    use crate::config::{Collection, Paginate};
    use serde_yaml::Mapping;

    fn documents(n: usize) -> Vec<Document> {
        (0..n)
            .map(|i| Document::new("posts", &format!("posts/{}.html", i), Mapping::new()))
            .collect()
    }

    fn output(page: usize) -> String {
        format!("posts/p{}.html", page)
    }

    #[test]
    fn test_paginate_empty_collection() {
        let pages = paginate("posts", &[], 10, &output);
        assert_eq!(1, pages.len());
        assert_eq!(1, pages[0].page);
        assert_eq!("posts/p1.html", pages[0].path);
        assert!(pages[0].documents.is_empty());
    }

    #[test]
    fn test_paginate_one_per_page() {
        let docs = documents(2);
        let refs: Vec<&Document> = docs.iter().collect();
        let pages = paginate("posts", &refs, 1, &output);
        assert_eq!(2, pages.len());
        assert_eq!(vec![&docs[0]], pages[0].documents);
        assert_eq!(vec![&docs[1]], pages[1].documents);
        assert_eq!("posts/p2.html", pages[1].path);
    }

    #[test]
    fn test_paginate_page_boundaries() {
        for n in 0..12 {
            let docs = documents(n);
            let refs: Vec<&Document> = docs.iter().collect();
            for per_page in 1..5 {
                let pages = paginate("posts", &refs, per_page, &output);

                let wanted_pages = if n == 0 { 1 } else { (n + per_page - 1) / per_page };
                assert_eq!(wanted_pages, pages.len(), "n={} per_page={}", n, per_page);

                for (i, page) in pages.iter().enumerate() {
                    assert_eq!(i + 1, page.page);
                    assert_eq!(output(i + 1), page.path);
                    assert!(page.documents.len() <= per_page);
                }

                let last = pages.last().unwrap().documents.len();
                let wanted_last = match (n, n % per_page) {
                    (0, _) => 0,
                    (_, 0) => per_page,
                    (_, rem) => rem,
                };
                assert_eq!(wanted_last, last, "n={} per_page={}", n, per_page);

                // order is preserved across pages
                let flattened: Vec<&Document> =
                    pages.iter().flat_map(|p| p.documents.iter().copied()).collect();
                assert_eq!(refs, flattened);
            }
        }
    }

    fn path_of(value: Option<&Value>) -> Option<String> {
        match value {
            Some(Value::Object(m)) => m.get("path").map(|p| p.to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_page_locals_linkage() {
        let docs = documents(3);
        let refs: Vec<&Document> = docs.iter().collect();
        let pages = paginate("posts", &refs, 1, &output);
        let mut base = Locals::new();
        base.insert("site".to_owned(), Value::String("example".to_owned()));

        let first = page_locals(&pages, 0, &base);
        assert!(matches!(first.get("prev"), Some(Value::Nil)));
        assert_eq!(Some("posts/p2.html".to_owned()), path_of(first.get("next")));
        assert_eq!(Some("posts/p1.html".to_owned()), path_of(first.get(CURRENT_PAGE_KEY)));
        assert!(first.contains_key("site"));

        let middle = page_locals(&pages, 1, &base);
        assert_eq!(Some("posts/p1.html".to_owned()), path_of(middle.get("prev")));
        assert_eq!(Some("posts/p3.html".to_owned()), path_of(middle.get("next")));

        let last = page_locals(&pages, 2, &base);
        assert_eq!(Some("posts/p2.html".to_owned()), path_of(last.get("prev")));
        assert!(matches!(last.get("next"), Some(Value::Nil)));
    }

    #[test]
    fn test_render_pages() -> Result<()> {
        let docs = documents(3);
        let refs: Vec<&Document> = docs.iter().collect();
        let pages = paginate("posts", &refs, 2, &output);
        let template = "{{ ._currentPage.page }}:{{ range ._currentPage.posts }}[{{ ._path }}]{{ end }}{{ with .next }}>{{ .path }}{{ end }}";

        let rendered = render_pages("posts", &pages, template, &Locals::new())?;
        assert_eq!(2, rendered.len());
        assert_eq!("posts/p1.html", rendered[0].path);
        assert_eq!("1:[posts/0.html][posts/1.html]>posts/p2.html", rendered[0].output);
        assert_eq!("2:[posts/2.html]", rendered[1].output);
        Ok(())
    }

    #[test]
    fn test_render_pages_error_names_page() {
        let pages = paginate("posts", &[], 1, &output);
        match render_pages("posts", &pages, "{{ .broken ", &Locals::new()) {
            Err(Error::Render { collection, page, path, .. }) => {
                assert_eq!("posts", collection);
                assert_eq!(1, page);
                assert_eq!("posts/p1.html", path);
            }
            other => panic!("wanted render error; found {:?}", other),
        }
    }

    #[test]
    fn test_render_pages_unparsable_template_fails_first_page() {
        let docs = documents(3);
        let refs: Vec<&Document> = docs.iter().collect();
        let pages = paginate("posts", &refs, 1, &output);
        match render_pages("posts", &pages, "{{ range ._currentPage.posts }}", &Locals::new()) {
            Err(Error::Render { page, path, .. }) => {
                assert_eq!(1, page);
                assert_eq!("posts/p1.html", path);
            }
            other => panic!("wanted render error; found {:?}", other),
        }
    }

    #[test]
    fn test_paginate_all_dropped_collection() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path()).collection(
            "drafts",
            Collection::new("drafts/**")
                .paginate(Paginate::new("_drafts.html", |n| format!("drafts/p{}.html", n))),
        );
        let collections = assemble(&config)?;
        assert_eq!(0, collections.names().count());

        let all = paginate_all(&config, &collections);
        let pages = &all["drafts"];
        assert_eq!(1, pages.len());
        assert_eq!(1, pages[0].page);
        assert_eq!("drafts/p1.html", pages[0].path);
        assert!(pages[0].documents.is_empty());
        Ok(())
    }

    #[test]
    fn test_add_pages_to() {
        let docs = documents(3);
        let refs: Vec<&Document> = docs.iter().collect();
        let mut all = BTreeMap::new();
        all.insert("posts".to_owned(), paginate("posts", &refs, 2, &output));

        let mut data = Locals::new();
        add_pages_to(&all, &mut data);
        match data.get(PAGES_KEY) {
            Some(Value::Object(m)) => match m.get("posts") {
                Some(Value::Array(pages)) => assert_eq!(2, pages.len()),
                other => panic!("wanted array; found {:?}", other),
            },
            other => panic!("wanted object; found {:?}", other),
        }
    }
}
