//! The library code for the `quire` content-collection engine. A site is a
//! set of named collections, each selecting source files by glob pattern.
//! Building a site happens in a few distinct steps:
//!
//! 1. Discovering each collection's files ([`crate::discover`])
//! 2. Extracting front matter and optionally wrapping markdown in a layout
//!    ([`crate::frontmatter`], [`crate::markdown`])
//! 3. Turning each file into a [`Document`], running the collection's
//!    transform and computing its output path ([`crate::collection`],
//!    [`crate::permalink`])
//! 4. Splitting paginated collections into pages ([`crate::paginate`])
//! 5. Rendering documents and pages through their templates and writing the
//!    results to disk ([`crate::build`])
//!
//! Steps 1 through 3 are the bulk of the work and are driven by
//! [`assemble`]. The templates in step 5 see the values produced by
//! [`resolve_locals`]: the shared data context, the document's record, and its
//! front matter.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod collection;
pub mod config;
pub mod discover;
pub mod document;
pub mod error;
pub mod frontmatter;
pub mod locals;
pub mod markdown;
pub mod paginate;
pub mod permalink;
pub mod template;
pub mod value;

pub use crate::build::build_site;
pub use crate::collection::{assemble, Collections};
pub use crate::config::{Collection, Config, Paginate};
pub use crate::document::Document;
pub use crate::error::{Error, Result};
pub use crate::locals::resolve_locals;
pub use crate::permalink::Style;
