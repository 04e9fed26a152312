//! Permalink formatters for date-prefixed source files. Each formatter expects
//! a path ending in `<collection>/<YYYY>-<MM>-<DD>-<slug>.<ext>` and rewrites
//! it into a dated (or undated) output path. The extension is left untouched;
//! the collection assembler normalizes it to `.html` afterwards.
//!
//! ```
//! assert_eq!(
//!     quire::permalink::date("posts/2017-01-12-testing.md").unwrap(),
//!     "posts/2017/01/12/testing.md",
//! );
//! ```

use crate::config::PermalinkFn;
use crate::document::Document;
use crate::error::BoxError;
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// The naming convention every formatter expects, as shown to users.
pub const EXPECTED_PATTERN: &str = "<collection>/<YYYY>-<MM>-<DD>-<slug>.<ext>";

/// Returned when a source path doesn't follow [`EXPECTED_PATTERN`] or names
/// a date that doesn't exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("incorrect title formatting for post: {path} (expected `{}`)", EXPECTED_PATTERN)]
pub struct FormatError {
    /// The offending source path.
    pub path: String,
}

/// Selects one of the built-in formatters. This is how project files, which
/// can't carry closures, choose a permalink scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// See [`date`].
    Date,

    /// See [`ordinal`].
    Ordinal,

    /// See [`none`].
    #[serde(rename = "none")]
    Flat,
}

impl Style {
    /// Applies the selected formatter to `path`.
    pub fn format(self, path: &str) -> Result<String, FormatError> {
        match self {
            Style::Date => date(path),
            Style::Ordinal => ordinal(path),
            Style::Flat => none(path),
        }
    }

    /// Wraps the formatter as a collection `permalinks` function.
    pub fn into_permalink_fn(self) -> PermalinkFn {
        Box::new(
            move |path: &Path, _document: &Document| -> Result<String, BoxError> {
                Ok(self.format(&path.to_string_lossy())?)
            },
        )
    }
}

/// `posts/2017-01-12-testing.md` becomes `posts/2017/01/12/testing.md`.
pub fn date(path: &str) -> Result<String, FormatError> {
    let p = Parts::parse(path)?;
    Ok(format!(
        "{}/{}/{}/{}/{}.{}",
        p.collection, p.year, p.month, p.day, p.slug, p.extension
    ))
}

/// `posts/2017-07-22-testing.md` becomes `posts/2017/203/testing.md`, where
/// `203` is the 1-based day of the year.
pub fn ordinal(path: &str) -> Result<String, FormatError> {
    let p = Parts::parse(path)?;
    Ok(format!(
        "{}/{}/{}/{}.{}",
        p.collection,
        p.year,
        day_of_year(p.date),
        p.slug,
        p.extension
    ))
}

/// `posts/2017-01-12-testing.md` becomes `posts/testing.md`.
pub fn none(path: &str) -> Result<String, FormatError> {
    let p = Parts::parse(path)?;
    Ok(format!("{}/{}.{}", p.collection, p.slug, p.extension))
}

/// Gregorian leap-year rule.
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Days elapsed before the first of each month in a common year.
const CUMULATIVE_DAYS: [u32; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// The 1-based day of the year for `date`.
pub fn day_of_year(date: NaiveDate) -> u32 {
    use chrono::Datelike;
    let month = date.month0() as usize;
    let mut day = CUMULATIVE_DAYS[month] + date.day();
    if month > 1 && is_leap_year(date.year()) {
        day += 1;
    }
    day
}

/// The captures shared by every formatter.
struct Parts<'a> {
    collection: &'a str,
    year: &'a str,
    month: &'a str,
    day: &'a str,
    slug: &'a str,
    extension: &'a str,
    date: NaiveDate,
}

impl<'a> Parts<'a> {
    fn parse(path: &'a str) -> Result<Parts<'a>, FormatError> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"([A-Za-z0-9_-]+)/(\d{4})-(\d{2})-(\d{2})-([A-Za-z0-9_-]+)\.(\w+)$")
                .unwrap()
        });

        let err = || FormatError {
            path: path.to_owned(),
        };
        let caps = re.captures(path).ok_or_else(err)?;
        let text = |i: usize| caps.get(i).map(|m| m.as_str()).ok_or_else(err);
        let (year, month, day) = (text(2)?, text(3)?, text(4)?);

        // The pattern guarantees digits, so these only fail on impossible
        // dates like `2017-02-30`.
        let date = match (year.parse::<i32>(), month.parse::<u32>(), day.parse::<u32>()) {
            (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d).ok_or_else(err)?,
            _ => return Err(err()),
        };

        Ok(Parts {
            collection: text(1)?,
            year,
            month,
            day,
            slug: text(5)?,
            extension: text(6)?,
            date,
        })
    }
}
