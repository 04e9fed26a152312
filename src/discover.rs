//! File discovery: resolves a collection's glob pattern to an ordered list of
//! files under a base directory.
//!
//! Matching follows the conventions site authors expect from shell-style
//! globs: `*` doesn't cross `/`, `**` crosses any number of directories, a
//! trailing `**` matches every file beneath its directory, and dotfiles only
//! match patterns that name the dot explicitly.

use crate::error::Result;
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Returns the files under `base_dir` whose `/`-separated relative paths
/// match `pattern` and none of `exclude`, as absolute paths sorted by
/// relative path. Invalid patterns match nothing; [`crate::config::Config`]
/// validates them before discovery runs.
pub fn glob(base_dir: &Path, pattern: &str, exclude: &[String]) -> Result<Vec<PathBuf>> {
    let pattern = match Pattern::new(&expand_trailing_recursive(trim_current_dir(pattern))) {
        Ok(pattern) => pattern,
        Err(_) => return Ok(Vec::new()),
    };
    let exclude: Vec<Pattern> = exclude
        .iter()
        .filter_map(|p| Pattern::new(trim_current_dir(p)).ok())
        .collect();

    let start = base_dir.join(literal_prefix(pattern.as_str()));
    if !start.exists() {
        return Ok(Vec::new());
    }

    let mut matches: Vec<(String, PathBuf)> = Vec::new();
    for result in WalkDir::new(&start).follow_links(true) {
        let entry = result?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = match entry.path().strip_prefix(base_dir) {
            Ok(relative) => to_slash(relative),
            Err(_) => continue,
        };
        if pattern.matches_with(&relative, OPTIONS)
            && !exclude.iter().any(|x| x.matches_with(&relative, OPTIONS))
        {
            matches.push((relative, entry.into_path()));
        }
    }

    matches.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(matches.into_iter().map(|(_, path)| path).collect())
}

/// Joins the components of a relative path with `/`.
pub fn to_slash(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Strips leading `./` components, since matching is against paths relative
/// to the base directory.
pub fn trim_current_dir(pattern: &str) -> &str {
    let mut pattern = pattern;
    while let Some(rest) = pattern.strip_prefix("./") {
        pattern = rest.trim_start_matches('/');
    }
    pattern
}

// A bare trailing `**` only matches directories, so `posts/**` becomes
// `posts/**/*` to select every file beneath `posts`.
fn expand_trailing_recursive(pattern: &str) -> String {
    if pattern == "**" || pattern.ends_with("/**") {
        format!("{}/*", pattern)
    } else {
        pattern.to_owned()
    }
}

// The leading directories of `pattern` that contain no wildcards. Walking
// starts there instead of at the base directory.
fn literal_prefix(pattern: &str) -> PathBuf {
    let components: Vec<&str> = pattern.split('/').collect();
    let mut prefix = PathBuf::new();
    for component in &components[..components.len().saturating_sub(1)] {
        if component.contains(|c| matches!(c, '*' | '?' | '[' | ']')) {
            break;
        }
        prefix.push(component);
    }
    prefix
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn fixture() -> std::io::Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        for file in [
            "posts/foo.md",
            "posts/bar.md",
            "posts/_template.html",
            "posts/.hidden.md",
            "posts/2017/deep.md",
            "pages/about.html",
            "_layout.html",
        ] {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(path, "")?;
        }
        Ok(dir)
    }

    fn relative(base: &Path, paths: Vec<PathBuf>) -> Vec<String> {
        paths
            .iter()
            .map(|p| to_slash(p.strip_prefix(base).unwrap()))
            .collect()
    }

    #[test]
    fn test_glob_recursive() -> Result<()> {
        let dir = fixture().unwrap();
        let found = glob(dir.path(), "posts/**", &["**/_*".to_owned()])?;
        assert!(found.iter().all(|p| p.is_absolute()));
        assert_eq!(
            vec!["posts/2017/deep.md", "posts/bar.md", "posts/foo.md"],
            relative(dir.path(), found)
        );
        Ok(())
    }

    #[test]
    fn test_glob_single_level() -> Result<()> {
        let dir = fixture().unwrap();
        let found = glob(dir.path(), "posts/*.md", &[])?;
        assert_eq!(vec!["posts/bar.md", "posts/foo.md"], relative(dir.path(), found));
        Ok(())
    }

    #[test]
    fn test_glob_without_exclusions() -> Result<()> {
        let dir = fixture().unwrap();
        let found = glob(dir.path(), "**/_*", &[])?;
        assert_eq!(
            vec!["_layout.html", "posts/_template.html"],
            relative(dir.path(), found)
        );
        Ok(())
    }

    #[test]
    fn test_glob_missing_directory() -> Result<()> {
        let dir = fixture().unwrap();
        assert!(glob(dir.path(), "drafts/**", &[])?.is_empty());
        Ok(())
    }

    #[test]
    fn test_glob_current_dir_prefix() -> Result<()> {
        let dir = fixture().unwrap();
        let found = glob(dir.path(), "./posts/**", &["./**/_*".to_owned()])?;
        assert_eq!(
            vec!["posts/2017/deep.md", "posts/bar.md", "posts/foo.md"],
            relative(dir.path(), found)
        );
        Ok(())
    }

    #[test]
    fn test_trim_current_dir() {
        assert_eq!("posts/**", trim_current_dir("./posts/**"));
        assert_eq!("posts/*.md", trim_current_dir("././/posts/*.md"));
        assert_eq!("**/_*", trim_current_dir("**/_*"));
        assert_eq!("../posts", trim_current_dir("../posts"));
    }

    #[test]
    fn test_literal_prefix() {
        assert_eq!(PathBuf::from("posts"), literal_prefix("posts/**/*"));
        assert_eq!(PathBuf::from("a/b"), literal_prefix("a/b/*.md"));
        assert_eq!(PathBuf::new(), literal_prefix("**/_*"));
        assert_eq!(PathBuf::new(), literal_prefix("index.html"));
    }
}
