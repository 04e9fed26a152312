use anyhow::{Context, Result};
use clap::{App, Arg};
use quire::{build_site, Config};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let matches = App::new("quire")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a site from its content collections")
        .arg(
            Arg::with_name("dir")
                .long("dir")
                .short("d")
                .takes_value(true)
                .default_value(".")
                .help("The project directory (or any directory beneath it)"),
        )
        .arg(
            Arg::with_name("output")
                .long("output")
                .short("o")
                .takes_value(true)
                .help("The output directory [default: <project>/_site]"),
        )
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .short("j")
                .takes_value(true)
                .help("The number of threads used to read source files"),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .help("Log each document and page as it is processed"),
        )
        .get_matches();

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if matches.is_present("verbose") {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let dir = PathBuf::from(matches.value_of("dir").unwrap_or("."));
    let dir = dir
        .canonicalize()
        .with_context(|| format!("resolving project directory `{}`", dir.display()))?;

    let mut config = Config::from_directory(&dir)
        .with_context(|| format!("loading project from `{}`", dir.display()))?;
    if let Some(threads) = matches.value_of("threads") {
        let threads: usize = threads
            .parse()
            .with_context(|| format!("invalid thread count `{}`", threads))?;
        config = config.threads(threads);
    }

    let output = match matches.value_of("output") {
        Some(output) => resolve_output(Path::new(output))?,
        None => config.root.join("_site"),
    };
    // Keep previous builds out of the collections.
    if let Some(relative) = output
        .strip_prefix(&config.root)
        .ok()
        .filter(|p| !p.as_os_str().is_empty())
    {
        let pattern = format!("{}/**/*", quire::discover::to_slash(relative));
        config.ignore.push(pattern);
    }
    info!("Building `{}` into `{}`", config.root.display(), output.display());

    let summary = build_site(&config, &output)?;
    info!(
        "Done: {} documents, {} pages",
        summary.documents, summary.pages
    );
    Ok(())
}

// Makes `output` absolute against the working directory, resolving symlinks
// in the part of it that already exists so it compares with the project root.
fn resolve_output(output: &Path) -> Result<PathBuf> {
    let absolute = std::env::current_dir()
        .context("reading the working directory")?
        .join(output);

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return Ok(absolute.clone()),
        }
    }

    let mut resolved = existing
        .canonicalize()
        .with_context(|| format!("resolving output directory `{}`", output.display()))?;
    for name in missing.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}
