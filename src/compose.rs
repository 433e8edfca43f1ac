//! The compose module renders a summary as a Markdown document and writes it
//! to disk.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

static SLUG_SEPARATOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("Failed to compile slug regex"));

const UNTITLED: &str = "Untitled Article";
const DEFAULT_SLUG: &str = "summary";
const MAX_SLUG_CHARS: usize = 80;

/// Renders the summary document.
///
/// # Arguments
///
/// * `summary` - The summary text returned by the service
/// * `source` - The URL the content came from
/// * `title` - The page title, if any
/// * `date` - The generation date shown in the footer
#[must_use]
pub fn to_markdown(summary: &str, source: &str, title: Option<&str>, date: NaiveDate) -> String {
    [
        format!("# {}", title.unwrap_or(UNTITLED)),
        String::new(),
        format!("**Source:** {source}"),
        String::new(),
        "---".to_owned(),
        String::new(),
        "## Summary".to_owned(),
        String::new(),
        summary.trim().to_owned(),
        String::new(),
        "---".to_owned(),
        format!("*Generated by Gistify on {}*", date.format("%Y-%m-%d")),
    ]
    .join("\n")
}

/// Converts a title to a filename-safe slug.
#[must_use]
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let slug = SLUG_SEPARATOR_REGEX.replace_all(&lowered, "-");
    let slug: String = slug.trim_matches('-').chars().take(MAX_SLUG_CHARS).collect();

    if slug.is_empty() {
        DEFAULT_SLUG.to_owned()
    } else {
        slug
    }
}

/// Resolves where the document goes: the explicit path when given, otherwise a
/// slug of the title inside `output_dir`.
#[must_use]
pub fn output_path(explicit: Option<&Path>, output_dir: &Path, title: Option<&str>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => output_dir.join(format!("{}.md", slugify(title.unwrap_or(DEFAULT_SLUG)))),
    }
}

/// Writes the document, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the directories or the file cannot be written.
pub fn write_markdown(path: &Path, markdown: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .context(format!("Failed to create directory {}", parent.display()))?;
    }

    fs::write(path, markdown).context(format!("Failed to write {}", path.display()))?;
    Ok(())
}
