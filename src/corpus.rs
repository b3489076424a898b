//! Query corpus loading.
//!
//! Each file in the queries directory is one query template: the file base
//! name (extension stripped) is the group id, and the file body holds
//! individual queries separated by blank lines. Queries are opaque payloads;
//! no SPARQL validation happens here.

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;

/// A separator is a line consisting solely of whitespace. Anchored at line
/// start so a blank run inside an indented query body does not split it.
const SEPARATOR_PATTERN: &str = r"(?m)^\s*\n";

/// One query template: the ordered queries loaded from a single file.
///
/// Index 0 is the warm-up query; indices >= 1 are the measured queries.
#[derive(Debug, Clone)]
pub struct QueryGroup {
    pub id: String,
    pub queries: Vec<String>,
}

impl QueryGroup {
    /// Load a template file. Fails if the file is unreadable or holds no
    /// non-blank queries.
    pub fn load(path: &Path) -> Result<Self> {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .with_context(|| format!("Query file has no usable name: {}", path.display()))?;

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file: {}", path.display()))?;
        let queries = split_queries(&text)?;
        if queries.is_empty() {
            bail!("Query file contains no queries: {}", path.display());
        }

        Ok(Self { id, queries })
    }

    /// The warm-up query (index 0).
    pub fn warm_up(&self) -> &str {
        &self.queries[0]
    }

    /// Measured queries with their ids (indices >= 1).
    pub fn measured(&self) -> impl Iterator<Item = (usize, &str)> {
        self.queries
            .iter()
            .enumerate()
            .skip(1)
            .map(|(id, q)| (id, q.as_str()))
    }
}

/// Load every query template in a directory.
///
/// Directory listing order is not stable across platforms, so entries are
/// sorted by file name to keep group order comparable between runs.
pub fn load_groups(dir: &Path) -> Result<Vec<QueryGroup>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read queries directory: {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to list queries directory: {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        bail!("No query files found in {}", dir.display());
    }

    paths.iter().map(|p| QueryGroup::load(p)).collect()
}

/// Split file content into queries on blank-line separators, dropping
/// whitespace-only segments.
fn split_queries(text: &str) -> Result<Vec<String>> {
    let separator = Regex::new(SEPARATOR_PATTERN)?;
    Ok(separator
        .split(text)
        .filter(|segment| !segment.trim().is_empty())
        .map(str::to_string)
        .collect())
}
