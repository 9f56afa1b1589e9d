//! Loading of the ordered reference list that feeds a batch run

use std::path::Path;

use anyhow::Context;

use crate::domain::track::TrackReference;

/// Reads one reference per line, trimming whitespace and skipping blank lines
pub fn load_references(path: &Path) -> anyhow::Result<Vec<TrackReference>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read reference list {}", path.to_string_lossy()))?;
    Ok(parse_references(&contents))
}

pub fn parse_references(contents: &str) -> Vec<TrackReference> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(TrackReference::new)
        .collect()
}
