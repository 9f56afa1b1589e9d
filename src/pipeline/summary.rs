//! Rendering and persistence of a finished run

use std::path::Path;

use anyhow::Context;

use crate::domain::outcome::RunSummary;

/// Human readable report printed at the end of a run
pub fn render(summary: &RunSummary) -> String {
    let mut out = format!(
        "===== Download Summary =====\n\
         Total URLs: {}\n\
         Successful downloads: {}\n\
         Failed downloads: {}\n",
        summary.total,
        summary.successes.len(),
        summary.failures.len()
    );

    if !summary.failures.is_empty() {
        out.push_str("\nFailed URLs:\n");
        for failure in &summary.failures {
            out.push_str(&format!("- {}: {}\n", failure.reference, failure.message));
        }
    }
    out
}

pub fn write_json(summary: &RunSummary, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize run summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write run summary to {}", path.to_string_lossy()))
}
