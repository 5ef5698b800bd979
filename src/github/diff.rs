//! Diff assembly with per-file and total line limits

use super::ChangedFile;

/// Keep the first `max_lines` lines and note how many were dropped
pub fn truncate_diff(diff: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = diff.split('\n').collect();
    if lines.len() <= max_lines {
        return diff.to_string();
    }

    let remaining = lines.len() - max_lines;
    let mut out = lines[..max_lines].join("\n");
    out.push_str(&format!("\n\n... ({} more lines truncated)", remaining));
    out
}

/// Unified diff of every file that has a patch, within both limits
pub fn assemble_diff(files: &[ChangedFile], per_file_max: usize, total_max: usize) -> String {
    let parts: Vec<String> = files
        .iter()
        .filter_map(|file| {
            let patch = file.patch.as_deref()?;
            Some(format!(
                "--- a/{name}\n+++ b/{name}\n{patch}",
                name = file.filename,
                patch = truncate_diff(patch, per_file_max)
            ))
        })
        .collect();

    truncate_diff(&parts.join("\n\n"), total_max)
}
