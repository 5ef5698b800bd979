//! Repository guideline and shared review-standards documents

use std::path::Path;

/// Used when the repository has no guideline file
pub const NO_GUIDELINES: &str = "No repository-specific guidelines provided.";

/// Repository guidelines, or a placeholder when the file is absent or unreadable
pub fn read_repository_guidelines(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            log::info!("Found repository guidelines at {}", path.display());
            content
        }
        Err(e) => {
            log::warn!("No repository guidelines at {} ({}), using generic guidelines", path.display(), e);
            NO_GUIDELINES.to_string()
        }
    }
}

/// Shared review standards, empty when not configured or missing
pub fn read_review_standards(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return String::new();
    };
    match std::fs::read_to_string(path) {
        Ok(content) => {
            log::info!("Loaded shared review standards from {}", path.display());
            content
        }
        Err(e) => {
            log::debug!("Review standards not loaded from {}: {}", path.display(), e);
            String::new()
        }
    }
}
