//! Issue references and reviewer instructions from PR text

use std::sync::LazyLock;

use regex::Regex;

static ISSUE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Z]+-\d+)").expect("issue id regex is valid"));

/// Phrases that only trigger a review and carry no instruction
const GENERIC_TRIGGERS: &[&str] = &[
    "",
    "review",
    "please review",
    "review this",
    "please review this",
    "review this pr",
    "please review this pr",
    "check this",
    "please check this",
];

const TRUNCATION_MARKER: &str = "... (truncated)";

/// Leading issue key such as `ENG-123` in a PR title
pub fn extract_issue_id(title: &str) -> Option<String> {
    ISSUE_ID.captures(title).map(|c| c[1].to_string())
}

/// Text following the trigger mention in a review-request comment
///
/// The mention is matched case-insensitively and may be followed by a comma
/// or colon. Generic phrases yield an empty string; anything longer than
/// `max_len` characters is cut and marked.
pub fn extract_reviewer_instructions(comment: &str, trigger: &str, max_len: usize) -> String {
    if comment.is_empty() || trigger.is_empty() {
        return String::new();
    }

    let pattern = format!(r"(?is){}\b[,:]?\s*(.*)", regex::escape(trigger));
    let Ok(re) = Regex::new(&pattern) else {
        return String::new();
    };
    let Some(captures) = re.captures(comment) else {
        return String::new();
    };

    let instructions = captures[1].trim();
    if GENERIC_TRIGGERS.contains(&instructions.to_lowercase().as_str()) {
        return String::new();
    }

    if instructions.chars().count() > max_len {
        let mut cut: String = instructions.chars().take(max_len).collect();
        cut.push_str(TRUNCATION_MARKER);
        return cut;
    }
    instructions.to_string()
}
