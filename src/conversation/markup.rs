//! Cleanup of tag-like markup in final review text
//!
//! When tools are missing the model sometimes writes out pretend tool calls
//! as XML-ish tags. Those are removed from the text that gets posted.

use std::sync::LazyLock;

use regex::Regex;

static PAIRED_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<\w+[^>]*>.*?</\w+>").expect("paired tag regex is valid"));

static SELF_CLOSING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\w+[^>]*/>\s*").expect("self-closing tag regex is valid"));

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n+").expect("blank run regex is valid"));

/// Remove paired and self-closing tags, then collapse blank-line runs and trim
pub fn strip_tool_simulation_markup(text: &str) -> String {
    let cleaned = PAIRED_TAG.replace_all(text, "");
    let cleaned = SELF_CLOSING_TAG.replace_all(&cleaned, "");
    let cleaned = BLANK_RUN.replace_all(&cleaned, "\n\n");
    cleaned.trim().to_string()
}
