//! Issue details captured from tool results during a conversation

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Issue-tracker details surfaced alongside the review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub id: String,
    pub title: String,
    pub state: String,
    pub description: String,
}

impl IssueSummary {
    /// Parse the first text part of an issue lookup result
    ///
    /// Returns `None` unless the text is a JSON object. Missing fields become
    /// empty strings and the description is cut to `description_limit` chars.
    pub fn from_tool_text(text: &str, description_limit: usize) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;
        let object = value.as_object()?;

        let field = |key: &str| object.get(key).and_then(Value::as_str).unwrap_or_default().to_string();

        // `state` is usually an object with a name, occasionally a bare string
        let state = match object.get("state") {
            Some(Value::Object(state)) => state.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
            Some(Value::String(state)) => state.clone(),
            _ => String::new(),
        };

        Some(Self {
            id: field("identifier"),
            title: field("title"),
            state,
            description: field("description").chars().take(description_limit).collect(),
        })
    }
}
