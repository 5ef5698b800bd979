//! Tool catalog building
//!
//! Converts the descriptors one server advertises into the uniform tool
//! definitions sent to the model, applying that server's prefix and
//! allow-list.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use serde_json::{Value, json};

use crate::llm::ToolDefinition;

use super::provider::ToolDescriptor;

/// Placeholder used when a server omits a tool description
pub const MISSING_DESCRIPTION: &str = "No description provided";

/// Per-server naming and filtering rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogPolicy {
    /// Prepended to every original name
    pub prefix: Option<String>,
    /// Original names to keep; empty keeps everything
    pub allow: BTreeSet<String>,
}

impl CatalogPolicy {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_allow<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow = names.into_iter().map(Into::into).collect();
        self
    }

    fn admits(&self, original: &str) -> bool {
        self.allow.is_empty() || self.allow.contains(original)
    }

    /// Name the model sees for an original tool name
    pub fn expose(&self, original: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, original),
            None => original.to_string(),
        }
    }

    /// Recover the original name from an exposed one
    pub fn strip_prefix<'a>(&self, exposed: &'a str) -> &'a str {
        match &self.prefix {
            Some(prefix) => exposed.strip_prefix(prefix.as_str()).unwrap_or(exposed),
            None => exposed,
        }
    }
}

/// One tool as exposed to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub exposed_name: String,
    pub original_name: String,
    pub server: String,
    pub definition: ToolDefinition,
}

/// Convert one server's descriptors under its policy
pub fn build_catalog(descriptors: &[ToolDescriptor], server: &str, policy: &CatalogPolicy) -> Vec<CatalogEntry> {
    descriptors
        .iter()
        .filter(|d| policy.admits(&d.name))
        .map(|d| {
            let exposed_name = policy.expose(&d.name);
            let description = d
                .description
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| MISSING_DESCRIPTION.to_string());
            let input_schema = d.input_schema.clone().unwrap_or_else(|| json!({}));
            CatalogEntry {
                definition: ToolDefinition::new(exposed_name.clone(), description, input_schema),
                exposed_name,
                original_name: d.name.clone(),
                server: server.to_string(),
            }
        })
        .collect()
}

/// Ordered, name-unique set of tools offered to the model
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    entries: Vec<CatalogEntry>,
    names: HashSet<String>,
}

impl ToolCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry unless its exposed name is taken; returns whether it was added
    pub fn insert(&mut self, entry: CatalogEntry) -> bool {
        if !self.names.insert(entry.exposed_name.clone()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Get an entry by exposed name
    pub fn get(&self, exposed: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.exposed_name == exposed)
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Tool definitions for the model request
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.entries.iter().map(|e| e.definition.clone()).collect()
    }

    /// Serialized definitions, stable for identical inputs
    pub fn to_json(&self) -> Value {
        Value::Array(self.entries.iter().map(|e| e.definition.to_anthropic_schema()).collect())
    }

    /// Get number of tools
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptors() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new("get_file_contents")
                .with_description("Read a file")
                .with_schema(json!({ "type": "object", "properties": { "path": { "type": "string" } } })),
            ToolDescriptor::new("create_issue").with_description("Create an issue"),
            ToolDescriptor::new("search_code"),
        ]
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let entries = build_catalog(&descriptors(), "github", &CatalogPolicy::default());
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].definition.description, MISSING_DESCRIPTION);
        assert_eq!(entries[2].definition.input_schema, json!({}));
        assert_eq!(entries[1].definition.input_schema, json!({}));
    }

    #[test]
    fn test_prefix_and_allow_list() {
        let policy = CatalogPolicy::default()
            .with_prefix("github_")
            .with_allow(["get_file_contents", "search_code"]);
        let entries = build_catalog(&descriptors(), "github", &policy);

        let names: Vec<&str> = entries.iter().map(|e| e.exposed_name.as_str()).collect();
        assert_eq!(names, vec!["github_get_file_contents", "github_search_code"]);
        assert_eq!(entries[0].original_name, "get_file_contents");
        assert_eq!(entries[0].definition.name, "github_get_file_contents");
        assert_eq!(entries[0].server, "github");
    }

    #[test]
    fn test_empty_allow_list_keeps_everything() {
        let policy = CatalogPolicy::default().with_allow(Vec::<String>::new());
        assert_eq!(build_catalog(&descriptors(), "s", &policy).len(), 3);
    }

    #[test]
    fn test_prefix_round_trip() {
        let policy = CatalogPolicy::default().with_prefix("github_");
        for name in ["search_code", "github_nested", ""] {
            assert_eq!(policy.strip_prefix(&policy.expose(name)), name);
        }

        let bare = CatalogPolicy::default();
        assert_eq!(bare.strip_prefix(&bare.expose("get_issue")), "get_issue");
    }

    #[test]
    fn test_build_is_deterministic() {
        let policy = CatalogPolicy::default().with_prefix("p_");
        let mut a = ToolCatalog::new();
        let mut b = ToolCatalog::new();
        for entry in build_catalog(&descriptors(), "s", &policy) {
            a.insert(entry);
        }
        for entry in build_catalog(&descriptors(), "s", &policy) {
            b.insert(entry);
        }
        assert_eq!(
            serde_json::to_string(&a.to_json()).unwrap(),
            serde_json::to_string(&b.to_json()).unwrap()
        );
    }

    #[test]
    fn test_catalog_rejects_duplicate_names() {
        let mut catalog = ToolCatalog::new();
        let first = build_catalog(&[ToolDescriptor::new("search")], "linear", &CatalogPolicy::default());
        let second = build_catalog(&[ToolDescriptor::new("search")], "other", &CatalogPolicy::default());

        assert!(catalog.insert(first[0].clone()));
        assert!(!catalog.insert(second[0].clone()));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("search").unwrap().server, "linear");
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = ToolCatalog::new();
        assert!(catalog.is_empty());
        assert!(catalog.definitions().is_empty());
        assert_eq!(catalog.to_json(), json!([]));
    }
}
