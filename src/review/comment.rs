//! Review comment composition

use crate::conversation::ConversationOutcome;

/// A tool server as it appears in the comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLabel {
    pub name: String,
    pub label: String,
}

impl ServerLabel {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

/// Fixed parts of every posted comment
#[derive(Debug, Clone, Default)]
pub struct CommentStyle {
    /// Heading text, rendered as `## <header>`
    pub header: String,
    /// Issue-tracker server whose absence triggers the warning block
    pub requirements: Option<ServerLabel>,
    /// Servers announced as "<label> context enabled" when they contributed
    pub context_servers: Vec<ServerLabel>,
    /// `{id}` is replaced with the issue id, `{id_lower}` with its lowercase form
    pub issue_url_template: Option<String>,
    pub learn_more_url: Option<String>,
}

/// Per-review values for the footer
#[derive(Debug, Clone)]
pub struct CommentFooter<'a> {
    pub commenter: &'a str,
    pub model: &'a str,
    pub cost: f64,
}

fn queries(count: u32) -> String {
    format!("{} {}", count, if count == 1 { "query" } else { "queries" })
}

fn requirements_warning(label: &str) -> String {
    format!(
        "⚠️ **{label} Context**: Unable to fetch {label} issue context. Review performed without requirement validation.

**Possible reasons**:
- PR title doesn't include {label} ID (format: `AAA-#### Description`)
- {label} MCP server unavailable
- Issue doesn't exist or is inaccessible

**Recommendation**: Verify PR title format and ensure {label} issue is linked.

---
"
    )
}

impl CommentStyle {
    fn issue_url(&self, id: &str) -> Option<String> {
        self.issue_url_template
            .as_ref()
            .map(|t| t.replace("{id_lower}", &id.to_lowercase()).replace("{id}", id))
    }

    fn footer(&self, outcome: &ConversationOutcome, footer: &CommentFooter<'_>) -> String {
        let mut parts = vec![
            format!("Triggered by @{}", footer.commenter),
            format!("Powered by {}", footer.model),
        ];

        if let Some(issue) = &outcome.side_data {
            let queried = if outcome.tool_call_count > 0 {
                queries(outcome.tool_call_count)
            } else {
                "validated".to_string()
            };
            match self.issue_url(&issue.id) {
                Some(url) => parts.push(format!("Reviewed [{}]({}) ({})", issue.id, url, queried)),
                None => parts.push(format!("Reviewed {} ({})", issue.id, queried)),
            }
        } else if outcome.tool_call_count > 0 {
            parts.push(format!("Validated using {}", queries(outcome.tool_call_count)));
        }

        for server in &self.context_servers {
            if outcome.had_context(&server.name) {
                parts.push(format!("{} context enabled", server.label));
            }
        }

        if footer.cost > 0.0 {
            parts.push(format!("Cost: ${:.2}", footer.cost));
        }

        if let Some(url) = &self.learn_more_url {
            parts.push(format!("[Learn more]({})", url));
        }

        format!("<sub>{}</sub>\n", parts.join(" | "))
    }

    /// Full markdown body for the review comment
    pub fn compose(&self, outcome: &ConversationOutcome, footer: &CommentFooter<'_>) -> String {
        let mut body = format!("## {}\n\n{}\n\n---\n", self.header, outcome.text);

        if let Some(requirements) = &self.requirements
            && !outcome.had_context(&requirements.name)
        {
            body.push_str(&requirements_warning(&requirements.label));
        }

        body.push_str(&self.footer(outcome, footer));
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{FallbackReason, IssueSummary, OutcomeStatus};
    use crate::llm::Usage;

    fn style() -> CommentStyle {
        CommentStyle {
            header: "🤖 Code Review".into(),
            requirements: Some(ServerLabel::new("linear", "Linear")),
            context_servers: vec![ServerLabel::new("github", "Cross-repo")],
            issue_url_template: Some("https://linear.app/acme/issue/{id_lower}".into()),
            learn_more_url: Some("https://example.com/guide".into()),
        }
    }

    fn footer() -> CommentFooter<'static> {
        CommentFooter {
            commenter: "alice",
            model: "claude-sonnet-4-5",
            cost: 0.0,
        }
    }

    fn outcome(flags: &[&str], tool_calls: u32) -> ConversationOutcome {
        let mut outcome = ConversationOutcome::single_turn(
            "Looks good".into(),
            OutcomeStatus::Completed,
            Usage::default(),
            FallbackReason::NoCredentials,
        );
        outcome.context_flags = flags.iter().map(|s| s.to_string()).collect();
        outcome.tool_call_count = tool_calls;
        outcome
    }

    #[test]
    fn test_full_context_comment() {
        let mut out = outcome(&["linear", "github"], 3);
        out.side_data = Some(IssueSummary {
            id: "ENG-7".into(),
            title: "Login".into(),
            state: "In Progress".into(),
            description: String::new(),
        });

        let body = style().compose(
            &out,
            &CommentFooter {
                cost: 0.0612,
                ..footer()
            },
        );

        assert!(body.starts_with("## 🤖 Code Review\n\nLooks good\n\n---\n"));
        assert!(!body.contains("Unable to fetch"));
        assert!(body.ends_with(
            "<sub>Triggered by @alice | Powered by claude-sonnet-4-5 | Reviewed [ENG-7](https://linear.app/acme/issue/eng-7) (3 queries) | Cross-repo context enabled | Cost: $0.06 | [Learn more](https://example.com/guide)</sub>\n"
        ));
    }

    #[test]
    fn test_warning_without_requirements_context() {
        let body = style().compose(&outcome(&[], 0), &footer());
        assert!(body.contains("⚠️ **Linear Context**: Unable to fetch Linear issue context."));
        assert!(body.contains("**Possible reasons**:\n- PR title doesn't include Linear ID"));
        assert!(body.contains(
            "<sub>Triggered by @alice | Powered by claude-sonnet-4-5 | [Learn more](https://example.com/guide)</sub>"
        ));
    }

    #[test]
    fn test_validated_queries_without_issue() {
        let body = style().compose(&outcome(&["linear"], 1), &footer());
        assert!(body.contains("Validated using 1 query"));
        assert!(!body.contains("Cross-repo context enabled"));
    }

    #[test]
    fn test_issue_without_tool_calls_is_validated() {
        let mut out = outcome(&["linear"], 0);
        out.side_data = Some(IssueSummary {
            id: "ENG-7".into(),
            title: String::new(),
            state: String::new(),
            description: String::new(),
        });
        let mut plain = style();
        plain.issue_url_template = None;
        plain.learn_more_url = None;

        let body = plain.compose(&out, &footer());
        assert!(body.ends_with("| Reviewed ENG-7 (validated)</sub>\n"));
    }

    #[test]
    fn test_no_requirements_server_never_warns() {
        let mut plain = style();
        plain.requirements = None;
        let body = plain.compose(&outcome(&[], 0), &footer());
        assert!(!body.contains("Unable to fetch"));
    }
}
