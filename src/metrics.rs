//! Review cost metrics and the GitHub Actions step summary

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::llm::Usage;

/// Dollars per million input tokens
pub const INPUT_PRICE_PER_MILLION: f64 = 3.0;
/// Dollars per million output tokens
pub const OUTPUT_PRICE_PER_MILLION: f64 = 15.0;
/// Saved per million cache-read tokens (reads bill at 10% of input)
pub const CACHE_READ_SAVINGS_PER_MILLION: f64 = 2.70;
/// Reviews above this cost get an alert in the step summary
pub const COST_ALERT_THRESHOLD: f64 = 0.10;

/// Environment variable naming the step summary file
pub const STEP_SUMMARY_ENV: &str = "GITHUB_STEP_SUMMARY";

const MILLION: f64 = 1_000_000.0;

/// Cost breakdown for one review
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewMetrics {
    pub usage: Usage,
    pub tool_call_count: u32,
    pub input_cost: f64,
    pub output_cost: f64,
    pub cache_savings: f64,
    pub total_cost: f64,
    pub recorded_at: DateTime<Utc>,
}

impl ReviewMetrics {
    pub fn from_usage(usage: &Usage, tool_call_count: u32) -> Self {
        let input_cost = usage.input_tokens as f64 * INPUT_PRICE_PER_MILLION / MILLION;
        let output_cost = usage.output_tokens as f64 * OUTPUT_PRICE_PER_MILLION / MILLION;
        let cache_savings = usage.cache_read_input_tokens as f64 * CACHE_READ_SAVINGS_PER_MILLION / MILLION;

        Self {
            usage: usage.clone(),
            tool_call_count,
            input_cost,
            output_cost,
            cache_savings,
            total_cost: input_cost + output_cost - cache_savings,
            recorded_at: Utc::now(),
        }
    }

    pub fn cache_hit(&self) -> bool {
        self.usage.cache_read_input_tokens > 0
    }

    /// Share of the uncached cost saved by cache reads, in percent
    pub fn cache_savings_pct(&self) -> f64 {
        let baseline = self.input_cost + self.cache_savings;
        if baseline > 0.0 {
            self.cache_savings / baseline * 100.0
        } else {
            0.0
        }
    }

    pub fn log(&self) {
        log::info!(
            "Review cost: ${:.4} (input {} tokens, output {} tokens)",
            self.total_cost,
            self.usage.input_tokens,
            self.usage.output_tokens
        );
        if self.cache_hit() {
            log::debug!(
                "Cache hit: {} tokens read, ${:.4} saved",
                self.usage.cache_read_input_tokens,
                self.cache_savings
            );
        } else if self.usage.cache_creation_input_tokens > 0 {
            log::debug!("Cache created: {} tokens", self.usage.cache_creation_input_tokens);
        }
    }

    /// Markdown section for the step summary
    pub fn to_markdown(&self) -> String {
        let u = &self.usage;
        let mut md = String::from("## 🤖 Code Review Metrics\n\n");
        md.push_str(&format!("_Recorded {}_\n\n", self.recorded_at.format("%Y-%m-%d %H:%M:%S UTC")));
        md.push_str("| Metric | Value |\n|--------|-------|\n");
        md.push_str(&format!("| Input tokens | {} (${:.4}) |\n", u.input_tokens, self.input_cost));
        md.push_str(&format!("| Output tokens | {} (${:.4}) |\n", u.output_tokens, self.output_cost));
        md.push_str(&format!("| Cache created | {} tokens |\n", u.cache_creation_input_tokens));
        md.push_str(&format!(
            "| Cache hit | {} tokens (saved ${:.4}) |\n",
            u.cache_read_input_tokens, self.cache_savings
        ));
        md.push_str(&format!("| **Total cost** | **${:.4}** |\n", self.total_cost));
        if self.tool_call_count > 0 {
            md.push_str(&format!("| Tool queries | {} |\n", self.tool_call_count));
        }
        md.push('\n');

        if self.total_cost > COST_ALERT_THRESHOLD {
            md.push_str(&format!(
                "⚠️ **Cost Alert**: Review cost ${:.4} exceeds ${:.2} threshold\n\n",
                self.total_cost, COST_ALERT_THRESHOLD
            ));
        } else if self.cache_hit() {
            md.push_str(&format!(
                "⚡ **Cache Performance**: Saved ${:.4} ({:.0}% cost reduction)\n\n",
                self.cache_savings,
                self.cache_savings_pct()
            ));
        }
        md
    }

    /// Append to the step summary file; failures are logged and ignored
    pub fn append_step_summary(&self, path: &Path) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| f.write_all(self.to_markdown().as_bytes()));
        if let Err(e) = result {
            log::warn!("Failed to write metrics to step summary {}: {}", path.display(), e);
        }
    }
}
