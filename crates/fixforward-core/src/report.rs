//! Output artifacts for downstream consumers.
//!
//! - `diagnostics_json`: machine-readable list of classified failures
//! - `PrReport`: Markdown pull-request body for an applied fix

use serde::{Deserialize, Serialize};

use crate::domain::{ClassifiedFailure, FailureCategory, PatchResult, Result, VerifyResult};

// ── diagnostics JSON ──────────────────────────────────────────────────────

/// One classified failure in the diagnostics array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticEntry {
    pub test: String,
    pub file: String,
    pub line: Option<u32>,
    pub category: FailureCategory,
    pub confidence: f64,
    pub summary: String,
    pub error: String,
}

impl From<&ClassifiedFailure> for DiagnosticEntry {
    fn from(item: &ClassifiedFailure) -> Self {
        Self {
            test: item.failure.test_name.clone(),
            file: item.failure.file_path.clone(),
            line: item.failure.line_number,
            category: item.category,
            confidence: item.confidence,
            summary: item.summary.clone(),
            error: item.failure.error_message.clone(),
        }
    }
}

pub fn diagnostics(classified: &[ClassifiedFailure]) -> Vec<DiagnosticEntry> {
    classified.iter().map(DiagnosticEntry::from).collect()
}

/// Pretty-printed JSON array of [`DiagnosticEntry`].
pub fn diagnostics_json(classified: &[ClassifiedFailure]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&diagnostics(classified))?)
}

// ── PR body rendering ─────────────────────────────────────────────────────

/// Everything a fix PR description is built from.
pub struct PrReport<'a> {
    pub classified: &'a [ClassifiedFailure],
    pub patch: &'a PatchResult,
    pub verify: &'a VerifyResult,
}

impl<'a> PrReport<'a> {
    /// Render the report as a Markdown string.
    pub fn render_markdown(&self) -> String {
        let mut md = String::from("# FixForward: automated test fix\n");

        md.push_str("\n## Failures\n\n");
        if self.classified.is_empty() {
            md.push_str("none\n");
        } else {
            md.push_str("| Test | Location | Category | Confidence | Summary |\n");
            md.push_str("|------|----------|----------|------------|---------|\n");
            for item in self.classified {
                md.push_str(&format!(
                    "| `{}` | {} | {} | {:.2} | {} |\n",
                    item.failure.test_name,
                    escape_cell(&item.failure.location()),
                    item.category,
                    item.confidence,
                    escape_cell(&item.summary)
                ));
            }
        }

        md.push_str("\n## Files Changed\n\n");
        if self.patch.is_empty() {
            md.push_str("none\n");
        } else {
            for change in &self.patch.changes {
                md.push_str(&format!("- `{}`\n", change.file_path));
            }
        }

        if !self.patch.explanation.is_empty() {
            md.push_str("\n## Explanation\n\n");
            md.push_str(self.patch.explanation.trim());
            md.push('\n');
        }

        md.push_str("\n## Verification\n\n```\n");
        md.push_str(&self.verify.summary_diff);
        md.push_str("\n```\n\n");
        if self.verify.after.is_timeout() {
            md.push_str(&format!("{}\n\n", self.verify.after.raw_output));
        }
        md.push_str(&format!(
            "**Confidence:** {:.0}%{}\n",
            self.verify.confidence * 100.0,
            if self.verify.all_passing {
                " (all tests passing)"
            } else {
                ""
            }
        ));

        md
    }
}

/// Markdown PR body for a verified fix.
pub fn render_pr_report(
    classified: &[ClassifiedFailure],
    patch: &PatchResult,
    verify: &VerifyResult,
) -> String {
    PrReport {
        classified,
        patch,
        verify,
    }
    .render_markdown()
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
