//! Before/after verification results.

use serde::{Deserialize, Serialize};

use super::run::RunSummary;

/// Comparison of the runs before and after a fix was applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifyResult {
    pub before: RunSummary,
    pub after: RunSummary,
    pub all_passing: bool,
    pub fixed_count: u32,
    /// Failures still present after the fix.
    pub new_failure_count: u32,
    /// In `[0, 1]`, rounded to 2 decimals.
    pub confidence: f64,
    /// Human-readable before/after report.
    pub summary_diff: String,
}
