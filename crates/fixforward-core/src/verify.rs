//! Confidence scoring for an applied fix.
//!
//! Only the structured counts of the two runs are consulted; the raw output
//! and failure details play no part in the score.

use crate::domain::{RunSummary, VerifyResult};

const ALL_PASSING_SCORE: f64 = 0.90;
const PARTIAL_BASE_SCORE: f64 = 0.30;
const PARTIAL_RANGE: f64 = 0.50;
const NO_IMPROVEMENT_SCORE: f64 = 0.10;
const NEW_FAILURE_PENALTY: f64 = 0.20;
const KEPT_TESTS_BONUS: f64 = 0.05;

/// Score in `[0, 1]`, rounded to two decimals.
pub fn score(before: &RunSummary, after: &RunSummary) -> f64 {
    let mut score = if after.passed {
        ALL_PASSING_SCORE
    } else if after.failed_count < before.failed_count {
        let fixed = before.failed_count - after.failed_count;
        PARTIAL_BASE_SCORE + PARTIAL_RANGE * (fixed as f64 / before.failed_count as f64)
    } else {
        NO_IMPROVEMENT_SCORE
    };

    if after.failed_count > before.failed_count {
        let introduced = after.failed_count - before.failed_count;
        score = (score - NEW_FAILURE_PENALTY * introduced as f64).max(0.0);
    }

    // No tests silently dropped.
    if after.total >= before.total {
        score = (score + KEPT_TESTS_BONUS).min(1.0);
    }

    round2(score)
}

/// Round to two decimals from the exact binary value, ties to even.
///
/// `0.475` is stored just below itself and rounds down to `0.47`.
fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Before/after counts and the change in failures.
pub fn summary_diff(before: &RunSummary, after: &RunSummary) -> String {
    let delta = i64::from(before.failed_count) - i64::from(after.failed_count);
    let outcome = match delta {
        d if d > 0 => format!("Fixed:  {d} test(s)"),
        d if d < 0 => format!("New failures: {} test(s)", -d),
        _ => "No change in failure count.".to_string(),
    };
    format!(
        "Before: {} failed / {} passed / {} total\nAfter:  {} failed / {} passed / {} total\n{}",
        before.failed_count,
        before.passed_count,
        before.total,
        after.failed_count,
        after.passed_count,
        after.total,
        outcome
    )
}

/// Compare two runs of the same suite.
pub fn verify(before: &RunSummary, after: &RunSummary) -> VerifyResult {
    let confidence = score(before, after);
    let result = VerifyResult {
        before: before.clone(),
        after: after.clone(),
        all_passing: after.passed,
        fixed_count: before.failed_count.saturating_sub(after.failed_count),
        new_failure_count: after.failed_count,
        confidence,
        summary_diff: summary_diff(before, after),
    };
    crate::obs::emit_fix_verified(
        result.all_passing,
        result.fixed_count,
        result.new_failure_count,
        result.confidence,
    );
    result
}
