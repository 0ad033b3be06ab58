//! Structured events for the diagnose-fix-verify pipeline.
//!
//! Stage functions call the `emit_*` helpers; callers wrap a whole session
//! in a [`PipelineSpan`] so every event carries the project and ecosystem.

use tracing::info;

/// RAII guard for a pipeline-scoped span.
///
/// ```ignore
/// let _span = PipelineSpan::enter("/work/app", "python");
/// ```
pub struct PipelineSpan {
    _span: tracing::span::EnteredSpan,
}

impl PipelineSpan {
    pub fn enter(project: &str, ecosystem: &str) -> Self {
        let span = tracing::info_span!("fixforward.pipeline", project = %project, ecosystem = %ecosystem);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_run_normalized(ecosystem: &str, total: u32, failed_count: u32, records: usize) {
    info!(
        event = "run.normalized",
        ecosystem = %ecosystem,
        total = total,
        failed_count = failed_count,
        records = records,
    );
}

pub fn emit_failure_classified(test_name: &str, category: &str, confidence: f64) {
    info!(
        event = "failure.classified",
        test = %test_name,
        category = %category,
        confidence = confidence,
    );
}

/// `explanation_chars` is zero when no explanation was recovered.
pub fn emit_patch_extracted(changes: usize, explanation_chars: usize) {
    if changes == 0 {
        tracing::warn!(event = "patch.empty", "assistant produced no usable file changes");
    }
    info!(
        event = "patch.extracted",
        changes = changes,
        explanation_chars = explanation_chars,
    );
}

pub fn emit_fix_verified(all_passing: bool, fixed: u32, remaining: u32, confidence: f64) {
    info!(
        event = "fix.verified",
        all_passing = all_passing,
        fixed = fixed,
        remaining = remaining,
        confidence = confidence,
    );
}
