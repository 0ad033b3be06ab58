//! Test-runner output normalizers.
//!
//! Each ecosystem's dialect has its own [`Normalizer`]; dispatch goes through
//! [`Ecosystem::normalizer`] rather than per-caller branching. Every
//! normalizer follows the same cascade: structured summary first, then
//! individual failure lines, then coarse text signals. Normalizers are total:
//! any input, including empty or truncated text, yields a valid
//! [`RunSummary`].

pub mod js;
pub mod pytest;

use crate::config::NormalizeConfig;
use crate::domain::{Ecosystem, RunSummary};

pub use cargo_test::CargoTestNormalizer;
pub use js::JsNormalizer;
pub use pytest::PytestNormalizer;

/// Converts one ecosystem's raw test output into a [`RunSummary`].
pub trait Normalizer: Send + Sync {
    /// Ecosystem whose dialect this normalizer understands.
    fn ecosystem(&self) -> Ecosystem;

    /// Normalize with explicit scanning bounds.
    fn normalize_with(&self, raw_output: &str, config: &NormalizeConfig) -> RunSummary;

    /// Normalize with default bounds.
    fn normalize(&self, raw_output: &str) -> RunSummary {
        self.normalize_with(raw_output, &NormalizeConfig::default())
    }
}

static PYTEST: PytestNormalizer = PytestNormalizer;
static JS: JsNormalizer = JsNormalizer;
static CARGO_TEST: CargoTestNormalizer = CargoTestNormalizer;

impl Ecosystem {
    /// The normalizer for this ecosystem's output dialect.
    pub fn normalizer(self) -> &'static dyn Normalizer {
        match self {
            Ecosystem::Python => &PYTEST,
            Ecosystem::Node => &JS,
            Ecosystem::Rust => &CARGO_TEST,
        }
    }
}

/// Normalize raw output for `ecosystem` with default bounds.
pub fn normalize(ecosystem: Ecosystem, raw_output: &str) -> RunSummary {
    ecosystem.normalizer().normalize(raw_output)
}

/// Normalize a captured run and apply the runner's exit code and duration.
pub fn normalize_run(
    ecosystem: Ecosystem,
    raw_output: &str,
    exit_code: i32,
    duration_seconds: f64,
    config: &NormalizeConfig,
) -> RunSummary {
    let summary = ecosystem
        .normalizer()
        .normalize_with(raw_output, config)
        .finalize(exit_code, duration_seconds);
    crate::obs::emit_run_normalized(
        ecosystem.as_str(),
        summary.total,
        summary.failed_count,
        summary.failures.len(),
    );
    summary
}
