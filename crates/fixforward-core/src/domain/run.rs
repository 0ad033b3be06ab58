//! Normalized test-run results.

use serde::{Deserialize, Serialize};

/// Test name used for the synthetic record of a timed-out run.
pub const TIMEOUT_TEST_NAME: &str = "<timeout>";

/// A single failing test recovered from runner output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureRecord {
    /// Test identifier, or a synthetic label such as `<timeout>` or
    /// `collect: <file>`.
    pub test_name: String,

    /// Source file path; empty when unknown.
    pub file_path: String,

    /// Line number (1-indexed) when the output names one.
    pub line_number: Option<u32>,

    /// Short error message; may be empty.
    pub error_message: String,

    /// Bounded slice of the raw output around this failure.
    pub full_output: String,
}

impl FailureRecord {
    /// Create a record with no location and no detail.
    pub fn new(test_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            file_path: String::new(),
            line_number: None,
            error_message: error_message.into(),
            full_output: String::new(),
        }
    }

    /// Set the file path.
    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = file_path.into();
        self
    }

    /// Set the line number.
    pub fn with_line(mut self, line_number: Option<u32>) -> Self {
        self.line_number = line_number;
        self
    }

    /// Set the detail excerpt.
    pub fn with_output(mut self, full_output: impl Into<String>) -> Self {
        self.full_output = full_output.into();
        self
    }

    /// `file:line` when both are known, the bare file otherwise.
    pub fn location(&self) -> String {
        match self.line_number {
            Some(line) if !self.file_path.is_empty() => format!("{}:{}", self.file_path, line),
            _ => self.file_path.clone(),
        }
    }
}

/// Structured outcome of one test run.
///
/// `failed_count == 0` is the authoritative pass signal; `passed` is always
/// derived from it and never from `exit_code` alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub passed: bool,
    pub exit_code: i32,
    pub raw_output: String,
    pub total: u32,
    pub passed_count: u32,
    pub failed_count: u32,
    pub duration_seconds: f64,
    pub failures: Vec<FailureRecord>,
}

impl RunSummary {
    /// Build a summary from recovered counts.
    ///
    /// Negative or non-finite durations are clamped to zero.
    pub fn from_counts(
        raw_output: impl Into<String>,
        passed_count: u32,
        failed_count: u32,
        total: u32,
        duration_seconds: f64,
        failures: Vec<FailureRecord>,
    ) -> Self {
        Self {
            passed: failed_count == 0,
            exit_code: if failed_count == 0 { 0 } else { 1 },
            raw_output: raw_output.into(),
            total,
            passed_count,
            failed_count,
            duration_seconds: sanitize_duration(duration_seconds),
            failures,
        }
    }

    /// Empty passing summary for output with no recognizable signal.
    pub fn empty(raw_output: impl Into<String>) -> Self {
        Self::from_counts(raw_output, 0, 0, 0, 0.0, Vec::new())
    }

    /// Synthetic summary for a run the caller had to abort.
    ///
    /// Has the same shape as a parsed result so classification and scoring
    /// need no special case.
    pub fn timeout(seconds: u64) -> Self {
        let message = format!("Test execution timed out after {seconds} seconds");
        Self {
            passed: false,
            exit_code: -1,
            raw_output: format!("{message}."),
            total: 0,
            passed_count: 0,
            failed_count: 1,
            duration_seconds: seconds as f64,
            failures: vec![FailureRecord::new(TIMEOUT_TEST_NAME, message)],
        }
    }

    /// Apply the runner's exit code and measured wall-clock duration.
    ///
    /// The measured duration only replaces a parsed one when positive.
    pub fn finalize(mut self, exit_code: i32, duration_seconds: f64) -> Self {
        self.exit_code = exit_code;
        let measured = sanitize_duration(duration_seconds);
        if measured > 0.0 {
            self.duration_seconds = measured;
        }
        self.passed = self.failed_count == 0;
        self
    }

    /// Whether this summary is the synthetic timeout result.
    pub fn is_timeout(&self) -> bool {
        self.exit_code == -1
            && self.failures.len() == 1
            && self.failures[0].test_name == TIMEOUT_TEST_NAME
    }
}

fn sanitize_duration(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}
