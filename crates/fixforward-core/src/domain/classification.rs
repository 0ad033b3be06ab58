//! Failure categories and classified failures.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::run::FailureRecord;

/// Failure category, listed in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    SyntaxError,
    Dependency,
    EnvMismatch,
    ApiChange,
    Lint,
    FlakyTest,
    Assertion,
    Unknown,
}

impl FailureCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SyntaxError => "syntax_error",
            Self::Dependency => "dependency",
            Self::EnvMismatch => "env_mismatch",
            Self::ApiChange => "api_change",
            Self::Lint => "lint",
            Self::FlakyTest => "flaky_test",
            Self::Assertion => "assertion",
            Self::Unknown => "unknown",
        }
    }

    /// Three-letter tag for compact listings.
    pub fn short_tag(self) -> &'static str {
        match self {
            Self::SyntaxError => "SYN",
            Self::Dependency => "PKG",
            Self::EnvMismatch => "ENV",
            Self::ApiChange => "API",
            Self::Lint => "LNT",
            Self::FlakyTest => "FLK",
            Self::Assertion => "AST",
            Self::Unknown => "???",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure with exactly one assigned category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifiedFailure {
    pub failure: FailureRecord,
    pub category: FailureCategory,
    /// In `[0, 1]`.
    pub confidence: f64,
    /// One-line human-readable summary.
    pub summary: String,
}
