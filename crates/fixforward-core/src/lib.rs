//! FixForward Core Library
//!
//! Turns raw test-runner output into structured failures, classifies them,
//! recovers file changes from an assistant's free-form reply, and scores a
//! fix by comparing test runs before and after it was applied.
//!
//! ```ignore
//! use fixforward_core::{classify_all, normalize, Ecosystem};
//!
//! let summary = normalize(Ecosystem::Python, &raw_output);
//! let classified = classify_all(&summary.failures);
//! ```

pub mod classify;
pub mod config;
pub mod diff;
pub mod domain;
pub mod normalize;
pub mod obs;
pub mod patch;
pub mod prompt;
pub mod report;
pub mod state;
pub mod telemetry;
pub mod verify;

mod text;

pub use classify::{classify, classify_all, CategoryRules, RULES};
pub use config::{ExtractConfig, FixforwardConfig, NormalizeConfig, PromptConfig};
pub use diff::{apply_unified_diff, similarity_ratio, unified_diff};
pub use domain::{
    ClassifiedFailure, Ecosystem, FailureCategory, FailureRecord, FileChange, FixforwardError,
    PatchResult, Result, RunSummary, VerifyResult, TIMEOUT_TEST_NAME,
};
pub use normalize::{
    normalize, normalize_run, CargoTestNormalizer, JsNormalizer, Normalizer, PytestNormalizer,
};
pub use patch::{
    extract, extract_explanation, extract_patch, extract_with, DirLookup, FileLookup, MemoryLookup,
};
pub use prompt::{build_explain_prompt, build_fix_prompt};
pub use report::{diagnostics_json, render_pr_report, DiagnosticEntry, PrReport};
pub use state::{FileRollbackStore, RollbackState, RollbackStore};
pub use verify::{score, summary_diff, verify};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
