//! Domain models for FixForward.
//!
//! Value objects passed between pipeline stages:
//! - `FailureRecord` / `RunSummary`: normalized test-run output
//! - `ClassifiedFailure`: a failure with its category and confidence
//! - `FileChange` / `PatchResult`: proposed edits from an assistant response
//! - `VerifyResult`: before/after comparison with a confidence score

pub mod classification;
pub mod ecosystem;
pub mod error;
pub mod patch;
pub mod run;
pub mod verification;

pub use classification::{ClassifiedFailure, FailureCategory};
pub use ecosystem::Ecosystem;
pub use error::{FixforwardError, Result};
pub use patch::{FileChange, PatchResult};
pub use run::{FailureRecord, RunSummary, TIMEOUT_TEST_NAME};
pub use verification::VerifyResult;
