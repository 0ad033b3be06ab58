//! Error taxonomy for the I/O seams of FixForward.
//!
//! Parsing, classification, extraction and scoring are total and never
//! produce these; only file lookup, patch application, state persistence and
//! config loading do.

use std::path::PathBuf;

/// FixForward errors.
#[derive(Debug, thiserror::Error)]
pub enum FixforwardError {
    #[error("unknown ecosystem: {0}")]
    UnknownEcosystem(String),

    #[error("no rollback state found at {0}")]
    NoRollbackState(PathBuf),

    #[error("could not determine the home directory")]
    NoHomeDir,

    #[error("rollback state is for project {recorded}, not {requested}")]
    ProjectMismatch { recorded: String, requested: String },

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("patch does not apply: {0}")]
    InvalidPatch(String),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for FixForward I/O operations.
pub type Result<T> = std::result::Result<T, FixforwardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FixforwardError::UnknownEcosystem("cobol".to_string());
        assert!(err.to_string().contains("unknown ecosystem"));
        assert!(err.to_string().contains("cobol"));

        let err = FixforwardError::NoRollbackState(PathBuf::from("/tmp/state"));
        assert!(err.to_string().contains("/tmp/state"));
    }

    #[test]
    fn test_project_mismatch_error() {
        let err = FixforwardError::ProjectMismatch {
            recorded: "/work/a".to_string(),
            requested: "/work/b".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/work/a"));
        assert!(msg.contains("/work/b"));
    }

    #[test]
    fn test_digest_mismatch_error() {
        let err = FixforwardError::DigestMismatch {
            expected: "abc123".to_string(),
            actual: "def456".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("abc123"));
        assert!(msg.contains("def456"));
    }
}
