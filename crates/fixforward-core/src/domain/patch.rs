//! Proposed file changes extracted from assistant output.

use serde::{Deserialize, Serialize};

/// A single proposed change to one file.
///
/// Extractors only emit a change when the trimmed new content differs from
/// the trimmed original. Changes recovered from a bare diff carry empty
/// `original_content` / `modified_content`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileChange {
    pub file_path: String,
    pub original_content: String,
    pub modified_content: String,
    /// Unified diff text.
    pub diff: String,
}

impl FileChange {
    /// Whether full before/after content is available (not diff-only).
    pub fn has_content(&self) -> bool {
        !(self.original_content.is_empty() && self.modified_content.is_empty())
    }
}

/// Everything recovered from one assistant response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatchResult {
    pub changes: Vec<FileChange>,
    pub explanation: String,
    /// Full response text, kept for auditing.
    pub raw_response: String,
}

impl PatchResult {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Paths of all changed files, in extraction order.
    pub fn files_changed(&self) -> Vec<String> {
        self.changes.iter().map(|c| c.file_path.clone()).collect()
    }
}
