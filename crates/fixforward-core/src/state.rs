//! Persisted rollback state for the last applied fix.
//!
//! The store location is injected, so tests and embedders can keep state
//! wherever they like. `FileRollbackStore` writes `state.json` next to a
//! `state.digest` holding its SHA-256; a state file whose digest no longer
//! matches is rejected on load.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::{FixforwardError, Result};

const STATE_DIR_NAME: &str = ".fixforward";
const STATE_FILE: &str = "state.json";
const DIGEST_FILE: &str = "state.digest";

/// What is needed to undo a fix branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RollbackState {
    pub project_path: String,
    pub original_branch: String,
    pub fixforward_branch: String,
    /// Set when local changes were stashed before branching.
    pub stash_ref: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub files_changed: Vec<String>,
}

impl RollbackState {
    pub fn new(
        project_path: impl Into<String>,
        original_branch: impl Into<String>,
        fixforward_branch: impl Into<String>,
        files_changed: Vec<String>,
    ) -> Self {
        Self {
            project_path: project_path.into(),
            original_branch: original_branch.into(),
            fixforward_branch: fixforward_branch.into(),
            stash_ref: None,
            timestamp: Utc::now(),
            files_changed,
        }
    }

    pub fn with_stash(mut self, stash_ref: impl Into<String>) -> Self {
        self.stash_ref = Some(stash_ref.into());
        self
    }
}

/// Storage for the single current [`RollbackState`].
pub trait RollbackStore {
    /// Where the state lives, for error messages.
    fn location(&self) -> &Path;

    /// Replace any existing state.
    fn save(&self, state: &RollbackState) -> Result<()>;

    /// The current state, or `None` when nothing is recorded.
    fn load(&self) -> Result<Option<RollbackState>>;

    /// Remove the current state. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;

    /// The current state, provided it was recorded for `project`.
    fn load_for_project(&self, project: &Path) -> Result<RollbackState> {
        let state = self
            .load()?
            .ok_or_else(|| FixforwardError::NoRollbackState(self.location().to_path_buf()))?;
        if canonical(Path::new(&state.project_path)) != canonical(project) {
            return Err(FixforwardError::ProjectMismatch {
                recorded: state.project_path,
                requested: project.display().to_string(),
            });
        }
        Ok(state)
    }
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Rollback state kept as JSON in a directory.
#[derive(Debug, Clone)]
pub struct FileRollbackStore {
    dir: PathBuf,
}

impl FileRollbackStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.fixforward`.
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir().ok_or(FixforwardError::NoHomeDir)?;
        Ok(Self::new(home.join(STATE_DIR_NAME)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    fn digest_path(&self) -> PathBuf {
        self.dir.join(DIGEST_FILE)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

impl RollbackStore for FileRollbackStore {
    fn location(&self) -> &Path {
        &self.dir
    }

    fn save(&self, state: &RollbackState) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_vec_pretty(state)?;
        std::fs::write(self.state_path(), &json)?;
        std::fs::write(self.digest_path(), sha256_hex(&json))?;
        debug!(
            event = "state.saved",
            dir = %self.dir.display(),
            files = state.files_changed.len()
        );
        Ok(())
    }

    fn load(&self) -> Result<Option<RollbackState>> {
        let json = match std::fs::read(self.state_path()) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let expected = std::fs::read_to_string(self.digest_path())?;
        let actual = sha256_hex(&json);
        if expected.trim() != actual {
            return Err(FixforwardError::DigestMismatch {
                expected: expected.trim().to_string(),
                actual,
            });
        }
        Ok(Some(serde_json::from_slice(&json)?))
    }

    fn clear(&self) -> Result<()> {
        for path in [self.state_path(), self.digest_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        debug!(event = "state.cleared", dir = %self.dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(project: &Path) -> RollbackState {
        RollbackState::new(
            project.display().to_string(),
            "main",
            "fixforward/fix-1",
            vec!["calc.py".to_string()],
        )
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileRollbackStore::new(dir.path().join("state"));
        let state = sample(dir.path()).with_stash("stash@{0}");

        store.save(&state).expect("save");
        let loaded = store.load().expect("load").expect("present");
        assert_eq!(loaded, state);
        assert!(dir.path().join("state/state.digest").exists());
    }

    #[test]
    fn test_load_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileRollbackStore::new(dir.path());
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn test_tampered_state_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileRollbackStore::new(dir.path());
        store.save(&sample(dir.path())).expect("save");

        std::fs::write(dir.path().join(STATE_FILE), b"{\"tampered\": true}").expect("write");
        let err = store.load().unwrap_err();
        assert!(matches!(err, FixforwardError::DigestMismatch { .. }));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileRollbackStore::new(dir.path());
        store.save(&sample(dir.path())).expect("save");
        store.clear().expect("clear");
        store.clear().expect("clear again");
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn test_load_for_project() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = dir.path().join("project");
        let other = dir.path().join("other");
        std::fs::create_dir_all(&project).expect("mkdir");
        std::fs::create_dir_all(&other).expect("mkdir");

        let store = FileRollbackStore::new(dir.path().join("state"));
        assert!(matches!(
            store.load_for_project(&project).unwrap_err(),
            FixforwardError::NoRollbackState(_)
        ));

        store.save(&sample(&project)).expect("save");
        assert_eq!(
            store.load_for_project(&project).expect("same project").original_branch,
            "main"
        );
        assert!(matches!(
            store.load_for_project(&other).unwrap_err(),
            FixforwardError::ProjectMismatch { .. }
        ));
    }
}
