//! Read access to the project being fixed.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

/// Project files as seen by the extractor.
///
/// Paths are project-relative with `/` separators.
pub trait FileLookup {
    /// Current content of `path`, or `None` when it does not exist or
    /// cannot be read.
    fn read(&self, path: &str) -> Option<String>;

    /// Every file whose name ends with `ext` (for example `".py"`), sorted.
    fn files_with_extension(&self, ext: &str) -> Vec<String>;
}

/// Directory names never descended into.
const IGNORED_DIRS: [&str; 9] = [
    "target",
    "node_modules",
    "dist",
    "build",
    "vendor",
    "__pycache__",
    ".git",
    ".venv",
    ".pytest_cache",
];

/// A project rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct DirLookup {
    root: PathBuf,
}

impl DirLookup {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a relative path without leaving the root.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return None;
        }
        Some(self.root.join(relative))
    }
}

fn is_ignored(name: &str) -> bool {
    IGNORED_DIRS.contains(&name) || name.starts_with('.')
}

impl FileLookup for DirLookup {
    fn read(&self, path: &str) -> Option<String> {
        let full = self.resolve(path)?;
        std::fs::read_to_string(full).ok()
    }

    fn files_with_extension(&self, ext: &str) -> Vec<String> {
        let mut files: Vec<String> = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || !is_ignored(&e.file_name().to_string_lossy())
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.file_name().to_string_lossy().ends_with(ext))
            .filter_map(|e| {
                let rel = e.path().strip_prefix(&self.root).ok()?;
                let parts: Vec<String> = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                Some(parts.join("/"))
            })
            .collect();
        files.sort();
        files
    }
}

/// An in-memory project.
#[derive(Debug, Clone, Default)]
pub struct MemoryLookup {
    files: BTreeMap<String, String>,
}

impl MemoryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl FileLookup for MemoryLookup {
    fn read(&self, path: &str) -> Option<String> {
        self.files.get(path.trim()).cloned()
    }

    fn files_with_extension(&self, ext: &str) -> Vec<String> {
        self.files
            .keys()
            .filter(|path| path.ends_with(ext))
            .cloned()
            .collect()
    }
}
