//! Patch extraction from free-form assistant responses.
//!
//! Strategies run in order and extraction stops at the first one that yields
//! a change; results are never merged across strategies:
//!
//! 1. `FILE: <path>` markers each followed by a fenced block of full content.
//! 2. Fenced `diff` blocks with a `--- a/<path>` / `+++ b/<path>` header.
//! 3. Remaining fenced blocks whose language maps to an extension,
//!    fuzzy-matched against project files of that extension.

pub mod explanation;
pub mod lookup;

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::ExtractConfig;
use crate::diff::{similarity_ratio, unified_diff};
use crate::domain::{FileChange, PatchResult};

pub use explanation::{extract_explanation, extract_explanation_with};
pub use lookup::{DirLookup, FileLookup, MemoryLookup};

static FILE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\*{0,2}FILE:\s*(.+?)\*{0,2}\s*\n\s*```\w*\n(.+?)```")
        .expect("FILE_BLOCK_RE regex should compile")
});
static DIFF_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```diff\n(.+?)```").expect("DIFF_BLOCK_RE regex should compile"));
static DIFF_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+-]{3}\s+[ab]/(.+)").expect("DIFF_PATH_RE regex should compile"));
static CODE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(\w+)\n(.+?)```").expect("CODE_BLOCK_RE regex should compile"));

/// Fence language tag to file extension.
const LANGUAGE_EXTENSIONS: [(&str, &str); 6] = [
    ("python", ".py"),
    ("py", ".py"),
    ("javascript", ".js"),
    ("js", ".js"),
    ("rust", ".rs"),
    ("rs", ".rs"),
];

type Strategy = fn(&str, &dyn FileLookup, &ExtractConfig) -> Vec<FileChange>;

/// Extraction strategies in the order they are tried.
const STRATEGIES: [(&str, Strategy); 3] = [
    ("file_markers", file_markers),
    ("diff_blocks", diff_blocks),
    ("fuzzy_match", fuzzy_match),
];

/// Extract file changes with default limits.
pub fn extract(raw_response: &str, project: &dyn FileLookup) -> Vec<FileChange> {
    extract_with(raw_response, project, &ExtractConfig::default())
}

/// Extract file changes from the first strategy that yields any.
pub fn extract_with(
    raw_response: &str,
    project: &dyn FileLookup,
    config: &ExtractConfig,
) -> Vec<FileChange> {
    for (name, strategy) in STRATEGIES {
        let changes = strategy(raw_response, project, config);
        debug!(event = "patch.strategy", strategy = name, changes = changes.len());
        if !changes.is_empty() {
            return changes;
        }
    }
    Vec::new()
}

/// Changes plus explanation, keeping the raw response for auditing.
pub fn extract_patch(
    raw_response: &str,
    project: &dyn FileLookup,
    config: &ExtractConfig,
) -> PatchResult {
    let changes = extract_with(raw_response, project, config);
    let explanation = extract_explanation_with(raw_response, config);
    crate::obs::emit_patch_extracted(changes.len(), explanation.len());
    PatchResult {
        changes,
        explanation,
        raw_response: raw_response.to_string(),
    }
}

fn file_markers(raw: &str, project: &dyn FileLookup, _config: &ExtractConfig) -> Vec<FileChange> {
    FILE_BLOCK_RE
        .captures_iter(raw)
        .filter_map(|caps| {
            let file_path = caps[1].trim().trim_matches('*').trim();
            let modified = &caps[2];
            let original = project.read(file_path).unwrap_or_default();
            if modified.trim() == original.trim() {
                debug!(event = "patch.unchanged", file = file_path);
                return None;
            }
            Some(FileChange {
                file_path: file_path.to_string(),
                diff: unified_diff(file_path, &original, modified),
                original_content: original,
                modified_content: modified.to_string(),
            })
        })
        .collect()
}

fn diff_blocks(raw: &str, _project: &dyn FileLookup, _config: &ExtractConfig) -> Vec<FileChange> {
    DIFF_BLOCK_RE
        .captures_iter(raw)
        .filter_map(|caps| {
            let diff = &caps[1];
            let path = DIFF_PATH_RE.captures(diff)?;
            Some(FileChange {
                file_path: path[1].trim().to_string(),
                original_content: String::new(),
                modified_content: String::new(),
                diff: diff.to_string(),
            })
        })
        .collect()
}

fn fuzzy_match(raw: &str, project: &dyn FileLookup, config: &ExtractConfig) -> Vec<FileChange> {
    // Blocks already attached to a `FILE:` marker are not candidates.
    let claimed: Vec<(usize, usize)> = FILE_BLOCK_RE
        .find_iter(raw)
        .map(|m| (m.start(), m.end()))
        .collect();

    let mut changes = Vec::new();
    for caps in CODE_BLOCK_RE.captures_iter(raw) {
        let start = caps.get(0).map_or(0, |m| m.start());
        if claimed.iter().any(|&(lo, hi)| (lo..hi).contains(&start)) {
            continue;
        }
        let Some(ext) = extension_for(&caps[1]) else {
            continue;
        };
        let content = &caps[2];
        for file_path in project.files_with_extension(ext) {
            let Some(original) = project.read(&file_path) else {
                continue;
            };
            if original.trim() == content.trim() {
                break;
            }
            let ratio = similarity_ratio(&original, content);
            if config.similarity_floor < ratio && ratio < config.similarity_ceiling {
                debug!(event = "patch.fuzzy_match", file = %file_path, ratio);
                changes.push(FileChange {
                    diff: unified_diff(&file_path, &original, content),
                    file_path,
                    original_content: original,
                    modified_content: content.to_string(),
                });
                break;
            }
        }
    }
    changes
}

fn extension_for(language: &str) -> Option<&'static str> {
    LANGUAGE_EXTENSIONS
        .iter()
        .find(|(lang, _)| *lang == language)
        .map(|(_, ext)| *ext)
}
