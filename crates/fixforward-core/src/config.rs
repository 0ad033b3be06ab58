//! Tunable limits for normalization, extraction and prompting.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides:
//!
//! ```toml
//! [normalize]
//! collection_error_cap = 10
//!
//! [extract]
//! similarity_floor = 0.6
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::Result;

/// Bounds applied while scanning raw test output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Characters scanned after a JS failure title for stack and expectation text.
    pub detail_window: usize,

    /// Characters of that window kept as the record's detail.
    pub detail_excerpt: usize,

    /// Maximum collection-error records per run.
    pub collection_error_cap: usize,

    /// Trailing lines of a collection-error block kept as detail.
    pub collection_error_tail: usize,

    /// Characters of raw output used as the message of an opaque failure.
    pub opaque_failure_prefix: usize,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            detail_window: 1000,
            detail_excerpt: 500,
            collection_error_cap: 5,
            collection_error_tail: 20,
            opaque_failure_prefix: 500,
        }
    }
}

/// Bounds for patch and explanation extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Exclusive lower bound for a fuzzy file match.
    pub similarity_floor: f64,

    /// Exclusive upper bound for a fuzzy file match (at or above means unchanged).
    pub similarity_ceiling: f64,

    /// Lines kept from a marked explanation.
    pub explanation_max_lines: usize,

    /// Characters kept from a fallback last-paragraph explanation.
    pub explanation_max_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            similarity_floor: 0.5,
            similarity_ceiling: 1.0,
            explanation_max_lines: 10,
            explanation_max_chars: 500,
        }
    }
}

/// Limits for prompts sent to the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Classified failures included in a fix prompt.
    pub max_failures: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { max_failures: 3 }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixforwardConfig {
    pub normalize: NormalizeConfig,
    pub extract: ExtractConfig,
    pub prompt: PromptConfig,
}

impl FixforwardConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
