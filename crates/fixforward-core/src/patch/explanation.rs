//! Human-readable explanation recovered from an assistant response.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::ExtractConfig;
use crate::text::truncate_chars;

/// Marker patterns in priority order, with the capture group holding the
/// explanation text.
static MARKERS: LazyLock<[(Regex, usize); 2]> = LazyLock::new(|| {
    [
        (
            Regex::new(r"(?is)(?:explanation|what changed|changes made|summary):?\s*\n(.+)")
                .expect("explanation heading regex should compile"),
            1,
        ),
        (
            Regex::new(r"(?is)(?:I changed|I fixed|The fix|This fixes|The issue).+")
                .expect("explanation phrase regex should compile"),
            0,
        ),
    ]
});

/// Explanation with default limits.
pub fn extract_explanation(raw_response: &str) -> String {
    extract_explanation_with(raw_response, &ExtractConfig::default())
}

/// The text after the first marker, cut to `explanation_max_lines` lines.
/// Without a marker, the last paragraph cut to `explanation_max_chars`.
pub fn extract_explanation_with(raw_response: &str, config: &ExtractConfig) -> String {
    for (pattern, group) in MARKERS.iter() {
        if let Some(text) = pattern
            .captures(raw_response)
            .and_then(|caps| caps.get(*group))
        {
            return text
                .as_str()
                .trim()
                .lines()
                .take(config.explanation_max_lines)
                .collect::<Vec<_>>()
                .join("\n");
        }
    }

    let last_paragraph = raw_response.trim().rsplit("\n\n").next().unwrap_or("");
    truncate_chars(last_paragraph, config.explanation_max_chars).to_string()
}
