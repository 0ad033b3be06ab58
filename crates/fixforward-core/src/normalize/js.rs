//! `npm test` output from Jest or Mocha.
//!
//! Jest is recognized by its `Tests: ... N total` line, Mocha by its
//! `N passing` / `N failing` prose. Per-failure detail is read from a bounded
//! window after each failure title so a later test's stack trace is never
//! attributed to an earlier one. Output matching neither yields at most one
//! opaque failure.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::Normalizer;
use crate::config::NormalizeConfig;
use crate::domain::{Ecosystem, FailureRecord, RunSummary};
use crate::text::{truncate_chars, window_after};

static JEST_SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*Tests:\s+(.*?\d+\s+total.*)$").expect("JEST_SUMMARY_RE regex should compile")
});
static JEST_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+(failed|passed|total)\b").expect("JEST_COUNT_RE regex should compile")
});
static JEST_FAIL_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*FAIL\s+(.+?)\s*$").expect("JEST_FAIL_FILE_RE regex should compile")
});
static JEST_TEST_FAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s+[✕×✗]\s+(.+?)(?:\s+\((\d+)\s*ms\))?\s*$")
        .expect("JEST_TEST_FAIL_RE regex should compile")
});
static JEST_EXPECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)Expected:?[ \t]*(.+?)\s*$").expect("JEST_EXPECT_RE regex should compile")
});
static JEST_RECEIVED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)Received:?[ \t]*(.+?)\s*$").expect("JEST_RECEIVED_RE regex should compile")
});
static JEST_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Time:\s+(\d+(?:\.\d+)?)\s*s").expect("JEST_TIME_RE regex should compile")
});
/// `at fn (file:line:col)` or `at file:line:col`.
static STACK_AT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bat\s+(?:[^\n(]*\()?([^\s()]+):(\d+):\d+").expect("STACK_AT_RE regex should compile")
});

static MOCHA_PASSING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+passing(?:\s*\((\d+)(ms|s)\))?").expect("MOCHA_PASSING_RE regex should compile")
});
static MOCHA_FAILING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+failing").expect("MOCHA_FAILING_RE regex should compile"));
static MOCHA_FAIL_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s+\d+\)\s+(.+?)\s*$").expect("MOCHA_FAIL_TITLE_RE regex should compile")
});
static ERROR_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s+(?:AssertionError|Error|TypeError|ReferenceError).+$")
        .expect("ERROR_CLASS_RE regex should compile")
});

const FALLBACK_MARKERS: [&str; 3] = ["FAIL", "ERR!", "Error"];
const UNKNOWN_TEST_NAME: &str = "<unknown>";

/// Normalizer for Jest and Mocha output.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsNormalizer;

impl Normalizer for JsNormalizer {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Node
    }

    fn normalize_with(&self, raw_output: &str, config: &NormalizeConfig) -> RunSummary {
        if let Some(summary) = JEST_SUMMARY_RE.captures(raw_output) {
            debug!(event = "normalize.dialect", ecosystem = "node", format = "jest");
            return parse_jest(raw_output, &summary[1], config);
        }

        let passing = MOCHA_PASSING_RE.captures(raw_output);
        let failing = MOCHA_FAILING_RE.captures(raw_output);
        if passing.is_some() || failing.is_some() {
            debug!(event = "normalize.dialect", ecosystem = "node", format = "mocha");
            return parse_mocha(raw_output, passing, failing, config);
        }

        debug!(event = "normalize.dialect", ecosystem = "node", format = "coarse");
        coarse_fallback(raw_output, config)
    }
}

fn parse_jest(raw_output: &str, summary: &str, config: &NormalizeConfig) -> RunSummary {
    let (mut failed, mut passed, mut total) = (0, 0, 0);
    for caps in JEST_COUNT_RE.captures_iter(summary) {
        let n: u32 = caps[1].parse().unwrap_or(0);
        match &caps[2] {
            "failed" => failed = n,
            "passed" => passed = n,
            _ => total = n,
        }
    }

    let duration = JEST_TIME_RE
        .captures(raw_output)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0.0);

    let fail_files: Vec<(usize, &str)> = JEST_FAIL_FILE_RE
        .captures_iter(raw_output)
        .filter_map(|c| c.get(1).map(|m| (m.start(), m.as_str())))
        .collect();

    let failures = JEST_TEST_FAIL_RE
        .captures_iter(raw_output)
        .map(|caps| {
            let title = caps.get(1).map_or("", |m| m.as_str().trim());
            let end = caps.get(0).map_or(0, |m| m.end());
            // The nearest preceding `FAIL <file>` header owns this test.
            let suite_file = fail_files
                .iter()
                .rev()
                .find(|(pos, _)| *pos < end)
                .map_or("", |(_, file)| *file);

            let window = window_after(raw_output, end, config.detail_window);
            let (file_path, line_number) = match stack_location(window) {
                Some((file, line)) => (file, Some(line)),
                None => (suite_file.to_string(), None),
            };

            FailureRecord::new(title, jest_message(window))
                .with_file(file_path)
                .with_line(line_number)
                .with_output(truncate_chars(window, config.detail_excerpt))
        })
        .collect();

    RunSummary::from_counts(raw_output, passed, failed, total, duration, failures)
}

fn jest_message(window: &str) -> String {
    let expected = JEST_EXPECT_RE.captures(window).map(|c| c[1].to_string());
    let received = JEST_RECEIVED_RE.captures(window).map(|c| c[1].to_string());
    match (expected, received) {
        (Some(e), Some(r)) => format!("Expected {e}, received {r}"),
        (Some(e), None) => format!("Expected {e}"),
        _ => ERROR_CLASS_RE
            .find(window)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
    }
}

fn parse_mocha(
    raw_output: &str,
    passing: Option<regex::Captures<'_>>,
    failing: Option<regex::Captures<'_>>,
    config: &NormalizeConfig,
) -> RunSummary {
    let passed: u32 = passing
        .as_ref()
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);
    let failed: u32 = failing
        .as_ref()
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);
    let duration = passing.as_ref().map_or(0.0, mocha_duration);

    // Titles are printed once inline and again in the detail section after
    // `N failing`; the detail copy is the one followed by the error.
    let detail_start = failing.as_ref().and_then(|c| c.get(0)).map_or(0, |m| m.end());
    let mut titles: Vec<_> = MOCHA_FAIL_TITLE_RE
        .captures_iter(&raw_output[detail_start..])
        .filter_map(|c| c.get(1).map(|m| (detail_start + m.end(), m.as_str())))
        .collect();
    if titles.is_empty() {
        titles = MOCHA_FAIL_TITLE_RE
            .captures_iter(raw_output)
            .filter_map(|c| c.get(1).map(|m| (m.end(), m.as_str())))
            .collect();
    }

    let failures = titles
        .into_iter()
        .map(|(title_end, title)| {
            let (title, end) = mocha_leaf_title(raw_output, title, title_end);
            let window = window_after(raw_output, end, config.detail_window);
            let message = ERROR_CLASS_RE
                .find(window)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            let (file_path, line_number) = match stack_location(window) {
                Some((file, line)) => (file, Some(line)),
                None => (String::new(), None),
            };
            FailureRecord::new(title, message)
                .with_file(file_path)
                .with_line(line_number)
                .with_output(truncate_chars(window, config.detail_excerpt))
        })
        .collect();

    RunSummary::from_counts(
        raw_output,
        passed,
        failed,
        passed.saturating_add(failed),
        duration,
        failures,
    )
}

/// The failing test's own title and the offset where it ends.
///
/// The detail section prints `N) <suite>` and then the nested titles on
/// deeper-indented lines, the test itself last and followed by `:`.
fn mocha_leaf_title<'a>(
    raw_output: &'a str,
    title: &'a str,
    title_end: usize,
) -> (&'a str, usize) {
    let line_start = raw_output[..title_end].rfind('\n').map_or(0, |i| i + 1);
    let indent = indent_width(&raw_output[line_start..title_end]);

    let (mut leaf, mut end) = (title, title_end);
    let mut pieces = raw_output[title_end..].split_inclusive('\n');
    let mut offset = title_end + pieces.next().map_or(0, str::len);
    for piece in pieces {
        let text = piece.trim();
        if text.is_empty()
            || indent_width(piece) <= indent
            || ERROR_CLASS_RE.is_match(piece)
            || MOCHA_FAIL_TITLE_RE.is_match(piece)
        {
            break;
        }
        leaf = text;
        end = offset + piece.trim_end().len();
        offset += piece.len();
    }
    (leaf.trim_end_matches(':').trim_end(), end)
}

fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn mocha_duration(caps: &regex::Captures<'_>) -> f64 {
    let Some(value) = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok()) else {
        return 0.0;
    };
    match caps.get(3).map(|m| m.as_str()) {
        Some("ms") => value / 1000.0,
        _ => value,
    }
}

/// One opaque failure when the text carries a failure marker, none otherwise.
fn coarse_fallback(raw_output: &str, config: &NormalizeConfig) -> RunSummary {
    let failed = FALLBACK_MARKERS.iter().any(|m| raw_output.contains(m));
    if !failed {
        return RunSummary::empty(raw_output);
    }
    let prefix = truncate_chars(raw_output, config.opaque_failure_prefix);
    let failure = FailureRecord::new(UNKNOWN_TEST_NAME, prefix).with_output(prefix);
    RunSummary::from_counts(raw_output, 0, 1, 0, 0.0, vec![failure])
}

fn stack_location(window: &str) -> Option<(String, u32)> {
    let caps = STACK_AT_RE.captures(window)?;
    let line = caps[2].parse().ok()?;
    Some((caps[1].to_string(), line))
}
