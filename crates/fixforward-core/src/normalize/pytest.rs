//! pytest output (`-v --tb=long`).
//!
//! Counts come from the last `N failed, M passed in Ts` summary line. Failures
//! come from the short test summary section, then from `FAILED` lines anywhere
//! in the body, then from verbose per-test status lines, and finally from
//! collection-error blocks when a whole file failed to import.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::Normalizer;
use crate::config::NormalizeConfig;
use crate::domain::{Ecosystem, FailureRecord, RunSummary};
use crate::text::tail_lines;

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[=\s]*(\d+\s+\w+(?:,\s*\d+\s+\w+)*)\s+in\s+(\d+(?:\.\d+)?)s\b")
        .expect("SUMMARY_RE regex should compile")
});
static FAILED_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+failed\b").expect("FAILED_COUNT_RE regex should compile"));
static PASSED_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+passed\b").expect("PASSED_COUNT_RE regex should compile"));
static ERROR_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+errors?\b").expect("ERROR_COUNT_RE regex should compile"));
static SHORT_SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"=+\s*short test summary info\s*=+").expect("SHORT_SUMMARY_RE regex should compile")
});
static FAILED_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*FAILED\s+(.+?)::(.+?)(?:\s+-\s+(.*))?\s*$")
        .expect("FAILED_LINE_RE regex should compile")
});
static ERROR_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*ERROR\s+(.+?)::(.+?)(?:\s+-\s+(.*))?\s*$")
        .expect("ERROR_LINE_RE regex should compile")
});
static ERROR_COLLECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*ERROR\s+(?:collecting\s+)?(\S+\.py)(?:\s+-\s+.*)?\s*$")
        .expect("ERROR_COLLECT_RE regex should compile")
});
static STATUS_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+?\.py)::(\S+)\s+(PASSED|FAILED|ERROR)\b")
        .expect("STATUS_LINE_RE regex should compile")
});
static TRACEBACK_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\S+\.py):(\d+):").expect("TRACEBACK_FILE_RE regex should compile")
});

const DEGRADED_MESSAGE: &str = "(see raw output)";
const COLLECTION_ERROR_MESSAGE: &str = "(collection error)";

/// Normalizer for pytest's verbose, long-traceback output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PytestNormalizer;

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    passed: u32,
    failed: u32,
    errors: u32,
    duration: f64,
}

impl Normalizer for PytestNormalizer {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Python
    }

    fn normalize_with(&self, raw_output: &str, config: &NormalizeConfig) -> RunSummary {
        let lines: Vec<&str> = raw_output
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .collect();

        let counts = find_summary(&lines).unwrap_or_else(|| count_status_lines(&lines));

        let mut failures = short_summary_failures(&lines);
        if failures.is_empty() && counts.failed > 0 {
            failures = body_failures(&lines);
        }
        if failures.is_empty() && counts.failed > 0 {
            debug!(
                event = "normalize.degraded",
                ecosystem = "python",
                "no FAILED lines found; using verbose status lines"
            );
            failures = degraded_failures(&lines);
        }
        if failures.is_empty() && counts.errors > 0 {
            failures = collection_errors(&lines, config);
        }

        // Errors (setup, teardown, collection) count as failures.
        let failed = counts.failed.saturating_add(counts.errors);
        let total = counts.passed.saturating_add(failed);

        RunSummary::from_counts(
            raw_output,
            counts.passed,
            failed,
            total,
            counts.duration,
            failures,
        )
    }
}

/// The last summary line wins; earlier ones are usually plugin noise.
fn find_summary(lines: &[&str]) -> Option<Counts> {
    lines.iter().rev().find_map(|line| {
        let caps = SUMMARY_RE.captures(line)?;
        let text = caps.get(1).map_or("", |m| m.as_str());
        let grab = |re: &Regex| {
            re.captures(text)
                .and_then(|c| c[1].parse::<u32>().ok())
                .unwrap_or(0)
        };
        Some(Counts {
            passed: grab(&*PASSED_COUNT_RE),
            failed: grab(&*FAILED_COUNT_RE),
            errors: grab(&*ERROR_COUNT_RE),
            duration: caps[2].parse().unwrap_or(0.0),
        })
    })
}

fn count_status_lines(lines: &[&str]) -> Counts {
    let mut counts = Counts::default();
    let mut seen_status = false;
    for line in lines {
        if let Some(caps) = STATUS_LINE_RE.captures(line) {
            seen_status = true;
            match &caps[3] {
                "PASSED" => counts.passed = counts.passed.saturating_add(1),
                "FAILED" => counts.failed = counts.failed.saturating_add(1),
                _ => counts.errors = counts.errors.saturating_add(1),
            }
        }
    }
    if seen_status {
        return counts;
    }
    // Without verbose lines only the short summary entries are left.
    for line in lines {
        if FAILED_LINE_RE.is_match(line) {
            counts.failed = counts.failed.saturating_add(1);
        } else if ERROR_LINE_RE.is_match(line) {
            counts.errors = counts.errors.saturating_add(1);
        }
    }
    counts
}

fn short_summary_failures(lines: &[&str]) -> Vec<FailureRecord> {
    let Some(start) = lines.iter().position(|l| SHORT_SUMMARY_RE.is_match(l)) else {
        return Vec::new();
    };

    let mut failures = Vec::new();
    for line in &lines[start + 1..] {
        if let Some(caps) = FAILED_LINE_RE.captures(line) {
            failures.push(failed_record(lines, &caps));
        } else if let Some(caps) = ERROR_LINE_RE.captures(line) {
            let message = caps.get(3).map_or("", |m| m.as_str().trim());
            failures.push(FailureRecord::new(&caps[2], message).with_file(&caps[1]));
        }
    }
    failures
}

fn body_failures(lines: &[&str]) -> Vec<FailureRecord> {
    lines
        .iter()
        .filter_map(|line| FAILED_LINE_RE.captures(line))
        .map(|caps| failed_record(lines, &caps))
        .collect()
}

fn failed_record(lines: &[&str], caps: &regex::Captures<'_>) -> FailureRecord {
    let file_path = &caps[1];
    let test_name = &caps[2];
    let message = caps.get(3).map_or("", |m| m.as_str().trim());
    let block = traceback_block(lines, test_name);
    FailureRecord::new(test_name, message)
        .with_file(file_path)
        .with_line(last_frame_line(&block))
        .with_output(block.join("\n"))
}

fn degraded_failures(lines: &[&str]) -> Vec<FailureRecord> {
    let mut seen = HashSet::new();
    let mut failures = Vec::new();
    for line in lines {
        let Some(caps) = STATUS_LINE_RE.captures(line) else {
            continue;
        };
        if &caps[3] != "FAILED" || !seen.insert(caps[2].to_string()) {
            continue;
        }
        let block = traceback_block(lines, &caps[2]);
        failures.push(
            FailureRecord::new(&caps[2], DEGRADED_MESSAGE)
                .with_file(&caps[1])
                .with_line(last_frame_line(&block))
                .with_output(block.join("\n")),
        );
    }
    failures
}

/// One record per file that failed to import, de-duplicated and capped.
fn collection_errors(lines: &[&str], config: &NormalizeConfig) -> Vec<FailureRecord> {
    let mut seen = HashSet::new();
    let mut failures = Vec::new();
    for line in lines {
        if failures.len() >= config.collection_error_cap {
            break;
        }
        let Some(caps) = ERROR_COLLECT_RE.captures(line) else {
            continue;
        };
        let file_path = caps[1].to_string();
        if !seen.insert(file_path.clone()) {
            continue;
        }
        let (message, detail) = collection_error_block(lines, &file_path, config);
        failures.push(
            FailureRecord::new(format!("collect: {file_path}"), message)
                .with_file(file_path)
                .with_output(detail),
        );
    }
    failures
}

fn collection_error_block(
    lines: &[&str],
    file_path: &str,
    config: &NormalizeConfig,
) -> (String, String) {
    let marker = format!("ERROR collecting {file_path}");
    let mut block = Vec::new();
    let mut message = String::new();
    let mut capturing = false;

    for line in lines {
        if !capturing {
            capturing = line.contains(&marker) && line.contains("___");
            continue;
        }
        if is_section_rule(line) || (line.starts_with('_') && line.contains("ERROR collecting")) {
            break;
        }
        block.push(*line);
        let stripped = line.trim();
        if stripped.starts_with("E   ") || stripped.starts_with("E\t") {
            message = stripped[1..].trim().to_string();
        }
    }

    if message.is_empty() {
        message = COLLECTION_ERROR_MESSAGE.to_string();
    }
    (message, tail_lines(&block, config.collection_error_tail))
}

/// Lines of the `____ test_name ____` block, excluding the header.
fn traceback_block<'a>(lines: &[&'a str], test_name: &str) -> Vec<&'a str> {
    let mut block = Vec::new();
    let mut capturing = false;
    for line in lines {
        if !capturing {
            capturing = is_block_header_for(line, test_name);
            continue;
        }
        if is_section_rule(line) || (is_block_header(line) && !is_block_header_for(line, test_name))
        {
            break;
        }
        block.push(*line);
    }
    block
}

fn is_section_rule(line: &str) -> bool {
    line.starts_with('=') && line.len() > 10
}

/// A `____ name ____` separator; `_ _ _ _` frame rules have no name.
fn is_block_header(line: &str) -> bool {
    line.starts_with('_') && !line.trim_matches(|c| c == '_' || c == ' ').is_empty()
}

fn is_block_header_for(line: &str, test_name: &str) -> bool {
    if !line.starts_with('_') {
        return false;
    }
    // Class-based tests are reported as `Cls::test` but headed as `Cls.test`.
    let dotted = test_name.replace("::", ".");
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    [test_name, dotted.as_str()].iter().any(|name| {
        line.contains(&format!("__ {name} __"))
            || compact.contains(&format!("__{}__", name.replace(' ', "")))
    })
}

fn last_frame_line(block: &[&str]) -> Option<u32> {
    block
        .iter()
        .filter_map(|line| TRACEBACK_FILE_RE.captures_iter(line).last())
        .last()
        .and_then(|caps| caps[2].parse().ok())
}
