//! Rule-based failure classification.
//!
//! Categories are tried in table order and, within a category, patterns in
//! list order. The first pattern that matches `error_message + "\n" +
//! full_output` decides the category, the confidence and the summary. A
//! literal dependency error therefore always outranks a generic assertion
//! phrase found in the same text.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::domain::{ClassifiedFailure, FailureCategory, FailureRecord};
use crate::text::truncate_chars;

/// Confidence assigned when no rule matches.
pub const UNKNOWN_CONFIDENCE: f64 = 0.30;

/// Characters of the error message used as the summary of an unknown failure.
pub const UNKNOWN_SUMMARY_CHARS: usize = 80;

const UNKNOWN_SUMMARY: &str = "Unknown error";

/// One category's patterns, in priority order.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRules {
    pub category: FailureCategory,
    pub confidence: f64,
    /// `(pattern, summary template)`. Templates use `{0}`, `{1}` for groups.
    pub rules: &'static [(&'static str, &'static str)],
}

/// The classification table. Order is significant at both levels.
pub const RULES: &[CategoryRules] = &[
    CategoryRules {
        category: FailureCategory::SyntaxError,
        confidence: 0.95,
        rules: &[
            (r"SyntaxError:\s*(.+)", "Syntax error: {0}"),
            (r"IndentationError:\s*(.+)", "Indentation error: {0}"),
            (r"Unexpected token\s*(.+)", "Unexpected token: {0}"),
            (r"parse error", "Parse error"),
            (r"expected\s+.+,\s+found\s+(.+)", "Expected/found mismatch: {0}"),
        ],
    },
    CategoryRules {
        category: FailureCategory::Dependency,
        confidence: 0.90,
        rules: &[
            (r"ModuleNotFoundError:\s*No module named '(\S+)'", "Missing module: {0}"),
            (r"ImportError:\s*(.+)", "Import error: {0}"),
            (r"Cannot find module '(\S+)'", "Missing Node module: {0}"),
            (r"No module named '?([^\s']+)'?", "Missing module: {0}"),
            (r"unresolved import `(\S+)`", "Unresolved import: {0}"),
            (r"package `(\S+)`.+not found", "Missing Rust crate: {0}"),
            (r"Could not find a version that satisfies", "Dependency version conflict"),
        ],
    },
    CategoryRules {
        category: FailureCategory::EnvMismatch,
        confidence: 0.80,
        rules: &[
            (r"version mismatch", "Version mismatch"),
            (r"requires Python\s*([\d.]+)", "Requires Python {0}"),
            (r"engine .+ is incompatible", "Engine incompatible"),
            (r"ENOENT.+?'(\S+)'", "Command not found: {0}"),
            (r"command not found:\s*(\S+)", "Command not found: {0}"),
            (r"minimum supported rust version", "Rust version too old"),
        ],
    },
    CategoryRules {
        category: FailureCategory::ApiChange,
        confidence: 0.85,
        rules: &[
            (
                r"AttributeError:\s*'?(\w+)'?\s+object has no attribute '(\w+)'",
                "{0} has no attribute '{1}'",
            ),
            (
                r"TypeError:\s*(\w+)\(\) (?:got an unexpected|missing \d+ required|takes \d+)",
                "Wrong arguments for {0}()",
            ),
            (r"missing \d+ required (?:positional )?argument", "Missing required argument"),
            (r"has no member named `(\w+)`", "No member: {0}"),
            (r"no method named `(\w+)`", "No method: {0}"),
            (r"is not a function", "Not a function"),
            (r"is not defined", "Not defined"),
        ],
    },
    CategoryRules {
        category: FailureCategory::Lint,
        confidence: 0.75,
        rules: &[
            (r"flake8", "Flake8 lint error"),
            (r"eslint", "ESLint error"),
            (r"clippy", "Clippy warning"),
            (r"warning\[(\w+)\]", "Compiler warning: {0}"),
            (r"formatting.+differ", "Formatting difference"),
        ],
    },
    CategoryRules {
        category: FailureCategory::FlakyTest,
        confidence: 0.60,
        rules: &[
            (r"timeout|timed?\s*out", "Test timed out"),
            (r"flaky", "Flaky test"),
            (r"intermittent", "Intermittent failure"),
            (r"connection refused", "Connection refused"),
            (r"ECONNRESET", "Connection reset"),
            (r"Resource temporarily unavailable", "Resource unavailable"),
        ],
    },
    CategoryRules {
        category: FailureCategory::Assertion,
        confidence: 0.85,
        rules: &[
            (r"AssertionError:\s*assert\s+(.+)", "Assertion failed: {0}"),
            (r"AssertionError:\s*(.+)", "Assertion: {0}"),
            (r"assert\s+[\d.]+\s*==\s*[\d.]+", "Assertion: value mismatch"),
            (r"assert\s+(.+?)\s*==\s*(.+)", "Assertion: {0} != {1}"),
            (
                r"assert_eq!.+left:\s*`(.+?)`,\s*right:\s*`(.+?)`",
                "assert_eq! left={0}, right={1}",
            ),
            (r"expect\(.+\)\.to(?:Equal|Be)\((.+?)\)", "Expected {0}"),
            (r"Expected\s+(.+?)\s+to (?:equal|be)\s+(.+)", "Expected {1}, got {0}"),
            (r"expected:\s*(.+?)\s+but was:\s*(.+)", "Expected {0}, got {1}"),
            (r"!=\s", "Value mismatch"),
            (r"AssertionError", "Assertion error"),
        ],
    },
];

struct CompiledRule {
    pattern: Regex,
    template: &'static str,
}

struct CompiledCategory {
    category: FailureCategory,
    confidence: f64,
    rules: Vec<CompiledRule>,
}

static COMPILED: LazyLock<Vec<CompiledCategory>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|table| CompiledCategory {
            category: table.category,
            confidence: table.confidence,
            rules: table
                .rules
                .iter()
                .map(|(pattern, template)| CompiledRule {
                    pattern: Regex::new(&format!("(?i){pattern}"))
                        .expect("classification rule regex should compile"),
                    template,
                })
                .collect(),
        })
        .collect()
});

/// Assign exactly one category to a failure.
pub fn classify(failure: &FailureRecord) -> ClassifiedFailure {
    let text = format!("{}\n{}", failure.error_message, failure.full_output);

    for table in COMPILED.iter() {
        for rule in &table.rules {
            if let Some(caps) = rule.pattern.captures(&text) {
                return ClassifiedFailure {
                    failure: failure.clone(),
                    category: table.category,
                    confidence: table.confidence,
                    summary: render_template(rule.template, &caps),
                };
            }
        }
    }

    let summary = if failure.error_message.is_empty() {
        UNKNOWN_SUMMARY.to_string()
    } else {
        truncate_chars(&failure.error_message, UNKNOWN_SUMMARY_CHARS).to_string()
    };
    ClassifiedFailure {
        failure: failure.clone(),
        category: FailureCategory::Unknown,
        confidence: UNKNOWN_CONFIDENCE,
        summary,
    }
}

/// Classify every failure, preserving order.
pub fn classify_all(failures: &[FailureRecord]) -> Vec<ClassifiedFailure> {
    let classified: Vec<_> = failures.iter().map(classify).collect();
    for item in &classified {
        crate::obs::emit_failure_classified(
            &item.failure.test_name,
            item.category.as_str(),
            item.confidence,
        );
    }
    classified
}

/// Substitute `{n}` with capture group `n + 1`.
///
/// A placeholder naming a group the pattern does not have makes the whole
/// template fall back to its literal text. A group that exists but did not
/// participate in the match renders as empty.
fn render_template(template: &str, caps: &Captures<'_>) -> String {
    let groups = caps.len() - 1;
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        match after[..close].parse::<usize>() {
            Ok(index) if index < groups => {
                out.push_str(caps.get(index + 1).map_or("", |m| m.as_str()));
            }
            Ok(_) => return template.to_string(),
            Err(_) => out.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}
