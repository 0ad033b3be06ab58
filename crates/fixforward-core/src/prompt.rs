//! Prompts handed to the coding assistant.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::config::PromptConfig;
use crate::domain::{ClassifiedFailure, Ecosystem};
use crate::patch::FileLookup;

const NO_SOURCES: &str = "(no source files read)";

/// Fix prompt with the default failure limit.
pub fn build_fix_prompt(
    failures: &[ClassifiedFailure],
    ecosystem: Ecosystem,
    project: &dyn FileLookup,
) -> String {
    build_fix_prompt_with(failures, ecosystem, project, &PromptConfig::default())
}

/// Describe the first `max_failures` failures, inline the files they point
/// at, and ask for `FILE: <path>` + fenced-block replies.
pub fn build_fix_prompt_with(
    failures: &[ClassifiedFailure],
    ecosystem: Ecosystem,
    project: &dyn FileLookup,
    config: &PromptConfig,
) -> String {
    let mut descriptions = Vec::new();
    let mut sources = Vec::new();
    let mut seen = HashSet::new();

    for item in failures.iter().take(config.max_failures) {
        let failure = &item.failure;
        let mut desc = format!(
            "- [{}] {}\n  File: {}",
            item.category, failure.test_name, failure.file_path
        );
        if let Some(line) = failure.line_number {
            let _ = write!(desc, ":{line}");
        }
        let _ = write!(desc, "\n  Error: {}", failure.error_message);
        descriptions.push(desc);

        if !seen.insert(failure.file_path.as_str()) {
            continue;
        }
        if let Some(content) = project.read(&failure.file_path) {
            sources.push(format!("--- {} ---\n{}", failure.file_path, content));
        }
    }

    let sources_text = if sources.is_empty() {
        NO_SOURCES.to_string()
    } else {
        sources.join("\n\n")
    };

    format!(
        "I have a {ecosystem} project with failing tests. Generate a minimal fix.\n\n\
         FAILURES:\n{}\n\n\
         SOURCE FILES:\n{sources_text}\n\n\
         Generate the smallest possible code change to fix these failures. \
         Show the complete corrected file content for each file that needs changes. \
         Format each fix as:\n\
         FILE: <filepath>\n\
         ```\n<complete corrected file content>\n```\n\n\
         Then explain what you changed and why.",
        descriptions.join("\n"),
    )
}

/// Ask for a root-cause explanation of one failure.
pub fn build_explain_prompt(item: &ClassifiedFailure) -> String {
    format!(
        "Explain this test failure concisely:\n\
         Test: {}\n\
         File: {}\n\
         Error: {}\n\
         Category: {}\n\n\
         What is the likely root cause and how should it be fixed?",
        item.failure.test_name, item.failure.file_path, item.failure.error_message, item.category,
    )
}

/// Explanation to show when the assistant is unavailable.
pub fn offline_explanation(item: &ClassifiedFailure) -> String {
    format!("({}) {}", item.category, item.summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::domain::FailureRecord;
    use crate::patch::MemoryLookup;

    fn failure(name: &str, file: &str, line: Option<u32>, message: &str) -> ClassifiedFailure {
        classify(&FailureRecord::new(name, message).with_file(file).with_line(line))
    }

    #[test]
    fn test_fix_prompt_layout() {
        let project = MemoryLookup::new().with_file("calc.py", "def add(a, b):\n    return a - b\n");
        let failures = vec![failure("test_add", "calc.py", Some(2), "assert 1 == 3")];
        let prompt = build_fix_prompt(&failures, Ecosystem::Python, &project);

        assert!(prompt.starts_with("I have a python project with failing tests."));
        assert!(prompt.contains("- [assertion] test_add\n  File: calc.py:2\n  Error: assert 1 == 3"));
        assert!(prompt.contains("--- calc.py ---\ndef add(a, b):"));
        assert!(prompt.contains("FILE: <filepath>\n```\n"));
        assert!(prompt.ends_with("Then explain what you changed and why."));
    }

    #[test]
    fn test_fix_prompt_limits_failures() {
        let failures: Vec<_> = (0..5)
            .map(|n| failure(&format!("test_{n}"), "", None, "boom"))
            .collect();
        let prompt = build_fix_prompt(&failures, Ecosystem::Node, &MemoryLookup::new());
        assert!(prompt.contains("test_2"));
        assert!(!prompt.contains("test_3"));
        assert!(prompt.contains("(no source files read)"));
    }

    #[test]
    fn test_fix_prompt_inlines_each_file_once() {
        let project = MemoryLookup::new().with_file("src/lib.rs", "pub fn f() {}\n");
        let failures = vec![
            failure("a", "src/lib.rs", Some(1), "x"),
            failure("b", "src/lib.rs", Some(1), "y"),
        ];
        let prompt = build_fix_prompt(&failures, Ecosystem::Rust, &project);
        assert_eq!(prompt.matches("--- src/lib.rs ---").count(), 1);
    }

    #[test]
    fn test_explain_prompt_and_offline_fallback() {
        let item = failure("test_import", "app.py", None, "ModuleNotFoundError: No module named 'requests'");
        let prompt = build_explain_prompt(&item);
        assert!(prompt.contains("Test: test_import"));
        assert!(prompt.contains("Category: dependency"));
        assert_eq!(offline_explanation(&item), "(dependency) Missing module: requests");
    }
}
