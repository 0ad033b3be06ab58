//! Diagnose, prompt, extract and verify over one small Python project.

use fixforward_core::{
    build_fix_prompt, classify_all, diagnostics_json, extract_patch, normalize, render_pr_report,
    verify, DiagnosticEntry, Ecosystem, ExtractConfig, FailureCategory, MemoryLookup,
};

const BEFORE: &str = "\
test_calc.py::test_add PASSED
test_calc.py::test_sub PASSED
test_calc.py::test_mul PASSED
test_calc.py::test_pow PASSED
test_calc.py::test_divide FAILED
=========================== short test summary info ============================
FAILED test_calc.py::test_divide - assert 3 == 3
========================= 1 failed, 4 passed in 0.20s ==========================
";

const AFTER: &str = "========================= 5 passed in 0.18s ==========================\n";

const CALC: &str = "def divide(a, b):\n    return a // b\n";
const CALC_FIXED: &str = "def divide(a, b):\n    return round(a / b)\n";

#[test]
fn failing_pytest_run_is_diagnosed() {
    let summary = normalize(Ecosystem::Python, BEFORE);
    assert!(!summary.passed);
    assert_eq!(summary.total, 5);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].test_name, "test_divide");
    assert_eq!(summary.failures[0].file_path, "test_calc.py");

    let classified = classify_all(&summary.failures);
    assert_eq!(classified[0].category, FailureCategory::Assertion);
    assert_eq!(classified[0].confidence, 0.85);
    assert_eq!(classified[0].summary, "Assertion: value mismatch");

    let json = diagnostics_json(&classified).expect("diagnostics json");
    let entries: Vec<DiagnosticEntry> = serde_json::from_str(&json).expect("parse diagnostics");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].test, "test_divide");
    assert_eq!(entries[0].error, "assert 3 == 3");
}

#[test]
fn full_fix_cycle_produces_report() {
    let project = MemoryLookup::new().with_file("test_calc.py", CALC);

    let before = normalize(Ecosystem::Python, BEFORE);
    let classified = classify_all(&before.failures);

    let prompt = build_fix_prompt(&classified, Ecosystem::Python, &project);
    assert!(prompt.contains("- [assertion] test_divide"));
    assert!(prompt.contains("--- test_calc.py ---\ndef divide(a, b):"));

    let response = format!(
        "FILE: test_calc.py\n```python\n{CALC_FIXED}```\n\nThe fix uses true division and rounds the result."
    );
    let patch = extract_patch(&response, &project, &ExtractConfig::default());
    assert_eq!(patch.files_changed(), vec!["test_calc.py"]);

    let after = normalize(Ecosystem::Python, AFTER);
    let result = verify(&before, &after);
    assert!(result.all_passing);
    assert_eq!(result.fixed_count, 1);
    assert_eq!(result.confidence, 0.95);

    let report = render_pr_report(&classified, &patch, &result);
    assert!(report.contains("| `test_divide` | test_calc.py | assertion | 0.85 |"));
    assert!(report.contains("- `test_calc.py`"));
    assert!(report.contains("The fix uses true division and rounds the result."));
    assert!(report.contains("**Confidence:** 95% (all tests passing)"));
}

#[test]
fn timed_out_rerun_scores_as_no_improvement() {
    let before = normalize(Ecosystem::Python, BEFORE);
    let after = fixforward_core::RunSummary::timeout(300);
    let result = verify(&before, &after);
    assert!(!result.all_passing);
    assert_eq!(result.fixed_count, 0);
    assert_eq!(result.confidence, 0.1);
}
