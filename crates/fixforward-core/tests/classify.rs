use fixforward_core::{classify, classify_all, FailureCategory, FailureRecord, RULES};

fn classify_message(message: &str) -> (FailureCategory, f64, String) {
    let result = classify(&FailureRecord::new("test_case", message));
    (result.category, result.confidence, result.summary)
}

#[test]
fn missing_module_is_dependency() {
    let (category, confidence, summary) =
        classify_message("ModuleNotFoundError: No module named 'foo'");
    assert_eq!(category, FailureCategory::Dependency);
    assert_eq!(confidence, 0.90);
    assert_eq!(summary, "Missing module: foo");
}

#[test]
fn earlier_category_wins_over_later() {
    // Both a dependency pattern and an assertion pattern are present.
    let failure = FailureRecord::new("test_case", "assert 1 == 2")
        .with_output("E   ModuleNotFoundError: No module named 'numpy'");
    let result = classify(&failure);
    assert_eq!(result.category, FailureCategory::Dependency);
    assert_eq!(result.summary, "Missing module: numpy");
}

#[test]
fn pattern_order_within_category_is_respected() {
    // `AssertionError: assert ...` is listed before the bare `AssertionError: ...`.
    let (_, _, summary) = classify_message("AssertionError: assert x == y");
    assert_eq!(summary, "Assertion failed: x == y");

    let (_, _, summary) = classify_message("AssertionError: lists differ");
    assert_eq!(summary, "Assertion: lists differ");
}

#[test]
fn ecosystem_specific_messages() {
    let cases = [
        ("Cannot find module 'lodash'", FailureCategory::Dependency, "Missing Node module: lodash"),
        ("error[E0432]: unresolved import `serde_yaml`", FailureCategory::Dependency, "Unresolved import: serde_yaml"),
        ("TypeError: fetchUser is not a function", FailureCategory::ApiChange, "Not a function"),
        ("error[E0599]: no method named `len2` found", FailureCategory::ApiChange, "No method: len2"),
        ("SyntaxError: Unexpected token '}'", FailureCategory::SyntaxError, "Syntax error: Unexpected token '}'"),
        ("expect(sum).toEqual(4)", FailureCategory::Assertion, "Expected 4"),
        ("sh: 1: jest: command not found: jest", FailureCategory::EnvMismatch, "Command not found: jest"),
    ];
    for (message, category, summary) in cases {
        let result = classify(&FailureRecord::new("t", message));
        assert_eq!(result.category, category, "{message}");
        assert_eq!(result.summary, summary, "{message}");
    }
}

#[test]
fn every_category_has_fixed_confidence() {
    for table in RULES {
        assert!((0.0..=1.0).contains(&table.confidence));
        assert!(!table.rules.is_empty());
    }
}

#[test]
fn unknown_is_catch_all() {
    let (category, confidence, summary) = classify_message("segfault in worker 3");
    assert_eq!(category, FailureCategory::Unknown);
    assert_eq!(confidence, 0.30);
    assert_eq!(summary, "segfault in worker 3");
}

#[test]
fn classification_is_deterministic() {
    let failures = vec![
        FailureRecord::new("a", "IndentationError: unexpected indent"),
        FailureRecord::new("b", "ECONNRESET while fetching"),
        FailureRecord::new("c", ""),
    ];
    assert_eq!(classify_all(&failures), classify_all(&failures));
}
