use fixforward_core::{normalize, normalize_run, Ecosystem, NormalizeConfig, RunSummary};

#[test]
fn pytest_summary_line_drives_counts() {
    for raw in [
        "1 failed, 4 passed in 0.20s",
        "===== 1 failed, 4 passed in 0.20s =====",
        "collected 5 items\n\n========================= 1 failed, 4 passed in 0.20s ==========================\n",
    ] {
        let summary = normalize(Ecosystem::Python, raw);
        assert_eq!(summary.total, 5, "{raw}");
        assert_eq!(summary.failed_count, 1);
        assert_eq!(summary.passed_count, 4);
        assert!((summary.duration_seconds - 0.20).abs() < 1e-9);
        assert!(!summary.passed);
    }
}

#[test]
fn empty_and_whitespace_output_never_fails() {
    for eco in Ecosystem::ALL {
        for raw in ["", "\n\n", "   "] {
            let summary = normalize(eco, raw);
            assert!(summary.passed, "{eco} on {raw:?}");
            assert_eq!(summary.total, 0);
            assert_eq!(summary.failed_count, 0);
        }
    }
}

#[test]
fn truncated_output_still_yields_summary() {
    let raw = "tests/test_io.py::test_read PASSED\ntests/test_io.py::test_write FAI";
    let summary = normalize(Ecosystem::Python, raw);
    assert_eq!(summary.passed_count, 1);
    assert!(summary.passed);

    let raw = "running 4 tests\ntest a ... ok\ntest b ... FAILED\nthread 'b' panicked at src/li";
    let summary = normalize(Ecosystem::Rust, raw);
    assert_eq!(summary.failed_count, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].test_name, "b");
}

#[test]
fn pass_flag_always_matches_failed_count() {
    let samples = [
        (Ecosystem::Python, "2 passed, 1 error in 0.10s"),
        (Ecosystem::Python, "3 passed in 0.01s"),
        (Ecosystem::Node, "Tests:       1 failed, 1 total"),
        (Ecosystem::Node, "npm ERR! missing script: test"),
        (Ecosystem::Rust, "test result: FAILED. 0 passed; 2 failed; 0 ignored;"),
    ];
    for (eco, raw) in samples {
        let summary: RunSummary = normalize(eco, raw);
        assert_eq!(summary.passed, summary.failed_count == 0, "{eco}: {raw}");
    }
}

#[test]
fn pytest_errors_fold_into_failures() {
    let summary = normalize(Ecosystem::Python, "2 passed, 1 error in 0.10s");
    assert_eq!(summary.total, 3);
    assert_eq!(summary.failed_count, 1);
    assert!(!summary.passed);
}

#[test]
fn jest_window_does_not_borrow_next_test_stack() {
    let filler = "x".repeat(1200);
    let raw = format!(
        "FAIL src/a.test.js\n    ✕ first\n{filler}\n    ✕ second\n      at Object.<anonymous> (src/a.test.js:40:3)\n\nTests:       2 failed, 2 total\n"
    );
    let summary = normalize(Ecosystem::Node, &raw);
    assert_eq!(summary.failures.len(), 2);
    assert_eq!(summary.failures[0].line_number, None);
    assert_eq!(summary.failures[0].file_path, "src/a.test.js");
    assert_eq!(summary.failures[1].line_number, Some(40));
}

#[test]
fn detail_window_is_configurable() {
    let config = NormalizeConfig {
        detail_excerpt: 20,
        ..NormalizeConfig::default()
    };
    let raw = "FAIL t.test.js\n    ✕ slow\n      Error: this message is longer than twenty characters\n\nTests:       1 failed, 1 total\n";
    let summary = normalize_run(Ecosystem::Node, raw, 1, 0.0, &config);
    assert_eq!(summary.failures[0].full_output.chars().count(), 20);
    assert_eq!(summary.exit_code, 1);
}

#[test]
fn timeout_summary_has_parsed_shape() {
    let summary = RunSummary::timeout(180);
    assert!(!summary.passed);
    assert_eq!(summary.exit_code, -1);
    assert_eq!(summary.total, 0);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].test_name, "<timeout>");
}
