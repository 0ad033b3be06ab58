//! Line diffs between file versions.
//!
//! Lines are aligned with a Longest Common Subsequence table after stripping
//! the common prefix and suffix. The full table is only built for unified-diff
//! rendering; the similarity ratio used for fuzzy file matching keeps two rows.

use crate::domain::{FixforwardError, Result};

/// Context lines around each hunk.
pub const CONTEXT_LINES: usize = 3;

const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Equal,
    Delete,
    Insert,
}

/// One aligned step. `a` and `b` are the cursors into each side when the
/// step is taken.
#[derive(Debug, Clone, Copy)]
struct Op {
    tag: Tag,
    a: usize,
    b: usize,
}

/// Align two line sequences.
fn line_ops(a: &[&str], b: &[&str]) -> Vec<Op> {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mid_a = &a[prefix..a.len() - suffix];
    let mid_b = &b[prefix..b.len() - suffix];
    let (m, n) = (mid_a.len(), mid_b.len());

    // dp[i][j] = LCS length of mid_a[i..] and mid_b[j..]
    let mut dp = vec![vec![0u32; n + 1]; m + 1];
    for i in (0..m).rev() {
        for j in (0..n).rev() {
            dp[i][j] = if mid_a[i] == mid_b[j] {
                dp[i + 1][j + 1] + 1
            } else {
                dp[i + 1][j].max(dp[i][j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(a.len().max(b.len()));
    for k in 0..prefix {
        ops.push(Op { tag: Tag::Equal, a: k, b: k });
    }

    let (mut i, mut j) = (0, 0);
    while i < m || j < n {
        let (ai, bj) = (prefix + i, prefix + j);
        if i < m && j < n && mid_a[i] == mid_b[j] {
            ops.push(Op { tag: Tag::Equal, a: ai, b: bj });
            i += 1;
            j += 1;
        } else if j == n || (i < m && dp[i + 1][j] >= dp[i][j + 1]) {
            ops.push(Op { tag: Tag::Delete, a: ai, b: bj });
            i += 1;
        } else {
            ops.push(Op { tag: Tag::Insert, a: ai, b: bj });
            j += 1;
        }
    }

    for k in 0..suffix {
        ops.push(Op {
            tag: Tag::Equal,
            a: prefix + m + k,
            b: prefix + n + k,
        });
    }
    ops
}

/// Normalized `[0, 1]` closeness of two texts.
///
/// `2 * matched / (len(a) + len(b))`, where `matched` is the largest number
/// of characters carried by lines common to both texts in the same order.
/// Equal texts (including two empty ones) score 1.0.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 1.0;
    }
    let a_lines: Vec<&str> = a.split_inclusive('\n').collect();
    let b_lines: Vec<&str> = b.split_inclusive('\n').collect();
    (2 * matched_chars(&a_lines, &b_lines)) as f64 / total as f64
}

/// Character-weighted common subsequence of two line sequences.
///
/// Keeps two rows of the table, so memory grows with the shorter side only.
fn matched_chars(a: &[&str], b: &[&str]) -> usize {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let weight = |lines: &[&str]| lines.iter().map(|l| l.chars().count()).sum::<usize>();
    let fixed = weight(&a[..prefix]) + weight(&a[a.len() - suffix..]);

    let mut mid_a = &a[prefix..a.len() - suffix];
    let mut mid_b = &b[prefix..b.len() - suffix];
    if mid_b.len() > mid_a.len() {
        std::mem::swap(&mut mid_a, &mut mid_b);
    }

    let mut prev = vec![0usize; mid_b.len() + 1];
    let mut row = vec![0usize; mid_b.len() + 1];
    for line_a in mid_a {
        for (j, line_b) in mid_b.iter().enumerate() {
            row[j + 1] = if line_a == line_b {
                prev[j] + line_a.chars().count()
            } else {
                prev[j + 1].max(row[j])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }
    fixed + prev[mid_b.len()]
}

/// Render a unified diff from `a/<path>` to `b/<path>`.
///
/// Identical inputs produce an empty string.
pub fn unified_diff(file_path: &str, original: &str, modified: &str) -> String {
    if original == modified {
        return String::new();
    }
    let a_lines: Vec<&str> = original.split_inclusive('\n').collect();
    let b_lines: Vec<&str> = modified.split_inclusive('\n').collect();
    let ops = line_ops(&a_lines, &b_lines);

    let mut out = format!("--- a/{file_path}\n+++ b/{file_path}\n");
    for (lo, hi) in hunk_ranges(&ops) {
        let hunk = &ops[lo..hi];
        let a_len = hunk.iter().filter(|op| op.tag != Tag::Insert).count();
        let b_len = hunk.iter().filter(|op| op.tag != Tag::Delete).count();
        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            format_range(hunk[0].a, a_len),
            format_range(hunk[0].b, b_len)
        ));
        for op in hunk {
            let (prefix, line) = match op.tag {
                Tag::Equal => (' ', a_lines[op.a]),
                Tag::Delete => ('-', a_lines[op.a]),
                Tag::Insert => ('+', b_lines[op.b]),
            };
            out.push(prefix);
            out.push_str(line);
            if !line.ends_with('\n') {
                out.push('\n');
                out.push_str(NO_NEWLINE_MARKER);
            }
        }
    }
    out
}

/// Group changes into `[lo, hi)` op ranges, merging changes whose gap fits
/// inside shared context.
fn hunk_ranges(ops: &[Op]) -> Vec<(usize, usize)> {
    let mut groups: Vec<(usize, usize)> = Vec::new();
    for (idx, op) in ops.iter().enumerate() {
        if op.tag == Tag::Equal {
            continue;
        }
        match groups.last_mut() {
            Some((_, last)) if idx - *last - 1 <= 2 * CONTEXT_LINES => *last = idx,
            _ => groups.push((idx, idx)),
        }
    }
    groups
        .into_iter()
        .map(|(first, last)| {
            (
                first.saturating_sub(CONTEXT_LINES),
                (last + 1 + CONTEXT_LINES).min(ops.len()),
            )
        })
        .collect()
}

fn format_range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}

/// Apply a unified diff to `original`.
///
/// Context and removed lines must match the original exactly. An empty diff
/// returns the original unchanged.
pub fn apply_unified_diff(original: &str, diff: &str) -> Result<String> {
    let source: Vec<&str> = original.split_inclusive('\n').collect();
    let mut out = String::with_capacity(original.len());
    let mut cursor = 0usize;
    let mut lines = diff.split_inclusive('\n').peekable();

    while let Some(line) = lines.next() {
        let Some(header) = line.strip_prefix("@@ ") else {
            // File headers and anything else outside a hunk.
            continue;
        };
        let (old_start, old_len) = parse_hunk_header(header)?;
        let hunk_start = if old_len == 0 {
            old_start
        } else {
            old_start.saturating_sub(1)
        };
        if hunk_start < cursor || hunk_start > source.len() {
            return Err(FixforwardError::InvalidPatch(format!(
                "hunk at line {old_start} is out of order or past end of file"
            )));
        }
        source[cursor..hunk_start].iter().for_each(|l| out.push_str(l));
        cursor = hunk_start;

        while let Some(body) = lines.next_if(|l| !l.starts_with("@@")) {
            let mut chars = body.chars();
            let Some(tag) = chars.next() else { continue };
            let mut content = chars.as_str();
            if lines.next_if(|l| l.starts_with('\\')).is_some() {
                content = content.strip_suffix('\n').unwrap_or(content);
            }
            match tag {
                ' ' | '-' => {
                    if source.get(cursor) != Some(&content) {
                        return Err(FixforwardError::InvalidPatch(format!(
                            "line {} does not match the original",
                            cursor + 1
                        )));
                    }
                    cursor += 1;
                    if tag == ' ' {
                        out.push_str(content);
                    }
                }
                '+' => out.push_str(content),
                '\\' => {}
                other => {
                    return Err(FixforwardError::InvalidPatch(format!(
                        "unexpected line prefix {other:?}"
                    )))
                }
            }
        }
    }

    source[cursor..].iter().for_each(|l| out.push_str(l));
    Ok(out)
}

/// `-start[,len] +start[,len] @@` to the old side's `(start, len)`.
fn parse_hunk_header(header: &str) -> Result<(usize, usize)> {
    let invalid = || FixforwardError::InvalidPatch(format!("bad hunk header: @@ {}", header.trim_end()));
    let old = header
        .split_whitespace()
        .next()
        .and_then(|r| r.strip_prefix('-'))
        .ok_or_else(invalid)?;
    let (start, len) = match old.split_once(',') {
        Some((start, len)) => (start, len),
        None => (old, "1"),
    };
    let start = start.parse().map_err(|_| invalid())?;
    let len = len.parse().map_err(|_| invalid())?;
    Ok((start, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_inputs_no_diff() {
        assert_eq!(unified_diff("a.py", "x\ny\n", "x\ny\n"), "");
    }

    #[test]
    fn test_single_line_change() {
        let diff = unified_diff("calc.py", "a\nb\nc\n", "a\nB\nc\n");
        assert_eq!(
            diff,
            "--- a/calc.py\n+++ b/calc.py\n@@ -1,3 +1,3 @@\n a\n-b\n+B\n c\n"
        );
    }

    #[test]
    fn test_distant_changes_split_into_hunks() {
        let original: String = (1..=20).map(|n| format!("line {n}\n")).collect();
        let modified = original
            .replace("line 2\n", "line two\n")
            .replace("line 19\n", "line nineteen\n");
        let diff = unified_diff("f.txt", &original, &modified);
        assert_eq!(diff.matches("@@ -").count(), 2);
        assert_eq!(apply_unified_diff(&original, &diff).expect("apply"), modified);
    }

    #[test]
    fn test_missing_trailing_newline_round_trip() {
        let original = "fn main() {}\n";
        let modified = "fn main() {\n    run();\n}";
        let diff = unified_diff("src/main.rs", original, modified);
        assert!(diff.contains(NO_NEWLINE_MARKER));
        assert_eq!(apply_unified_diff(original, &diff).expect("apply"), modified);
    }

    #[test]
    fn test_create_from_empty() {
        let diff = unified_diff("new.py", "", "print('hi')\n");
        assert!(diff.contains("@@ -0,0 +1 @@"));
        assert_eq!(apply_unified_diff("", &diff).expect("apply"), "print('hi')\n");
    }

    #[test]
    fn test_delete_everything() {
        let diff = unified_diff("old.py", "a\nb\n", "");
        assert!(diff.contains("@@ -1,2 +0,0 @@"));
        assert_eq!(apply_unified_diff("a\nb\n", &diff).expect("apply"), "");
    }

    #[test]
    fn test_apply_rejects_mismatched_context() {
        let diff = unified_diff("f", "a\nb\nc\n", "a\nX\nc\n");
        let err = apply_unified_diff("a\nQ\nc\n", &diff).unwrap_err();
        assert!(matches!(err, FixforwardError::InvalidPatch(_)));
    }

    #[test]
    fn test_apply_empty_diff_is_identity() {
        assert_eq!(apply_unified_diff("keep\n", "").expect("apply"), "keep\n");
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity_ratio("", ""), 1.0);
        assert_eq!(similarity_ratio("same\n", "same\n"), 1.0);
        assert_eq!(similarity_ratio("abc\n", "xyz\n"), 0.0);
        assert_eq!(similarity_ratio("", "text\n"), 0.0);
    }

    #[test]
    fn test_similarity_partial_edit() {
        let original = "def add(a, b):\n    return a - b\n\ndef sub(a, b):\n    return a - b\n";
        let modified = "def add(a, b):\n    return a + b\n\ndef sub(a, b):\n    return a - b\n";
        let ratio = similarity_ratio(original, modified);
        assert!(ratio > 0.5 && ratio < 1.0, "ratio was {ratio}");
    }

    #[test]
    fn test_similarity_weights_matched_lines_by_length() {
        // Either `long` or `x` can be kept in order, not both; the longer line wins.
        let a = "long line here\nx\n";
        let b = "x\nlong line here\n";
        let expected = 2.0 * 15.0 / 34.0;
        assert!((similarity_ratio(a, b) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_similarity_large_inputs_with_distinct_middles() {
        let head: String = (0..50).map(|i| format!("shared {i}\n")).collect();
        let mid_a: String = (0..5000).map(|i| format!("left {i}\n")).collect();
        let mid_b: String = (0..5000).map(|i| format!("right {i}\n")).collect();
        let a = format!("{head}{mid_a}{head}");
        let b = format!("{head}{mid_b}{head}");
        let ratio = similarity_ratio(&a, &b);
        assert!(ratio > 0.0 && ratio < 0.1, "ratio was {ratio}");
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let a = "one\ntwo\nthree\n";
        let b = "one\n2\nthree\nfour\n";
        assert!((similarity_ratio(a, b) - similarity_ratio(b, a)).abs() < 1e-12);
    }
}
