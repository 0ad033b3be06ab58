//! Char-boundary-safe slicing helpers shared by the text scanners.

/// The first `max_chars` characters of `s`.
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Up to `max_chars` characters of `s` starting at byte offset `start`.
///
/// `start` must come from a regex match or another char boundary.
pub(crate) fn window_after(s: &str, start: usize, max_chars: usize) -> &str {
    truncate_chars(s.get(start..).unwrap_or(""), max_chars)
}

/// The last `n` lines joined with newlines.
pub(crate) fn tail_lines(lines: &[&str], n: usize) -> String {
    let skip = lines.len().saturating_sub(n);
    lines[skip..].join("\n")
}
