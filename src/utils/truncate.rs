//! Truncation Utilities
//!
//! Keeps logged response bodies bounded while respecting UTF-8 boundaries.

/// Largest body excerpt carried in errors and log lines.
pub const BODY_EXCERPT_BYTES: usize = 200;

/// Keep a prefix and a suffix of `content` totalling at most `max_bytes`,
/// with a marker in between saying how much was dropped.
pub fn truncate_text(content: &str, max_bytes: usize) -> String {
    if content.len() <= max_bytes {
        return content.to_string();
    }
    if max_bytes == 0 {
        return format!("... [{} bytes truncated] ...", content.len());
    }

    let half = max_bytes / 2;
    let prefix_end = floor_char_boundary(content, half);
    let suffix_start = ceil_char_boundary(content, content.len() - half).max(prefix_end);

    let prefix = &content[..prefix_end];
    let suffix = &content[suffix_start..];
    let dropped = content.len() - prefix.len() - suffix.len();

    format!("{} ... [{} bytes truncated] ... {}", prefix, dropped, suffix)
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        assert_eq!(truncate_text("Internal Server Error", 200), "Internal Server Error");
    }

    #[test]
    fn test_keeps_prefix_and_suffix() {
        let body = "a".repeat(50) + &"b".repeat(50);
        let out = truncate_text(&body, 10);
        assert!(out.starts_with("aaaaa ..."));
        assert!(out.ends_with("... bbbbb"));
        assert!(out.contains("[90 bytes truncated]"));
    }

    #[test]
    fn test_multibyte_boundaries() {
        let body = "é".repeat(20);
        let out = truncate_text(&body, 5);
        // Must not panic on a split code point.
        assert!(out.contains("bytes truncated"));
    }
}
