//! Terminal display width of text.
//!
//! Every measurement and truncation in layout and paint goes through this
//! module. Widths are counted per extended grapheme cluster and each
//! cluster occupies 0, 1 or 2 columns.

use std::borrow::Cow;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Drawn in place of a control character found in page text.
pub const REPLACEMENT: char = '\u{FFFD}';

/// C0 controls other than newline and tab, DEL, and C1 controls. Written
/// to a terminal these start escape sequences or move the cursor.
pub fn is_unsafe_control(c: char) -> bool {
    c.is_control() && c != '\n' && c != '\t'
}

/// Replace every unsafe control character with [`REPLACEMENT`].
pub fn scrub_controls(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_unsafe_control) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.chars()
            .map(|c| if is_unsafe_control(c) { REPLACEMENT } else { c })
            .collect(),
    )
}

/// Remove every control character, newline and tab included.
pub fn strip_controls(s: &str) -> Cow<'_, str> {
    if !s.chars().any(char::is_control) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|c| !c.is_control()).collect())
}

/// Columns taken by a single codepoint: 0 for combining and zero-width
/// marks (and control characters), 2 for wide East Asian and emoji
/// codepoints, 1 otherwise.
pub fn char_width(c: char) -> usize {
    c.width().unwrap_or(0).min(2)
}

/// Columns taken by one grapheme cluster.
pub fn grapheme_width(g: &str) -> usize {
    if g.chars().all(char::is_control) {
        return 0;
    }
    g.width().min(2)
}

/// Columns taken by a string.
pub fn str_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_width).sum()
}

/// Split `s` after the longest prefix that fits in `max` columns.
///
/// Splits only at grapheme boundaries, so the prefix may be narrower than
/// `max` when a wide cluster straddles the limit.
pub fn split_at_width(s: &str, max: usize) -> (&str, &str) {
    let mut used = 0;
    for (idx, g) in s.grapheme_indices(true) {
        let w = grapheme_width(g);
        if used + w > max {
            return s.split_at(idx);
        }
        used += w;
    }
    (s, "")
}

/// Truncate to at most `max` columns, ending in `…` when anything was cut.
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    if str_width(s) <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let (head, _) = split_at_width(s, max - 1);
    format!("{head}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_one_column() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(str_width("hello"), 5);
    }

    #[test]
    fn cjk_is_two_columns() {
        assert_eq!(char_width('漢'), 2);
        assert_eq!(str_width("漢字"), 4);
    }

    #[test]
    fn combining_mark_is_zero() {
        assert_eq!(char_width('\u{0301}'), 0);
        // "e" + combining acute is a single one-column cluster.
        assert_eq!(str_width("e\u{0301}"), 1);
    }

    #[test]
    fn control_is_zero() {
        assert_eq!(char_width('\u{7}'), 0);
        assert_eq!(str_width("a\u{7}b"), 2);
    }

    #[test]
    fn scrub_replaces_escape_and_c1() {
        assert_eq!(
            scrub_controls("a\u{1b}[2Jb\u{7}\u{9b}c\u{7f}"),
            "a\u{FFFD}[2Jb\u{FFFD}\u{FFFD}c\u{FFFD}"
        );
        assert_eq!(scrub_controls("keep\nthis\tone"), "keep\nthis\tone");
        assert!(matches!(scrub_controls("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn strip_drops_all_controls() {
        assert_eq!(strip_controls("a\u{1b}]52;c\u{7}\nb\t"), "a]52;cb");
    }

    #[test]
    fn split_respects_wide_boundary() {
        let (head, tail) = split_at_width("ab漢c", 3);
        assert_eq!(head, "ab");
        assert_eq!(tail, "漢c");
    }

    #[test]
    fn split_whole_string_fits() {
        assert_eq!(split_at_width("abc", 10), ("abc", ""));
    }

    #[test]
    fn ellipsis_truncation() {
        assert_eq!(truncate_with_ellipsis("Hello, world", 6), "Hello…");
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(str_width(&truncate_with_ellipsis("漢字漢字", 5)), 5);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn split_prefix_fits(s in "\\PC{0,40}", max in 0usize..30) {
                let (head, tail) = split_at_width(&s, max);
                prop_assert!(str_width(head) <= max);
                prop_assert_eq!(format!("{head}{tail}"), s);
            }

            #[test]
            fn ellipsis_fits(s in "\\PC{0,40}", max in 0usize..30) {
                prop_assert!(str_width(&truncate_with_ellipsis(&s, max)) <= max);
            }
        }
    }
}
