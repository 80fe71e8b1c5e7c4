//! Inline flow: flattening inline blocks into pieces and greedy word wrap.

use unicode_segmentation::UnicodeSegmentation;

use baodweb_types::{Color, NamedColor, Style};

use super::{RenderLine, Span};
use crate::block::Block;
use crate::width::{grapheme_width, str_width};

// -----------------------------------------------------------------------
// Whitespace
// -----------------------------------------------------------------------

/// Collapse runs of whitespace into single spaces and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split(is_break_space)
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whitespace that may break a line. No-break space is excluded.
fn is_break_space(c: char) -> bool {
    c.is_whitespace() && c != '\u{a0}'
}

// -----------------------------------------------------------------------
// Pieces
// -----------------------------------------------------------------------

/// Style of the `[id]` tag in front of a link label.
pub const LINK_ID_STYLE: Style = Style {
    bold: true,
    ..Style::PLAIN
};

/// Style of a link label.
pub const LINK_STYLE: Style = Style {
    underline: true,
    fg: Some(Color::Named(NamedColor::Blue)),
    ..Style::PLAIN
};

/// Style of a button.
pub const BUTTON_STYLE: Style = Style {
    reverse: true,
    ..Style::PLAIN
};

/// Unit of inline content fed to [`wrap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// Styled text; may break at any whitespace inside it.
    Text(Span),
    /// Indivisible run (link or button).
    Unit(Vec<Span>),
    /// Forced line break.
    Break,
}

/// Flatten inline blocks into pieces, layering each run's style over
/// `base`.
pub fn inline_pieces(blocks: &[Block], base: Style, out: &mut Vec<Piece>) {
    for block in blocks {
        match block {
            Block::InlineRun { text, style } => {
                out.push(Piece::Text(Span::new(text, style.over(base))));
            },
            Block::LineBreak => out.push(Piece::Break),
            Block::Link { id, href, children } => {
                out.push(Piece::Unit(link_unit(*id, href, children, base)));
            },
            Block::Button(children) => out.push(Piece::Unit(button_unit(children, base))),
            Block::Image { alt, .. } if !alt.is_empty() => {
                out.push(Piece::Text(Span::new(&format!("[{alt}]"), base.italic())));
            },
            other => inline_pieces(other.children(), base, out),
        }
    }
}

/// `[id] label`, with whitespace inside the label normalized.
pub fn link_unit(id: u32, href: &str, children: &[Block], base: Style) -> Vec<Span> {
    let mut label = label_spans(children, LINK_STYLE.over(base));
    if label.is_empty() {
        label.push(Span::new(href, LINK_STYLE.over(base)));
    }
    let mut spans = vec![Span::new(&format!("[{id}] "), LINK_ID_STYLE.over(base))];
    spans.extend(label);
    spans
}

/// `[ label ]`.
pub fn button_unit(children: &[Block], base: Style) -> Vec<Span> {
    let style = BUTTON_STYLE.over(base);
    let mut spans = vec![Span::new("[ ", style)];
    spans.extend(label_spans(children, style));
    spans.push(Span::new(" ]", style));
    spans
}

/// Text of `children` as spans with whitespace collapsed across span
/// boundaries and trimmed at both ends.
pub fn label_spans(children: &[Block], base: Style) -> Vec<Span> {
    let mut pieces = Vec::new();
    inline_pieces(children, base, &mut pieces);
    normalize_spans(pieces_to_spans(pieces))
}

pub(crate) fn pieces_to_spans(pieces: Vec<Piece>) -> Vec<Span> {
    let mut spans = Vec::new();
    for piece in pieces {
        match piece {
            Piece::Text(span) => spans.push(span),
            Piece::Unit(unit) => spans.extend(unit),
            Piece::Break => spans.push(Span::new(" ", Style::PLAIN)),
        }
    }
    spans
}

fn normalize_spans(spans: Vec<Span>) -> Vec<Span> {
    let mut out: Vec<Span> = Vec::new();
    let mut pending_space = false;
    for span in spans {
        let mut text = String::new();
        for (is_space, segment) in segments(&span.text) {
            if is_space {
                pending_space = true;
            } else {
                let started = !text.is_empty() || !out.is_empty();
                if pending_space && started {
                    text.push(' ');
                }
                pending_space = false;
                text.push_str(segment);
            }
        }
        if !text.is_empty() {
            out.push(Span::new(&text, span.style));
        }
    }
    out
}

/// Split text into alternating whitespace / non-whitespace segments.
fn segments(text: &str) -> impl Iterator<Item = (bool, &str)> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let space = is_break_space(first);
        let end = rest
            .char_indices()
            .find(|&(_, c)| is_break_space(c) != space)
            .map_or(rest.len(), |(i, _)| i);
        let (seg, tail) = rest.split_at(end);
        rest = tail;
        Some((space, seg))
    })
}

// -----------------------------------------------------------------------
// Wrapping
// -----------------------------------------------------------------------

/// A run of non-breaking content placed as a whole.
#[derive(Debug)]
struct Word {
    spans: Vec<Span>,
    width: usize,
    space_before: bool,
}

impl Word {
    fn new(space_before: bool) -> Self {
        Self {
            spans: Vec::new(),
            width: 0,
            space_before,
        }
    }

    fn push(&mut self, text: &str, style: Style) {
        self.width += str_width(text);
        self.spans.push(Span::new(text, style));
    }
}

#[derive(Debug)]
enum Token {
    Word(Word),
    Break,
}

fn tokenize(pieces: &[Piece]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current: Option<Word> = None;
    let mut pending_space = false;
    for piece in pieces {
        match piece {
            Piece::Text(span) => {
                for (is_space, segment) in segments(&span.text) {
                    if is_space {
                        if let Some(word) = current.take() {
                            tokens.push(Token::Word(word));
                        }
                        pending_space = true;
                    } else {
                        let word = current
                            .get_or_insert_with(|| Word::new(std::mem::take(&mut pending_space)));
                        word.push(segment, span.style);
                    }
                }
            },
            Piece::Unit(spans) => {
                if let Some(word) = current.take() {
                    tokens.push(Token::Word(word));
                }
                let mut word = Word::new(std::mem::take(&mut pending_space));
                for span in spans {
                    word.push(&span.text, span.style);
                }
                tokens.push(Token::Word(word));
            },
            Piece::Break => {
                if let Some(word) = current.take() {
                    tokens.push(Token::Word(word));
                }
                pending_space = false;
                tokens.push(Token::Break);
            },
        }
    }
    if let Some(word) = current.take() {
        tokens.push(Token::Word(word));
    }
    tokens
}

/// Greedy word wrap at `width` columns.
///
/// Lines break only at whitespace. A word (or link/button unit) wider
/// than `width` starts a new line and is hard-broken at column `width`.
pub fn wrap(pieces: &[Piece], width: usize) -> Vec<RenderLine> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = RenderLine::new();
    let mut used = 0;

    for token in tokenize(pieces) {
        let word = match token {
            Token::Break => {
                lines.push(std::mem::take(&mut line));
                used = 0;
                continue;
            },
            Token::Word(word) => word,
        };
        let sep = usize::from(used > 0 && word.space_before);
        if used + sep + word.width <= width {
            if sep == 1 {
                line.push(" ", Style::PLAIN);
            }
            line.extend(word.spans);
            used += sep + word.width;
        } else if word.width <= width {
            lines.push(std::mem::take(&mut line));
            line.extend(word.spans);
            used = word.width;
        } else {
            if used > 0 {
                lines.push(std::mem::take(&mut line));
            }
            let mut chunks = chop(&word.spans, width);
            line = chunks.pop().unwrap_or_default();
            used = line.width();
            lines.extend(chunks);
        }
    }
    if !line.spans.is_empty() {
        lines.push(line);
    }
    lines
}

/// Hard-break spans into lines of at most `width` columns. A grapheme
/// wider than `width` is replaced by `?`.
pub fn chop(spans: &[Span], width: usize) -> Vec<RenderLine> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = RenderLine::new();
    let mut used = 0;
    for span in spans {
        for g in span.text.graphemes(true) {
            let (g, w) = match grapheme_width(g) {
                w if w > width => ("?", 1),
                w => (g, w),
            };
            if used + w > width {
                lines.push(std::mem::take(&mut line));
                used = 0;
            }
            line.push(g, span.style);
            used += w;
        }
    }
    if !line.spans.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Piece {
        Piece::Text(Span::new(s, Style::PLAIN))
    }

    fn plain(lines: &[RenderLine]) -> Vec<String> {
        lines.iter().map(RenderLine::plain_text).collect()
    }

    // -- collapse -------------------------------------------------------

    #[test]
    fn collapse_basic() {
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn collapse_keeps_nbsp() {
        assert_eq!(collapse_whitespace("a\u{a0}b"), "a\u{a0}b");
    }

    // -- wrap -----------------------------------------------------------

    #[test]
    fn two_hundred_chars_wrap_into_three_lines() {
        let mut words = vec!["abcdefghi"; 19];
        words.push("abcdefghij");
        let para = words.join(" ");
        assert_eq!(para.chars().count(), 200);
        let lines = wrap(&[text(&para)], 80);
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert!(line.width() <= 80);
            let t = line.plain_text();
            assert!(!t.starts_with(' ') && !t.ends_with(' '));
        }
    }

    #[test]
    fn overlong_word_is_hard_broken() {
        let lines = wrap(&[text("ab abcdefghijkl")], 5);
        assert_eq!(plain(&lines), vec!["ab", "abcde", "fghij", "kl"]);
    }

    #[test]
    fn styles_survive_wrapping() {
        let bold = Style::default().bold();
        let pieces = vec![text("plain "), Piece::Text(Span::new("heavy words", bold))];
        let lines = wrap(&pieces, 11);
        assert_eq!(plain(&lines), vec!["plain heavy", "words"]);
        assert_eq!(lines[1].spans[0].style, bold);
    }

    #[test]
    fn adjacent_runs_form_one_word() {
        let bold = Style::default().bold();
        let pieces = vec![text("foo"), Piece::Text(Span::new("bar", bold)), text(" baz")];
        let lines = wrap(&pieces, 6);
        assert_eq!(plain(&lines), vec!["foobar", "baz"]);
    }

    #[test]
    fn link_unit_is_not_split() {
        let unit = link_unit(
            12,
            "http://x.test/",
            &[Block::InlineRun {
                text: "two words".into(),
                style: Style::PLAIN,
            }],
            Style::PLAIN,
        );
        let pieces = vec![text("some text"), Piece::Unit(unit)];
        let lines = wrap(&pieces, 16);
        assert_eq!(plain(&lines), vec!["some text", "[12] two words"]);
    }

    #[test]
    fn overlong_unit_breaks_like_a_word() {
        let unit = button_unit(
            &[Block::InlineRun {
                text: "a very long label".into(),
                style: Style::PLAIN,
            }],
            Style::PLAIN,
        );
        let lines = wrap(&[Piece::Unit(unit)], 8);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width() <= 8));
    }

    #[test]
    fn break_forces_new_line() {
        let lines = wrap(&[text("a"), Piece::Break, text("b")], 40);
        assert_eq!(plain(&lines), vec!["a", "b"]);
    }

    #[test]
    fn whitespace_only_input_produces_nothing() {
        assert!(wrap(&[text("  \n ")], 10).is_empty());
    }

    #[test]
    fn wide_characters_count_double() {
        let lines = wrap(&[text("漢字 漢字 漢字")], 9);
        assert_eq!(plain(&lines), vec!["漢字 漢字", "漢字"]);
    }

    #[test]
    fn chop_replaces_too_wide_grapheme() {
        let lines = chop(&[Span::new("漢", Style::PLAIN)], 1);
        assert_eq!(plain(&lines), vec!["?"]);
    }

    // -- labels ---------------------------------------------------------

    #[test]
    fn label_whitespace_is_normalized() {
        let spans = label_spans(
            &[
                Block::InlineRun {
                    text: "  Hello\n".into(),
                    style: Style::PLAIN,
                },
                Block::InlineRun {
                    text: "  world ".into(),
                    style: Style::default().bold(),
                },
            ],
            Style::PLAIN,
        );
        let joined: String = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(joined, "Hello world");
    }

    #[test]
    fn empty_link_label_shows_href() {
        let unit = link_unit(3, "http://a.test/", &[], Style::PLAIN);
        let joined: String = unit.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(joined, "[3] http://a.test/");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn wrapped_lines_fit(s in "[a-z漢 ]{0,120}", width in 1usize..60) {
                for line in wrap(&[text(&s)], width) {
                    prop_assert!(line.width() <= width);
                }
            }

            #[test]
            fn wrap_keeps_every_word(s in "[a-z ]{0,120}", width in 1usize..60) {
                let out: String = wrap(&[text(&s)], width)
                    .iter()
                    .map(RenderLine::plain_text)
                    .collect::<Vec<_>>()
                    .join("");
                let squeezed: String = s.split_whitespace().collect();
                let got: String = out.split_whitespace().collect();
                prop_assert_eq!(got, squeezed);
            }
        }
    }
}
