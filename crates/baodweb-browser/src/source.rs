//! Source view: the raw page markup, lightly highlighted.

use baodweb_types::{Color, NamedColor, Style};

use crate::layout::text::chop;
use crate::layout::{RenderLine, Span};
use crate::width::scrub_controls;

/// Token classes of the highlighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Text,
    Tag,
    AttrName,
    AttrValue,
    Comment,
}

impl Token {
    pub fn style(self) -> Style {
        let fg = |c| Style::default().fg(Color::Named(c));
        match self {
            Token::Text => Style::PLAIN,
            Token::Tag => fg(NamedColor::Blue).bold(),
            Token::AttrName => fg(NamedColor::Cyan),
            Token::AttrValue => fg(NamedColor::Green),
            Token::Comment => fg(NamedColor::BrightBlack).italic(),
        }
    }
}

/// Split markup into classified runs. Concatenating the runs gives back
/// the input.
pub fn tokenize(src: &str) -> Vec<(Token, &str)> {
    let mut out = Vec::new();
    let mut rest = src;
    while !rest.is_empty() {
        if rest.starts_with("<!--") {
            let end = rest.find("-->").map_or(rest.len(), |i| i + 3);
            out.push((Token::Comment, &rest[..end]));
            rest = &rest[end..];
        } else if rest.starts_with('<') {
            let end = rest.find('>').map_or(rest.len(), |i| i + 1);
            tag_tokens(&rest[..end], &mut out);
            rest = &rest[end..];
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            out.push((Token::Text, &rest[..end]));
            rest = &rest[end..];
        }
    }
    out
}

/// `<name attr="value" ...>`: the name and punctuation are `Tag`.
fn tag_tokens<'a>(tag: &'a str, out: &mut Vec<(Token, &'a str)>) {
    let name_end = tag[1..]
        .find(|c: char| c.is_whitespace() || c == '>')
        .map_or(tag.len(), |i| i + 1);
    out.push((Token::Tag, &tag[..name_end]));
    let mut rest = &tag[name_end..];
    while !rest.is_empty() {
        let c = rest.chars().next().unwrap_or(' ');
        let len = if c.is_whitespace() {
            let n = rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len());
            out.push((Token::Text, &rest[..n]));
            n
        } else if c == '"' || c == '\'' {
            let n = rest[1..].find(c).map_or(rest.len(), |i| i + 2);
            out.push((Token::AttrValue, &rest[..n]));
            n
        } else if c == '=' || c == '>' || c == '/' {
            out.push((Token::Tag, &rest[..1]));
            1
        } else {
            let n = rest
                .find(|c: char| c.is_whitespace() || matches!(c, '=' | '>' | '/'))
                .unwrap_or(rest.len());
            let prev_is_eq = out.last().is_some_and(|(_, s)| *s == "=");
            let class = if prev_is_eq {
                Token::AttrValue
            } else {
                Token::AttrName
            };
            out.push((class, &rest[..n]));
            n
        };
        rest = &rest[len.max(1).min(rest.len())..];
    }
}

/// Render `src` as highlighted lines, each hard-broken at `width`.
pub fn render(src: &str, width: usize) -> Vec<RenderLine> {
    let mut lines = Vec::new();
    let mut current: Vec<Span> = Vec::new();
    for (token, text) in tokenize(src) {
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            let part = scrub_controls(part.trim_end_matches('\r')).replace('\t', "    ");
            if !part.is_empty() {
                current.push(Span::new(&part, token.style()));
            }
            if parts.peek().is_some() {
                flush(&mut current, width, &mut lines);
            }
        }
    }
    if !current.is_empty() {
        flush(&mut current, width, &mut lines);
    }
    lines
}

fn flush(spans: &mut Vec<Span>, width: usize, lines: &mut Vec<RenderLine>) {
    if spans.is_empty() {
        lines.push(RenderLine::new());
    } else {
        lines.extend(chop(spans, width));
    }
    spans.clear();
}
