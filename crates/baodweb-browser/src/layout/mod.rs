//! Layout engine: block tree + width -> width-bounded render lines.
//!
//! The engine performs one exhaustive match over [`Block`]. Consecutive
//! inline blocks are gathered and word-wrapped together ([`text`]);
//! block-level variants force a line break before and after themselves.
//! Tables are negotiated in [`table`], images are delegated to
//! [`crate::raster`].
//!
//! Every line produced for width `W` has a display width of at most `W`,
//! and identical input always yields identical output.

pub mod table;
pub mod text;

use std::collections::BTreeMap;

use baodweb_types::{Color, ColorMode, ImageError, LayoutError, NamedColor, Style};

use crate::block::{Block, Role};
use crate::raster::{self, DecodedImage};
use crate::width::{scrub_controls, str_width};
use text::{Piece, chop, inline_pieces, label_spans, wrap};

/// Narrowest terminal that gets full chrome and grid tables.
pub const MIN_WIDTH: usize = 20;

/// Decoded images of a page, keyed by resolved `src`.
pub type ImageTable = BTreeMap<String, Result<DecodedImage, ImageError>>;

// -----------------------------------------------------------------------
// Render lines
// -----------------------------------------------------------------------

/// A run of text with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

impl Span {
    pub fn new(text: &str, style: Style) -> Self {
        Self {
            text: text.to_string(),
            style,
        }
    }

    pub fn width(&self) -> usize {
        str_width(&self.text)
    }
}

/// One laid-out terminal row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderLine {
    pub spans: Vec<Span>,
}

impl RenderLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str, style: Style) -> Self {
        let mut line = Self::new();
        line.push(text, style);
        line
    }

    /// Append text, extending the last span when the style matches.
    pub fn push(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.spans.push(Span::new(text, style)),
        }
    }

    pub fn extend(&mut self, spans: impl IntoIterator<Item = Span>) {
        for span in spans {
            self.push(&span.text, span.style);
        }
    }

    pub fn width(&self) -> usize {
        self.spans.iter().map(Span::width).sum()
    }

    pub fn is_blank(&self) -> bool {
        self.spans.iter().all(|s| s.text.trim().is_empty())
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Pad with plain spaces up to `width` columns.
    pub fn pad_to(&mut self, width: usize) {
        let w = self.width();
        if w < width {
            self.push(&" ".repeat(width - w), Style::PLAIN);
        }
    }
}

// -----------------------------------------------------------------------
// Entry points
// -----------------------------------------------------------------------

/// Inputs besides the block tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    pub width: usize,
    /// Selects how images are rasterized.
    pub color_mode: ColorMode,
}

/// Report whether `width` is below the supported minimum. Layout still
/// runs in that case, in degraded form.
pub fn check_width(width: usize) -> Result<(), LayoutError> {
    if width < MIN_WIDTH {
        return Err(LayoutError::TerminalTooNarrow {
            width,
            minimum: MIN_WIDTH,
        });
    }
    Ok(())
}

/// Lay out a whole document.
pub fn layout(blocks: &[Block], images: &ImageTable, options: &LayoutOptions) -> Vec<RenderLine> {
    let width = options.width.max(1);
    let engine = Engine {
        images,
        color_mode: options.color_mode,
        narrow: width < MIN_WIDTH,
        measuring: false,
    };
    let mut lines = Vec::new();
    engine.blocks(blocks, width, &mut lines);
    trim_blank_edges(&mut lines);
    lines
}

// -----------------------------------------------------------------------
// Engine
// -----------------------------------------------------------------------

const RULE_STYLE: Style = Style {
    fg: Some(Color::Named(NamedColor::BrightBlack)),
    ..Style::PLAIN
};

const BORDER_STYLE: Style = RULE_STYLE;

const QUOTE_BAR: &str = "│ ";

pub(crate) struct Engine<'a> {
    images: &'a ImageTable,
    color_mode: ColorMode,
    /// Terminal is below [`MIN_WIDTH`]: no frames, stacked tables.
    pub(crate) narrow: bool,
    /// Natural-width pass for table cells. Content that would stretch to
    /// the available width (rules, frames, images, nested tables) is laid
    /// out at its own size instead.
    pub(crate) measuring: bool,
}

impl Engine<'_> {
    pub(crate) fn for_measuring(&self) -> Engine<'_> {
        Engine {
            images: self.images,
            color_mode: self.color_mode,
            narrow: self.narrow,
            measuring: true,
        }
    }

    /// Lay out a sequence of sibling blocks at `width`.
    pub(crate) fn blocks(&self, blocks: &[Block], width: usize, out: &mut Vec<RenderLine>) {
        let mut pieces = Vec::new();
        for block in blocks {
            if block.is_inline() {
                inline_pieces(std::slice::from_ref(block), Style::PLAIN, &mut pieces);
                continue;
            }
            flush_inline(&mut pieces, width, out);
            self.block(block, width, out);
        }
        flush_inline(&mut pieces, width, out);
    }

    fn block(&self, block: &Block, width: usize, out: &mut Vec<RenderLine>) {
        match block {
            Block::Heading { level, children } => {
                push_blank(out);
                self.heading(*level, children, width, out);
                push_blank(out);
            },
            Block::Paragraph(children) => {
                self.blocks(children, width, out);
                push_blank(out);
            },
            Block::List { ordered, items } => {
                self.list(*ordered, items, width, out);
                push_blank(out);
            },
            Block::ListItem(children) => self.list_item("• ", children, width, out),
            Block::Table(rows) => {
                table::layout_table(self, rows, width, out);
                push_blank(out);
            },
            Block::TableRow(children) | Block::TableCell { children, .. } => {
                self.blocks(children, width, out)
            },
            Block::Image {
                src,
                alt,
                width_hint,
                height_hint,
            } => {
                self.image(src, alt, (*width_hint, *height_hint), width, out);
                push_blank(out);
            },
            Block::NavBar(items) => {
                self.nav(items, width, out);
                push_blank(out);
            },
            Block::Header(children) => {
                self.framed("Header", children, width, out);
                push_blank(out);
            },
            Block::Footer(children) => {
                self.framed("Footer", children, width, out);
                push_blank(out);
            },
            Block::Container {
                role: Role::Quote,
                children,
            } => {
                self.quote(children, width, out);
                push_blank(out);
            },
            Block::Container { children, .. } => self.blocks(children, width, out),
            Block::Preformatted(text) => {
                preformatted(text, width, out);
                push_blank(out);
            },
            Block::Rule if self.measuring => out.push(RenderLine::from_text("─", RULE_STYLE)),
            Block::Rule => out.push(RenderLine::from_text(&"─".repeat(width), RULE_STYLE)),
            Block::InlineRun { .. } | Block::Link { .. } | Block::Button(_) | Block::LineBreak => {
                let mut pieces = Vec::new();
                inline_pieces(std::slice::from_ref(block), Style::PLAIN, &mut pieces);
                flush_inline(&mut pieces, width, out);
            },
        }
    }

    // -- headings -------------------------------------------------------

    fn heading(&self, level: u8, children: &[Block], width: usize, out: &mut Vec<RenderLine>) {
        let color = match level {
            1 => NamedColor::Cyan,
            2 => NamedColor::Green,
            _ => NamedColor::Yellow,
        };
        let style = Style::default().bold().fg(Color::Named(color));
        let mut pieces = Vec::new();
        if level >= 2 {
            let marks = "#".repeat(level as usize);
            pieces.push(Piece::Text(Span::new(&format!("{marks} "), style)));
        }
        inline_pieces(children, style, &mut pieces);
        if level == 1 {
            for piece in &mut pieces {
                if let Piece::Text(span) = piece {
                    span.text = heavy_glyphs(&span.text);
                }
            }
        }
        out.extend(wrap(&pieces, width));
    }

    // -- lists ----------------------------------------------------------

    fn list(&self, ordered: bool, items: &[Block], width: usize, out: &mut Vec<RenderLine>) {
        for (i, item) in items.iter().enumerate() {
            let marker = if ordered {
                format!("{}. ", i + 1)
            } else {
                "• ".to_string()
            };
            let children = match item {
                Block::ListItem(children) => children.as_slice(),
                other => std::slice::from_ref(other),
            };
            self.list_item(&marker, children, width, out);
        }
    }

    /// First line carries the marker; continuation lines are indented by
    /// the marker's width so they align under the item text.
    fn list_item(&self, marker: &str, children: &[Block], width: usize, out: &mut Vec<RenderLine>) {
        let indent = str_width(marker);
        if width <= indent {
            self.blocks(children, width, out);
            return;
        }
        let mut inner = Vec::new();
        self.blocks(children, width - indent, &mut inner);
        trim_blank_edges(&mut inner);
        if inner.is_empty() {
            inner.push(RenderLine::new());
        }
        for (i, line) in inner.into_iter().enumerate() {
            let mut row = if i == 0 {
                RenderLine::from_text(marker, Style::PLAIN)
            } else {
                RenderLine::from_text(&" ".repeat(indent), Style::PLAIN)
            };
            row.extend(line.spans);
            out.push(row);
        }
    }

    fn quote(&self, children: &[Block], width: usize, out: &mut Vec<RenderLine>) {
        let bar = str_width(QUOTE_BAR);
        if width <= bar {
            self.blocks(children, width, out);
            return;
        }
        let mut inner = Vec::new();
        self.blocks(children, width - bar, &mut inner);
        trim_blank_edges(&mut inner);
        for line in inner {
            let mut row = RenderLine::from_text(QUOTE_BAR, BORDER_STYLE);
            row.extend(line.spans);
            out.push(row);
        }
    }

    // -- images ---------------------------------------------------------

    fn image(
        &self,
        src: &str,
        alt: &str,
        hints: (Option<u32>, Option<u32>),
        width: usize,
        out: &mut Vec<RenderLine>,
    ) {
        let caption = if alt.is_empty() { src } else { alt };
        match self.images.get(src) {
            Some(Ok(img)) if self.measuring => {
                let columns = raster::column_budget(img, hints.0, hints.1, width);
                let columns = columns.min(raster::NATURAL_MAX_COLUMNS);
                out.push(RenderLine::from_text(&" ".repeat(columns), Style::PLAIN));
            },
            Some(Ok(img)) => {
                let columns = raster::column_budget(img, hints.0, hints.1, width);
                out.extend(raster::rasterize(img, columns, self.color_mode));
            },
            Some(Err(e)) => {
                log::debug!("image placeholder for {src}: {e}");
                out.extend(raster::placeholder(width));
            },
            None => out.extend(raster::placeholder(width)),
        }
        let caption = scrub_controls(caption);
        let label = Span::new(&format!("[Image: {caption}]"), Style::default().italic());
        out.extend(wrap(&[Piece::Text(label)], width));
    }

    // -- navigation bar -------------------------------------------------

    /// Items in a box sized to its content, left-aligned. Items that do
    /// not fit on one row continue on further rows and the box then spans
    /// the full width.
    fn nav(&self, items: &[Block], width: usize, out: &mut Vec<RenderLine>) {
        let units: Vec<Vec<Span>> = items
            .iter()
            .map(|item| label_spans(std::slice::from_ref(item), Style::PLAIN))
            .filter(|spans| spans.iter().map(Span::width).sum::<usize>() > 0)
            .collect();
        if units.is_empty() {
            return;
        }
        if self.narrow || width < 5 {
            let mut pieces = Vec::new();
            for (i, unit) in units.into_iter().enumerate() {
                if i > 0 {
                    pieces.push(Piece::Text(Span::new(" | ", BORDER_STYLE)));
                }
                pieces.push(Piece::Unit(unit));
            }
            out.extend(wrap(&pieces, width));
            return;
        }

        let inner = width - 4;
        let mut rows: Vec<RenderLine> = Vec::new();
        let mut row = RenderLine::new();
        let mut used = 0;
        for unit in units {
            let unit_width: usize = unit.iter().map(Span::width).sum();
            if unit_width > inner {
                if used > 0 {
                    rows.push(std::mem::take(&mut row));
                    used = 0;
                }
                rows.extend(chop(&unit, inner));
                continue;
            }
            if used > 0 && used + 3 + unit_width > inner {
                rows.push(std::mem::take(&mut row));
                used = 0;
            }
            if used > 0 {
                row.push(" │ ", BORDER_STYLE);
                used += 3;
            }
            row.extend(unit);
            used += unit_width;
        }
        if used > 0 {
            rows.push(row);
        }

        let box_width = match rows.as_slice() {
            [only] => only.width(),
            _ => inner,
        };
        frame_rows(None, rows, box_width, out);
    }

    // -- header / footer ------------------------------------------------

    fn framed(&self, label: &str, children: &[Block], width: usize, out: &mut Vec<RenderLine>) {
        if self.narrow || width < MIN_WIDTH {
            self.blocks(children, width, out);
            return;
        }
        let mut inner = width - 4;
        let mut lines = Vec::new();
        self.blocks(children, inner, &mut lines);
        trim_blank_edges(&mut lines);
        if self.measuring {
            let content = lines.iter().map(RenderLine::width).max().unwrap_or(0);
            inner = content.max(str_width(label) + 2).min(inner);
        }
        frame_rows(Some(label), lines, inner, out);
    }
}

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

fn flush_inline(pieces: &mut Vec<Piece>, width: usize, out: &mut Vec<RenderLine>) {
    if pieces.is_empty() {
        return;
    }
    out.extend(wrap(pieces, width));
    pieces.clear();
}

/// Add a blank separator line unless the output is empty or already ends
/// with one.
fn push_blank(out: &mut Vec<RenderLine>) {
    if out.last().is_some_and(|l| !l.is_blank()) {
        out.push(RenderLine::new());
    }
}

pub(crate) fn trim_blank_edges(lines: &mut Vec<RenderLine>) {
    while lines.last().is_some_and(RenderLine::is_blank) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| l.is_blank()).count();
    lines.drain(..leading);
}

/// Draw a rounded box of inner width `inner` (plus 4 columns of frame)
/// around `rows`, with an optional label in the top border.
fn frame_rows(label: Option<&str>, rows: Vec<RenderLine>, inner: usize, out: &mut Vec<RenderLine>) {
    let span = inner + 2;
    let top = match label {
        Some(label) if str_width(label) + 3 <= span => {
            let head = format!("─ {label} ");
            let rest = span - str_width(&head);
            format!("╭{head}{}╮", "─".repeat(rest))
        },
        _ => format!("╭{}╮", "─".repeat(span)),
    };
    out.push(RenderLine::from_text(&top, BORDER_STYLE));
    for line in rows {
        let mut row = RenderLine::from_text("│ ", BORDER_STYLE);
        let mut content = line;
        content.pad_to(inner);
        row.extend(content.spans);
        row.push(" │", BORDER_STYLE);
        out.push(row);
    }
    out.push(RenderLine::from_text(
        &format!("╰{}╯", "─".repeat(span)),
        BORDER_STYLE,
    ));
}

fn preformatted(text: &str, width: usize, out: &mut Vec<RenderLine>) {
    for raw in text.lines() {
        let expanded = raw.replace('\t', "    ");
        if expanded.trim().is_empty() {
            out.push(RenderLine::new());
            continue;
        }
        out.extend(chop(&[Span::new(&expanded, Style::PLAIN)], width));
    }
}

/// Swap ASCII letters and digits for their Mathematical Bold forms.
pub fn heavy_glyphs(text: &str) -> String {
    text.chars()
        .map(|c| {
            let mapped = match c {
                'A'..='Z' => char::from_u32(0x1D400 + (c as u32 - 'A' as u32)),
                'a'..='z' => char::from_u32(0x1D41A + (c as u32 - 'a' as u32)),
                '0'..='9' => char::from_u32(0x1D7CE + (c as u32 - '0' as u32)),
                _ => None,
            };
            mapped.unwrap_or(c)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::build;
    use crate::config::Config;
    use crate::dom::parse_html;

    fn render(html: &str, width: usize) -> Vec<RenderLine> {
        let root = parse_html(html.as_bytes()).unwrap();
        let tree = build(&root, None, &Config::default());
        let options = LayoutOptions {
            width,
            color_mode: ColorMode::TrueColor,
        };
        layout(&tree.blocks, &ImageTable::new(), &options)
    }

    fn plain(lines: &[RenderLine]) -> Vec<String> {
        lines.iter().map(RenderLine::plain_text).collect()
    }

    // ---------------------------------------------------------------
    // Render lines
    // ---------------------------------------------------------------

    #[test]
    fn push_merges_equal_styles_only() {
        let mut line = RenderLine::new();
        line.push("a", Style::PLAIN);
        line.push("b", Style::PLAIN);
        line.push("c", Style::default().bold());
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.plain_text(), "abc");
    }

    #[test]
    fn too_narrow_is_reported() {
        assert!(check_width(80).is_ok());
        assert_eq!(
            check_width(12),
            Err(LayoutError::TerminalTooNarrow {
                width: 12,
                minimum: MIN_WIDTH
            })
        );
    }

    // ---------------------------------------------------------------
    // Blocks
    // ---------------------------------------------------------------

    #[test]
    fn paragraphs_are_separated_by_one_blank_line() {
        let lines = render("<p>one</p><p>two</p>", 40);
        assert_eq!(plain(&lines), vec!["one", "", "two"]);
    }

    #[test]
    fn heading_prefixes() {
        let lines = render("<title>T</title><h2>Sub</h2><h3>Minor</h3>", 40);
        assert_eq!(plain(&lines), vec!["## Sub", "", "### Minor"]);
        assert!(lines[0].spans[0].style.bold);
    }

    #[test]
    fn h1_uses_heavy_glyphs_once() {
        let lines = render("<title>T</title><h1>Big</h1>", 40);
        let text: Vec<String> = plain(&lines);
        assert_eq!(text, vec![heavy_glyphs("Big")]);
        assert_eq!(str_width(&text[0]), 3);
    }

    #[test]
    fn unordered_list_hangs_continuations() {
        let lines = render("<ul><li>alpha beta gamma</li></ul>", 12);
        assert_eq!(plain(&lines), vec!["• alpha beta", "  gamma"]);
    }

    #[test]
    fn ordered_list_numbers_items() {
        let lines = render("<ol><li>a</li><li>b</li><li>c</li></ol>", 20);
        assert_eq!(plain(&lines), vec!["1. a", "2. b", "3. c"]);
    }

    #[test]
    fn nested_list_is_indented() {
        let lines = render("<ul><li>outer<ul><li>inner</li></ul></li></ul>", 30);
        assert_eq!(plain(&lines), vec!["• outer", "  • inner"]);
    }

    #[test]
    fn links_render_with_ids() {
        let lines = render(r#"<p>see <a href="http://a.test/">the docs</a> now</p>"#, 40);
        assert_eq!(plain(&lines), vec!["see [1] the docs now"]);
    }

    #[test]
    fn buttons_render_bracketed() {
        let lines = render("<p><button>OK</button></p>", 40);
        assert_eq!(plain(&lines), vec!["[ OK ]"]);
    }

    #[test]
    fn nav_box_shrinks_to_content() {
        let lines = render(r#"<nav><a href="/a">A</a><a href="/b">B</a></nav>"#, 60);
        let text = plain(&lines);
        assert_eq!(text[1], "│ [1] A │ [2] B │");
        assert_eq!(str_width(&text[0]), str_width(&text[1]));
        assert!(str_width(&text[0]) < 60);
    }

    #[test]
    fn nav_wraps_onto_more_rows() {
        let html = r#"<nav><a href="/a">Alpha</a><a href="/b">Bravo</a><a href="/c">Charlie</a></nav>"#;
        let lines = render(html, 24);
        assert!(lines.len() > 3);
        assert!(lines.iter().all(|l| l.width() == 24));
    }

    #[test]
    fn header_box_spans_width() {
        let lines = render("<header><p>Site</p></header>", 30);
        let text = plain(&lines);
        assert!(text[0].starts_with("╭─ Header "));
        assert!(text[1].starts_with("│ Site"));
        assert!(lines.iter().all(|l| l.width() == 30));
    }

    #[test]
    fn narrow_width_drops_frames() {
        let lines = render("<footer><p>bye</p></footer>", 10);
        assert_eq!(plain(&lines), vec!["bye"]);
    }

    #[test]
    fn preformatted_is_verbatim() {
        let lines = render("<pre>a  b\n\tc</pre>", 40);
        assert_eq!(plain(&lines), vec!["a  b", "    c"]);
    }

    #[test]
    fn missing_image_shows_placeholder_and_alt_once() {
        let lines = render(r#"<img src="http://a.test/x.png" alt="A cat">"#, 40);
        let text = plain(&lines);
        assert_eq!(text.iter().filter(|l| l.contains("A cat")).count(), 1);
        assert!(text[0].contains('░'));
    }

    #[test]
    fn rule_and_frame_in_cell_keep_natural_widths() {
        let lines = plain(&render("<table><tr><td>ab<hr></td><td>c</td></tr></table>", 40));
        assert_eq!(lines, vec!["╭──┬─╮", "│ab│c│", "│──│ │", "╰──┴─╯"]);

        let lines = render("<table><tr><td><header>hi</header></td><td>c</td></tr></table>", 40);
        assert!(lines.iter().all(|l| l.width() < 40), "{:?}", plain(&lines));
    }

    #[test]
    fn deep_nesting_lays_out_on_a_small_stack() {
        let divs = format!("{}deep{}", "<div>".repeat(10_000), "</div>".repeat(10_000));
        let mixed = format!("{}mixed", "<div><blockquote><ul><li><table><tr><td>".repeat(300));
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(move || (render(&divs, 80), render(&mixed, 80)))
            .unwrap();
        let (divs, mixed) = handle.join().unwrap();
        assert_eq!(plain(&divs), vec!["deep"]);
        assert!(mixed.iter().all(|l| l.width() <= 80));
    }

    #[test]
    fn rule_spans_width() {
        let lines = render("<p>a</p><hr><p>b</p>", 25);
        assert!(lines.iter().any(|l| l.plain_text() == "─".repeat(25)));
    }

    #[test]
    fn layout_is_idempotent() {
        let html = r#"<h2>T</h2><p>x <b>y</b> <a href="/z">z</a></p>
                      <table><tr><th>k</th><th>v</th></tr><tr><td>1</td><td>2</td></tr></table>"#;
        assert_eq!(render(html, 33), render(html, 33));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn arb_html() -> impl Strategy<Value = String> {
            let word = "[a-zA-Z漢]{1,14}";
            let para = proptest::collection::vec(word, 1..30).prop_map(|w| format!("<p>{}</p>", w.join(" ")));
            let link = "[a-z]{1,30}".prop_map(|t| format!(r#"<p><a href="/{t}">{t} {t}</a></p>"#));
            let list = proptest::collection::vec("[a-z ]{1,40}", 1..5).prop_map(|items| {
                let lis: String = items.iter().map(|i| format!("<li>{i}</li>")).collect();
                format!("<ol>{lis}</ol>")
            });
            let table = (1usize..5, proptest::collection::vec("[a-z ]{0,30}", 1..12)).prop_map(|(cols, cells)| {
                let mut html = String::from("<table>");
                for row in cells.chunks(cols) {
                    html.push_str("<tr>");
                    for c in row {
                        html.push_str(&format!("<td>{c}</td>"));
                    }
                    html.push_str("</tr>");
                }
                html.push_str("</table>");
                html
            });
            let nav = proptest::collection::vec("[a-z]{1,12}", 1..6).prop_map(|items| {
                let links: String = items.iter().map(|i| format!(r#"<a href="/{i}">{i}</a>"#)).collect();
                format!("<nav>{links}</nav>")
            });
            proptest::collection::vec(prop_oneof![para, link, list, table, nav], 1..6)
                .prop_map(|parts| parts.concat())
        }

        proptest! {
            #[test]
            fn every_line_fits(html in arb_html(), width in 1usize..120) {
                for line in render(&html, width) {
                    prop_assert!(line.width() <= width, "{:?} > {}", line.plain_text(), width);
                }
            }

            #[test]
            fn relayout_is_byte_identical(html in arb_html(), width in 20usize..100) {
                prop_assert_eq!(render(&html, width), render(&html, width));
            }
        }
    }
}
