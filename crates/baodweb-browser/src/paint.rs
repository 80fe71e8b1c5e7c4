//! Painter: render lines + bars -> one terminal escape-sequence buffer.
//!
//! Row 0 is the title bar, the last row is the command bar, and the rows
//! in between show `lines[offset .. offset + viewport_height]`. Below
//! [`MIN_WIDTH`] columns both bars are dropped and the page uses the whole
//! screen. Every row is clamped to the terminal width here; wrapping has
//! already happened in layout.

use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::queue;
use crossterm::style::{
    Attribute, Color as TermColor, Print, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{Clear, ClearType};

use baodweb_types::{Color, ColorMode, NamedColor, QuantizedColor, Style};

use crate::layout::{MIN_WIDTH, RenderLine};
use crate::width::{split_at_width, str_width, strip_controls, truncate_with_ellipsis};

const TITLE_STYLE: Style = Style {
    bold: true,
    reverse: true,
    ..Style::PLAIN
};

const STATUS_STYLE: Style = Style {
    fg: Some(Color::Named(NamedColor::Yellow)),
    ..Style::PLAIN
};

const PROMPT: &str = "> ";

/// Everything one repaint needs.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub title: &'a str,
    pub lines: &'a [RenderLine],
    pub offset: usize,
    /// Last status message, shown before the prompt.
    pub status: Option<&'a str>,
    /// Text typed so far.
    pub input: &'a str,
    pub width: usize,
    pub height: usize,
    pub color_mode: ColorMode,
}

/// Whether the title and command bars are drawn at `width`.
pub fn has_bars(width: usize) -> bool {
    width >= MIN_WIDTH
}

/// Rows left for page content.
pub fn viewport_height(width: usize, height: usize) -> usize {
    if has_bars(width) {
        height.saturating_sub(2)
    } else {
        height
    }
}

/// Build the screen as exactly `height` rows, none wider than `width`.
pub fn compose_rows(frame: &Frame<'_>) -> Vec<RenderLine> {
    let width = frame.width;
    let bars = has_bars(width);
    let body = viewport_height(width, frame.height);
    let mut rows = Vec::with_capacity(frame.height);

    if bars && frame.height >= 2 {
        let title = strip_controls(frame.title);
        let mut title = RenderLine::from_text(&truncate_with_ellipsis(&title, width), TITLE_STYLE);
        let pad = width - title.width();
        title.push(&" ".repeat(pad), TITLE_STYLE);
        rows.push(title);
    }

    let start = frame.offset.min(frame.lines.len());
    let end = (start + body).min(frame.lines.len());
    for line in &frame.lines[start..end] {
        rows.push(clamp_line(line, width));
    }
    while rows.len() < body + usize::from(bars && frame.height >= 2) {
        rows.push(RenderLine::new());
    }

    if bars && frame.height >= 1 {
        rows.push(command_bar(frame.status, frame.input, width));
    }
    rows
}

fn command_bar(status: Option<&str>, input: &str, width: usize) -> RenderLine {
    let mut bar = RenderLine::new();
    if let Some(status) = status.filter(|s| !s.is_empty()) {
        // Keep room for the prompt and a few typed characters.
        let room = width.saturating_sub(PROMPT.len() + 3 + 8);
        if room > 0 {
            bar.push(&format!("[{}] ", truncate_with_ellipsis(status, room)), STATUS_STYLE);
        }
    }
    bar.push(PROMPT, Style::PLAIN);
    let room = width.saturating_sub(bar.width());
    // Show the end of long input, where the cursor is.
    let mut shown = input;
    while str_width(shown) > room {
        let mut chars = shown.chars();
        chars.next();
        shown = chars.as_str();
    }
    bar.push(shown, Style::PLAIN);
    clamp_line(&bar, width)
}

/// Truncate a line to `width` columns. Control characters never reach
/// the terminal.
pub fn clamp_line(line: &RenderLine, width: usize) -> RenderLine {
    let mut out = RenderLine::new();
    let mut room = width;
    for span in &line.spans {
        if room == 0 {
            break;
        }
        let text = strip_controls(&span.text);
        let (head, _) = split_at_width(&text, room);
        out.push(head, span.style);
        room -= str_width(head);
    }
    out
}

/// Serialize the frame into `out`.
pub fn paint(frame: &Frame<'_>, out: &mut Vec<u8>) -> io::Result<()> {
    let rows = compose_rows(frame);
    queue!(out, Hide)?;
    for (y, row) in rows.iter().enumerate() {
        queue!(out, MoveTo(0, y as u16), Clear(ClearType::UntilNewLine))?;
        write_line(out, row, frame.color_mode)?;
    }
    if has_bars(frame.width) {
        if let Some(bar) = rows.last() {
            let y = rows.len().saturating_sub(1) as u16;
            let x = bar.width().min(frame.width.saturating_sub(1)) as u16;
            queue!(out, MoveTo(x, y), Show)?;
        }
    }
    Ok(())
}

fn write_line(out: &mut impl Write, line: &RenderLine, mode: ColorMode) -> io::Result<()> {
    for span in &line.spans {
        apply_style(out, span.style, mode)?;
        queue!(out, Print(span.text.as_str()), SetAttribute(Attribute::Reset))?;
    }
    Ok(())
}

fn apply_style(out: &mut impl Write, style: Style, mode: ColorMode) -> io::Result<()> {
    if style.bold {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if style.italic {
        queue!(out, SetAttribute(Attribute::Italic))?;
    }
    if style.underline {
        queue!(out, SetAttribute(Attribute::Underlined))?;
    }
    if style.strike {
        queue!(out, SetAttribute(Attribute::CrossedOut))?;
    }
    if style.reverse || (style.mark && mode == ColorMode::NoColor) {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    }
    if let Some(fg) = style.fg.and_then(|c| to_term_color(c, mode)) {
        queue!(out, SetForegroundColor(fg))?;
    }
    let bg = match (style.bg, style.mark) {
        (Some(bg), _) => Some(bg),
        (None, true) => Some(Color::Named(NamedColor::Yellow)),
        (None, false) => None,
    };
    if let Some(bg) = bg.and_then(|c| to_term_color(c, mode)) {
        queue!(out, SetBackgroundColor(bg))?;
    }
    Ok(())
}

/// Map a style color onto what `mode` can show. `None` emits nothing.
pub fn to_term_color(color: Color, mode: ColorMode) -> Option<TermColor> {
    Some(match mode.quantize(color)? {
        QuantizedColor::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        QuantizedColor::Indexed(i) => TermColor::AnsiValue(i),
        QuantizedColor::Named(n) => named(n),
    })
}

fn named(color: NamedColor) -> TermColor {
    match color {
        NamedColor::Black => TermColor::Black,
        NamedColor::Red => TermColor::DarkRed,
        NamedColor::Green => TermColor::DarkGreen,
        NamedColor::Yellow => TermColor::DarkYellow,
        NamedColor::Blue => TermColor::DarkBlue,
        NamedColor::Magenta => TermColor::DarkMagenta,
        NamedColor::Cyan => TermColor::DarkCyan,
        NamedColor::White => TermColor::Grey,
        NamedColor::BrightBlack => TermColor::DarkGrey,
        NamedColor::BrightRed => TermColor::Red,
        NamedColor::BrightGreen => TermColor::Green,
        NamedColor::BrightYellow => TermColor::Yellow,
        NamedColor::BrightBlue => TermColor::Blue,
        NamedColor::BrightMagenta => TermColor::Magenta,
        NamedColor::BrightCyan => TermColor::Cyan,
        NamedColor::BrightWhite => TermColor::White,
    }
}
