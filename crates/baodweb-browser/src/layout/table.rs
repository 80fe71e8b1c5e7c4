//! Table column negotiation and grid drawing.
//!
//! Tables are laid out in two passes. The first measures every column's
//! natural width (widest unwrapped cell content). The second either keeps
//! the natural widths, when the whole grid fits, or splits the available
//! width evenly across columns, leftmost columns taking the remainder one
//! column at a time. When even one column per cell cannot be afforded, or
//! the terminal is below the minimum width, the table is printed as
//! stacked `label: value` records instead of a grid.

use baodweb_types::Style;

use super::text::{Piece, inline_pieces, wrap};
use super::{BORDER_STYLE, Engine, RenderLine, Span, trim_blank_edges};
use crate::block::Block;

/// Width used to measure content "without line breaks".
const UNBOUNDED: usize = 1024;

// -------------------------------------------------------------------
// Table representation
// -------------------------------------------------------------------

/// One cell, normalized out of the block tree.
struct Cell<'a> {
    header: bool,
    children: &'a [Block],
}

/// Rows padded to a common column count.
struct TableLayout<'a> {
    num_cols: usize,
    rows: Vec<Vec<Cell<'a>>>,
}

// -------------------------------------------------------------------
// Public entry point
// -------------------------------------------------------------------

/// Lay out a [`Block::Table`]'s rows at `width`.
pub(crate) fn layout_table(engine: &Engine<'_>, rows: &[Block], width: usize, out: &mut Vec<RenderLine>) {
    let table = parse_table_structure(rows);
    if table.num_cols == 0 {
        return;
    }
    let natural = measure_cell_widths(engine, &table);
    if engine.measuring {
        let total = natural.iter().sum::<usize>() + table.num_cols + 1;
        out.push(RenderLine::from_text(&" ".repeat(total.min(width)), Style::PLAIN));
        return;
    }
    let widths = if engine.narrow {
        None
    } else {
        compute_column_widths(&natural, width)
    };
    match widths {
        Some(widths) => draw_grid(engine, &table, &widths, out),
        None => draw_stacked(&table, width, out),
    }
}

// -------------------------------------------------------------------
// Step 1 -- Parse table structure
// -------------------------------------------------------------------

fn parse_table_structure(rows: &[Block]) -> TableLayout<'_> {
    let mut parsed: Vec<Vec<Cell<'_>>> = rows
        .iter()
        .map(|row| {
            row.children()
                .iter()
                .map(|cell| match cell {
                    Block::TableCell { header, children } => Cell {
                        header: *header,
                        children,
                    },
                    other => Cell {
                        header: false,
                        children: std::slice::from_ref(other),
                    },
                })
                .collect()
        })
        .collect();
    let num_cols = parsed.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut parsed {
        while row.len() < num_cols {
            row.push(Cell {
                header: false,
                children: &[],
            });
        }
    }
    TableLayout {
        num_cols,
        rows: parsed,
    }
}

// -------------------------------------------------------------------
// Step 2 -- Measure natural column widths
// -------------------------------------------------------------------

/// A nested table measures as its natural grid width and is not drawn.
fn measure_cell_widths(engine: &Engine<'_>, table: &TableLayout<'_>) -> Vec<usize> {
    let engine = engine.for_measuring();
    let mut natural = vec![1; table.num_cols];
    for row in &table.rows {
        for (col, cell) in row.iter().enumerate() {
            let mut lines = Vec::new();
            engine.blocks(cell.children, UNBOUNDED, &mut lines);
            let w = lines.iter().map(RenderLine::width).max().unwrap_or(0);
            natural[col] = natural[col].max(w);
        }
    }
    natural
}

// -------------------------------------------------------------------
// Step 3 -- Negotiate final column widths
// -------------------------------------------------------------------

/// Final column widths for a grid of total width at most `width`.
///
/// Natural widths are kept when `sum + (n + 1)` fits. Otherwise the
/// result sums to exactly `width - (n + 1)`. `None` means a grid cannot
/// give every column at least one cell.
pub fn compute_column_widths(natural: &[usize], width: usize) -> Option<Vec<usize>> {
    let n = natural.len();
    let borders = n + 1;
    if natural.iter().sum::<usize>() + borders <= width {
        return Some(natural.to_vec());
    }
    let available = width.checked_sub(borders)?;
    if available < n {
        return None;
    }
    Some(distribute_widths(n, available))
}

// -------------------------------------------------------------------
// Step 4 -- Equal split with remainder on the left
// -------------------------------------------------------------------

fn distribute_widths(n: usize, available: usize) -> Vec<usize> {
    let base = available / n;
    let remainder = available % n;
    (0..n).map(|i| base + usize::from(i < remainder)).collect()
}

// -------------------------------------------------------------------
// Step 5 -- Draw the grid
// -------------------------------------------------------------------

fn draw_grid(engine: &Engine<'_>, table: &TableLayout<'_>, widths: &[usize], out: &mut Vec<RenderLine>) {
    out.push(border_line('╭', '┬', '╮', widths));
    for (r, row) in table.rows.iter().enumerate() {
        let cells: Vec<Vec<RenderLine>> = row
            .iter()
            .zip(widths)
            .map(|(cell, &w)| layout_cell(engine, cell, w))
            .collect();
        let height = cells.iter().map(Vec::len).max().unwrap_or(0).max(1);
        for i in 0..height {
            let mut line = RenderLine::from_text("│", BORDER_STYLE);
            for (lines, &w) in cells.iter().zip(widths) {
                let mut content = lines.get(i).cloned().unwrap_or_default();
                content.pad_to(w);
                line.extend(content.spans);
                line.push("│", BORDER_STYLE);
            }
            out.push(line);
        }
        let is_header_row = row.iter().all(|c| c.header);
        if is_header_row && r + 1 < table.rows.len() {
            out.push(border_line('├', '┼', '┤', widths));
        }
    }
    out.push(border_line('╰', '┴', '╯', widths));
}

fn layout_cell(engine: &Engine<'_>, cell: &Cell<'_>, width: usize) -> Vec<RenderLine> {
    let mut lines = Vec::new();
    engine.blocks(cell.children, width, &mut lines);
    trim_blank_edges(&mut lines);
    if cell.header {
        for line in &mut lines {
            for span in &mut line.spans {
                span.style = Style::default().bold().over(span.style);
            }
        }
    }
    lines
}

fn border_line(left: char, mid: char, right: char, widths: &[usize]) -> RenderLine {
    let mut s = String::new();
    s.push(left);
    for (i, &w) in widths.iter().enumerate() {
        if i > 0 {
            s.push(mid);
        }
        s.extend(std::iter::repeat_n('─', w));
    }
    s.push(right);
    RenderLine::from_text(&s, BORDER_STYLE)
}

// -------------------------------------------------------------------
// Step 6 -- Stacked fallback
// -------------------------------------------------------------------

/// One record per row, one `label: value` line group per cell. Labels come
/// from a leading all-header row when there is one.
fn draw_stacked(table: &TableLayout<'_>, width: usize, out: &mut Vec<RenderLine>) {
    let (labels, body) = match table.rows.split_first() {
        Some((first, rest)) if first.iter().all(|c| c.header) && !rest.is_empty() => {
            let labels: Vec<String> = first
                .iter()
                .map(|c| {
                    let text: Vec<String> = c.children.iter().map(Block::plain_text).collect();
                    text.join(" ").trim().to_string()
                })
                .collect();
            (labels, rest)
        },
        _ => (Vec::new(), table.rows.as_slice()),
    };

    for (r, row) in body.iter().enumerate() {
        if r > 0 {
            out.push(RenderLine::new());
        }
        for (col, cell) in row.iter().enumerate() {
            let label = labels
                .get(col)
                .filter(|l| !l.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("Column {}", col + 1));
            let mut pieces = vec![Piece::Text(Span::new(
                &format!("{label}: "),
                Style::default().bold(),
            ))];
            for child in cell.children {
                inline_pieces(std::slice::from_ref(child), Style::PLAIN, &mut pieces);
                pieces.push(Piece::Text(Span::new(" ", Style::PLAIN)));
            }
            out.extend(wrap(&pieces, width));
        }
    }
}

// -------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------
