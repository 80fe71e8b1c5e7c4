//! Bitmap to half-block art.
//!
//! A decoded image is resampled (Lanczos3) to `C` columns by `2 * rows`
//! pixels; each terminal cell then shows two vertically stacked pixels as
//! `▀` with the upper pixel in the foreground and the lower one in the
//! background. Cells whose two pixels are near-identical use a solid
//! block instead. Without color, pixel luminance picks a glyph from an
//! ASCII density ramp.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use baodweb_types::{Color, ColorMode, ImageError, NamedColor, Style};

use crate::layout::RenderLine;

/// Source pixels represented by one terminal column when no width hint
/// is given.
pub const PX_PER_COLUMN: u32 = 8;

/// Height of a terminal cell relative to its width, inverted: cells are
/// about twice as tall as wide.
const CELL_ASPECT: f64 = 0.5;

/// Sum of absolute channel differences under which two pixels are drawn
/// as one solid block.
const SOLID_THRESHOLD: u32 = 24;

/// Most glyph rows one image may take, a few screens' worth.
pub const MAX_ROWS: usize = 120;

/// Widest an image counts when a table measures its cells.
pub const NATURAL_MAX_COLUMNS: usize = 32;

const PLACEHOLDER_ROWS: usize = 3;
const PLACEHOLDER_MAX_WIDTH: usize = 16;

/// Lightest to densest.
const RAMP: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

/// A fully decoded RGB bitmap.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: RgbImage,
}

impl DecodedImage {
    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Decode PNG, JPEG, GIF or WebP bytes.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, ImageError> {
    let img = image::load_from_memory(bytes).map_err(|e| ImageError::DecodeFailed(e.to_string()))?;
    let pixels = img.to_rgb8();
    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(ImageError::DecodeFailed("empty image".into()));
    }
    Ok(DecodedImage { pixels })
}

/// Columns to give an image: its (hinted) pixel width at
/// [`PX_PER_COLUMN`], capped at `width` and never below one.
pub fn column_budget(
    img: &DecodedImage,
    width_hint: Option<u32>,
    height_hint: Option<u32>,
    width: usize,
) -> usize {
    let px_width = match (width_hint, height_hint) {
        (Some(w), _) => w,
        (None, Some(h)) => {
            let scaled = u64::from(h) * u64::from(img.width()) / u64::from(img.height().max(1));
            u32::try_from(scaled).unwrap_or(u32::MAX)
        },
        (None, None) => img.width(),
    };
    ((px_width / PX_PER_COLUMN) as usize).clamp(1, width.max(1))
}

/// Glyph rows for a `width` x `height` bitmap drawn `columns` wide.
pub fn scaled_rows(width: u32, height: u32, columns: usize) -> usize {
    let ratio = f64::from(height) / f64::from(width.max(1));
    let rows = (ratio * columns as f64 * CELL_ASPECT).round() as usize;
    rows.max(1)
}

/// Grid (columns, rows) for a `width` x `height` bitmap given `columns`.
/// An image taller than [`MAX_ROWS`] is narrowed to keep its aspect
/// ratio; rows are capped even when one column is still too many.
pub fn grid_size(width: u32, height: u32, columns: usize) -> (usize, usize) {
    let columns = columns.max(1);
    let rows = scaled_rows(width, height, columns);
    if rows <= MAX_ROWS {
        return (columns, rows);
    }
    let narrowed = (columns * MAX_ROWS / rows).max(1);
    (narrowed, scaled_rows(width, height, narrowed).min(MAX_ROWS))
}

/// Render `img` as half-block art at most `columns` wide and
/// [`MAX_ROWS`] tall.
pub fn rasterize(img: &DecodedImage, columns: usize, mode: ColorMode) -> Vec<RenderLine> {
    let (columns, rows) = grid_size(img.width(), img.height(), columns);
    let scaled = imageops::resize(
        &img.pixels,
        columns as u32,
        (rows * 2) as u32,
        FilterType::Lanczos3,
    );

    let mut lines = Vec::with_capacity(rows);
    for row in 0..rows {
        let mut line = RenderLine::new();
        for x in 0..columns as u32 {
            let upper = *scaled.get_pixel(x, (row * 2) as u32);
            let lower = *scaled.get_pixel(x, (row * 2 + 1) as u32);
            let (glyph, style) = cell(upper, lower, mode);
            line.push(glyph, style);
        }
        lines.push(line);
    }
    lines
}

fn cell(upper: Rgb<u8>, lower: Rgb<u8>, mode: ColorMode) -> (&'static str, Style) {
    if mode == ColorMode::NoColor {
        let lum = (luminance(upper) + luminance(lower)) / 2.0;
        let idx = ((lum / 255.0) * (RAMP.len() - 1) as f64).round() as usize;
        let idx = idx.min(RAMP.len() - 1);
        return (RAMP[idx], Style::PLAIN);
    }
    let fg = Color::Rgb(upper[0], upper[1], upper[2]);
    if distance(upper, lower) <= SOLID_THRESHOLD {
        return ("█", Style::default().fg(fg));
    }
    let bg = Color::Rgb(lower[0], lower[1], lower[2]);
    ("▀", Style::default().fg(fg).bg(bg))
}

fn luminance(p: Rgb<u8>) -> f64 {
    0.299 * f64::from(p[0]) + 0.587 * f64::from(p[1]) + 0.114 * f64::from(p[2])
}

fn distance(a: Rgb<u8>, b: Rgb<u8>) -> u32 {
    a.0.iter()
        .zip(b.0.iter())
        .map(|(&x, &y)| u32::from(x.abs_diff(y)))
        .sum()
}

/// Fixed block shown for an image that could not be fetched or decoded.
pub fn placeholder(width: usize) -> Vec<RenderLine> {
    let w = width.clamp(1, PLACEHOLDER_MAX_WIDTH);
    let style = Style::default().fg(Color::Named(NamedColor::BrightBlack));
    (0..PLACEHOLDER_ROWS)
        .map(|_| RenderLine::from_text(&"░".repeat(w), style))
        .collect()
}
