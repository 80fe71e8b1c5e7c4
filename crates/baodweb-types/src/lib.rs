//! Foundation types for BaodWeb.
//!
//! This crate holds the types shared by the browser engine and the
//! terminal front end: the error taxonomy every pipeline stage reports
//! through, and the style/color model that layout produces and the
//! painter serializes.

pub mod error;
pub mod style;

pub use error::{
    BrowserError, CommandError, ConfigError, FetchError, ImageError, LayoutError,
    NavigationError, ParseError, Result,
};
pub use style::{Color, ColorMode, NamedColor, QuantizedColor, Style};
