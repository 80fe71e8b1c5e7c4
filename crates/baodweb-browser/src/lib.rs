//! Terminal HTML browser engine.
//!
//! The pipeline runs markup → [`dom::Node`] tree → [`block::BlockTree`]
//! → [`layout::RenderLine`]s → one escape-sequence buffer from
//! [`paint::paint`]. [`session::Session`] owns the current page, history,
//! viewport and configuration, and [`commands::CommandRegistry`] maps
//! command-bar input onto it.

pub mod block;
pub mod commands;
pub mod config;
pub mod dom;
pub mod generate;
pub mod layout;
pub mod loader;
pub mod nav;
pub mod paint;
pub mod raster;
pub mod scroll;
pub mod session;
pub mod source;
pub mod width;

#[cfg(test)]
pub(crate) mod test_utils;

// -----------------------------------------------------------------------
// Public re-exports
// -----------------------------------------------------------------------

pub use block::{Block, BlockTree, LinkRegistry, build};
pub use commands::{BrowserCommand, CommandOutput, CommandRegistry, register_browser_commands};
pub use config::{Config, ConfigStore};
pub use layout::{LayoutOptions, RenderLine, Span, layout};
pub use loader::{CancelToken, Fetcher, Loader};
pub use nav::{History, HistoryEntry};
pub use paint::Frame;
pub use scroll::Viewport;
pub use session::{LoadingState, Page, Session};
