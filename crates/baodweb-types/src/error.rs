//! Error types for BaodWeb.
//!
//! Every failure the browser can hit maps onto one of these enums. None of
//! them is fatal to a session: the session turns each into a one-line
//! status message and keeps the previous page on screen.

use std::io;
use std::time::Duration;

/// Failure to turn a URL into bytes.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unsupported URL: {0}")]
    Unsupported(String),

    #[error("cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Malformed markup. The parser is permissive, so this only surfaces when
/// the input could not be read at all.
#[derive(Debug, thiserror::Error)]
#[error("parse error: {0}")]
pub struct ParseError(pub String);

/// Rejected navigation commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("no link with id {0}")]
    InvalidLinkId(u32),

    #[error("history is empty")]
    EmptyHistory,

    #[error("busy: a page is still loading")]
    Busy,
}

/// Layout degradation notices.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("terminal too narrow: {width} columns (minimum {minimum})")]
    TerminalTooNarrow { width: usize, minimum: usize },
}

/// Failure to produce a bitmap for an `<img>`.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image decode failed: {0}")]
    DecodeFailed(String),

    #[error("image download failed: {0}")]
    DownloadFailed(#[from] FetchError),
}

/// Failure to read, validate, or persist a setting.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("config I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Malformed command-bar input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: {0} (try 'help')")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(String),
}

/// Any error the browser engine reports.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, BrowserError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_status_display() {
        let e = FetchError::Status(404);
        assert_eq!(format!("{e}"), "HTTP status 404");
    }

    #[test]
    fn fetch_timeout_display() {
        let e = FetchError::Timeout(Duration::from_millis(2500));
        assert_eq!(format!("{e}"), "timed out after 2.5s");
    }

    #[test]
    fn invalid_link_display() {
        let e = NavigationError::InvalidLinkId(99);
        assert_eq!(format!("{e}"), "no link with id 99");
    }

    #[test]
    fn too_narrow_display() {
        let e = LayoutError::TerminalTooNarrow {
            width: 12,
            minimum: 20,
        };
        assert_eq!(
            format!("{e}"),
            "terminal too narrow: 12 columns (minimum 20)"
        );
    }

    #[test]
    fn config_invalid_value_display() {
        let e = ConfigError::InvalidValue {
            key: "enable-color".into(),
            value: "maybe".into(),
        };
        assert_eq!(format!("{e}"), "invalid value for enable-color: maybe");
    }

    #[test]
    fn image_error_wraps_fetch_error() {
        let e: ImageError = FetchError::Status(500).into();
        assert_eq!(format!("{e}"), "image download failed: HTTP status 500");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: FetchError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("this is [[[not valid toml").unwrap_err();
        let e: ConfigError = toml_err.into();
        assert!(format!("{e}").contains("config parse error"));
    }

    #[test]
    fn browser_error_is_transparent() {
        let e: BrowserError = NavigationError::EmptyHistory.into();
        assert_eq!(format!("{e}"), "history is empty");
        let e: BrowserError = CommandError::Unknown("fly".into()).into();
        assert_eq!(format!("{e}"), "unknown command: fly (try 'help')");
    }

    #[test]
    fn result_alias_err() {
        let r: Result<i32> = Err(NavigationError::Busy.into());
        assert!(matches!(
            r,
            Err(BrowserError::Navigation(NavigationError::Busy))
        ));
    }
}
