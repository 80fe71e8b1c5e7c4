//! Files on disk: plain `file://` pages, start pages and test pages.
//!
//! Start and test pages live in the data directory:
//!
//! ```text
//! <data dir>/start-page.html
//! <data dir>/start-page-<lang>.html
//! <data dir>/test-pages/<page>.html
//! <data dir>/test-pages/<page>-<lang>.html
//! ```
//!
//! The language-specific file is tried first (`<lang>` is lower-case).

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use url::Url;

use baodweb_types::FetchError;

use super::Fetched;

/// Environment variable naming the data directory.
pub const HOME_ENV: &str = "BAODWEB_HOME";

const TEST_DIR: &str = "test-pages";

/// `$BAODWEB_HOME`, or the current directory.
pub fn data_dir() -> PathBuf {
    std::env::var_os(HOME_ENV)
        .map(PathBuf::from)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Read a `file://` URL.
pub fn read_file(url: &Url) -> Result<Fetched, FetchError> {
    let path = url
        .to_file_path()
        .map_err(|()| FetchError::Unsupported(url.to_string()))?;
    Ok(Fetched::new(read_path(&path)?))
}

fn read_path(path: &Path) -> Result<Vec<u8>, FetchError> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => FetchError::NotFound(path.display().to_string()),
        _ => FetchError::Io(e),
    })
}

/// First existing candidate, read, with its file URL as base.
fn first_existing(candidates: &[PathBuf]) -> Result<Option<Fetched>, FetchError> {
    for path in candidates {
        if path.is_file() {
            let bytes = read_path(path)?;
            let base = path
                .canonicalize()
                .ok()
                .and_then(|p| Url::from_file_path(p).ok());
            log::debug!("loaded {}", path.display());
            return Ok(Some(Fetched { bytes, base }));
        }
    }
    Ok(None)
}

/// The start page for `language`, or `None` when neither file exists.
pub fn start_page(dir: &Path, language: &str) -> Result<Option<Fetched>, FetchError> {
    let lang = language.to_ascii_lowercase();
    first_existing(&[
        dir.join(format!("start-page-{lang}.html")),
        dir.join("start-page.html"),
    ])
}

/// A page under `test-pages/`.
pub fn test_page(dir: &Path, name: &str, language: &str) -> Result<Fetched, FetchError> {
    let name = name.trim();
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(FetchError::Unsupported(format!("test:{name}")));
    }
    let lang = language.to_ascii_lowercase();
    let tests = dir.join(TEST_DIR);
    first_existing(&[
        tests.join(format!("{name}-{lang}.html")),
        tests.join(format!("{name}.html")),
    ])?
    .ok_or_else(|| FetchError::NotFound(format!("test:{name}")))
}

/// Test page names, language suffixes folded, sorted.
pub fn list_tests(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir.join(TEST_DIR)) else {
        return Vec::new();
    };
    let mut names = BTreeSet::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(stem) = file_name.to_str().and_then(|n| n.strip_suffix(".html")) else {
            continue;
        };
        let base = match stem.rsplit_once('-') {
            Some((base, lang)) if !base.is_empty() && is_language_code(lang) => base,
            _ => stem,
        };
        names.insert(base.to_string());
    }
    names.into_iter().collect()
}

/// Languages that have a `start-page-<lang>.html`, upper-case, sorted.
pub fn list_languages(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut langs = BTreeSet::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let lang = file_name
            .to_str()
            .and_then(|n| n.strip_prefix("start-page-"))
            .and_then(|n| n.strip_suffix(".html"));
        if let Some(lang) = lang.filter(|l| is_language_code(l)) {
            langs.insert(lang.to_ascii_uppercase());
        }
    }
    langs.into_iter().collect()
}

fn is_language_code(s: &str) -> bool {
    s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic())
}
