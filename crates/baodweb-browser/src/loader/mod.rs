//! Resource loading: URL resolution and scheme dispatch.
//!
//! The session only sees the [`Fetcher`] trait. [`Loader`] is the real
//! implementation: `http`/`https` go through [`http::HttpClient`], `file`
//! and `test:` pages are read from disk by [`local`], and `about:` pages
//! are generated in memory.
//!
//! Fetches block; the session runs them on a worker thread and abandons
//! them through a [`CancelToken`].

pub mod http;
pub mod local;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use url::Url;

use baodweb_types::FetchError;

use crate::config::Config;
use crate::generate;

/// Schemes accepted as-is by [`resolve_input`].
pub const KNOWN_SCHEMES: &[&str] = &["http", "https", "file", "about", "test"];

/// URL of the start page.
pub const HOME_URL: &str = "about:home";

/// Default network timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// -------------------------------------------------------------------
// Fetcher
// -------------------------------------------------------------------

/// One fetch. The config is carried along because some generated pages
/// and localized files depend on it.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub config: Config,
}

/// Raw bytes of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    /// Base for relative links when it differs from the request URL
    /// (`test:` pages resolve against their file location).
    pub base: Option<Url>,
}

impl Fetched {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            base: None,
        }
    }
}

/// Source of page and image bytes.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, request: &Request, cancel: &CancelToken) -> Result<Fetched, FetchError>;
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancelled.
    pub fn check(&self) -> Result<(), FetchError> {
        if self.is_cancelled() {
            Err(FetchError::Cancelled)
        } else {
            Ok(())
        }
    }
}

// -------------------------------------------------------------------
// URL resolution
// -------------------------------------------------------------------

/// Turn command-bar input into an absolute URL.
///
/// Absolute URLs with a known scheme pass through. Anything else is joined
/// onto `base` when there is one that can be joined onto. Failing that, an
/// existing local path becomes a `file://` URL and everything else gets
/// `https://` in front.
pub fn resolve_input(input: &str, base: Option<&Url>) -> Result<Url, FetchError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FetchError::Unsupported("empty URL".into()));
    }
    if let Ok(url) = Url::parse(input) {
        if KNOWN_SCHEMES.contains(&url.scheme()) {
            return Ok(url);
        }
    }
    if let Some(base) = base.filter(|b| !b.cannot_be_a_base()) {
        if let Ok(url) = base.join(input) {
            return Ok(url);
        }
    }
    let path = Path::new(input);
    if path.exists() {
        let absolute = path.canonicalize()?;
        return Url::from_file_path(&absolute)
            .map_err(|()| FetchError::Unsupported(absolute.display().to_string()));
    }
    Url::parse(&format!("https://{input}")).map_err(|_| FetchError::Unsupported(input.to_string()))
}

// -------------------------------------------------------------------
// Loader
// -------------------------------------------------------------------

/// Scheme-dispatching fetcher.
#[derive(Debug)]
pub struct Loader {
    http: http::HttpClient,
    data_dir: PathBuf,
}

impl Loader {
    pub fn new(data_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            http: http::HttpClient::new(timeout),
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn about(&self, url: &Url, config: &Config) -> Result<Fetched, FetchError> {
        let page = url.path();
        let html = match page {
            "home" => {
                if let Some(found) = local::start_page(&self.data_dir, &config.language)? {
                    return Ok(found);
                }
                generate::home_page()
            },
            "blank" => String::new(),
            "config" => generate::config_page(config),
            "tests" => generate::tests_page(&local::list_tests(&self.data_dir), &config.language),
            "languages" => {
                generate::languages_page(&local::list_languages(&self.data_dir), &config.language)
            },
            _ => match page.strip_prefix("generate/") {
                Some(tag) => generate::tag_page(&tag.to_ascii_lowercase())
                    .ok_or_else(|| FetchError::NotFound(format!("no sample page for <{tag}>")))?,
                None => return Err(FetchError::NotFound(url.to_string())),
            },
        };
        Ok(Fetched::new(html))
    }
}

impl Fetcher for Loader {
    fn fetch(&self, request: &Request, cancel: &CancelToken) -> Result<Fetched, FetchError> {
        cancel.check()?;
        let url = &request.url;
        log::debug!("fetch {url}");
        match url.scheme() {
            "http" | "https" => self.http.get(url, cancel).map(Fetched::new),
            "file" => local::read_file(url),
            "test" => local::test_page(&self.data_dir, url.path(), &request.config.language),
            "about" => self.about(url, &request.config),
            other => Err(FetchError::Unsupported(format!("{other}: scheme"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn request(s: &str) -> Request {
        Request {
            url: url(s),
            config: Config::default(),
        }
    }

    // ---------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------

    #[test]
    fn relative_input_merges_with_current_path() {
        let base = url("http://x.test/a/b");
        assert_eq!(resolve_input("c", Some(&base)).unwrap().as_str(), "http://x.test/a/c");
        assert_eq!(resolve_input("/d", Some(&base)).unwrap().as_str(), "http://x.test/d");
    }

    #[test]
    fn absolute_input_passes_through() {
        let base = url("http://x.test/a/b");
        let got = resolve_input("https://other.test/p", Some(&base)).unwrap();
        assert_eq!(got.as_str(), "https://other.test/p");
        assert_eq!(resolve_input("about:config", None).unwrap().as_str(), "about:config");
    }

    #[test]
    fn bare_host_gets_https() {
        let got = resolve_input("example.test", None).unwrap();
        assert_eq!(got.as_str(), "https://example.test/");
    }

    #[test]
    fn opaque_base_is_not_joined() {
        let base = url("about:home");
        let got = resolve_input("example.test/x", Some(&base)).unwrap();
        assert_eq!(got.as_str(), "https://example.test/x");
    }

    #[test]
    fn existing_path_becomes_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("page.html");
        std::fs::write(&page, "<p>hi</p>").unwrap();
        let got = resolve_input(page.to_str().unwrap(), None).unwrap();
        assert_eq!(got.scheme(), "file");
        assert!(got.path().ends_with("/page.html"));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(resolve_input("   ", None), Err(FetchError::Unsupported(_))));
    }

    // ---------------------------------------------------------------
    // Dispatch
    // ---------------------------------------------------------------

    #[test]
    fn generated_pages() {
        let dir = tempfile::tempdir().unwrap();
        let loader = Loader::new(dir.path(), DEFAULT_TIMEOUT);
        let cancel = CancelToken::new();
        let page = loader.fetch(&request("about:generate/table"), &cancel).unwrap();
        assert!(String::from_utf8_lossy(&page.bytes).contains("<table>"));
        let config = loader.fetch(&request("about:config"), &cancel).unwrap();
        assert!(String::from_utf8_lossy(&config.bytes).contains("enable-color"));
        assert!(matches!(
            loader.fetch(&request("about:generate/blink"), &cancel),
            Err(FetchError::NotFound(_))
        ));
    }

    #[test]
    fn home_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let loader = Loader::new(dir.path(), DEFAULT_TIMEOUT);
        let page = loader.fetch(&request(HOME_URL), &CancelToken::new()).unwrap();
        assert!(String::from_utf8_lossy(&page.bytes).contains("Welcome"));
    }

    #[test]
    fn cancelled_token_stops_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let loader = Loader::new(dir.path(), DEFAULT_TIMEOUT);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            loader.fetch(&request("about:blank"), &cancel),
            Err(FetchError::Cancelled)
        ));
    }

    #[test]
    fn unknown_scheme_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let loader = Loader::new(dir.path(), DEFAULT_TIMEOUT);
        assert!(matches!(
            loader.fetch(&request("gopher://x.test/"), &CancelToken::new()),
            Err(FetchError::Unsupported(_))
        ));
    }
}
