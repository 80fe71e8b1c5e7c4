//! Navigation session: the single owner of the current page, history,
//! viewport and configuration.
//!
//! ```text
//!            go / click / back / reload
//!   Idle ──────────────────────────────▶ Loading ──ok──▶ Idle(new page)
//!   Error ─────────────────────────────▶    │
//!     ▲                                      └─fail/timeout─▶ Error(old page)
//!     └──────────────── cancel ─────────────────────────────▶ Idle/Error(old page)
//! ```
//!
//! A load runs fetch, parse, build and image download on a worker thread
//! and hands the finished page back over a channel. The page, its links
//! and the history are only ever replaced on the command-loop thread, in
//! [`Session::poll`] or [`Session::wait`], so a half-built page is never
//! visible. Layout always runs on the command-loop thread.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use url::Url;

use baodweb_types::{ColorMode, FetchError, ImageError, LayoutError, NavigationError, Result};

use crate::block::{BlockTree, build};
use crate::config::{Config, ConfigStore};
use crate::dom::{empty_document, parse_html};
use crate::generate;
use crate::layout::{ImageTable, LayoutOptions, RenderLine, check_width, layout};
use crate::loader::{CancelToken, DEFAULT_TIMEOUT, Fetcher, HOME_URL, Request, resolve_input};
use crate::nav::History;
use crate::paint::{Frame, viewport_height};
use crate::raster::{self, DecodedImage};
use crate::scroll::Viewport;
use crate::source;

/// Interval at which [`Session::wait`] re-checks the deadline.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A load (page plus its images) may take this many fetch timeouts.
const LOAD_BUDGET_FACTOR: u32 = 2;

/// Images downloaded at once.
const MAX_PARALLEL_IMAGES: usize = 4;

const DEFAULT_TITLE: &str = "BaodWeb";

/// Where the session is in its load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingState {
    Idle,
    Loading,
    /// The last load failed; the previous page is still shown.
    Error,
}

// -------------------------------------------------------------------
// Page
// -------------------------------------------------------------------

/// A displayed document.
#[derive(Debug)]
pub struct Page {
    url: Url,
    /// What relative references resolve against.
    base: Url,
    title: String,
    tree: BlockTree,
    images: ImageTable,
    source: Vec<u8>,
    lines: Vec<RenderLine>,
    /// Generated in place of a page that failed to load.
    failed: bool,
}

impl Page {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tree(&self) -> &BlockTree {
        &self.tree
    }

    pub fn images(&self) -> &ImageTable {
        &self.images
    }

    /// Raw markup as fetched.
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Current render lines (layout or source view).
    pub fn lines(&self) -> &[RenderLine] {
        &self.lines
    }

    /// Whether this is the error page shown after a failed first load.
    pub fn is_error_page(&self) -> bool {
        self.failed
    }

    fn from_loaded(loaded: Loaded) -> Self {
        let title = page_title(&loaded.tree, &loaded.url);
        Self {
            url: loaded.url,
            base: loaded.base,
            title,
            tree: loaded.tree,
            images: loaded.images,
            source: loaded.source,
            lines: Vec::new(),
            failed: false,
        }
    }
}

fn page_title(tree: &BlockTree, url: &Url) -> String {
    tree.title
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| url.to_string())
}

// -------------------------------------------------------------------
// Worker side
// -------------------------------------------------------------------

/// Everything a finished load produces, built off the command-loop thread.
#[derive(Debug)]
struct Loaded {
    url: Url,
    base: Url,
    source: Vec<u8>,
    tree: BlockTree,
    images: ImageTable,
    parse_error: Option<String>,
}

/// Fetch, parse, build and download images for `request`.
fn load_page(
    fetcher: &dyn Fetcher,
    request: &Request,
    cancel: &CancelToken,
) -> std::result::Result<Loaded, FetchError> {
    let fetched = fetcher.fetch(request, cancel)?;
    let base = fetched.base.unwrap_or_else(|| request.url.clone());
    let (root, parse_error) = match parse_html(&fetched.bytes) {
        Ok(root) => (root, None),
        Err(e) => (empty_document(), Some(e.to_string())),
    };
    let tree = build(&root, Some(&base), &request.config);
    cancel.check()?;
    let images = fetch_images(fetcher, &tree.images, &request.config, cancel);
    cancel.check()?;
    Ok(Loaded {
        url: request.url.clone(),
        base,
        source: fetched.bytes,
        tree,
        images,
        parse_error,
    })
}

/// Download and decode every image, a few at a time. Failures are kept
/// in the table so layout can draw a placeholder.
fn fetch_images(
    fetcher: &dyn Fetcher,
    sources: &[String],
    config: &Config,
    cancel: &CancelToken,
) -> ImageTable {
    let mut table = ImageTable::new();
    for chunk in sources.chunks(MAX_PARALLEL_IMAGES) {
        if cancel.is_cancelled() {
            break;
        }
        let results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = chunk
                .iter()
                .map(|src| s.spawn(move || fetch_image(fetcher, src, config, cancel)))
                .collect();
            handles
                .into_iter()
                .map(|h| {
                    h.join()
                        .unwrap_or_else(|_| Err(ImageError::DecodeFailed("decoder panicked".into())))
                })
                .collect()
        });
        for (src, result) in chunk.iter().zip(results) {
            if let Err(e) = &result {
                log::warn!("image {src}: {e}");
            }
            table.insert(src.clone(), result);
        }
    }
    table
}

fn fetch_image(
    fetcher: &dyn Fetcher,
    src: &str,
    config: &Config,
    cancel: &CancelToken,
) -> std::result::Result<DecodedImage, ImageError> {
    let url = Url::parse(src).map_err(|_| FetchError::Unsupported(src.to_string()))?;
    let request = Request {
        url,
        config: config.clone(),
    };
    let fetched = fetcher.fetch(&request, cancel)?;
    raster::decode(&fetched.bytes)
}

// -------------------------------------------------------------------
// Session
// -------------------------------------------------------------------

/// What a load does to history and scroll once it succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NavKind {
    /// Push the current page; start at the top.
    Go,
    /// Pop the history entry that was re-fetched; restore its scroll.
    Back { scroll: usize },
    /// Replace the current page in place; keep the scroll.
    Reload { scroll: usize },
}

#[derive(Debug)]
struct Pending {
    url: Url,
    kind: NavKind,
    cancel: CancelToken,
    rx: Receiver<std::result::Result<Loaded, FetchError>>,
    deadline: Instant,
}

/// One browsing session.
pub struct Session {
    fetcher: Arc<dyn Fetcher>,
    config: Config,
    store: Option<ConfigStore>,
    history: History,
    viewport: Viewport,
    page: Option<Page>,
    pending: Option<Pending>,
    state: LoadingState,
    status: Option<String>,
    width: usize,
    height: usize,
    /// What the terminal supports; `enable-color = false` overrides it.
    terminal_colors: ColorMode,
    show_source: bool,
    timeout: Duration,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("url", &self.page.as_ref().map(|p| p.url.as_str()))
            .field("state", &self.state)
            .field("history", &self.history.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// A session with no page yet, sized `width` x `height` cells.
    pub fn new(fetcher: Arc<dyn Fetcher>, config: Config, width: usize, height: usize) -> Self {
        Self {
            fetcher,
            config,
            store: None,
            history: History::new(),
            viewport: Viewport::new(viewport_height(width, height)),
            page: None,
            pending: None,
            state: LoadingState::Idle,
            status: None,
            width,
            height,
            terminal_colors: ColorMode::TrueColor,
            show_source: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Persist successful `config` changes to `store`.
    pub fn with_store(mut self, store: ConfigStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Per-fetch timeout; a whole load gets twice this.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_color_mode(mut self, mode: ColorMode) -> Self {
        self.terminal_colors = mode;
        self
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn state(&self) -> LoadingState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadingState::Loading
    }

    pub fn page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    pub fn current_url(&self) -> Option<&Url> {
        self.page.as_ref().map(|p| &p.url)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn showing_source(&self) -> bool {
        self.show_source
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Color mode actually used for output.
    pub fn color_mode(&self) -> ColorMode {
        if self.config.color_enabled {
            self.terminal_colors
        } else {
            ColorMode::NoColor
        }
    }

    pub fn title(&self) -> &str {
        self.page.as_ref().map_or(DEFAULT_TITLE, |p| p.title.as_str())
    }

    pub fn lines(&self) -> &[RenderLine] {
        self.page.as_ref().map(|p| p.lines.as_slice()).unwrap_or(&[])
    }

    /// Everything the painter needs for one repaint.
    pub fn frame<'a>(&'a self, input: &'a str) -> Frame<'a> {
        Frame {
            title: self.title(),
            lines: self.lines(),
            offset: self.viewport.offset(),
            status: self.status(),
            input,
            width: self.width,
            height: self.height,
            color_mode: self.color_mode(),
        }
    }

    // ---------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------

    /// Resolve `input` against the current page and load it.
    pub fn go(&mut self, input: &str) -> Result<()> {
        self.ensure_idle()?;
        let url = resolve_input(input, self.current_url())?;
        self.begin_load(url, NavKind::Go)
    }

    /// Follow link `id` of the current page.
    pub fn click(&mut self, id: u32) -> Result<()> {
        self.ensure_idle()?;
        let (href, base) = self
            .page
            .as_ref()
            .and_then(|p| p.tree.links.get(id).map(|h| (h.to_string(), p.base.clone())))
            .ok_or(NavigationError::InvalidLinkId(id))?;
        let url = resolve_input(&href, Some(&base))?;
        self.begin_load(url, NavKind::Go)
    }

    /// Re-fetch the most recent history entry. The entry is popped only
    /// once that load succeeds.
    pub fn back(&mut self) -> Result<()> {
        self.ensure_idle()?;
        let entry = self
            .history
            .peek()
            .cloned()
            .ok_or(NavigationError::EmptyHistory)?;
        let kind = NavKind::Back {
            scroll: entry.scroll,
        };
        self.begin_load(entry.url, kind)
    }

    /// Re-fetch the current page, keeping the scroll position.
    pub fn reload(&mut self) -> Result<()> {
        self.ensure_idle()?;
        match self.current_url().cloned() {
            Some(url) => {
                let scroll = self.viewport.offset();
                self.begin_load(url, NavKind::Reload { scroll })
            },
            None => self.home(),
        }
    }

    /// Load the start page.
    pub fn home(&mut self) -> Result<()> {
        self.go(HOME_URL)
    }

    /// Abandon the pending load. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        pending.cancel.cancel();
        log::info!("cancelled load of {}", pending.url);
        self.state = LoadingState::Idle;
        self.status = Some(format!("stopped loading {}", pending.url));
        true
    }

    /// Apply a finished load, if there is one. Returns `None` while the
    /// load is still running or when nothing is pending.
    pub fn poll(&mut self) -> Option<Result<()>> {
        let outcome = self.check_pending(None)?;
        Some(self.complete(outcome))
    }

    /// Block until the pending load finishes, fails or runs out of time.
    pub fn wait(&mut self) -> Result<()> {
        while self.pending.is_some() {
            if let Some(outcome) = self.check_pending(Some(POLL_INTERVAL)) {
                return self.complete(outcome);
            }
        }
        Ok(())
    }

    fn ensure_idle(&self) -> std::result::Result<(), NavigationError> {
        if self.pending.is_some() {
            return Err(NavigationError::Busy);
        }
        Ok(())
    }

    fn load_budget(&self) -> Duration {
        self.timeout * LOAD_BUDGET_FACTOR
    }

    fn begin_load(&mut self, url: Url, kind: NavKind) -> Result<()> {
        let cancel = CancelToken::new();
        let (tx, rx) = mpsc::channel();
        let request = Request {
            url: url.clone(),
            config: self.config.clone(),
        };
        let fetcher = Arc::clone(&self.fetcher);
        let token = cancel.clone();
        log::info!("loading {url}");

        self.state = LoadingState::Loading;
        self.status = Some(format!("loading {url}"));
        self.pending = Some(Pending {
            url,
            kind,
            cancel,
            rx,
            deadline: Instant::now() + self.load_budget(),
        });

        let spawned = thread::Builder::new()
            .name("page-loader".into())
            .spawn(move || {
                let outcome = load_page(fetcher.as_ref(), &request, &token);
                // The receiver is gone when the load was cancelled.
                let _ = tx.send(outcome);
            });
        match spawned {
            Ok(_) => Ok(()),
            Err(e) => self.complete(Err(FetchError::Io(e))),
        }
    }

    /// Look for a result, waiting up to `block` for one.
    fn check_pending(
        &self,
        block: Option<Duration>,
    ) -> Option<std::result::Result<Loaded, FetchError>> {
        let pending = self.pending.as_ref()?;
        let received = match block {
            Some(interval) => {
                let left = pending.deadline.saturating_duration_since(Instant::now());
                pending
                    .rx
                    .recv_timeout(left.min(interval))
                    .map_err(|e| e == RecvTimeoutError::Disconnected)
            },
            None => pending
                .rx
                .try_recv()
                .map_err(|e| e == TryRecvError::Disconnected),
        };
        match received {
            Ok(outcome) => Some(outcome),
            Err(true) => Some(Err(FetchError::Unreachable("page loader stopped".into()))),
            Err(false) if Instant::now() >= pending.deadline => {
                pending.cancel.cancel();
                Some(Err(FetchError::Timeout(self.load_budget())))
            },
            Err(false) => None,
        }
    }

    fn complete(&mut self, outcome: std::result::Result<Loaded, FetchError>) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        match outcome {
            Ok(loaded) => {
                log::info!("loaded {}", loaded.url);
                self.install(loaded, pending.kind);
                Ok(())
            },
            Err(err) => {
                log::warn!("load of {} failed: {err}", pending.url);
                let message = format!("{}: {err}", pending.url);
                if self.page.is_none() {
                    self.install_error_page(&pending.url, &err.to_string());
                }
                self.state = LoadingState::Error;
                self.status = Some(message);
                Err(err.into())
            },
        }
    }

    fn install(&mut self, loaded: Loaded, kind: NavKind) {
        let scroll = match kind {
            NavKind::Go => {
                // An error page stands for a URL that did not load.
                if let Some(prev) = self.page.as_ref().filter(|p| !p.failed) {
                    self.history.push(prev.url.clone(), self.viewport.offset());
                }
                0
            },
            NavKind::Back { scroll } => {
                self.history.pop();
                scroll
            },
            NavKind::Reload { scroll } => scroll,
        };
        self.status = loaded.parse_error.clone();
        if let Some(e) = &loaded.parse_error {
            log::warn!("{}: {e}", loaded.url);
        }
        self.page = Some(Page::from_loaded(loaded));
        self.show_source = false;
        self.state = LoadingState::Idle;
        self.relayout();
        self.viewport.scroll_to(scroll);
        self.report_width();
    }

    /// First load failed: show a generated error page in its place.
    fn install_error_page(&mut self, url: &Url, message: &str) {
        let source = generate::error_page(url.as_str(), message).into_bytes();
        let root = parse_html(&source).unwrap_or_else(|_| empty_document());
        let tree = build(&root, Some(url), &self.config);
        let mut page = Page::from_loaded(Loaded {
            url: url.clone(),
            base: url.clone(),
            source,
            tree,
            images: ImageTable::new(),
            parse_error: None,
        });
        page.failed = true;
        self.page = Some(page);
        self.relayout();
        self.viewport.scroll_to_top();
    }

    // ---------------------------------------------------------------
    // Layout
    // ---------------------------------------------------------------

    /// New terminal size: re-lay out the current page and re-clamp the
    /// scroll offset. History is not touched.
    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        log::debug!("resize to {width}x{height}");
        self.width = width;
        self.height = height;
        self.viewport.set_height(viewport_height(width, height));
        self.relayout();
        self.report_width();
    }

    /// Switch between the rendered page and its highlighted markup.
    pub fn toggle_source(&mut self) -> bool {
        if self.page.is_none() {
            return false;
        }
        self.show_source = !self.show_source;
        self.relayout();
        self.viewport.scroll_to_top();
        self.show_source
    }

    fn relayout(&mut self) {
        let options = LayoutOptions {
            width: self.width,
            color_mode: self.color_mode(),
        };
        let show_source = self.show_source;
        let Some(page) = self.page.as_mut() else {
            self.viewport.set_total_lines(0);
            return;
        };
        page.lines = if show_source {
            source::render(&String::from_utf8_lossy(&page.source), options.width.max(1))
        } else {
            layout(&page.tree.blocks, &page.images, &options)
        };
        self.viewport.set_total_lines(page.lines.len());
    }

    fn report_width(&mut self) {
        if let Err(e @ LayoutError::TerminalTooNarrow { .. }) = check_width(self.width) {
            log::debug!("{e}");
            self.status = Some(e.to_string());
        }
    }

    // ---------------------------------------------------------------
    // Configuration
    // ---------------------------------------------------------------

    /// Validate, persist and apply one setting, then rebuild the current
    /// page from its retained source. `about:config` is regenerated so it
    /// shows the new value.
    pub fn set_config(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.config.clone();
        next.set(key, value)?;
        if let Some(store) = &self.store {
            store.save(&next)?;
        }
        log::info!("config {key} = {value}");
        self.config = next;
        self.rebuild();
        let on_config_page = self
            .current_url()
            .is_some_and(|u| u.scheme() == "about" && u.path() == "config");
        if on_config_page && self.pending.is_none() {
            self.reload()?;
        }
        Ok(())
    }

    fn rebuild(&mut self) {
        if let Some(page) = self.page.as_mut() {
            let root = parse_html(&page.source).unwrap_or_else(|_| empty_document());
            page.tree = build(&root, Some(&page.base), &self.config);
            page.title = page_title(&page.tree, &page.url);
        }
        self.relayout();
    }
}
