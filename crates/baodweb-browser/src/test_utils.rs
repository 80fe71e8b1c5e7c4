//! Shared test utilities for the browser engine.
//!
//! Provides in-memory [`Fetcher`]s so session and command tests never
//! touch the network or the file system.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use baodweb_types::FetchError;

use crate::loader::{CancelToken, Fetched, Fetcher, Request};

/// Serves fixed bytes per absolute URL and records every request.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    pages: Mutex<BTreeMap<String, Vec<u8>>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_page(self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.insert(url, body);
        self
    }

    pub fn insert(&self, url: &str, body: impl Into<Vec<u8>>) {
        if let Ok(mut pages) = self.pages.lock() {
            pages.insert(url.to_string(), body.into());
        }
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// How many times `url` was requested.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| *r == url).count()
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&self, request: &Request, cancel: &CancelToken) -> Result<Fetched, FetchError> {
        cancel.check()?;
        let url = request.url.as_str();
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        let pages = self
            .pages
            .lock()
            .map_err(|_| FetchError::Unreachable("poisoned".into()))?;
        pages
            .get(url)
            .map(|body| Fetched::new(body.clone()))
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}

/// Wraps a [`MemoryFetcher`] and stalls every request for `delay`,
/// giving up early once cancelled.
#[derive(Debug)]
pub struct SlowFetcher {
    pub inner: MemoryFetcher,
    pub delay: Duration,
}

impl SlowFetcher {
    pub fn new(inner: MemoryFetcher, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl Fetcher for SlowFetcher {
    fn fetch(&self, request: &Request, cancel: &CancelToken) -> Result<Fetched, FetchError> {
        let until = Instant::now() + self.delay;
        while Instant::now() < until {
            cancel.check()?;
            thread::sleep(Duration::from_millis(5));
        }
        self.inner.fetch(request, cancel)
    }
}

/// A tiny PNG of one solid color.
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("PNG encoding of an in-memory image");
    out.into_inner()
}
