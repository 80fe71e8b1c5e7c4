//! History stack.
//!
//! Entries record where the user was and how far they had scrolled; the
//! page itself is re-fetched on `back` so that a resize in between is
//! honored. Only successful forward navigations push, and `back` only
//! pops once the re-fetch has succeeded.

use url::Url;

/// A single entry in the navigation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: Url,
    pub scroll: usize,
}

/// Back stack, most recent entry last.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, url: Url, scroll: usize) {
        self.entries.push(HistoryEntry { url, scroll });
    }

    /// Entry `back` would return, without removing it.
    pub fn peek(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn push_and_pop_are_lifo() {
        let mut history = History::new();
        history.push(url("http://a.test/"), 0);
        history.push(url("http://b.test/"), 7);
        assert_eq!(history.len(), 2);

        let top = history.pop().unwrap();
        assert_eq!(top.url.as_str(), "http://b.test/");
        assert_eq!(top.scroll, 7);
        assert_eq!(history.pop().unwrap().url.as_str(), "http://a.test/");
        assert!(history.pop().is_none());
    }

    #[test]
    fn peek_does_not_remove() {
        let mut history = History::new();
        assert!(history.peek().is_none());
        history.push(url("http://a.test/"), 3);
        assert_eq!(history.peek().unwrap().scroll, 3);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn iter_is_most_recent_first() {
        let mut history = History::new();
        history.push(url("http://a.test/"), 0);
        history.push(url("http://b.test/"), 0);
        let urls: Vec<&str> = history.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["http://b.test/", "http://a.test/"]);
    }
}
