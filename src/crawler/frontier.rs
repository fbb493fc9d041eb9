//! Breadth-first crawl frontier
//!
//! A FIFO queue of pending URLs plus the set of URLs already handed out.
//! Together they guarantee that a URL is dequeued and processed at most
//! once per run, and that traversal is breadth-first across pagination
//! chains.

use std::collections::{HashSet, VecDeque};
use url::Url;

#[derive(Debug, Default)]
pub struct Frontier {
    pending: VecDeque<Url>,
    queued: HashSet<Url>,
    visited: HashSet<Url>,
}

impl Frontier {
    /// Creates a frontier seeded with the start URL
    pub fn new(start_url: Url) -> Self {
        let mut frontier = Self::default();
        frontier.enqueue(start_url);
        frontier
    }

    /// Adds a URL to the back of the queue
    ///
    /// URLs already visited or already pending are silently dropped; a
    /// pagination link pointing back at a processed page (including a
    /// self-loop) is expected, not an error. Fragments are stripped so
    /// `/list#top` and `/list` count as the same page.
    ///
    /// Returns true when the URL was actually queued.
    pub fn enqueue(&mut self, mut url: Url) -> bool {
        url.set_fragment(None);

        if self.visited.contains(&url) || self.queued.contains(&url) {
            return false;
        }

        self.queued.insert(url.clone());
        self.pending.push_back(url);
        true
    }

    /// Removes and returns the next URL in FIFO order
    ///
    /// The URL is marked visited immediately, before the caller processes
    /// it, so pagination discovery during processing cannot re-enqueue it.
    pub fn next(&mut self) -> Option<Url> {
        while let Some(url) = self.pending.pop_front() {
            self.queued.remove(&url);
            if self.visited.contains(&url) {
                continue;
            }
            self.visited.insert(url.clone());
            return Some(url);
        }
        None
    }

    /// Number of URLs waiting to be processed
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of URLs handed out so far
    pub fn visited(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
