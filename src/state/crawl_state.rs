use crate::url::visit_key;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The set of addresses visited during one crawl run
///
/// Addresses are inserted at most once and never removed. The check and the
/// insert happen under one lock, so concurrent branches that reach the same
/// address agree on which of them owns it.
#[derive(Debug, Default)]
pub struct CrawlState {
    visited: Mutex<HashSet<String>>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `address` as visited
    ///
    /// Returns true if the caller is the first to visit it, false if it was
    /// already present.
    pub fn mark_visited(&self, address: &str) -> bool {
        self.lock().insert(visit_key(address))
    }

    /// Number of distinct addresses visited so far
    pub fn visited_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set is only ever inserted into, so it stays consistent after a panic
        self.visited.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
