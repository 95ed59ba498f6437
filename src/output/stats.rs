//! Run summary for a crawl
//!
//! This module provides the counters a crawl run accumulates and the
//! formatted report printed when it ends.

use crate::state::{PageOutcome, ResourceKind};
use std::time::Duration;

/// Outcome counts for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Distinct addresses marked visited (the root included)
    pub pages_visited: usize,

    /// Pages persisted, the root document included
    pub pages_stored: u64,

    /// Stylesheets persisted
    pub stylesheets_stored: u64,

    /// Links skipped because their address was already visited
    pub already_visited: u64,

    /// Pages or stylesheets that could not be fetched
    pub fetch_failures: u64,

    /// Pages or stylesheets that could not be staged or uploaded
    pub persist_failures: u64,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl CrawlSummary {
    /// Tallies one outcome
    pub fn record(&mut self, kind: ResourceKind, outcome: PageOutcome) {
        match (kind, outcome) {
            (ResourceKind::Page, PageOutcome::Stored) => self.pages_stored += 1,
            (ResourceKind::Stylesheet, PageOutcome::Stored) => self.stylesheets_stored += 1,
            (_, PageOutcome::AlreadyVisited) => self.already_visited += 1,
            (_, PageOutcome::FetchFailed) => self.fetch_failures += 1,
            (_, PageOutcome::PersistFailed) => self.persist_failures += 1,
        }
    }

    pub fn total_stored(&self) -> u64 {
        self.pages_stored + self.stylesheets_stored
    }

    pub fn total_failures(&self) -> u64 {
        self.fetch_failures + self.persist_failures
    }

    /// Returns true if nothing failed during the run
    pub fn is_clean(&self) -> bool {
        self.total_failures() == 0
    }
}

/// Prints the summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Archive Summary ===\n");

    println!("Overview:");
    println!("  Pages visited: {}", summary.pages_visited);
    println!("  Pages stored: {}", summary.pages_stored);
    println!("  Stylesheets stored: {}", summary.stylesheets_stored);
    println!("  Already-visited links skipped: {}", summary.already_visited);
    println!("  Duration: {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    if !summary.is_clean() {
        println!("Failures:");
        println!("  Fetch: {}", summary.fetch_failures);
        println!("  Persist: {}", summary.persist_failures);
        println!();
    }

    let attempted = summary.total_stored() + summary.total_failures();
    let success_rate = if attempted > 0 {
        (summary.total_stored() as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} resources archived)",
        success_rate,
        summary.total_stored(),
        attempted
    );
}
