//! Output module for reporting crawl results
//!
//! This module handles the run summary: the per-outcome counters a crawl
//! accumulates and the report printed when it completes.

pub mod stats;

pub use stats::{print_summary, CrawlSummary};
