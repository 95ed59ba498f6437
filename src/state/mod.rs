//! State module for tracking crawl progress
//!
//! This module provides the state owned by a single crawl run.
//!
//! # Components
//!
//! - `CrawlState`: The visited-address set with atomic check-and-mark
//! - `PageOutcome`: How processing one page or stylesheet ended
//! - `ResourceKind`: Whether an outcome refers to a page or a stylesheet

mod crawl_state;
mod page_state;

// Re-export main types
pub use crawl_state::CrawlState;
pub use page_state::{PageOutcome, ResourceKind};
