//! Crawler module for web page fetching and traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - HTML parsing and href selection
//! - Domain-scoped, depth-first traversal that archives every page it reaches

mod coordinator;
mod fetcher;
mod parser;

pub use coordinator::{run_archive, Crawler};
pub use fetcher::{build_http_client, Fetcher};
pub use parser::{select_hrefs, Document};
