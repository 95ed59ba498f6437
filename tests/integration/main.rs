//! Integration tests for Site-Archiver
//!
//! These tests use wiremock to stand in for both the archived site and the
//! blob service, and exercise full archive runs end-to-end.

mod crawl_tests;
mod support;
