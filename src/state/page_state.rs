/// Page outcome definitions for tracking crawl progress
///
/// This module defines the ways processing one discovered resource can end.
use std::fmt;

/// The kind of resource an outcome refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// An HTML page reached through an anchor (or the root document)
    Page,
    /// A stylesheet linked from the root document
    Stylesheet,
}

/// Represents how processing a single resource ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageOutcome {
    // ===== Success =====
    /// Resource was fetched and persisted
    Stored,

    // ===== Skip =====
    /// Address was already in the visited set; not fetched again
    AlreadyVisited,

    // ===== Errors =====
    /// Resource could not be retrieved; the branch was abandoned
    FetchFailed,

    /// Resource was fetched but could not be staged or uploaded
    PersistFailed,
}

impl PageOutcome {
    /// Returns true if this represents a successful store
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Stored)
    }

    /// Returns true if this is an expected skip rather than a failure
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::AlreadyVisited)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::PersistFailed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::AlreadyVisited => "already_visited",
            Self::FetchFailed => "fetch_failed",
            Self::PersistFailed => "persist_failed",
        }
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
