//! Fatal build errors.
//!
//! User mistakes never surface here; they become [`OverlayIssue`]s. A
//! `BuildError` aborts only the rebuild that produced it.
//!
//! [`OverlayIssue`]: super::OverlayIssue

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A newer edit superseded this rebuild.
    #[error("rebuild cancelled after {processed} of {total} fragments")]
    Cancelled { processed: usize, total: usize },

    /// Builder invariant violated (a bug, not bad input).
    #[error("graph builder invariant violated: {0}")]
    Invariant(String),
}

impl BuildError {
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BuildError::Cancelled { .. })
    }
}
