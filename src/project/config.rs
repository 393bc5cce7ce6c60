//! Host configuration

use std::time::Duration;

use crate::hir::BuildOptions;
use crate::macros::DEFAULT_MAX_DEPTH;

/// Settings shared by every context of a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Quiet period after an edit before the rebuild starts
    pub debounce: Duration,
    /// Bound on nested user-macro expansions during macro resolution
    pub max_expansion_depth: usize,
    /// Which optional diagnostics the builder emits
    pub build: BuildOptions,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(250),
            max_expansion_depth: DEFAULT_MAX_DEPTH,
            build: BuildOptions::default(),
        }
    }
}

impl HostConfig {
    /// Configuration without a debounce delay, for batch use.
    pub fn immediate() -> Self {
        Self {
            debounce: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}
