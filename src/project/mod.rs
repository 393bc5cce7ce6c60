//! Project layer - per-context hosting of the merged graph.
//!
//! ## Key Types
//!
//! - [`ContextHost`] - Debounced, cancellable rebuild and atomic graph swap
//! - [`Workspace`] - Independent contexts keyed by [`ContextId`]
//! - [`ParseCache`] - Parsed files keyed by content digest
//! - [`HostConfig`] - Debounce, expansion depth and builder options

mod config;
mod context;
mod parse_cache;

pub use config::HostConfig;
pub use context::{ContextHost, ContextId, Workspace};
pub use parse_cache::{ParseCache, content_digest};
