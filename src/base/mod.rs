//! Foundation types for the devicetree toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`FileId`] - Identifier of a source file inside one context
//! - [`Position`], [`Span`], [`Location`] - Line/column positions for fragments
//! - [`Name`] - Small interned-style string used for node, property and label names
//! - Identifier casing helpers mirroring the build's macro naming
//!
//! This module has NO dependencies on other crate modules.

mod file_id;
mod ident;
mod position;

pub use file_id::FileId;
pub use ident::{to_macro_ident, to_string_token, to_upper_token};
pub use position::{Location, Position, Span};

/// Names are short and cloned often; `SmolStr` keeps them inline.
pub type Name = smol_str::SmolStr;

// Re-export text-size types for byte-offset ranges (macro call trees)
pub use text_size::{TextRange, TextSize};
