//! Macro resolution tests
//!
//! `DT_*` expressions resolved against merged graphs, including user
//! macros expanded through the preprocessor boundary and calls located
//! inside C source text.
