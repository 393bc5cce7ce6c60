//! IDE feature tests
//!
//! Hover and go-to-definition over merged graphs, using fixtures whose
//! spans mirror small source files.

mod tests_goto;
mod tests_hover;
