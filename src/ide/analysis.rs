//! Analysis - read-only snapshot facade for editor requests.
//!
//! An `Analysis` pairs one published graph with the macro environment of
//! its context. Every query reads the same snapshot, so answers stay
//! consistent even if the host publishes a newer graph meanwhile.

use std::sync::Arc;

use crate::base::{FileId, Position, TextSize};
use crate::hir::{Graph, OverlayIssue};
use crate::macros::{DEFAULT_MAX_DEPTH, MacroEngine, MacroEnv, Resolved};
use crate::project::ContextHost;

use super::goto::{GotoResult, goto_definition};
use super::hover::{HoverResult, MacroHover, hover, hover_macro};

#[derive(Clone)]
pub struct Analysis {
    graph: Arc<Graph>,
    env: Arc<dyn MacroEnv>,
    max_depth: usize,
}

impl Analysis {
    pub fn new(graph: Arc<Graph>, env: Arc<dyn MacroEnv>) -> Self {
        Self {
            graph,
            env,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Wait for the context to be stable and snapshot it.
    pub async fn stable(host: &ContextHost, env: Arc<dyn MacroEnv>) -> Self {
        let graph = host.stable_snapshot().await;
        Self::new(graph, env).with_max_depth(host.config().max_expansion_depth)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn hover(&self, file: FileId, position: Position) -> Option<HoverResult> {
        hover(&self.graph, file, position)
    }

    pub fn hover_macro(&self, source: &str, offset: TextSize) -> Option<MacroHover> {
        hover_macro(&self.graph, self.env.as_ref(), self.max_depth, source, offset)
    }

    pub fn goto_definition(&self, file: FileId, position: Position) -> GotoResult {
        goto_definition(&self.graph, file, position)
    }

    /// Resolve a standalone macro expression.
    pub fn resolve_macro(&self, text: &str) -> Option<Resolved> {
        MacroEngine::new(&self.graph, self.env.as_ref())
            .with_max_depth(self.max_depth)
            .resolve_text(text)
    }

    /// Merge issues located in `file`.
    pub fn diagnostics(&self, file: FileId) -> Vec<&OverlayIssue> {
        self.graph.issues_for_file(file).collect()
    }
}
