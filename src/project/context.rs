//! Per-context graph host.
//!
//! A context is one compilation unit (one board). Its published graph is
//! immutable; an edit schedules a rebuild that runs a fresh merge and swaps
//! the graph reference in one write. Readers see either the old or the new
//! graph, never a partial merge.
//!
//! ```text
//! rebuild(fragments)
//!     │ cancel in-flight token, mark unstable
//!     ▼
//! debounce ──(newer edit)──► Cancelled
//!     │
//!     ▼
//! GraphBuilder::build (blocking task, checks token per fragment)
//!     │
//!     ▼
//! swap Arc<Graph>, mark stable ──► stable_snapshot() wakes
//! ```

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::hir::{BindingProvider, BuildError, ConstEvaluator, Graph, GraphBuilder, MacroTable};
use crate::syntax::SourceFragment;

use super::config::HostConfig;

#[derive(Default)]
struct RebuildState {
    /// Bumped by every `rebuild` call; only the latest may publish.
    generation: u64,
    cancel: Option<CancellationToken>,
}

/// Owns the published graph of one context.
pub struct ContextHost {
    config: HostConfig,
    bindings: Arc<dyn BindingProvider>,
    evaluator: Arc<dyn ConstEvaluator>,
    graph: RwLock<Arc<Graph>>,
    state: Mutex<RebuildState>,
    /// `true` while no rebuild is in flight.
    stable: watch::Sender<bool>,
}

impl ContextHost {
    pub fn new(
        config: HostConfig,
        bindings: Arc<dyn BindingProvider>,
        evaluator: Arc<dyn ConstEvaluator>,
    ) -> Self {
        let empty = Graph::empty(bindings.clone(), evaluator.clone());
        let (stable, _) = watch::channel(true);
        Self {
            config,
            bindings,
            evaluator,
            graph: RwLock::new(Arc::new(empty)),
            state: Mutex::new(RebuildState::default()),
            stable,
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// The currently published graph, without waiting.
    pub fn snapshot(&self) -> Arc<Graph> {
        self.graph.read().clone()
    }

    pub fn is_stable(&self) -> bool {
        *self.stable.borrow()
    }

    /// Wait until no rebuild is in flight, then return the published graph.
    pub async fn stable_snapshot(&self) -> Arc<Graph> {
        let mut stable = self.stable.subscribe();
        // The sender lives as long as `self`, so this only returns once stable.
        let _ = stable.wait_for(|stable| *stable).await;
        self.snapshot()
    }

    /// Rebuild from `fragments` after the debounce delay and publish.
    ///
    /// A newer call cancels this one; the superseded call returns
    /// [`BuildError::Cancelled`] and publishes nothing.
    pub async fn rebuild(&self, fragments: Vec<SourceFragment>) -> Result<Arc<Graph>, BuildError> {
        let total = fragments.len();
        let (generation, cancel) = self.begin();
        let _in_flight = InFlight {
            host: self,
            generation,
        };

        if !self.config.debounce.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(BuildError::Cancelled { processed: 0, total });
                }
                _ = tokio::time::sleep(self.config.debounce) => {}
            }
        }

        let builder = GraphBuilder::new(self.bindings.clone())
            .with_evaluator(self.evaluator.clone())
            .with_options(self.config.build)
            .with_cancel(cancel);
        let graph = tokio::task::spawn_blocking(move || builder.build(&fragments))
            .await
            .map_err(|e| BuildError::invariant(format!("rebuild task failed: {e}")))??;

        self.publish(generation, graph)
            .ok_or(BuildError::Cancelled {
                processed: total,
                total,
            })
    }

    /// Cancel the in-flight rebuild, if any.
    pub fn cancel_pending(&self) {
        if let Some(cancel) = &self.state.lock().cancel {
            cancel.cancel();
        }
    }

    fn begin(&self) -> (u64, CancellationToken) {
        let mut state = self.state.lock();
        if let Some(previous) = state.cancel.take() {
            previous.cancel();
        }
        state.generation += 1;
        let cancel = CancellationToken::new();
        state.cancel = Some(cancel.clone());
        self.stable.send_replace(false);
        tracing::debug!("[HOST] rebuild #{} scheduled", state.generation);
        (state.generation, cancel)
    }

    fn publish(&self, generation: u64, graph: Graph) -> Option<Arc<Graph>> {
        let state = self.state.lock();
        if state.generation != generation {
            tracing::debug!("[HOST] rebuild #{generation} superseded before publishing");
            return None;
        }
        let graph = Arc::new(graph);
        *self.graph.write() = graph.clone();
        tracing::debug!(
            "[HOST] published rebuild #{generation}: {} nodes, {} issues",
            graph.node_count(),
            graph.issues().len()
        );
        Some(graph)
    }

    /// Mark the context stable if `generation` is still the latest rebuild.
    fn settle(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.generation == generation {
            state.cancel = None;
            self.stable.send_replace(true);
        }
    }
}

/// Settles the host when a rebuild ends, however it ends.
struct InFlight<'a> {
    host: &'a ContextHost,
    generation: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.host.settle(self.generation);
    }
}

/// Identifier of a context within a [`Workspace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(pub u32);

/// Independent contexts sharing only configuration and bindings.
pub struct Workspace {
    config: HostConfig,
    bindings: Arc<dyn BindingProvider>,
    contexts: RwLock<FxHashMap<ContextId, Arc<ContextHost>>>,
}

impl Workspace {
    pub fn new(config: HostConfig, bindings: Arc<dyn BindingProvider>) -> Self {
        Self {
            config,
            bindings,
            contexts: RwLock::new(FxHashMap::default()),
        }
    }

    /// Open `id` with its own define table, replacing any previous context.
    pub fn open(&self, id: ContextId, evaluator: Arc<dyn ConstEvaluator>) -> Arc<ContextHost> {
        let host = Arc::new(ContextHost::new(
            self.config.clone(),
            self.bindings.clone(),
            evaluator,
        ));
        if let Some(previous) = self.contexts.write().insert(id, host.clone()) {
            previous.cancel_pending();
        }
        host
    }

    /// The context `id`, opened with an empty define table when missing.
    pub fn context(&self, id: ContextId) -> Arc<ContextHost> {
        if let Some(host) = self.get(id) {
            return host;
        }
        self.open(id, Arc::new(MacroTable::new()))
    }

    pub fn get(&self, id: ContextId) -> Option<Arc<ContextHost>> {
        self.contexts.read().get(&id).cloned()
    }

    pub fn close(&self, id: ContextId) -> bool {
        match self.contexts.write().remove(&id) {
            Some(host) => {
                host.cancel_pending();
                true
            }
            None => false,
        }
    }

    pub fn ids(&self) -> Vec<ContextId> {
        let mut ids: Vec<ContextId> = self.contexts.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.contexts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.read().is_empty()
    }
}
