//! Rebuild scheduling and graph publication.

use std::sync::Arc;
use std::time::Duration;

use dtsa::base::FileId;
use dtsa::hir::{BuildError, MacroTable};
use dtsa::project::{ContextHost, ContextId, HostConfig, ParseCache, Workspace};
use dtsa::syntax::SourceFragment;

use crate::helpers::fixtures::{BINDINGS, base_board, uart_overlay};

fn host(config: HostConfig) -> ContextHost {
    ContextHost::new(
        config,
        Arc::new(BINDINGS.clone()),
        Arc::new(MacroTable::new()),
    )
}

#[tokio::test]
async fn test_new_host_publishes_empty_graph() {
    let host = host(HostConfig::default());
    assert!(host.is_stable());
    let graph = host.stable_snapshot().await;
    assert_eq!(graph.node_count(), 1);
    assert!(graph.issues().is_empty());
}

#[tokio::test]
async fn test_rebuild_publishes_merged_graph() {
    let host = host(HostConfig::immediate());
    let built = host
        .rebuild(vec![base_board(), uart_overlay()])
        .await
        .unwrap();

    assert!(host.is_stable());
    assert!(Arc::ptr_eq(&built, &host.snapshot()));
    let uart = built.get_node("/soc/uart@1000").unwrap();
    assert_eq!(built.string_property(uart, "status"), Some("okay"));
}

#[tokio::test]
async fn test_stable_snapshot_waits_for_in_flight_rebuild() {
    let host = host(HostConfig::default().with_debounce(Duration::from_millis(20)));
    let before = host.snapshot();

    let (built, seen) = tokio::join!(host.rebuild(vec![base_board()]), async {
        tokio::task::yield_now().await;
        assert!(!host.is_stable());
        host.stable_snapshot().await
    });

    let built = built.unwrap();
    assert!(Arc::ptr_eq(&built, &seen));
    assert!(!Arc::ptr_eq(&before, &seen));
    assert!(seen.get_node("/soc/uart@1000").is_some());
}

#[tokio::test]
async fn test_newer_rebuild_cancels_older() {
    let host = host(HostConfig::default().with_debounce(Duration::from_millis(50)));

    let (first, second) = tokio::join!(host.rebuild(vec![base_board()]), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        host.rebuild(vec![base_board(), uart_overlay()]).await
    });

    let error = first.unwrap_err();
    assert!(error.is_cancelled());
    assert!(matches!(error, BuildError::Cancelled { processed: 0, total: 1 }));

    let second = second.unwrap();
    assert!(Arc::ptr_eq(&second, &host.snapshot()));
    let uart = second.get_node("/soc/uart@1000").unwrap();
    assert!(second.live_property(uart, "clock-frequency").is_none());
    assert!(host.is_stable());
}

#[tokio::test]
async fn test_cancel_pending_keeps_previous_graph() {
    let host = host(HostConfig::default().with_debounce(Duration::from_millis(50)));
    let before = host.snapshot();

    let (result, ()) = tokio::join!(host.rebuild(vec![base_board()]), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        host.cancel_pending();
    });

    assert!(result.unwrap_err().is_cancelled());
    assert!(Arc::ptr_eq(&before, &host.snapshot()));
    assert!(host.is_stable());
}

#[tokio::test]
async fn test_workspace_contexts_are_isolated() {
    let workspace = Workspace::new(HostConfig::immediate(), Arc::new(BINDINGS.clone()));
    let board = workspace.context(ContextId(2));
    let other = workspace.context(ContextId(1));

    board.rebuild(vec![base_board()]).await.unwrap();

    assert!(board.snapshot().get_node("/soc").is_some());
    assert!(other.snapshot().get_node("/soc").is_none());
    assert_eq!(workspace.ids(), vec![ContextId(1), ContextId(2)]);
    assert!(Arc::ptr_eq(&workspace.context(ContextId(2)), &board));

    assert!(workspace.close(ContextId(2)));
    assert!(!workspace.close(ContextId(2)));
    assert_eq!(workspace.len(), 1);
}

#[tokio::test]
async fn test_cached_fragments_feed_rebuilds() {
    let host = host(HostConfig::immediate());
    let mut cache: ParseCache<SourceFragment> = ParseCache::new();
    let file = FileId(0);
    let mut parses = 0;

    for _ in 0..2 {
        let fragment = cache.get_or_parse(file, "/ { soc { }; };", |_| {
            parses += 1;
            base_board()
        });
        host.rebuild(vec![(*fragment).clone()]).await.unwrap();
    }

    assert_eq!(parses, 1);
    assert_eq!(cache.stats(), (1, 1));
    assert!(cache.invalidate(file));
    assert!(cache.is_empty());
}
