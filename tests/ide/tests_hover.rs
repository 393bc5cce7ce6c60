//! Hover over devicetree sources and macro expressions.

use std::sync::Arc;

use dtsa::base::{Position, Span, TextSize};
use dtsa::hir::MacroTable;
use dtsa::ide::{Analysis, hover};
use dtsa::macros::{MacroValue, PreprocessorEnv, Resolved};
use dtsa::project::{ContextHost, HostConfig};

use crate::helpers::fixtures::{BASE, BINDINGS, OVERLAY, base_board, uart_overlay};
use crate::helpers::graph_helpers::build;

#[test]
fn test_hover_node_name() {
    let graph = build(&[base_board(), uart_overlay()]);
    let result = hover(&graph, BASE, Position::new(2, 16)).unwrap();

    assert_eq!(result.location.span, Span::from_coords(2, 8, 5, 10));
    assert!(result.contents.contains("/soc/uart@1000"));
    assert!(result.contents.contains("`uart1`"));
    assert!(result.contents.contains("**Binding:** `vnd,uart`"));
    assert!(result.contents.contains("**Status:** `okay`"));
}

#[test]
fn test_hover_deleted_property_names_directive() {
    let graph = build(&[base_board(), uart_overlay()]);
    let result = hover(&graph, BASE, Position::new(4, 12)).unwrap();

    assert!(result.contents.contains("clock-frequency = <100>;"));
    assert!(
        result
            .contents
            .contains("**Deleted by** `/delete-property/ clock-frequency;`")
    );
}

#[test]
fn test_hover_delete_directive() {
    let graph = build(&[base_board(), uart_overlay()]);
    let result = hover(&graph, OVERLAY, Position::new(1, 10)).unwrap();
    assert_eq!(result.location.file, OVERLAY);
    assert!(
        result
            .contents
            .contains("Removes `clock-frequency` from `/soc/uart@1000`")
    );
}

#[test]
fn test_hover_outside_any_fragment() {
    let graph = build(&[base_board(), uart_overlay()]);
    assert!(hover(&graph, BASE, Position::new(20, 0)).is_none());
}

fn analysis() -> Analysis {
    let graph = build(&[base_board(), uart_overlay()]);
    let table = MacroTable::new().with("CONSOLE", "DT_NODELABEL(uart1)");
    Analysis::new(Arc::new(graph), Arc::new(PreprocessorEnv::new(table)))
}

#[test]
fn test_hover_macro_value_names_source_property() {
    let source = "DT_PROP(DT_NODELABEL(uart1), status)";
    let offset = source.find("status").unwrap() as u32;
    let result = analysis().hover_macro(source, TextSize::from(offset)).unwrap();

    assert_eq!(u32::from(result.range.start()), 0);
    assert_eq!(
        result.resolved.as_value(),
        Some(&MacroValue::Str("okay".into()))
    );
    assert!(result.contents.contains("\"okay\""));
    assert!(result.contents.contains("From `status` of `/soc/uart@1000`"));
}

#[test]
fn test_hover_macro_widens_to_enclosing_call() {
    let source = "x = DT_PROP_OR(CONSOLE, status, FALLBACK(1));";
    let offset = source.find("FALLBACK").unwrap() as u32 + 2;
    let result = analysis().hover_macro(source, TextSize::from(offset)).unwrap();

    let start = source.find("DT_PROP_OR").unwrap() as u32;
    assert_eq!(u32::from(result.range.start()), start);
    assert!(result.contents.starts_with("`DT_PROP_OR(CONSOLE, status, FALLBACK(1))`"));
}

#[test]
fn test_hover_macro_node() {
    let source = "DT_NODELABEL(uart1)";
    let analysis = analysis();
    let result = analysis.hover_macro(source, TextSize::from(2)).unwrap();
    let uart = analysis.graph().get_node("/soc/uart@1000").unwrap();
    assert_eq!(result.resolved, Resolved::Node(uart));
    assert!(result.contents.contains("**Labels:** `uart1`"));
}

#[test]
fn test_hover_macro_unresolvable() {
    assert!(
        analysis()
            .hover_macro("DT_NODELABEL(nowhere)", TextSize::from(2))
            .is_none()
    );
}

#[tokio::test]
async fn test_analysis_from_stable_host() {
    let host = ContextHost::new(
        HostConfig::immediate(),
        Arc::new(BINDINGS.clone()),
        Arc::new(MacroTable::new()),
    );
    host.rebuild(vec![base_board(), uart_overlay()])
        .await
        .unwrap();

    let analysis = Analysis::stable(&host, Arc::new(PreprocessorEnv::default())).await;
    let status = analysis
        .resolve_macro("DT_PROP(DT_NODELABEL(uart1), status)")
        .unwrap();
    assert_eq!(status.as_value(), Some(&MacroValue::Str("okay".into())));

    let diagnostics = analysis.diagnostics(BASE);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code(), "DELETED_BY_DIRECTIVE");
    assert!(analysis.diagnostics(OVERLAY).is_empty());
}
