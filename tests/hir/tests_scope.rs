//! Order-relative lookups around delete directives.

use dtsa::base::{Position, Span};
use dtsa::hir::AstHit;
use dtsa::syntax::{BodyItem, ChildNodeFragment, DeleteNodeDirective, SourceFragment, Value};

use crate::helpers::fixtures::{BASE, OVERLAY, base_board, uart_overlay};
use crate::helpers::graph_helpers::{build, node};

/// ```text
/// base.dts                 overlay.dts
/// 0  / {                   0  / {
/// 1      a {               1      /delete-node/ a;
/// 2          x = <1>;      2      a {
/// 3      };                3          y = <2>;
/// 4  };                    4      };
///                          5  };
/// ```
fn delete_and_redefine() -> Vec<SourceFragment> {
    vec![
        SourceFragment::root(BASE).at(Span::from_coords(0, 0, 4, 2)).child(
            ChildNodeFragment::new("a")
                .at(Span::from_coords(1, 4, 3, 6))
                .property("x", [Value::cells([Value::int(1)])]),
        ),
        SourceFragment::root(OVERLAY)
            .at(Span::from_coords(0, 0, 5, 2))
            .item(BodyItem::DeleteNode(
                DeleteNodeDirective::named("a").at(Span::from_coords(1, 4, 1, 21)),
            ))
            .child(
                ChildNodeFragment::new("a")
                    .at(Span::from_coords(2, 4, 4, 6))
                    .property("y", [Value::cells([Value::int(2)])]),
            ),
    ]
}

#[test]
fn test_redefinition_after_delete_is_a_new_node() {
    let graph = build(&delete_and_redefine());
    let live = node(&graph, "/a");
    assert!(graph.live_property(live, "y").is_some());
    assert!(graph.live_property(live, "x").is_none());

    let root = graph.node(graph.root());
    assert_eq!(root.deleted_children.len(), 1);
    assert_eq!(graph.children(graph.root()), &[live]);
}

#[test]
fn test_lookup_before_directive_sees_deleted_node() {
    let graph = build(&delete_and_redefine());
    let live = node(&graph, "/a");

    let before = graph.scope_at(BASE, Position::new(2, 10));
    let old = graph.get_child_from_scope(graph.root(), "/a", before).unwrap();
    assert_ne!(old, live);
    assert!(graph.node(old).is_deleted());
    assert!(graph.live_property(old, "x").is_some());

    let after = graph.scope_at(OVERLAY, Position::new(3, 10));
    assert_eq!(graph.get_child_from_scope(graph.root(), "/a", after), Some(live));
}

#[test]
fn test_property_lookup_respects_directive_order() {
    let graph = build(&[base_board(), uart_overlay()]);
    let uart = node(&graph, "/soc/uart@1000");

    let before = graph.scope_at(BASE, Position::new(4, 20));
    let deleted = graph
        .property_from_scope(uart, "clock-frequency", before)
        .expect("visible before the directive");
    assert!(graph.property(deleted).deleted_by.is_some());

    let after = graph.scope_at(OVERLAY, Position::new(2, 10));
    assert_eq!(graph.property_from_scope(uart, "clock-frequency", after), None);
}

#[test]
fn test_deepest_hit_prefers_property_over_node() {
    let graph = build(&[base_board(), uart_overlay()]);
    let uart = node(&graph, "/soc/uart@1000");

    let hit = graph.deepest_ast_node_at(BASE, Position::new(3, 12)).unwrap();
    let AstHit::Property(property) = hit else {
        panic!("expected a property, got {hit:?}");
    };
    assert_eq!(graph.property(property).name, "compatible");
    assert_eq!(graph.owning_node(hit), Some(uart));

    let hit = graph.deepest_ast_node_at(BASE, Position::new(2, 9)).unwrap();
    assert_eq!(hit, AstHit::Node(uart));

    let hit = graph.deepest_ast_node_at(OVERLAY, Position::new(1, 10)).unwrap();
    assert!(matches!(hit, AstHit::Directive(_)));
    assert_eq!(graph.owning_node(hit), Some(uart));
}
