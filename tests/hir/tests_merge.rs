//! Overlay merge scenarios.

use dtsa::base::{FileId, Span};
use dtsa::hir::{DeletedEntity, IssueKind, Severity};
use dtsa::syntax::{ChildNodeFragment, NodeRef, SourceFragment, Value};

use crate::helpers::fixtures::{BASE, OVERLAY, base_board, uart_overlay};
use crate::helpers::graph_helpers::{build, issue_codes, issues_of, node};

// =============================================================================
// BASE + OVERLAY
// =============================================================================

#[test]
fn test_overlay_deletes_and_adds_properties() {
    let graph = build(&[base_board(), uart_overlay()]);
    let uart = node(&graph, "/soc/uart@1000");

    let soc = node(&graph, "/soc");
    let uarts: Vec<_> = graph
        .children(soc)
        .iter()
        .filter(|&&c| graph.node(c).name.name == "uart")
        .collect();
    assert_eq!(uarts.len(), 1, "one node at the merged path");

    let live: Vec<&str> = graph
        .node(uart)
        .properties
        .keys()
        .map(|k| k.as_str())
        .collect();
    assert_eq!(live, vec!["compatible", "status"]);
    assert_eq!(graph.string_property(uart, "status"), Some("okay"));

    let record = graph.node(uart).deleted_properties[0];
    let DeletedEntity::Property(deleted) = record.entity else {
        panic!("expected a deleted property");
    };
    let data = graph.property(deleted);
    assert_eq!(data.name, "clock-frequency");
    assert_eq!(data.values, vec![Value::cells([Value::int(100)])]);
    assert_eq!(data.deleted_by, Some(record.directive));
    assert_eq!(graph.directive(record.directive).location.file, OVERLAY);
}

#[test]
fn test_deleted_property_reported_with_link_to_directive() {
    let graph = build(&[base_board(), uart_overlay()]);
    let deleted: Vec<_> = graph
        .issues()
        .iter()
        .filter(|i| i.kind == IssueKind::DeletedByDirective)
        .collect();
    assert_eq!(deleted.len(), 1);
    let issue = deleted[0];
    assert_eq!(issue.severity, Severity::Hint);
    assert_eq!(issue.location.file, BASE);
    assert_eq!(issue.location.span, Span::from_coords(4, 8, 4, 40));
    assert_eq!(issue.linked_to.map(|l| l.file), Some(OVERLAY));
}

#[test]
fn test_override_builds_version_chain() {
    let first = SourceFragment::root(BASE).child(
        ChildNodeFragment::new("node").property("value", [Value::cells([Value::int(1)])]),
    );
    let second = SourceFragment::root(OVERLAY).child(
        ChildNodeFragment::new("node").property("value", [Value::cells([Value::int(2)])]),
    );
    let graph = build(&[first, second]);
    let n = node(&graph, "/node");

    let live = graph.live_property(n, "value").unwrap();
    assert_eq!(
        graph.property(live).values,
        vec![Value::cells([Value::int(2)])]
    );
    let older = graph.property(live).replaces.expect("live replaces V1");
    assert_eq!(
        graph.property(older).values,
        vec![Value::cells([Value::int(1)])]
    );
    assert_eq!(graph.property(older).replaced_by, Some(live));
    assert!(!graph.property(older).is_live());
    assert_eq!(graph.version_chain(live), vec![older, live]);
    assert!(graph.issues().is_empty(), "overrides across fragments are silent");
}

// =============================================================================
// DUPLICATES
// =============================================================================

#[test]
fn test_duplicate_sibling_keeps_first() {
    let root = SourceFragment::root(BASE)
        .child(ChildNodeFragment::new("foo").property("a", [Value::int(1)]))
        .child(ChildNodeFragment::new("foo").property("b", [Value::int(2)]));
    let graph = build(&[root]);

    assert_eq!(issues_of(&graph, IssueKind::DuplicateNodeName), 1);
    let foos: Vec<_> = graph
        .children(graph.root())
        .iter()
        .filter(|&&c| graph.node(c).name.name == "foo")
        .collect();
    assert_eq!(foos.len(), 1);
}

#[test]
fn test_duplicate_property_in_one_body() {
    let root = SourceFragment::root(BASE).child(
        ChildNodeFragment::new("foo")
            .property("a", [Value::int(1)])
            .property("a", [Value::int(2)]),
    );
    let graph = build(&[root]);
    assert_eq!(issue_codes(&graph), vec!["DUPLICATE_PROPERTY_NAME"]);
}

// =============================================================================
// LABELS AND REFERENCES
// =============================================================================

#[test]
fn test_label_resolves_before_its_fragment() {
    let overlay = SourceFragment::reference(OVERLAY, "late").property("x", [Value::int(1)]);
    let base = SourceFragment::root(BASE).child(ChildNodeFragment::new("late").label("late"));
    // The reference is processed first; the label is known from pass one.
    let graph = build(&[overlay, base]);
    let late = node(&graph, "/late");
    assert_eq!(graph.resolve_label("late"), Some(late));
    assert!(graph.live_property(late, "x").is_some());
    assert!(graph.issues().is_empty());
}

#[test]
fn test_unresolved_reference_merges_into_orphan() {
    let overlay = SourceFragment::reference(OVERLAY, "missing").property("x", [Value::int(1)]);
    let graph = build(&[SourceFragment::root(BASE), overlay]);
    assert_eq!(issue_codes(&graph), vec!["UNABLE_TO_RESOLVE_CHILD_NODE"]);
    assert_eq!(graph.orphans().len(), 1);
    let orphan = graph.orphans()[0];
    assert!(graph.live_property(orphan, "x").is_some());
    assert_eq!(graph.path_of(orphan), "");
}

#[test]
fn test_label_on_two_nodes_is_reported() {
    let root = SourceFragment::root(BASE)
        .child(ChildNodeFragment::new("a").label("dup"))
        .child(ChildNodeFragment::new("b").label("dup"));
    let graph = build(&[root]);
    assert_eq!(issue_codes(&graph), vec!["LABEL_ALREADY_IN_USE"]);
    assert_eq!(graph.resolve_label("dup"), Some(node(&graph, "/a")));
}

#[test]
fn test_label_redeclared_on_same_node_is_a_hint() {
    let first = SourceFragment::root(BASE).child(ChildNodeFragment::new("a").label("l"));
    let second = SourceFragment::root(OVERLAY).child(ChildNodeFragment::new("a").label("l"));
    let graph = build(&[first, second]);
    assert_eq!(issue_codes(&graph), vec!["LABEL_REASSIGNED"]);
}

#[test]
fn test_phandle_lookup_and_duplicates() {
    let root = SourceFragment::root(BASE)
        .child(ChildNodeFragment::new("a").property("phandle", [Value::cells([Value::int(5)])]))
        .child(ChildNodeFragment::new("b").property("phandle", [Value::cells([Value::int(6)])]))
        .child(ChildNodeFragment::new("c").property("phandle", [Value::cells([Value::int(5)])]));
    let graph = build(&[root]);

    assert_eq!(graph.get_phandle(6), Some(node(&graph, "/b")));
    assert_eq!(graph.get_phandle(5), Some(node(&graph, "/a")));
    assert_eq!(graph.get_all_phandle(5).len(), 2);
    assert_eq!(issue_codes(&graph), vec!["DUPLICATE_PHANDLE"]);
}

// =============================================================================
// DELETE DIRECTIVES
// =============================================================================

#[test]
fn test_top_level_delete_by_label() {
    let base = SourceFragment::root(BASE).child(ChildNodeFragment::new("a").label("a"));
    let delete = SourceFragment::delete_node(OVERLAY, NodeRef::Label("a".into()));
    let graph = build(&[base, delete]);

    assert!(graph.get_node("/a").is_none());
    assert_eq!(graph.resolve_label("a"), None);
    assert_eq!(graph.node(graph.root()).deleted_children.len(), 1);
}

#[test]
fn test_deleted_node_releases_its_label() {
    let delete = SourceFragment::delete_node(OVERLAY, NodeRef::Label("uart1".into()));
    let replacement = SourceFragment::root(OVERLAY).child(
        ChildNodeFragment::new("soc").child(ChildNodeFragment::new("uart@2000").label("uart1")),
    );
    let graph = build(&[base_board(), delete, replacement]);

    assert_eq!(issue_codes(&graph), vec!["DELETED_BY_DIRECTIVE"]);
    assert!(graph.get_node("/soc/uart@1000").is_none());
    assert_eq!(
        graph.resolve_label("uart1"),
        Some(node(&graph, "/soc/uart@2000"))
    );
}

#[test]
fn test_delete_missing_entities() {
    let root = SourceFragment::root(BASE)
        .delete_child("ghost")
        .delete_property("nothing");
    let graph = build(&[root]);
    assert_eq!(
        issue_codes(&graph),
        vec!["NODE_DOES_NOT_EXIST", "PROPERTY_DOES_NOT_EXIST"]
    );
    assert_eq!(graph.directives().count(), 2);
    assert!(graph.directives().all(|(_, d)| d.removed.is_none()));
}

#[test]
fn test_issues_filter_by_file() {
    let graph = build(&[base_board(), uart_overlay()]);
    assert_eq!(graph.issues_for_file(BASE).count(), 1);
    assert_eq!(graph.issues_for_file(FileId(9)).count(), 0);
}
