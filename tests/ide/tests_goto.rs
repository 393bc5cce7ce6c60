//! Go-to-definition across fragments.

use dtsa::base::{Position, Span};
use dtsa::ide::goto_definition;
use dtsa::syntax::{BodyItem, ChildNodeFragment, PropertyDecl, SourceFragment, Value};

use crate::helpers::fixtures::{BASE, OVERLAY, base_board, uart_overlay};
use crate::helpers::graph_helpers::build;

#[test]
fn test_node_name_lists_every_contribution() {
    let graph = build(&[base_board(), uart_overlay()]);
    let result = goto_definition(&graph, BASE, Position::new(2, 16));

    let locations: Vec<_> = result.targets.iter().map(|t| t.location).collect();
    assert_eq!(locations.len(), 2);
    assert_eq!(locations[0].file, BASE);
    assert_eq!(locations[0].span, Span::from_coords(2, 15, 2, 24));
    assert_eq!(locations[1].file, OVERLAY);
    assert_eq!(locations[1].span, Span::from_coords(0, 0, 0, 17));
    assert!(result.targets.iter().all(|t| t.path == "/soc/uart@1000"));
}

#[test]
fn test_reference_target_jumps_to_same_contributions() {
    let graph = build(&[base_board(), uart_overlay()]);
    let from_base = goto_definition(&graph, BASE, Position::new(2, 16));
    let from_overlay = goto_definition(&graph, OVERLAY, Position::new(0, 5));
    assert_eq!(from_base, from_overlay);
}

#[test]
fn test_delete_directive_jumps_to_removed_property() {
    let graph = build(&[base_board(), uart_overlay()]);
    let result = goto_definition(&graph, OVERLAY, Position::new(1, 10));

    assert_eq!(result.targets.len(), 1);
    let target = &result.targets[0];
    assert_eq!(target.location.file, BASE);
    assert_eq!(target.location.span, Span::from_coords(4, 8, 4, 23));
}

/// ```text
/// 0  / {
/// 1      gpio: gpio { };
/// 2      user {
/// 3          gpios = <&gpio 1>;
/// 4          speed = <1>;
/// 5      };
/// 6  };
/// 0  / { user { speed = <2>; }; };     (overlay)
/// ```
fn reference_board() -> Vec<SourceFragment> {
    let prop = |name: &str, values: Vec<Value>, line: usize| {
        BodyItem::Property(
            PropertyDecl::new(name, values)
                .at(Span::from_coords(line, 8, line, 30))
                .name_at(Span::from_coords(line, 8, line, 8 + name.len())),
        )
    };
    vec![
        SourceFragment::root(BASE)
            .at(Span::from_coords(0, 0, 6, 2))
            .child(
                ChildNodeFragment::new("gpio")
                    .label("gpio")
                    .at(Span::from_coords(1, 4, 1, 19))
                    .name_at(Span::from_coords(1, 10, 1, 14)),
            )
            .child(
                ChildNodeFragment::new("user")
                    .at(Span::from_coords(2, 4, 5, 6))
                    .name_at(Span::from_coords(2, 4, 2, 8))
                    .item(prop(
                        "gpios",
                        vec![Value::cells([Value::label("gpio"), Value::int(1)])],
                        3,
                    ))
                    .item(prop("speed", vec![Value::cells([Value::int(1)])], 4)),
            ),
        SourceFragment::root(OVERLAY)
            .at(Span::from_coords(0, 0, 0, 32))
            .child(
                ChildNodeFragment::new("user")
                    .at(Span::from_coords(0, 4, 0, 29))
                    .name_at(Span::from_coords(0, 4, 0, 8))
                    .item(BodyItem::Property(
                        PropertyDecl::new("speed", [Value::cells([Value::int(2)])])
                            .at(Span::from_coords(0, 11, 0, 25))
                            .name_at(Span::from_coords(0, 11, 0, 16)),
                    )),
            ),
    ]
}

#[test]
fn test_property_reference_jumps_to_target_node() {
    let graph = build(&reference_board());
    let result = goto_definition(&graph, BASE, Position::new(3, 20));

    assert_eq!(result.targets.len(), 1);
    assert_eq!(result.targets[0].path, "/gpio");
    assert_eq!(result.targets[0].location.span, Span::from_coords(1, 10, 1, 14));
}

#[test]
fn test_overridden_property_lists_versions_oldest_first() {
    let graph = build(&reference_board());
    let result = goto_definition(&graph, OVERLAY, Position::new(0, 12));

    let files: Vec<_> = result.targets.iter().map(|t| t.location.file).collect();
    assert_eq!(files, vec![BASE, OVERLAY]);
    assert_eq!(
        result.targets[0].location.span,
        Span::from_coords(4, 8, 4, 13)
    );
}

#[test]
fn test_nothing_under_cursor() {
    let graph = build(&reference_board());
    assert!(goto_definition(&graph, BASE, Position::new(9, 0)).is_empty());
}
