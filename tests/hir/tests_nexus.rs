//! Specifier groups, `reg` blocks and interrupt specifiers.

use dtsa::hir::RegBlock;
use dtsa::syntax::{ChildNodeFragment, SourceFragment, Value};
use rstest::rstest;

use crate::helpers::fixtures::{BASE, nexus_board};
use crate::helpers::graph_helpers::{build, node};

#[test]
fn test_named_group_cells_round_trip() {
    let graph = build(&nexus_board());
    let dev = node(&graph, "/dev");
    let gpios = graph.live_property(dev, "foo-gpios").unwrap();

    assert_eq!(graph.specifier_space_of(gpios), "foo");
    let mappings = graph.nexus_mappings(gpios);
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].target, Some(node(&graph, "/target")));
    assert_eq!(mappings[0].cells, vec![Value::int(7), Value::int(1)]);

    let group = graph.group_index_by_name(gpios, "reset").unwrap();
    assert_eq!(group, 0);
    assert_eq!(graph.specifier_cell_value(gpios, group, "flags"), Some(1));
    assert_eq!(graph.specifier_cell_value(gpios, group, "pin"), Some(7));
    assert_eq!(graph.specifier_cell_value(gpios, group, "missing"), None);
    assert_eq!(graph.group_index_by_name(gpios, "other"), None);
}

#[test]
fn test_groups_split_by_each_target_cell_count() {
    let root = SourceFragment::root(BASE)
        .child(
            ChildNodeFragment::new("one")
                .label("one")
                .property("#gpio-cells", [Value::cells([Value::int(1)])]),
        )
        .child(
            ChildNodeFragment::new("two")
                .label("two")
                .property("#gpio-cells", [Value::cells([Value::int(2)])]),
        )
        .child(ChildNodeFragment::new("user").property(
            "gpios",
            [
                Value::cells([Value::label("two"), Value::int(3), Value::int(4)]),
                Value::cells([Value::label("one"), Value::int(5)]),
            ],
        ));
    let graph = build(&[root]);
    let gpios = graph.live_property(node(&graph, "/user"), "gpios").unwrap();
    let mappings = graph.nexus_mappings(gpios);

    assert_eq!(mappings.len(), 2);
    assert_eq!(mappings[0].cells.len(), 2);
    assert_eq!(mappings[1].target, Some(node(&graph, "/one")));
    assert_eq!(mappings[1].cells, vec![Value::int(5)]);
}

#[test]
fn test_unresolved_phandle_stops_splitting() {
    let root = SourceFragment::root(BASE).child(ChildNodeFragment::new("user").property(
        "gpios",
        [Value::cells([Value::label("nowhere"), Value::int(1)])],
    ));
    let graph = build(&[root]);
    let gpios = graph.live_property(node(&graph, "/user"), "gpios").unwrap();
    let mappings = graph.nexus_mappings(gpios);
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].target, None);
    assert!(mappings[0].cells.is_empty());
}

#[rstest]
#[case::explicit_cells(Some((1, 1)), vec![0x1000, 0x100], vec![(Some(0x1000), Some(0x100))])]
#[case::default_cells(None, vec![0, 0x2000, 0x10], vec![(Some(0x2000), Some(0x10))])]
#[case::two_blocks(Some((1, 1)), vec![0x10, 4, 0x20, 8], vec![(Some(0x10), Some(4)), (Some(0x20), Some(8))])]
#[case::no_size(Some((1, 0)), vec![0x40], vec![(Some(0x40), None)])]
#[case::high_cell_kept(Some((2, 1)), vec![1, 0x2000, 0x10], vec![(Some(0x1_0000_2000), Some(0x10))])]
#[case::too_wide(Some((3, 1)), vec![1, 0, 0x2000, 0x10], vec![(None, Some(0x10))])]
fn test_reg_blocks(
    #[case] cells: Option<(i64, i64)>,
    #[case] reg: Vec<i64>,
    #[case] expected: Vec<(Option<u64>, Option<u64>)>,
) {
    let mut bus = ChildNodeFragment::new("bus");
    if let Some((address, size)) = cells {
        bus = bus
            .property("#address-cells", [Value::cells([Value::int(address)])])
            .property("#size-cells", [Value::cells([Value::int(size)])]);
    }
    let bus = bus.child(
        ChildNodeFragment::new("dev@0")
            .property("reg", [Value::cells(reg.into_iter().map(Value::int))]),
    );
    let graph = build(&[SourceFragment::root(BASE).child(bus)]);

    let blocks = graph.reg_blocks(node(&graph, "/bus/dev@0"));
    let expected: Vec<RegBlock> = expected
        .into_iter()
        .map(|(address, size)| RegBlock { address, size })
        .collect();
    assert_eq!(blocks, expected);
}

#[test]
fn test_interrupts_use_controller_cells() {
    let root = SourceFragment::root(BASE)
        .child(
            ChildNodeFragment::new("intc")
                .label("intc")
                .property("compatible", [Value::str("vnd,intc")])
                .property("#interrupt-cells", [Value::cells([Value::int(2)])]),
        )
        .child(
            ChildNodeFragment::new("dev")
                .property("interrupt-parent", [Value::cells([Value::label("intc")])])
                .property(
                    "interrupts",
                    [Value::cells([
                        Value::int(5),
                        Value::int(1),
                        Value::int(9),
                        Value::int(2),
                    ])],
                ),
        );
    let graph = build(&[root]);
    let dev = node(&graph, "/dev");

    assert_eq!(graph.interrupt_parent(dev), Some(node(&graph, "/intc")));
    let groups = graph.interrupt_groups(dev);
    assert_eq!(groups.len(), 2);
    assert_eq!(graph.interrupt_cell_value(dev, 0, "irq"), Some(5));
    assert_eq!(graph.interrupt_cell_value(dev, 1, "priority"), Some(2));
    assert_eq!(graph.interrupt_cell_value(dev, 2, "irq"), None);
}
