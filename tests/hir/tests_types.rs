//! Bus-aware type resolution.

use crate::helpers::fixtures::bus_board;
use crate::helpers::graph_helpers::{build, node};

#[test]
fn test_bus_specific_binding_wins_over_generic() {
    let graph = build(&[bus_board()]);

    let on_i2c = graph
        .resolved_type(node(&graph, "/i2c@4000/sensor@48"))
        .unwrap();
    assert_eq!(on_i2c.on_bus.as_deref(), Some("i2c"));
    assert!(on_i2c.property("int-gpios").is_some());

    let standalone = graph.resolved_type(node(&graph, "/sensor")).unwrap();
    assert_eq!(standalone.compatible.as_deref(), Some("vnd,sensor"));
    assert!(standalone.on_bus.is_none());
}

#[test]
fn test_bus_mandated_child_type_overrides_compatible() {
    let graph = build(&[bus_board()]);
    let flash = node(&graph, "/spi@5000/flash@0");

    assert_eq!(graph.compatibles(flash), vec!["vnd,sensor"]);
    let resolved = graph.resolved_type(flash).unwrap();
    assert_eq!(resolved.compatible.as_deref(), Some("vnd,spi-device"));
    assert!(resolved.property("spi-max-frequency").is_some());
    assert!(resolved.property("int-gpios").is_none());
}

#[test]
fn test_bus_controllers_resolve_their_own_type() {
    let graph = build(&[bus_board()]);
    let i2c = graph.resolved_type(node(&graph, "/i2c@4000")).unwrap();
    assert_eq!(i2c.bus_exposed(), Some("i2c"));
    assert!(graph.resolved_type(graph.root()).is_none());
}
