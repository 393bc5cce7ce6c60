//! Common fragment fixtures for tests.
//!
//! Spans are laid out as if each fixture were a small source file; line
//! numbers are noted next to each fragment.

use once_cell::sync::Lazy;

use dtsa::base::{FileId, Span};
use dtsa::hir::{EnumValue, NodeType, PropertyKind, PropertySpec, StaticBindings};
use dtsa::syntax::{BodyItem, ChildNodeFragment, PropertyDecl, SourceFragment, Value};

pub const BASE: FileId = FileId(0);
pub const OVERLAY: FileId = FileId(1);

pub static BINDINGS: Lazy<StaticBindings> = Lazy::new(|| {
    StaticBindings::new()
        .with(NodeType::new("vnd,gpio").with_cells("gpio", ["pin", "flags"]))
        .with(NodeType::new("vnd,intc").with_cells("interrupt", ["irq", "priority"]))
        .with(NodeType::new("vnd,target").with_cells("foo", ["pin", "flags"]))
        .with(NodeType::new("vnd,dev").with_property(
            "foo-gpios",
            PropertySpec::new(PropertyKind::PhandleArray).with_specifier_space("foo"),
        ))
        .with(
            NodeType::new("vnd,uart")
                .with_property("clock-frequency", PropertySpec::new(PropertyKind::Int))
                .with_property(
                    "parity",
                    PropertySpec::new(PropertyKind::String).with_enum([
                        EnumValue::Str("none".into()),
                        EnumValue::Str("odd".into()),
                        EnumValue::Str("even".into()),
                    ]),
                ),
        )
        .with(NodeType::new("vnd,i2c").exposes_bus("i2c"))
        .with(
            NodeType::new("vnd,spi").exposes_bus("spi").with_child_type(
                "spi",
                NodeType::new("vnd,spi-device").with_property(
                    "spi-max-frequency",
                    PropertySpec::new(PropertyKind::Int),
                ),
            ),
        )
        .with(NodeType::new("vnd,sensor").on_bus("i2c").with_property(
            "int-gpios",
            PropertySpec::new(PropertyKind::PhandleArray),
        ))
        .with(NodeType::new("vnd,sensor"))
});

fn prop(name: &str, values: impl IntoIterator<Item = Value>, line: usize) -> BodyItem {
    BodyItem::Property(
        PropertyDecl::new(name, values)
            .at(Span::from_coords(line, 8, line, 40))
            .name_at(Span::from_coords(line, 8, line, 8 + name.len())),
    )
}

/// ```text
/// 0  / {
/// 1      soc {
/// 2          uart1: uart@1000 {
/// 3              compatible = "vnd,uart";
/// 4              clock-frequency = <100>;
/// 5          };
/// 6      };
/// 7  };
/// ```
pub fn base_board() -> SourceFragment {
    SourceFragment::root(BASE)
        .at(Span::from_coords(0, 0, 7, 2))
        .child(
            ChildNodeFragment::new("soc")
                .at(Span::from_coords(1, 4, 6, 6))
                .name_at(Span::from_coords(1, 4, 1, 7))
                .child(
                    ChildNodeFragment::new("uart@1000")
                        .label("uart1")
                        .at(Span::from_coords(2, 8, 5, 10))
                        .name_at(Span::from_coords(2, 15, 2, 24))
                        .item(prop("compatible", [Value::str("vnd,uart")], 3))
                        .item(prop(
                            "clock-frequency",
                            [Value::cells([Value::int(100)])],
                            4,
                        )),
                ),
        )
}

/// ```text
/// 0  &{/soc/uart@1000} {
/// 1      /delete-property/ clock-frequency;
/// 2      status = "okay";
/// 3  };
/// ```
pub fn uart_overlay() -> SourceFragment {
    use dtsa::syntax::DeletePropertyDirective;
    SourceFragment::reference_path(OVERLAY, "/soc/uart@1000")
        .at(Span::from_coords(0, 0, 3, 2))
        .target_at(Span::from_coords(0, 0, 0, 17))
        .item(BodyItem::DeleteProperty(
            DeletePropertyDirective::new("clock-frequency").at(Span::from_coords(1, 4, 1, 38)),
        ))
        .item(prop("status", [Value::str("okay")], 2))
}

/// Target with `#foo-cells = <2>; max-pins = <16>;` and a consumer
/// `foo-gpios = <&target 7 1>; foo-gpio-names = "reset";`.
pub fn nexus_board() -> Vec<SourceFragment> {
    vec![
        SourceFragment::root(BASE)
            .child(
                ChildNodeFragment::new("target")
                    .label("target")
                    .property("compatible", [Value::str("vnd,target")])
                    .property("#foo-cells", [Value::cells([Value::int(2)])])
                    .property("max-pins", [Value::cells([Value::int(16)])])
                    .property("phandle", [Value::cells([Value::int(1)])]),
            )
            .child(
                ChildNodeFragment::new("dev")
                    .label("dev")
                    .property("compatible", [Value::str("vnd,dev")])
                    .property(
                        "foo-gpios",
                        [Value::cells([Value::label("target"), Value::int(7), Value::int(1)])],
                    )
                    .property("foo-gpio-names", [Value::str("reset")]),
            ),
    ]
}

/// ```text
/// / {
///     i2c@4000 { compatible = "vnd,i2c";
///         sensor@48 { compatible = "vnd,sensor"; };
///     };
///     spi@5000 { compatible = "vnd,spi";
///         flash@0 { compatible = "vnd,sensor"; };
///     };
///     sensor { compatible = "vnd,sensor"; };
/// };
/// ```
pub fn bus_board() -> SourceFragment {
    let sensor = |name: &str| {
        ChildNodeFragment::new(name).property("compatible", [Value::str("vnd,sensor")])
    };
    SourceFragment::root(BASE)
        .child(
            ChildNodeFragment::new("i2c@4000")
                .property("compatible", [Value::str("vnd,i2c")])
                .child(sensor("sensor@48")),
        )
        .child(
            ChildNodeFragment::new("spi@5000")
                .property("compatible", [Value::str("vnd,spi")])
                .child(sensor("flash@0")),
        )
        .child(sensor("sensor"))
}
