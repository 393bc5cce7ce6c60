//! Bindings boundary - node types supplied by an external schema loader.
//!
//! The core never reads binding files. It asks a [`BindingProvider`] for the
//! [`NodeType`] of a set of `compatible` strings on a given bus and only
//! consumes the handful of facts listed here: property kinds and enums,
//! specifier cell names, and bus behavior.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::base::{Name, to_macro_ident};

/// Declared kind of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Int,
    Array,
    Uint8Array,
    String,
    StringArray,
    Boolean,
    Phandle,
    Phandles,
    /// Phandle followed by specifier cells, repeated.
    PhandleArray,
    Path,
    Compound,
}

/// One literal of a binding `enum:` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumValue {
    Int(i64),
    Str(Name),
}

/// Declaration of one property in a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    pub kind: PropertyKind,
    pub enum_values: Vec<EnumValue>,
    /// Overrides the specifier space derived from the property name.
    pub specifier_space: Option<Name>,
}

impl PropertySpec {
    pub fn new(kind: PropertyKind) -> Self {
        Self {
            kind,
            enum_values: Vec::new(),
            specifier_space: None,
        }
    }

    pub fn with_enum(mut self, values: impl IntoIterator<Item = EnumValue>) -> Self {
        self.enum_values = values.into_iter().collect();
        self
    }

    pub fn with_specifier_space(mut self, space: impl Into<Name>) -> Self {
        self.specifier_space = Some(space.into());
        self
    }

    /// Index of `value` in the declared enum, if any.
    pub fn enum_index(&self, value: &EnumValue) -> Option<usize> {
        self.enum_values.iter().position(|v| v == value)
    }
}

/// A resolved binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeType {
    pub compatible: Option<Name>,
    /// Bus this binding must sit on, if any.
    pub on_bus: Option<Name>,
    /// Bus this node exposes to its children.
    pub bus: Option<Name>,
    pub properties: IndexMap<Name, PropertySpec>,
    /// `<space>-cells: [names...]`
    pub cell_names: IndexMap<Name, Vec<Name>>,
    /// Child type mandated per exposed bus.
    pub child_types: FxHashMap<Name, Arc<NodeType>>,
}

impl NodeType {
    pub fn new(compatible: impl Into<Name>) -> Self {
        Self {
            compatible: Some(compatible.into()),
            ..Self::default()
        }
    }

    pub fn on_bus(mut self, bus: impl Into<Name>) -> Self {
        self.on_bus = Some(bus.into());
        self
    }

    pub fn exposes_bus(mut self, bus: impl Into<Name>) -> Self {
        self.bus = Some(bus.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<Name>, spec: PropertySpec) -> Self {
        self.properties.insert(name.into(), spec);
        self
    }

    pub fn with_cells(
        mut self,
        space: impl Into<Name>,
        names: impl IntoIterator<Item = impl Into<Name>>,
    ) -> Self {
        self.cell_names
            .insert(space.into(), names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_child_type(mut self, bus: impl Into<Name>, child: NodeType) -> Self {
        self.child_types.insert(bus.into(), Arc::new(child));
        self
    }

    /// Ordered cell names for a specifier space (`gpio`, `interrupt`, ...).
    pub fn cell_names(&self, space: &str) -> Option<&[Name]> {
        self.cell_names.get(space).map(|v| v.as_slice())
    }

    pub fn bus_exposed(&self) -> Option<&str> {
        self.bus.as_deref()
    }

    pub fn required_child_type(&self, bus: &str) -> Option<Arc<NodeType>> {
        self.child_types.get(bus).cloned()
    }

    /// Look up a property spec by devicetree name.
    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.get(name)
    }

    /// Look up a property spec by its macro-identifier form (`foo_gpios`).
    pub fn property_by_ident(&self, ident: &str) -> Option<(&Name, &PropertySpec)> {
        self.properties
            .iter()
            .find(|(name, _)| to_macro_ident(name) == ident)
    }
}

/// Supplies node types; implemented by the host's bindings loader.
pub trait BindingProvider: Send + Sync {
    /// Resolve the type for a node's `compatible` strings (most specific
    /// first) on the bus its parent exposes.
    fn resolve_type(&self, compatibles: &[Name], bus: Option<&str>) -> Option<Arc<NodeType>>;
}

/// Provider that knows no bindings.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBindings;

impl BindingProvider for NoBindings {
    fn resolve_type(&self, _compatibles: &[Name], _bus: Option<&str>) -> Option<Arc<NodeType>> {
        None
    }
}

/// In-memory provider keyed by compatible string.
#[derive(Debug, Clone, Default)]
pub struct StaticBindings {
    by_compatible: FxHashMap<Name, Vec<Arc<NodeType>>>,
}

impl StaticBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding under its `compatible`. Bindings without one are ignored.
    pub fn add(&mut self, node_type: NodeType) {
        let Some(compatible) = node_type.compatible.clone() else {
            return;
        };
        self.by_compatible
            .entry(compatible)
            .or_default()
            .push(Arc::new(node_type));
    }

    pub fn with(mut self, node_type: NodeType) -> Self {
        self.add(node_type);
        self
    }

    pub fn len(&self) -> usize {
        self.by_compatible.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_compatible.is_empty()
    }
}

impl BindingProvider for StaticBindings {
    fn resolve_type(&self, compatibles: &[Name], bus: Option<&str>) -> Option<Arc<NodeType>> {
        for compatible in compatibles {
            let Some(candidates) = self.by_compatible.get(compatible) else {
                continue;
            };
            // A bus-specific binding wins over a bus-agnostic one.
            let on_bus = candidates
                .iter()
                .find(|t| t.on_bus.is_some() && t.on_bus.as_deref() == bus);
            let generic = candidates.iter().find(|t| t.on_bus.is_none());
            if let Some(found) = on_bus.or(generic) {
                return Some(found.clone());
            }
        }
        None
    }
}

/// Specifier space implied by a phandle-array property name.
///
/// `foo-gpios` and `gpios` use `gpio`, `interrupts-extended` uses
/// `interrupt`, everything else drops its trailing `s` (`pwms` → `pwm`,
/// `io-channels` → `io-channel`).
pub fn specifier_space_for(property: &str) -> Name {
    if property == "gpios" || property.ends_with("-gpios") {
        return Name::new("gpio");
    }
    if property == "interrupts-extended" {
        return Name::new("interrupt");
    }
    Name::from(property.strip_suffix('s').unwrap_or(property))
}

/// Name of the `<prefix>-names` property that labels the groups of a
/// phandle-array property (`foo-gpios` → `foo-gpio-names`).
pub fn names_property_for(property: &str) -> String {
    if property == "interrupts-extended" {
        return "interrupt-names".to_string();
    }
    format!("{}-names", property.strip_suffix('s').unwrap_or(property))
}
