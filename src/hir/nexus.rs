//! Specifier groups of phandle-with-cells properties.
//!
//! `foo-gpios = <&gpio0 7 1>, <&gpio1 3 0>;` is a flat list of
//! `[phandle, cell_0 .. cell_{n-1}]` groups where `n` comes from the
//! target's own `#<space>-cells`. The space is what the consuming
//! property's binding declares, falling back to the name-derived one.

use crate::base::Name;
use crate::syntax::{Value, flatten};

use super::graph::Graph;
use super::ids::{NodeId, PropertyId};
use super::types::{names_property_for, specifier_space_for};

/// One `[phandle, cells...]` group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NexusMapping {
    /// Node the phandle resolves to.
    pub target: Option<NodeId>,
    pub specifier_space: Name,
    /// The phandle cell as written.
    pub phandle: Value,
    /// Raw specifier cells, unevaluated.
    pub cells: Vec<Value>,
}

impl Graph {
    /// Specifier space of a phandle-array property.
    pub fn specifier_space_of(&self, property: PropertyId) -> Name {
        let data = self.property(property);
        self.resolved_type(data.owner)
            .and_then(|t| t.property(&data.name)?.specifier_space.clone())
            .unwrap_or_else(|| specifier_space_for(&data.name))
    }

    /// `#<space>-cells` of `node`, 0 when absent.
    pub fn specifier_cell_count(&self, node: NodeId, space: &str) -> usize {
        self.cell_count(node, &format!("#{space}-cells"), 0)
    }

    /// Groups of a phandle-with-cells property, computed once per snapshot.
    pub fn nexus_mappings(&self, property: PropertyId) -> &[NexusMapping] {
        self.property(property)
            .nexus
            .get_or_init(|| self.split_groups(property))
    }

    fn split_groups(&self, property: PropertyId) -> Vec<NexusMapping> {
        let space = self.specifier_space_of(property);
        let cells = flatten(&self.property(property).values);
        let mut groups = Vec::new();
        let mut index = 0;
        while index < cells.len() {
            let phandle = cells[index];
            let target = self.resolve_reference(phandle);
            index += 1;
            let Some(target_node) = target else {
                // Without a target the cell count is unknown.
                groups.push(NexusMapping {
                    target: None,
                    specifier_space: space.clone(),
                    phandle: phandle.clone(),
                    cells: Vec::new(),
                });
                break;
            };
            let count = self.specifier_cell_count(target_node, &space);
            let end = (index + count).min(cells.len());
            groups.push(NexusMapping {
                target,
                specifier_space: space.clone(),
                phandle: phandle.clone(),
                cells: cells[index..end].iter().map(|&v| v.clone()).collect(),
            });
            index = end;
        }
        groups
    }

    /// Index of the group called `name` in the owner's `<prefix>-names`.
    pub fn group_index_by_name(&self, property: PropertyId, name: &str) -> Option<usize> {
        let data = self.property(property);
        let names = self.property_values(data.owner, &names_property_for(&data.name))?;
        flatten(names).iter().position(|v| v.as_str() == Some(name))
    }

    /// Raw cell called `cell` in group `group`, by the target's cell names.
    pub fn specifier_cell(&self, property: PropertyId, group: usize, cell: &str) -> Option<&Value> {
        let mapping = self.nexus_mappings(property).get(group)?;
        let target_type = self.resolved_type(mapping.target?)?;
        let names = target_type.cell_names(&mapping.specifier_space)?;
        let index = names.iter().position(|n| n == cell)?;
        mapping.cells.get(index)
    }

    /// Evaluated cell called `cell` in group `group`.
    pub fn specifier_cell_value(&self, property: PropertyId, group: usize, cell: &str) -> Option<i64> {
        match self.specifier_cell(property, group, cell)? {
            Value::Expr(expr) => self.evaluator.evaluate(expr),
            _ => None,
        }
    }
}

/// One `reg` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegBlock {
    pub address: Option<u64>,
    pub size: Option<u64>,
}

impl Graph {
    fn cell_count(&self, node: NodeId, name: &str, default: usize) -> usize {
        self.property_values(node, name)
            .and_then(|values| match flatten(values).first()? {
                Value::Expr(expr) => self.evaluator.evaluate(expr),
                _ => None,
            })
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(default)
    }

    /// Combine one or two big-endian 32-bit cells into one number.
    ///
    /// Wider values do not fit in 64 bits and are unresolved.
    fn combine_cells(&self, cells: &[&Value]) -> Option<u64> {
        if cells.is_empty() || cells.len() > 2 {
            return None;
        }
        cells.iter().try_fold(0u64, |acc, cell| match cell {
            Value::Expr(expr) => {
                let v = self.evaluator.evaluate(expr)?;
                Some((acc << 32) | (v as u64 & 0xffff_ffff))
            }
            _ => None,
        })
    }

    /// `reg` split by the parent's `#address-cells` (default 2) and
    /// `#size-cells` (default 1).
    pub fn reg_blocks(&self, node: NodeId) -> Vec<RegBlock> {
        let Some(values) = self.property_values(node, "reg") else {
            return Vec::new();
        };
        let (address_cells, size_cells) = match self.parent(node) {
            Some(parent) => (
                self.cell_count(parent, "#address-cells", 2),
                self.cell_count(parent, "#size-cells", 1),
            ),
            None => (2, 1),
        };
        let stride = address_cells + size_cells;
        if stride == 0 {
            return Vec::new();
        }
        flatten(values)
            .chunks(stride)
            .map(|chunk| {
                let split = address_cells.min(chunk.len());
                RegBlock {
                    address: self.combine_cells(&chunk[..split]),
                    size: self.combine_cells(&chunk[split..]),
                }
            })
            .collect()
    }

    /// Controller receiving the node's `interrupts`: the nearest
    /// `interrupt-parent` on the node or an ancestor, else the parent.
    pub fn interrupt_parent(&self, node: NodeId) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(values) = self.property_values(id, "interrupt-parent") {
                return flatten(values)
                    .first()
                    .and_then(|v| self.resolve_reference(v));
            }
            current = self.parent(id);
        }
        self.parent(node)
    }

    /// Interrupt specifiers of a node, from `interrupts-extended` when
    /// present, else `interrupts` split by the controller's
    /// `#interrupt-cells`.
    pub fn interrupt_groups(&self, node: NodeId) -> Vec<NexusMapping> {
        if let Some(extended) = self.live_property(node, "interrupts-extended") {
            return self.nexus_mappings(extended).to_vec();
        }
        let Some(values) = self.property_values(node, "interrupts") else {
            return Vec::new();
        };
        let controller = self.interrupt_parent(node);
        let count = controller
            .map(|c| self.cell_count(c, "#interrupt-cells", 1))
            .unwrap_or(1)
            .max(1);
        let phandle = Value::PathRef(Name::from(
            controller.map(|c| self.path_of(c)).unwrap_or_default(),
        ));
        flatten(values)
            .chunks(count)
            .map(|chunk| NexusMapping {
                target: controller,
                specifier_space: Name::new("interrupt"),
                phandle: phandle.clone(),
                cells: chunk.iter().map(|&v| v.clone()).collect(),
            })
            .collect()
    }

    /// Evaluated interrupt cell `cell` of group `group`.
    pub fn interrupt_cell_value(&self, node: NodeId, group: usize, cell: &str) -> Option<i64> {
        let groups = self.interrupt_groups(node);
        let mapping = groups.get(group)?;
        let names = self.resolved_type(mapping.target?)?;
        let index = names
            .cell_names("interrupt")?
            .iter()
            .position(|n| n == cell)?;
        match mapping.cells.get(index)? {
            Value::Expr(expr) => self.evaluator.evaluate(expr),
            _ => None,
        }
    }
}
