//! Macro Resolution Engine.
//!
//! A small interpreter over the `DT_*` accessor vocabulary. Each form is
//! evaluated against the graph the way the build's generated header would
//! expand it. Unknown names go through the preprocessor boundary and the
//! expansion is resolved again, so user aliases that reduce to a known form
//! are transparent.
//!
//! Nothing here fails loudly: every unmet precondition yields `None`.

use crate::base::{to_macro_ident, to_string_token, to_upper_token};
use crate::hir::{EnumValue, Graph, NodeId, PropertyId, PropertyKind};
use crate::syntax::{Value, flatten, parse_int_literal};

use super::call::{CallId, CallKind, MacroCallTree};
use super::env::MacroEnv;
use super::parser::parse_call;
use super::value::{MacroValue, Resolved};

/// Default bound on nested user-macro expansions.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Resolve `call` with the default expansion depth.
pub fn resolve(
    graph: &Graph,
    env: &dyn MacroEnv,
    tree: &MacroCallTree,
    call: CallId,
) -> Option<Resolved> {
    MacroEngine::new(graph, env).resolve(tree, call)
}

pub struct MacroEngine<'a> {
    graph: &'a Graph,
    env: &'a dyn MacroEnv,
    max_depth: usize,
}

impl<'a> MacroEngine<'a> {
    pub fn new(graph: &'a Graph, env: &'a dyn MacroEnv) -> Self {
        Self {
            graph,
            env,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn resolve(&self, tree: &MacroCallTree, call: CallId) -> Option<Resolved> {
        self.resolve_at(tree, call, 0)
    }

    /// Parse and resolve a macro expression.
    pub fn resolve_text(&self, text: &str) -> Option<Resolved> {
        let tree = parse_call(text)?;
        self.resolve(&tree, tree.root())
    }

    fn resolve_at(&self, tree: &MacroCallTree, id: CallId, depth: usize) -> Option<Resolved> {
        if depth > self.max_depth {
            tracing::trace!("[MACRO] expansion depth {depth} exceeded at {}", tree.text(id));
            return None;
        }
        let node = tree.node(id);
        match node.kind {
            CallKind::Call => self.dispatch(tree, id, depth),
            CallKind::Ident => self
                .node_token(&node.name)
                .map(Resolved::Node)
                .or_else(|| {
                    self.env
                        .evaluate(&node.name)
                        .map(|n| Resolved::value(MacroValue::Int(n)))
                })
                .or_else(|| self.expand(tree, id, depth)),
            CallKind::Number => parse_int_literal(&node.name)
                .or_else(|| self.env.evaluate(&node.name))
                .map(|n| Resolved::value(MacroValue::Int(n))),
            CallKind::Str => Some(Resolved::value(MacroValue::Str(unquote(&node.name).into()))),
            CallKind::Raw => self
                .env
                .evaluate(&node.name)
                .map(|n| Resolved::value(MacroValue::Int(n))),
        }
    }

    fn expand(&self, tree: &MacroCallTree, id: CallId, depth: usize) -> Option<Resolved> {
        let expanded = self.env.expand(tree, id)?;
        self.resolve_at(&expanded, expanded.root(), depth + 1)
    }

    // ========================================================================
    // DISPATCH
    // ========================================================================

    fn dispatch(&self, tree: &MacroCallTree, call: CallId, depth: usize) -> Option<Resolved> {
        let name = tree.name(call);
        let argc = tree.args(call).len();
        tracing::trace!("[MACRO] dispatch {name}/{argc}");

        let a = Args {
            engine: self,
            tree,
            call,
            depth,
        };

        match (name, argc) {
            // ---- node identifiers -------------------------------------------
            ("DT_ROOT", 0) => Some(Resolved::Node(self.graph.root())),
            ("DT_PATH", n) if n > 0 => {
                let mut node = self.graph.root();
                for i in 0..n {
                    node = self.child_by_ident(node, &a.ident(i)?)?;
                }
                Some(Resolved::Node(node))
            }
            ("DT_ALIAS", 1) => self.graph.alias(&a.raw(0)?).map(Resolved::Node),
            ("DT_NODELABEL", 1) => self.graph.resolve_label(&a.raw(0)?).map(Resolved::Node),
            ("DT_CHILD", 2) => self
                .child_by_ident(a.node(0)?, &a.ident(1)?)
                .map(Resolved::Node),
            ("DT_PARENT", 1) => self.graph.parent(a.node(0)?).map(Resolved::Node),
            ("DT_GPARENT", 1) => {
                let parent = self.graph.parent(a.node(0)?)?;
                self.graph.parent(parent).map(Resolved::Node)
            }
            ("DT_INST", 2) => self
                .instances(&a.ident(1)?)
                .get(a.index(0)?)
                .copied()
                .map(Resolved::Node),
            ("DT_DRV_INST", 1) => {
                let compat = to_macro_ident(&self.env.object("DT_DRV_COMPAT")?);
                self.instances(&compat)
                    .get(a.index(0)?)
                    .copied()
                    .map(Resolved::Node)
            }
            ("DT_COMPAT_GET_ANY_STATUS_OKAY", 1) => self
                .instances(&a.ident(0)?)
                .into_iter()
                .find(|&n| self.graph.is_status_okay(n))
                .map(Resolved::Node),
            ("DT_CHOSEN", 1) => self.graph.chosen(&a.raw(0)?).map(Resolved::Node),
            ("DT_BUS", 1) => {
                let parent = self.graph.parent(a.node(0)?)?;
                self.graph
                    .resolved_type(parent)?
                    .bus_exposed()
                    .map(|_| Resolved::Node(parent))
            }
            ("DT_PHANDLE", 2) => self.phandle_by_idx(&a, 0),
            ("DT_PHANDLE" | "DT_PHANDLE_BY_IDX", 3) => self.phandle_by_idx(&a, a.index(2)?),
            ("DT_PHANDLE_BY_NAME", 3) => {
                let property = a.property(0, 1)?;
                let group = self.graph.group_index_by_name(property, &a.raw(2)?)?;
                self.phandle_target(property, group).map(Resolved::Node)
            }

            // ---- node tests -------------------------------------------------
            ("DT_SAME_NODE", 2) => bool_value(a.node(0)? == a.node(1)?),
            ("DT_NODE_EXISTS", 1) => bool_value(a.node(0).is_some()),
            ("DT_HAS_CHOSEN", 1) => bool_value(self.graph.chosen(&a.raw(0)?).is_some()),
            ("DT_ON_BUS", 2) => {
                let parent = self.graph.parent(a.node(0)?)?;
                let bus = self
                    .graph
                    .resolved_type(parent)
                    .and_then(|t| t.bus_exposed().map(to_macro_ident));
                bool_value(bus.as_deref() == Some(a.ident(1)?.as_str()))
            }
            ("DT_NODE_HAS_PROP", 2) => {
                let node = a.node(0)?;
                bool_value(self.graph.property_by_ident(node, &a.ident(1)?).is_some())
            }
            ("DT_NODE_HAS_COMPAT", 2) => {
                let wanted = a.ident(1)?;
                bool_value(
                    self.graph
                        .compatibles(a.node(0)?)
                        .iter()
                        .any(|c| to_macro_ident(c) == wanted),
                )
            }
            ("DT_NODE_HAS_STATUS", 2) => {
                let node = a.node(0)?;
                let wanted = a.raw(1)?;
                let status = self.graph.string_property(node, "status").unwrap_or("okay");
                let okay = |s: &str| s == "okay" || s == "ok";
                bool_value(status == wanted || (okay(status) && okay(wanted.as_str())))
            }
            ("DT_NODE_HAS_STATUS_OKAY", 1) => bool_value(self.graph.is_status_okay(a.node(0)?)),
            ("DT_HAS_COMPAT_STATUS_OKAY", 1) => bool_value(
                self.instances(&a.ident(0)?)
                    .into_iter()
                    .any(|n| self.graph.is_status_okay(n)),
            ),
            ("DT_NUM_INST_STATUS_OKAY", 1) => int_value(
                self.instances(&a.ident(0)?)
                    .into_iter()
                    .filter(|&n| self.graph.is_status_okay(n))
                    .count(),
            ),
            ("DT_CHILD_NUM", 1) => int_value(self.graph.children(a.node(0)?).len()),
            ("DT_CHILD_NUM_STATUS_OKAY", 1) => int_value(
                self.graph
                    .children(a.node(0)?)
                    .iter()
                    .filter(|&&c| self.graph.is_status_okay(c))
                    .count(),
            ),

            // ---- node names ---------------------------------------------------
            ("DT_NODE_FULL_NAME", 1) => {
                let full = self.graph.node(a.node(0)?).full_name();
                Some(Resolved::value(MacroValue::Str(full.into())))
            }
            ("DT_NODE_FULL_NAME_UNQUOTED", 1) => {
                let full = self.graph.node(a.node(0)?).full_name();
                Some(Resolved::value(MacroValue::Token(full.into())))
            }
            ("DT_NODE_FULL_NAME_TOKEN", 1) => {
                let full = self.graph.node(a.node(0)?).full_name();
                Some(Resolved::value(MacroValue::Token(to_string_token(&full).into())))
            }
            ("DT_NODE_FULL_NAME_UPPER_TOKEN", 1) => {
                let full = self.graph.node(a.node(0)?).full_name();
                Some(Resolved::value(MacroValue::Token(to_upper_token(&full).into())))
            }
            ("DT_NODE_PATH", 1) => {
                let path = self.graph.path_of(a.node(0)?);
                Some(Resolved::value(MacroValue::Str(path.into())))
            }

            // ---- properties ---------------------------------------------------
            ("DT_PROP", 2) => self.prop(&a),
            ("DT_PROP_OR", 3) => self.prop(&a).or_else(|| a.default(2)),
            ("DT_PROP_BY_IDX", 3) => {
                let property = a.property(0, 1)?;
                let element = self.elements(property).into_iter().nth(a.index(2)?)?;
                Some(Resolved::from_property(element, property))
            }
            ("DT_PROP_LAST", 2) => {
                let property = a.property(0, 1)?;
                let element = self.elements(property).pop()?;
                Some(Resolved::from_property(element, property))
            }
            ("DT_PROP_LEN", 2) => {
                let property = a.property(0, 1)?;
                Some(Resolved::from_property(
                    MacroValue::Int(self.prop_len(property) as i64),
                    property,
                ))
            }
            ("DT_PROP_LEN_OR", 3) => match a.property(0, 1) {
                Some(property) => Some(Resolved::from_property(
                    MacroValue::Int(self.prop_len(property) as i64),
                    property,
                )),
                None => a.default(2),
            },
            ("DT_PROP_HAS_IDX", 3) => {
                let len = a.property(0, 1).map(|p| self.prop_len(p)).unwrap_or(0);
                bool_value(a.index(2)? < len)
            }
            ("DT_PROP_HAS_NAME", 3) => {
                let node = a.node(0)?;
                let property = self.graph.property_by_ident(node, &a.ident(1)?);
                let wanted = a.raw(2)?;
                let found = property.and_then(|p| self.graph.group_index_by_name(p, &wanted));
                bool_value(found.is_some())
            }

            // ---- strings ------------------------------------------------------
            (name, _) if name.starts_with("DT_STRING_") => self.string_form(&a, name),

            // ---- enums --------------------------------------------------------
            ("DT_ENUM_IDX", 2) => self.enum_idx(&a, 0),
            ("DT_ENUM_IDX_OR", 3) => self.enum_idx(&a, 0).or_else(|| a.default(2)),
            ("DT_ENUM_IDX_BY_IDX", 3) => self.enum_idx(&a, a.index(2)?),
            ("DT_ENUM_IDX_BY_IDX_OR", 4) => a
                .index(2)
                .and_then(|i| self.enum_idx(&a, i))
                .or_else(|| a.default(3)),

            // ---- specifier cells ----------------------------------------------
            ("DT_PHA", 3) => self.pha(&a, Some(0), 2),
            ("DT_PHA_OR", 4) => self.pha(&a, Some(0), 2).or_else(|| a.default(3)),
            ("DT_PHA_BY_IDX", 4) => self.pha(&a, a.index(2), 3),
            ("DT_PHA_BY_IDX_OR", 5) => self.pha(&a, a.index(2), 3).or_else(|| a.default(4)),
            ("DT_PHA_BY_NAME", 4) => self.pha_by_name(&a),
            ("DT_PHA_BY_NAME_OR", 5) => self.pha_by_name(&a).or_else(|| a.default(4)),

            // ---- properties through a phandle ---------------------------------
            ("DT_PROP_BY_PHANDLE", 3) => self.prop_by_phandle(&a, Some(0), 2),
            ("DT_PROP_BY_PHANDLE_IDX", 4) => self.prop_by_phandle(&a, a.index(2), 3),
            ("DT_PROP_BY_PHANDLE_IDX_OR", 5) => self
                .prop_by_phandle(&a, a.index(2), 3)
                .or_else(|| a.default(4)),

            // ---- registers and interrupts -------------------------------------
            ("DT_NUM_REGS", 1) => int_value(self.graph.reg_blocks(a.node(0)?).len()),
            ("DT_REG_HAS_IDX", 2) => {
                bool_value(a.index(1)? < self.graph.reg_blocks(a.node(0)?).len())
            }
            ("DT_REG_ADDR", 1) => self.reg(&a, Some(0), true),
            ("DT_REG_SIZE", 1) => self.reg(&a, Some(0), false),
            ("DT_REG_ADDR_BY_IDX", 2) => self.reg(&a, a.index(1), true),
            ("DT_REG_SIZE_BY_IDX", 2) => self.reg(&a, a.index(1), false),
            ("DT_REG_ADDR_BY_NAME", 2) => self.reg(&a, self.name_index(&a, "reg-names"), true),
            ("DT_REG_SIZE_BY_NAME", 2) => self.reg(&a, self.name_index(&a, "reg-names"), false),
            ("DT_NUM_IRQS", 1) => int_value(self.graph.interrupt_groups(a.node(0)?).len()),
            ("DT_IRQ_HAS_IDX", 2) => {
                bool_value(a.index(1)? < self.graph.interrupt_groups(a.node(0)?).len())
            }
            ("DT_IRQN", 1) => self.irq(a.node(0)?, 0, "irq"),
            ("DT_IRQ", 2) => self.irq(a.node(0)?, 0, &a.raw(1)?),
            ("DT_IRQ_BY_IDX", 3) => self.irq(a.node(0)?, a.index(1)?, &a.raw(2)?),
            ("DT_IRQ_BY_NAME", 3) => {
                let group = self.name_index(&a, "interrupt-names")?;
                self.irq(a.node(0)?, group, &a.raw(2)?)
            }

            // ---- DT_INST_* shorthands and user macros -------------------------
            (name, n) if n > 0 && name.starts_with("DT_INST_") => self
                .instance_form(tree, call, depth)
                .or_else(|| self.expand(tree, call, depth)),
            _ => self.expand(tree, call, depth),
        }
    }

    // ========================================================================
    // NODES
    // ========================================================================

    fn child_by_ident(&self, parent: NodeId, ident: &str) -> Option<NodeId> {
        self.graph
            .children(parent)
            .iter()
            .copied()
            .find(|&c| to_macro_ident(&self.graph.node(c).full_name()) == ident)
    }

    /// Decode a generated node identifier (`DT_N_S_soc_S_uart_1000`).
    fn node_token(&self, text: &str) -> Option<NodeId> {
        let rest = text.strip_prefix("DT_N")?;
        let mut node = self.graph.root();
        if rest.is_empty() {
            return Some(node);
        }
        for segment in rest.strip_prefix("_S_")?.split("_S_") {
            node = self.child_by_ident(node, segment)?;
        }
        Some(node)
    }

    /// Nodes listing a compatible (macro-identifier form), `okay` ones first.
    fn instances(&self, compat: &str) -> Vec<NodeId> {
        let (mut okay, rest): (Vec<NodeId>, Vec<NodeId>) = self
            .graph
            .descendants(self.graph.root())
            .into_iter()
            .filter(|&n| {
                self.graph
                    .compatibles(n)
                    .iter()
                    .any(|c| to_macro_ident(c) == compat)
            })
            .partition(|&n| self.graph.is_status_okay(n));
        okay.extend(rest);
        okay
    }

    /// `DT_INST_FOO(inst, args...)` → `DT_FOO(DT_DRV_INST(inst), args...)`.
    fn instance_form(&self, tree: &MacroCallTree, call: CallId, depth: usize) -> Option<Resolved> {
        let rest = tree.name(call).strip_prefix("DT_INST_")?;
        let args: Vec<String> = tree.args(call).iter().map(|&a| tree.text(a)).collect();
        let (inst, others) = args.split_first()?;
        let mut text = format!("DT_{rest}(DT_DRV_INST({inst})");
        for other in others {
            text.push_str(", ");
            text.push_str(other);
        }
        text.push(')');
        let rewritten = parse_call(&text)?;
        self.resolve_at(&rewritten, rewritten.root(), depth + 1)
    }

    fn phandle_target(&self, property: PropertyId, index: usize) -> Option<NodeId> {
        self.graph.nexus_mappings(property).get(index)?.target
    }

    fn phandle_by_idx(&self, a: &Args<'_, '_>, index: usize) -> Option<Resolved> {
        let property = a.property(0, 1)?;
        self.phandle_target(property, index).map(Resolved::Node)
    }

    // ========================================================================
    // VALUES
    // ========================================================================

    fn kind_of(&self, property: PropertyId) -> Option<PropertyKind> {
        let data = self.graph.property(property);
        self.graph
            .resolved_type(data.owner)?
            .property(&data.name)
            .map(|spec| spec.kind)
    }

    fn cell(&self, value: &Value) -> MacroValue {
        match value {
            Value::Str(s) => MacroValue::Str(s.clone()),
            Value::Expr(expr) => self
                .graph
                .evaluator()
                .evaluate(expr)
                .map(MacroValue::Int)
                .unwrap_or_else(|| MacroValue::Expr(expr.to_string())),
            Value::LabelRef(label) => self
                .graph
                .resolve_reference(value)
                .map(MacroValue::Node)
                .unwrap_or_else(|| MacroValue::Expr(format!("&{label}"))),
            Value::PathRef(path) => self
                .graph
                .resolve_reference(value)
                .map(MacroValue::Node)
                .unwrap_or_else(|| MacroValue::Expr(format!("&{{{path}}}"))),
            Value::Array(cells) => MacroValue::Array(cells.iter().map(|c| self.cell(c)).collect()),
            Value::Bytes(bytes) => MacroValue::Bytes(bytes.clone()),
        }
    }

    /// Flat elements; byte strings contribute one integer per byte.
    fn elements(&self, property: PropertyId) -> Vec<MacroValue> {
        let mut out = Vec::new();
        for value in flatten(&self.graph.property(property).values) {
            match value {
                Value::Bytes(bytes) => out.extend(bytes.iter().map(|&b| MacroValue::Int(b as i64))),
                other => out.push(self.cell(other)),
            }
        }
        out
    }

    fn is_phandle_array(&self, property: PropertyId) -> bool {
        match self.kind_of(property) {
            Some(kind) => kind == PropertyKind::PhandleArray,
            None => {
                let flat = flatten(&self.graph.property(property).values);
                flat.first().is_some_and(|v| v.is_reference())
                    && flat.iter().any(|v| matches!(v, Value::Expr(_)))
            }
        }
    }

    fn prop_len(&self, property: PropertyId) -> usize {
        if self.is_phandle_array(property) {
            return self.graph.nexus_mappings(property).len();
        }
        self.elements(property).len()
    }

    /// Whole-property value shaped by the declared kind when known.
    fn property_value(&self, property: PropertyId) -> MacroValue {
        let values = &self.graph.property(property).values;
        if values.is_empty() {
            return MacroValue::Bool(true);
        }
        let kind = self.kind_of(property);
        if let [Value::Bytes(bytes)] = values.as_slice() {
            return MacroValue::Bytes(bytes.clone());
        }
        let mut elements = self.elements(property);
        let array = match kind {
            Some(
                PropertyKind::Array
                | PropertyKind::Uint8Array
                | PropertyKind::StringArray
                | PropertyKind::Phandles
                | PropertyKind::PhandleArray
                | PropertyKind::Compound,
            ) => true,
            Some(
                PropertyKind::Int
                | PropertyKind::String
                | PropertyKind::Boolean
                | PropertyKind::Phandle
                | PropertyKind::Path,
            ) => false,
            None => elements.len() > 1,
        };
        if array || elements.len() != 1 {
            MacroValue::Array(elements)
        } else {
            elements.remove(0)
        }
    }

    fn prop(&self, a: &Args<'_, '_>) -> Option<Resolved> {
        let node = a.node(0)?;
        let ident = a.ident(1)?;
        match self.graph.property_by_ident(node, &ident) {
            Some(property) => Some(Resolved::from_property(
                self.property_value(property),
                property,
            )),
            // A declared boolean that is absent reads as false.
            None => {
                let node_type = self.graph.resolved_type(node)?;
                let (_, spec) = node_type.property_by_ident(&ident)?;
                (spec.kind == PropertyKind::Boolean)
                    .then(|| Resolved::value(MacroValue::Bool(false)))
            }
        }
    }

    fn string_form(&self, a: &Args<'_, '_>, name: &str) -> Option<Resolved> {
        let form = name.strip_prefix("DT_STRING_")?;
        let (form, has_or) = match form.strip_suffix("_OR") {
            Some(form) => (form, true),
            None => (form, false),
        };
        let (form, by_idx) = match form.strip_suffix("_BY_IDX") {
            Some(form) => (form, true),
            None => (form, false),
        };
        let expected = 2 + by_idx as usize + has_or as usize;
        if a.len() != expected || !matches!(form, "TOKEN" | "UPPER_TOKEN" | "UNQUOTED") {
            return a.engine.expand(a.tree, a.call, a.depth);
        }

        let lookup = || {
            let property = a.property(0, 1)?;
            let index = if by_idx { a.index(2)? } else { 0 };
            let text = flatten(&self.graph.property(property).values)
                .into_iter()
                .filter_map(Value::as_str)
                .nth(index)?
                .to_string();
            let token = match form {
                "TOKEN" => to_string_token(&text),
                "UPPER_TOKEN" => to_upper_token(&text),
                _ => text,
            };
            Some(Resolved::from_property(
                MacroValue::Token(token.into()),
                property,
            ))
        };
        let found = lookup();
        if has_or {
            found.or_else(|| a.default(expected - 1))
        } else {
            found
        }
    }

    fn enum_idx(&self, a: &Args<'_, '_>, index: usize) -> Option<Resolved> {
        let node = a.node(0)?;
        let property = a.property(0, 1)?;
        let data = self.graph.property(property);
        let node_type = self.graph.resolved_type(node)?;
        let spec = node_type.property(&data.name)?;
        let element = *flatten(&data.values).get(index)?;
        let value = match element {
            Value::Str(s) => EnumValue::Str(s.clone()),
            Value::Expr(expr) => EnumValue::Int(self.graph.evaluator().evaluate(expr)?),
            _ => return None,
        };
        let position = spec.enum_index(&value)?;
        Some(Resolved::from_property(
            MacroValue::Int(position as i64),
            property,
        ))
    }

    /// `DT_PHA*`: cell named by argument `cell_arg` of group `group`.
    fn pha(&self, a: &Args<'_, '_>, group: Option<usize>, cell_arg: usize) -> Option<Resolved> {
        let property = a.property(0, 1)?;
        self.pha_cell(property, group?, &a.raw(cell_arg)?)
    }

    fn pha_by_name(&self, a: &Args<'_, '_>) -> Option<Resolved> {
        let property = a.property(0, 1)?;
        let group = self.graph.group_index_by_name(property, &a.raw(2)?)?;
        self.pha_cell(property, group, &a.raw(3)?)
    }

    fn pha_cell(&self, property: PropertyId, group: usize, cell: &str) -> Option<Resolved> {
        let value = self.graph.specifier_cell(property, group, cell)?;
        Some(Resolved::from_property(self.cell(value), property))
    }

    fn prop_by_phandle(
        &self,
        a: &Args<'_, '_>,
        index: Option<usize>,
        prop_arg: usize,
    ) -> Option<Resolved> {
        let phandles = a.property(0, 1)?;
        let target = self.phandle_target(phandles, index?)?;
        let property = self.graph.property_by_ident(target, &a.ident(prop_arg)?)?;
        Some(Resolved::from_property(
            self.property_value(property),
            property,
        ))
    }

    /// Position of argument 1 in the node's `names` property.
    fn name_index(&self, a: &Args<'_, '_>, names: &str) -> Option<usize> {
        let node = a.node(0)?;
        let wanted = a.raw(1)?;
        flatten(self.graph.property_values(node, names)?)
            .iter()
            .position(|v| v.as_str() == Some(wanted.as_str()))
    }

    fn reg(&self, a: &Args<'_, '_>, index: Option<usize>, address: bool) -> Option<Resolved> {
        let node = a.node(0)?;
        let block = *self.graph.reg_blocks(node).get(index?)?;
        let value = if address { block.address } else { block.size };
        let value = i64::try_from(value?).ok()?;
        let source = self.graph.live_property(node, "reg")?;
        Some(Resolved::from_property(
            MacroValue::Int(value),
            source,
        ))
    }

    fn irq(&self, node: NodeId, group: usize, cell: &str) -> Option<Resolved> {
        let value = self.graph.interrupt_cell_value(node, group, cell)?;
        let source = self
            .graph
            .live_property(node, "interrupts-extended")
            .or_else(|| self.graph.live_property(node, "interrupts"))?;
        Some(Resolved::from_property(MacroValue::Int(value), source))
    }
}

/// Argument accessors for one call.
struct Args<'e, 't> {
    engine: &'e MacroEngine<'e>,
    tree: &'t MacroCallTree,
    call: CallId,
    depth: usize,
}

impl Args<'_, '_> {
    fn len(&self) -> usize {
        self.tree.args(self.call).len()
    }

    fn id(&self, index: usize) -> Option<CallId> {
        self.tree.arg(self.call, index)
    }

    /// Argument text as written, string quotes removed. Not macro-expanded,
    /// matching token pasting in the generated accessors.
    fn raw(&self, index: usize) -> Option<String> {
        let node = self.tree.node(self.id(index)?);
        match node.kind {
            CallKind::Str => Some(unquote(&node.name).to_string()),
            CallKind::Ident | CallKind::Number | CallKind::Raw => Some(node.name.to_string()),
            CallKind::Call => None,
        }
    }

    /// Argument in macro-identifier form (`"uart@1000"` → `uart_1000`).
    fn ident(&self, index: usize) -> Option<String> {
        self.raw(index).map(|r| to_macro_ident(&r))
    }

    fn resolve(&self, index: usize) -> Option<Resolved> {
        self.engine.resolve_at(self.tree, self.id(index)?, self.depth)
    }

    fn node(&self, index: usize) -> Option<NodeId> {
        self.resolve(index)?.node()
    }

    fn index(&self, index: usize) -> Option<usize> {
        let value = self.resolve(index)?.as_int()?;
        usize::try_from(value).ok()
    }

    /// Property argument `prop` of the node at argument `node`.
    fn property(&self, node: usize, prop: usize) -> Option<PropertyId> {
        let node = self.node(node)?;
        self.engine.graph.property_by_ident(node, &self.ident(prop)?)
    }

    /// Fallback argument of the `_OR` forms; bare identifiers stay tokens.
    fn default(&self, index: usize) -> Option<Resolved> {
        self.resolve(index).or_else(|| {
            let node = self.tree.node(self.id(index)?);
            match node.kind {
                CallKind::Ident | CallKind::Raw => {
                    Some(Resolved::value(MacroValue::Token(node.name.clone())))
                }
                _ => None,
            }
        })
    }
}

fn bool_value(value: bool) -> Option<Resolved> {
    Some(Resolved::value(MacroValue::Bool(value)))
}

fn int_value(value: usize) -> Option<Resolved> {
    Some(Resolved::value(MacroValue::Int(value as i64)))
}

fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}
