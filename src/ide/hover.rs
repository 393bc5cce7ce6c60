//! Hover information for devicetree sources and macro expressions.

use crate::base::{FileId, Location, Position, TextRange, TextSize};
use crate::hir::{AstHit, DeleteKind, DeletedEntity, DirectiveId, Graph, NodeId, PropertyId};
use crate::macros::{MacroEngine, MacroEnv, Resolved, call_at_offset};
use crate::syntax::{Value, flatten};

/// Result of a hover request in a devicetree file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoverResult {
    /// The hover content (markdown).
    pub contents: String,
    /// Span of the hovered entity.
    pub location: Location,
}

/// Result of a hover request over a macro expression in C source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MacroHover {
    pub contents: String,
    /// Range of the call that resolved, in the hovered text.
    pub range: TextRange,
    pub resolved: Resolved,
}

/// Hover for the deepest entity at `position`.
pub fn hover(graph: &Graph, file: FileId, position: Position) -> Option<HoverResult> {
    let hit = graph.deepest_ast_node_at(file, position)?;
    match hit {
        AstHit::Node(node) => {
            let location = graph
                .node(node)
                .contributions()
                .into_iter()
                .map(|d| d.location)
                .find(|l| l.contains(file, position))?;
            Some(HoverResult {
                contents: node_hover(graph, node),
                location,
            })
        }
        AstHit::Property(property) => Some(HoverResult {
            contents: property_hover(graph, property),
            location: graph.property(property).location,
        }),
        AstHit::Directive(directive) => Some(HoverResult {
            contents: directive_hover(graph, directive),
            location: graph.directive(directive).location,
        }),
    }
}

/// Hover for the macro call covering `offset` in `source`.
///
/// Starts at the innermost call and widens to enclosing calls until one
/// resolves.
pub fn hover_macro(
    graph: &Graph,
    env: &dyn MacroEnv,
    max_depth: usize,
    source: &str,
    offset: TextSize,
) -> Option<MacroHover> {
    let (tree, innermost) = call_at_offset(source, offset)?;
    let engine = MacroEngine::new(graph, env).with_max_depth(max_depth);
    let mut current = Some(innermost);
    while let Some(call) = current {
        if let Some(resolved) = engine.resolve(&tree, call) {
            let mut contents = format!("`{}`\n\n", tree.text(call));
            contents.push_str(&resolved_hover(graph, &resolved));
            return Some(MacroHover {
                contents,
                range: tree.node(call).range,
                resolved,
            });
        }
        current = tree.node(call).parent;
    }
    None
}

fn resolved_hover(graph: &Graph, resolved: &Resolved) -> String {
    match resolved {
        Resolved::Node(node) => node_hover(graph, *node),
        Resolved::Value { value, source } => {
            let mut content = format!("```c\n{}\n```\n", value.render(graph));
            if let Some(property) = source {
                let data = graph.property(*property);
                content.push_str(&format!(
                    "\nFrom `{}` of `{}`\n",
                    data.name,
                    graph.path_of(data.owner)
                ));
            }
            content
        }
    }
}

fn node_hover(graph: &Graph, node: NodeId) -> String {
    let data = graph.node(node);
    let path = graph.path_of(node);
    let mut content = String::new();

    content.push_str("```devicetree\n");
    content.push_str(if path.is_empty() { "<unresolved>" } else { &path });
    content.push_str("\n```\n");

    let labels = graph.labels_of(node);
    if !labels.is_empty() {
        let labels: Vec<String> = labels.iter().map(|l| format!("`{l}`")).collect();
        content.push_str(&format!("\n**Labels:** {}\n", labels.join(", ")));
    }
    if let Some(compatible) = graph
        .resolved_type(node)
        .and_then(|t| t.compatible.clone())
    {
        content.push_str(&format!("\n**Binding:** `{compatible}`\n"));
    }
    if graph.live_property(node, "status").is_some() || !graph.is_status_okay(node) {
        let status = graph.string_property(node, "status").unwrap_or("?");
        content.push_str(&format!("\n**Status:** `{status}`\n"));
    }
    if let Some(phandle) = data.phandle {
        content.push_str(&format!("\n**Phandle:** `{phandle}`\n"));
    }
    if let Some(directive) = data.deleted_by {
        content.push_str(&format!(
            "\n**Deleted by** `{}`\n",
            directive_text(graph, directive)
        ));
    }
    content
}

fn property_hover(graph: &Graph, property: PropertyId) -> String {
    let data = graph.property(property);
    let mut content = String::new();

    content.push_str("```devicetree\n");
    content.push_str(&property_text(data.name.as_str(), &data.values));
    content.push_str("\n```\n");
    content.push_str(&format!("\nNode: `{}`\n", graph.path_of(data.owner)));

    if let Some(directive) = data.deleted_by {
        content.push_str(&format!(
            "\n**Deleted by** `{}`\n",
            directive_text(graph, directive)
        ));
    } else if data.replaced_by.is_some() {
        if let Some(live) = graph.live_property(data.owner, &data.name) {
            content.push_str(&format!(
                "\n**Overridden:** `{}`\n",
                property_text(&data.name, &graph.property(live).values)
            ));
        }
    }

    let references: Vec<String> = flatten(&data.values)
        .into_iter()
        .filter(|v| v.is_reference())
        .filter_map(|v| {
            let target = graph.resolve_reference(v)?;
            Some(format!("- `{}` → `{}`", render_value(v), graph.path_of(target)))
        })
        .collect();
    if !references.is_empty() {
        content.push_str("\n**References:**\n");
        content.push_str(&references.join("\n"));
        content.push('\n');
    }
    content
}

fn directive_hover(graph: &Graph, directive: DirectiveId) -> String {
    let data = graph.directive(directive);
    let mut content = format!("```devicetree\n{}\n```\n", directive_text(graph, directive));
    match data.removed {
        Some(DeletedEntity::Node(node)) => {
            content.push_str(&format!("\nRemoves `{}`\n", graph.path_of(node)));
        }
        Some(DeletedEntity::Property(property)) => {
            let removed = graph.property(property);
            content.push_str(&format!(
                "\nRemoves `{}` from `{}`\n",
                removed.name,
                graph.path_of(removed.owner)
            ));
        }
        None => content.push_str("\nTarget does not exist\n"),
    }
    content
}

fn directive_text(graph: &Graph, directive: DirectiveId) -> String {
    let data = graph.directive(directive);
    match data.kind {
        DeleteKind::Node => format!("/delete-node/ {};", data.target),
        DeleteKind::Property => format!("/delete-property/ {};", data.target),
    }
}

fn property_text(name: &str, values: &[Value]) -> String {
    if values.is_empty() {
        return format!("{name};");
    }
    let values: Vec<String> = values.iter().map(render_value).collect();
    format!("{name} = {};", values.join(", "))
}

/// Render a value the way it is written in a source file.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("\"{s}\""),
        Value::Expr(expr) => expr.to_string(),
        Value::LabelRef(label) => format!("&{label}"),
        Value::PathRef(path) => format!("&{{{path}}}"),
        Value::Array(cells) => {
            let cells: Vec<String> = cells.iter().map(render_value).collect();
            format!("<{}>", cells.join(" "))
        }
        Value::Bytes(bytes) => {
            let bytes: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
            format!("[{}]", bytes.join(" "))
        }
    }
}
