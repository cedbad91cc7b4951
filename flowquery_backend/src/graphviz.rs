//! Renders a [`DependencyGraph`] in the Graphviz `dot` language, one cluster
//! per definition.

use std::fmt;

use crate::dependency_graph::{DependencyGraph, DependencyId, Subgraph, Vertex};

const INDENT: &str = "    ";

/// Returns the `dot` source for `graph`.
pub fn render(graph: &DependencyGraph) -> String {
    Dot(graph).to_string()
}

struct Dot<'graph>(&'graph DependencyGraph);

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph G {{")?;
        writeln!(f, "{}node [shape=\"box\"];", INDENT)?;

        for (index, subgraph) in self.0.subgraphs().iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "{}subgraph cluster{} {{", INDENT, index)?;
            writeln!(f, "{0}{0}label={1};", INDENT, quote(subgraph.label()))?;
            writeln!(f, "{0}{0}color=\"gray\";", INDENT)?;

            for (id, vertex) in subgraph.vertices() {
                write_vertex(f, id, vertex)?;
            }

            write_edges(f, subgraph)?;
            writeln!(f, "{}}}", INDENT)?;
        }

        writeln!(f, "}}")
    }
}

fn write_vertex(f: &mut fmt::Formatter<'_>, id: DependencyId, vertex: &Vertex) -> fmt::Result {
    let label = vertex.label.as_deref().unwrap_or_default();

    match &vertex.params {
        Some(params) => {
            let mut html = String::from(
                "<TABLE BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\" CELLPADDING=\"4\"><TR>",
            );

            for (index, param) in params.iter().enumerate() {
                html.push_str(&format!("<TD PORT=\"{}\">{}</TD>", index, escape_html(param)));
            }

            html.push_str(&format!(
                "</TR><TR><TD COLSPAN=\"{}\">{}</TD></TR></TABLE>",
                params.len(),
                escape_html(label)
            ));

            writeln!(
                f,
                "{0}{0}v{1} [shape=none, margin=0, label=<{2}>];",
                INDENT, id, html
            )
        },

        None => writeln!(f, "{0}{0}v{1} [label={2}];", INDENT, id, quote(label)),
    }
}

/// Edges are grouped by their source, sources in the order they first
/// gained an edge.
fn write_edges(f: &mut fmt::Formatter<'_>, subgraph: &Subgraph) -> fmt::Result {
    let mut sources: Vec<DependencyId> = Vec::new();

    for edge in subgraph.edges() {
        if !sources.contains(&edge.from) {
            sources.push(edge.from);
        }
    }

    for from in sources {
        for edge in subgraph.outgoing(from) {
            match edge.param_index {
                Some(index) => writeln!(f, "{0}{0}v{1} -> v{2}:{3};", INDENT, from, edge.to, index)?,
                None => writeln!(f, "{0}{0}v{1} -> v{2};", INDENT, from, edge.to)?,
            }
        }
    }

    Ok(())
}

/// A double-quoted option value.
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting() {
        assert_eq!(quote("f(x)"), "\"f(x)\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(escape_html("a < b & \"c\" > d"), "a &lt; b &amp; &quot;c&quot; &gt; d");
    }

    #[test]
    fn empty_graph() {
        assert_eq!(
            render(&DependencyGraph::new()),
            "digraph G {\n    node [shape=\"box\"];\n}\n"
        );
    }
}
