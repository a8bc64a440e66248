//! Graphviz DOT output.
//!
//! Writes an [`ImportGraph`] as a `digraph` with one node statement per
//! package followed by that package's outgoing edges.

use std::io::{self, Write};

use crate::graph::{GraphNode, ImportGraph};

/// Name of the emitted digraph.
pub const GRAPH_NAME: &str = "godep";

/// DOT writer for import graphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotExporter {
    /// Emit `rankdir="LR"` for a left-to-right layout.
    pub horizontal: bool,
}

impl DotExporter {
    /// Creates an exporter with the given orientation.
    pub fn new(horizontal: bool) -> Self {
        Self { horizontal }
    }

    /// Writes `graph` to `writer`.
    pub fn export<W: Write>(&self, graph: &ImportGraph, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "digraph {} {{", GRAPH_NAME)?;
        if self.horizontal {
            writeln!(writer, "rankdir=\"LR\"")?;
        }

        for node in graph.nodes() {
            write_node(writer, node)?;
            for dep in graph.get_dependencies(&node.import_path) {
                writeln!(writer, "{} -> {};", node.id, dep.id)?;
            }
        }

        writeln!(writer, "}}")
    }
}

fn write_node<W: Write>(writer: &mut W, node: &GraphNode) -> io::Result<()> {
    writeln!(
        writer,
        "{} [label=\"{}\" style=\"filled\" color=\"{}\"];",
        node.id,
        escape_label(&node.import_path),
        node.kind.color()
    )
}

/// Escapes special characters for DOT labels.
pub fn escape_label(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Package;

    fn to_string(exporter: DotExporter, graph: &ImportGraph) -> String {
        let mut buffer = Vec::new();
        exporter.export(graph, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_empty_graph() {
        let output = to_string(DotExporter::default(), &ImportGraph::new());
        assert_eq!(output, "digraph godep {\n}\n");
    }

    #[test]
    fn test_horizontal_header() {
        let output = to_string(DotExporter::new(true), &ImportGraph::new());
        assert_eq!(output, "digraph godep {\nrankdir=\"LR\"\n}\n");
    }

    #[test]
    fn test_node_and_edge_statements() {
        let mut graph = ImportGraph::new();
        graph.add_node(GraphNode::new(0, &Package::new("app")));
        graph.add_node(GraphNode::new(3, &Package::new("fmt").standard()));
        graph.add_edge("app", "fmt");

        let output = to_string(DotExporter::default(), &graph);
        assert_eq!(
            output,
            "digraph godep {\n\
             0 [label=\"app\" style=\"filled\" color=\"paleturquoise\"];\n\
             0 -> 3;\n\
             3 [label=\"fmt\" style=\"filled\" color=\"palegreen\"];\n\
             }\n"
        );
    }

    #[test]
    fn test_escape_label() {
        assert_eq!(escape_label("plain/path"), "plain/path");
        assert_eq!(escape_label("a\"b"), "a\\\"b");
        assert_eq!(escape_label("a\\b"), "a\\\\b");
        assert_eq!(escape_label("a\nb"), "a\\nb");
    }
}
