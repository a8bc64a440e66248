//! Rendering of the resolved package store.
//!
//! Builds the filtered [`ImportGraph`] and writes it in Graphviz DOT format,
//! the only supported output.

pub mod dot;

use std::io::{self, Write};

use tracing::debug;

use crate::config::RenderOptions;
use crate::filter::PackageFilter;
use crate::graph::{IdAllocator, ImportGraph, PackageStore};

pub use dot::DotExporter;

/// Renders the store as DOT to `writer`.
///
/// Returns the graph that was written.
pub fn render<W: Write>(
    store: &PackageStore,
    filter: &PackageFilter,
    ids: &mut IdAllocator,
    options: RenderOptions,
    writer: &mut W,
) -> io::Result<ImportGraph> {
    let graph = ImportGraph::build(store, filter, ids, options);
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        stored = store.len(),
        "Rendering import graph"
    );
    DotExporter::new(options.horizontal).export(&graph, writer)?;
    Ok(graph)
}

/// Renders the store as a DOT string.
///
/// # Example
///
/// ```
/// use godepgraph::config::RenderOptions;
/// use godepgraph::export::render_to_string;
/// use godepgraph::filter::PackageFilter;
/// use godepgraph::graph::{IdAllocator, PackageStore};
/// use godepgraph::parser::Package;
///
/// let mut store = PackageStore::new();
/// store.insert(Package::new("app"));
///
/// let dot = render_to_string(
///     &store,
///     &PackageFilter::default(),
///     &mut IdAllocator::new(),
///     RenderOptions::default(),
/// )
/// .unwrap();
/// assert_eq!(
///     dot,
///     "digraph godep {\n0 [label=\"app\" style=\"filled\" color=\"paleturquoise\"];\n}\n"
/// );
/// ```
pub fn render_to_string(
    store: &PackageStore,
    filter: &PackageFilter,
    ids: &mut IdAllocator,
    options: RenderOptions,
) -> io::Result<String> {
    let mut buffer = Vec::new();
    render(store, filter, ids, options, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
