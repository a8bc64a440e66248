//! Import graph built from the package store using petgraph.
//!
//! The graph holds only packages that pass the filter, each tagged with its
//! allocated node ID, and the deduplicated edges between them.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

use super::identity::IdAllocator;
use super::store::PackageStore;
use crate::config::RenderOptions;
use crate::filter::PackageFilter;
use crate::parser::{Package, PackageKind};

/// A retained package in the import graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    /// Allocated node ID, the key in DOT output.
    pub id: usize,
    /// Import path, used as the node label.
    pub import_path: String,
    /// Classification used for the fill color.
    pub kind: PackageKind,
}

impl GraphNode {
    /// Creates a node for `package` with the given ID.
    pub fn new(id: usize, package: &Package) -> Self {
        Self {
            id,
            import_path: package.import_path.clone(),
            kind: package.kind(),
        }
    }
}

/// A directed graph of retained packages.
///
/// Edges point from the importing package to the imported one. Nodes keep
/// the store's resolution order; outgoing edges keep import order.
///
/// # Example
///
/// ```rust
/// use godepgraph::config::RenderOptions;
/// use godepgraph::filter::PackageFilter;
/// use godepgraph::graph::{IdAllocator, ImportGraph, PackageStore};
/// use godepgraph::parser::Package;
///
/// let mut store = PackageStore::new();
/// store.insert(Package::new("app").with_imports(["lib/a", "lib/b"]));
/// store.insert(Package::new("lib/a").with_imports(["lib/b"]));
/// store.insert(Package::new("lib/b"));
///
/// let mut ids = IdAllocator::new();
/// let graph = ImportGraph::build(&store, &PackageFilter::default(), &mut ids, RenderOptions::default());
///
/// assert_eq!(graph.node_count(), 3);
/// assert_eq!(graph.edge_count(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    graph: DiGraph<GraphNode, ()>,
    node_indices: HashMap<String, NodeIndex>,
}

impl ImportGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph of every stored package that passes `filter`.
    ///
    /// IDs are allocated while walking the store: first the package itself
    /// (even when it is filtered out), then each import it has an edge to.
    /// Imports that were never stored or are filtered out are dropped.
    /// Standard-library packages get no outgoing edges unless
    /// `options.delve_goroot` is set.
    pub fn build(
        store: &PackageStore,
        filter: &PackageFilter,
        ids: &mut IdAllocator,
        options: RenderOptions,
    ) -> Self {
        let mut graph = Self::new();
        let mut pending = Vec::new();

        for package in store.iter() {
            let id = ids.id_for(&package.import_path);
            if filter.is_excluded(package) {
                continue;
            }
            graph.add_node(GraphNode::new(id, package));

            if package.is_standard_library() && !options.delve_goroot {
                continue;
            }

            for import in package.direct_imports(options.include_tests) {
                let Some(target) = store.get(import) else {
                    continue;
                };
                if filter.is_excluded(target) {
                    continue;
                }
                ids.id_for(import);
                pending.push((package.import_path.as_str(), import));
            }
        }

        for (from, to) in pending {
            graph.add_edge(from, to);
        }

        graph
    }

    /// Adds a node, returning the existing index if the path is present.
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(&node.import_path) {
            return idx;
        }
        let path = node.import_path.clone();
        let idx = self.graph.add_node(node);
        self.node_indices.insert(path, idx);
        idx
    }

    /// Adds an edge between two existing nodes.
    ///
    /// Returns `false` if either node is missing, the edge is a self-loop,
    /// or the edge already exists.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        let (Some(&from_idx), Some(&to_idx)) =
            (self.node_indices.get(from), self.node_indices.get(to))
        else {
            return false;
        };
        if from_idx == to_idx || self.graph.contains_edge(from_idx, to_idx) {
            return false;
        }
        self.graph.add_edge(from_idx, to_idx, ());
        true
    }

    /// Iterates nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Returns the packages imported by `import_path`, in import order.
    pub fn get_dependencies(&self, import_path: &str) -> Vec<&GraphNode> {
        let Some(&idx) = self.node_indices.get(import_path) else {
            return Vec::new();
        };

        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .collect();
        edges.sort_by_key(|edge| edge.id());
        edges
            .into_iter()
            .filter_map(|edge| self.graph.node_weight(edge.target()))
            .collect()
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;

    fn diamond_store() -> PackageStore {
        let mut store = PackageStore::new();
        store.insert(Package::new("app").with_imports(["lib/a", "lib/b"]));
        store.insert(Package::new("lib/a").with_imports(["lib/b"]));
        store.insert(Package::new("lib/b"));
        store
    }

    fn build(store: &PackageStore, config: &GraphConfig) -> (ImportGraph, IdAllocator) {
        let mut ids = IdAllocator::new();
        let filter = PackageFilter::from_config(config);
        let graph = ImportGraph::build(store, &filter, &mut ids, config.render_options());
        (graph, ids)
    }

    fn edges(graph: &ImportGraph) -> Vec<(&str, &str)> {
        graph
            .nodes()
            .flat_map(|node| {
                graph
                    .get_dependencies(&node.import_path)
                    .into_iter()
                    .map(move |dep| (node.import_path.as_str(), dep.import_path.as_str()))
            })
            .collect()
    }

    fn edge_ids(graph: &ImportGraph) -> Vec<(usize, usize)> {
        graph
            .nodes()
            .flat_map(|node| {
                graph
                    .get_dependencies(&node.import_path)
                    .into_iter()
                    .map(move |dep| (node.id, dep.id))
            })
            .collect()
    }

    fn node_ids(graph: &ImportGraph) -> Vec<(&str, usize)> {
        graph
            .nodes()
            .map(|node| (node.import_path.as_str(), node.id))
            .collect()
    }

    #[test]
    fn test_create_empty_graph() {
        let graph = ImportGraph::new();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_diamond_has_single_direct_edge() {
        let (graph, _) = build(&diamond_store(), &GraphConfig::default());

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(
            edges(&graph),
            vec![("app", "lib/a"), ("app", "lib/b"), ("lib/a", "lib/b")]
        );
    }

    #[test]
    fn test_ids_follow_store_order() {
        let (graph, _) = build(&diamond_store(), &GraphConfig::default());

        assert_eq!(node_ids(&graph), vec![("app", 0), ("lib/a", 1), ("lib/b", 2)]);
        assert_eq!(edge_ids(&graph), vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_excluded_package_drops_node_and_edges() {
        let config = GraphConfig {
            ignored_packages: vec!["lib/b".into()],
            ..GraphConfig::default()
        };
        let (graph, _) = build(&diamond_store(), &config);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(edges(&graph), vec![("app", "lib/a")]);
    }

    #[test]
    fn test_excluded_package_still_consumes_id() {
        let mut store = PackageStore::new();
        store.insert(Package::new("skip"));
        store.insert(Package::new("keep"));
        let config = GraphConfig {
            ignored_packages: vec!["skip".into()],
            ..GraphConfig::default()
        };
        let (graph, _) = build(&store, &config);

        assert_eq!(node_ids(&graph), vec![("keep", 1)]);
    }

    #[test]
    fn test_unresolved_targets_are_dropped() {
        let mut store = PackageStore::new();
        store.insert(Package::new("app").with_imports(["missing", "lib"]));
        store.insert(Package::new("lib"));
        let (graph, mut ids) = build(&store, &GraphConfig::default());

        assert_eq!(edges(&graph), vec![("app", "lib")]);
        // "missing" never got an ID.
        assert_eq!(ids.id_for("fresh"), 2);
    }

    #[test]
    fn test_stdlib_has_no_edges_without_delve() {
        let mut store = PackageStore::new();
        store.insert(Package::new("app").with_imports(["fmt"]));
        store.insert(Package::new("fmt").standard().with_imports(["io"]));
        store.insert(Package::new("io").standard());

        let (graph, _) = build(&store, &GraphConfig::default());
        assert!(graph.get_dependencies("fmt").is_empty());
        assert_eq!(graph.edge_count(), 1);

        let delve = GraphConfig {
            delve_goroot: true,
            ..GraphConfig::default()
        };
        let (graph, _) = build(&store, &delve);
        assert_eq!(edges(&graph), vec![("app", "fmt"), ("fmt", "io")]);
    }

    #[test]
    fn test_test_imports_are_optional() {
        let mut store = PackageStore::new();
        store.insert(
            Package::new("p")
                .with_imports(["q"])
                .with_test_imports(["q", "testing"])
                .with_x_test_imports(["p"]),
        );
        store.insert(Package::new("q"));
        store.insert(Package::new("testing").standard());

        let (graph, _) = build(&store, &GraphConfig::default());
        assert_eq!(graph.edge_count(), 1);

        let tests = GraphConfig {
            include_tests: true,
            ..GraphConfig::default()
        };
        let (graph, _) = build(&store, &tests);
        assert_eq!(edges(&graph), vec![("p", "q"), ("p", "testing")]);
    }

    #[test]
    fn test_add_edge_rejects_self_loops_and_duplicates() {
        let mut graph = ImportGraph::new();
        graph.add_node(GraphNode::new(0, &Package::new("a")));
        graph.add_node(GraphNode::new(1, &Package::new("b")));

        assert!(graph.add_edge("a", "b"));
        assert!(!graph.add_edge("a", "b"));
        assert!(!graph.add_edge("a", "a"));
        assert!(!graph.add_edge("a", "missing"));
        assert_eq!(graph.edge_count(), 1);
    }
}
