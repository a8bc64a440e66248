//! Graph module for import relationship modeling.
//!
//! - [`PackageStore`] holds every resolved package descriptor.
//! - [`IdAllocator`] hands out stable node IDs.
//! - [`ImportGraph`] is the filtered petgraph view the renderer writes out.
//!
//! # Example
//!
//! ```rust
//! use godepgraph::graph::{IdAllocator, PackageStore};
//! use godepgraph::parser::Package;
//!
//! let mut store = PackageStore::new();
//! store.insert(Package::new("app").with_imports(["fmt"]));
//!
//! let mut ids = IdAllocator::new();
//! assert_eq!(ids.id_for("app"), 0);
//! assert_eq!(store.len(), 1);
//! ```

mod identity;
mod import_graph;
mod store;

pub use identity::IdAllocator;
pub use import_graph::{GraphNode, ImportGraph};
pub use store::PackageStore;
