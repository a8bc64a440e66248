//! godepgraph - import dependency graphs for Go packages
//!
//! This crate resolves a Go package and everything it transitively imports,
//! then renders the result as a Graphviz DOT digraph.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use godepgraph::config::GraphConfig;
//! use godepgraph::parser::{InMemorySource, Package};
//!
//! let source = InMemorySource::new()
//!     .with_package(Package::new("app").with_imports(["fmt"]))
//!     .with_package(Package::new("fmt").standard());
//!
//! let dot = godepgraph::generate(&source, Path::new("."), "app", GraphConfig::default()).unwrap();
//! assert!(dot.starts_with("digraph godep {"));
//! assert!(dot.contains("0 -> 1;"));
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod graph;
pub mod parser;
pub mod resolver;

use std::path::Path;

use tracing::info;

pub use error::{Error, Result};

use config::GraphConfig;
use parser::PackageSource;
use resolver::{Resolver, RunContext};

/// Returns the single package named on the command line.
///
/// Anything other than exactly one name is a usage error.
pub fn single_package(packages: &[String]) -> Result<&str> {
    match packages {
        [package] => Ok(package.as_str()),
        _ => Err(Error::Usage("need one package name to process".to_string())),
    }
}

/// Resolves `import_path` from `root` and returns the DOT graph.
///
/// Nothing is rendered unless resolution succeeds completely.
pub fn generate<S: PackageSource + ?Sized>(
    source: &S,
    root: &Path,
    import_path: &str,
    config: GraphConfig,
) -> Result<String> {
    let mut ctx = RunContext::new(config);
    let summary = Resolver::new(source, root).resolve(&mut ctx, import_path)?;

    let mut buffer = Vec::new();
    let graph = export::render(
        &ctx.store,
        &ctx.filter,
        &mut ctx.ids,
        ctx.config.render_options(),
        &mut buffer,
    )?;

    info!(
        root = import_path,
        resolved = summary.stored,
        excluded = summary.excluded,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Import graph generated"
    );

    String::from_utf8(buffer)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
