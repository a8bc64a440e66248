//! Go source analysis for godepgraph.
//!
//! This module provides a package-metadata provider that does not need the
//! Go toolchain: it finds package directories itself and reads their imports
//! with tree-sitter.
//!
//! # Features
//!
//! - Resolve import paths under GOROOT, the enclosing module, its vendor
//!   directory, the module cache and GOPATH
//! - Parse `package` clauses and `import` declarations
//! - Split in-package and external test imports
//! - Detect cgo files (`import "C"`)
//! - Honor `//go:build` lines and `_GOOS`/`_GOARCH` file name suffixes
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use godepgraph::analysis::SourceTreeProvider;
//! use godepgraph::parser::{LoadMode, PackageSource};
//!
//! let provider = SourceTreeProvider::from_env(Vec::new(), None, None);
//! let pkg = provider.load(Path::new("."), "net/http", LoadMode::default())?;
//! println!("{} imports {:?}", pkg.import_path, pkg.imports);
//! ```

pub mod constraint;
pub mod gomod;
pub mod imports;
pub mod source;

// Re-export main types for convenience
pub use constraint::BuildContext;
pub use gomod::GoModule;
pub use imports::{GoFile, GoFileAnalyzer};
pub use source::{Location, SourceTreeProvider};
