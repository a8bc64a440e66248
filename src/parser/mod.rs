//! Package metadata for godepgraph.
//!
//! This module defines the package descriptor, the [`PackageSource`] provider
//! trait, and the providers that do not need source parsing.
//!
//! # Providers
//!
//! - **go list** ([`GoListProvider`]) - asks the Go toolchain
//! - **in memory** ([`InMemorySource`]) - fabricated descriptors
//! - **source tree** - see [`crate::analysis::SourceTreeProvider`]
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use godepgraph::parser::{GoListProvider, LoadMode, PackageSource};
//!
//! let provider = GoListProvider::new(vec!["integration".to_string()]);
//! let pkg = provider.load(Path::new("."), "net/http", LoadMode::default()).unwrap();
//! println!("{} imports {} packages", pkg.import_path, pkg.imports.len());
//! ```

pub mod go_list;
pub mod memory;
pub mod provider;
pub mod types;

pub use go_list::GoListProvider;
pub use memory::InMemorySource;
pub use provider::{PackageSource, ProviderError, ProviderResult};
pub use types::{LoadMode, Package, PackageError, PackageKind};
