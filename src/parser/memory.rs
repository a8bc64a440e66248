//! In-memory provider for tests, benchmarks and embedding.

use std::cell::Cell;
use std::collections::HashMap;
use std::path::Path;

use super::provider::{PackageSource, ProviderError, ProviderResult};
use super::types::{LoadMode, Package};

/// A provider serving fabricated package descriptors.
///
/// Counts every lookup so callers can check that the resolver never asks for
/// the same package twice.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use godepgraph::parser::{InMemorySource, LoadMode, Package, PackageSource};
///
/// let source = InMemorySource::new()
///     .with_package(Package::new("app").with_imports(["fmt"]))
///     .with_package(Package::new("fmt").standard());
///
/// let pkg = source.load(Path::new("."), "app", LoadMode::default()).unwrap();
/// assert_eq!(pkg.imports, vec!["fmt"]);
/// assert_eq!(source.load_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemorySource {
    packages: HashMap<String, Package>,
    loads: Cell<usize>,
}

impl InMemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a package, keyed by its import path.
    pub fn with_package(mut self, package: Package) -> Self {
        self.insert(package);
        self
    }

    /// Adds a package, replacing any previous one with the same path.
    pub fn insert(&mut self, package: Package) {
        self.packages.insert(package.import_path.clone(), package);
    }

    /// Returns the number of `load` calls made so far.
    pub fn load_count(&self) -> usize {
        self.loads.get()
    }
}

impl PackageSource for InMemorySource {
    fn load(&self, root: &Path, import_path: &str, _mode: LoadMode) -> ProviderResult<Package> {
        self.loads.set(self.loads.get() + 1);
        self.packages
            .get(import_path)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound {
                import_path: import_path.to_string(),
                searched: vec![root.join(import_path)],
            })
    }
}
