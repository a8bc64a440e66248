//! Memoization table of resolved packages.

use std::collections::HashMap;

use crate::parser::Package;

/// Resolved package descriptors keyed by import path.
///
/// Iteration follows insertion order, which is the resolver's pre-order
/// traversal. The first descriptor stored for a path wins.
///
/// # Example
///
/// ```
/// use godepgraph::graph::PackageStore;
/// use godepgraph::parser::Package;
///
/// let mut store = PackageStore::new();
/// assert!(store.insert(Package::new("app")));
/// assert!(!store.insert(Package::new("app").standard()));
///
/// assert_eq!(store.len(), 1);
/// assert!(!store.get("app").unwrap().is_standard_library());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PackageStore {
    packages: Vec<Package>,
    index: HashMap<String, usize>,
}

impl PackageStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `package` unless its import path is already present.
    ///
    /// Returns `true` if the package was added.
    pub fn insert(&mut self, package: Package) -> bool {
        if self.index.contains_key(&package.import_path) {
            return false;
        }
        self.index
            .insert(package.import_path.clone(), self.packages.len());
        self.packages.push(package);
        true
    }

    /// Looks up a package by import path.
    pub fn get(&self, import_path: &str) -> Option<&Package> {
        self.index.get(import_path).map(|&i| &self.packages[i])
    }

    /// Checks if a package is stored.
    pub fn contains(&self, import_path: &str) -> bool {
        self.index.contains_key(import_path)
    }

    /// Iterates packages in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }

    /// Returns the number of stored packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Checks if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_first() {
        let mut store = PackageStore::new();
        assert!(store.insert(Package::new("a").with_imports(["b"])));
        assert!(!store.insert(Package::new("a")));
        assert_eq!(store.get("a").unwrap().imports, vec!["b"]);
    }

    #[test]
    fn test_iteration_order_is_insertion_order() {
        let mut store = PackageStore::new();
        for path in ["z", "a", "m"] {
            store.insert(Package::new(path));
        }
        let order: Vec<_> = store.iter().map(|p| p.import_path.as_str()).collect();
        assert_eq!(order, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_lookup_missing() {
        let store = PackageStore::new();
        assert!(store.is_empty());
        assert!(store.get("a").is_none());
        assert!(!store.contains("a"));
    }
}
