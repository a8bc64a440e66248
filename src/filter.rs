//! Package inclusion rules.
//!
//! [`PackageFilter`] decides whether a package appears in the graph. The same
//! predicate prunes subtrees during resolution and gates output at render time.

use std::collections::HashSet;

use crate::config::GraphConfig;
use crate::parser::Package;

/// The cgo pseudo-package. Never resolved, never rendered.
pub const CGO_PSEUDO_PACKAGE: &str = "C";

/// Combined denylist/allowlist predicate over packages.
///
/// # Example
///
/// ```
/// use godepgraph::config::GraphConfig;
/// use godepgraph::filter::PackageFilter;
/// use godepgraph::parser::Package;
///
/// let config = GraphConfig {
///     only_prefixes: vec!["foo/".to_string()],
///     ..GraphConfig::default()
/// };
/// let filter = PackageFilter::from_config(&config);
///
/// assert!(filter.is_excluded(&Package::new("bar/baz")));
/// assert!(!filter.is_excluded(&Package::new("foo/bar")));
/// ```
#[derive(Debug, Clone)]
pub struct PackageFilter {
    ignored: HashSet<String>,
    ignored_prefixes: Vec<String>,
    only_prefixes: Vec<String>,
    ignore_stdlib: bool,
}

impl Default for PackageFilter {
    fn default() -> Self {
        Self::from_config(&GraphConfig::default())
    }
}

impl PackageFilter {
    /// Builds the filter from run configuration.
    pub fn from_config(config: &GraphConfig) -> Self {
        let mut ignored: HashSet<String> = config.ignored_packages.iter().cloned().collect();
        ignored.insert(CGO_PSEUDO_PACKAGE.to_string());

        Self {
            ignored,
            ignored_prefixes: config.ignored_prefixes.clone(),
            only_prefixes: config.only_prefixes.clone(),
            ignore_stdlib: config.ignore_stdlib,
        }
    }

    /// Returns true if `import_path` is on the exact-match denylist.
    ///
    /// The resolver checks this before asking the provider.
    pub fn is_denylisted(&self, import_path: &str) -> bool {
        self.ignored.contains(import_path)
    }

    /// Returns true if the package must not appear in the graph.
    ///
    /// A configured allowlist is checked first and overrides everything else.
    pub fn is_excluded(&self, package: &Package) -> bool {
        let path = package.import_path.as_str();

        if !self.only_prefixes.is_empty() && !has_prefix(path, &self.only_prefixes) {
            return true;
        }

        self.is_denylisted(path)
            || (package.is_standard_library() && self.ignore_stdlib)
            || has_prefix(path, &self.ignored_prefixes)
    }
}

fn has_prefix(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| path.starts_with(p.as_str()))
}
