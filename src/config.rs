//! Run configuration.

/// Options controlling resolution, filtering and rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphConfig {
    /// Exclude standard-library packages entirely.
    pub ignore_stdlib: bool,
    /// Explore the imports of standard-library packages.
    pub delve_goroot: bool,
    /// Import paths to exclude by exact match.
    pub ignored_packages: Vec<String>,
    /// Import path prefixes to exclude.
    pub ignored_prefixes: Vec<String>,
    /// If non-empty, only paths with one of these prefixes are kept.
    pub only_prefixes: Vec<String>,
    /// Build tags handed to the provider.
    pub build_tags: Vec<String>,
    /// Lay the graph out left to right.
    pub horizontal: bool,
    /// Follow test imports as well.
    pub include_tests: bool,
}

impl GraphConfig {
    /// Returns the subset of options the renderer needs.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            horizontal: self.horizontal,
            delve_goroot: self.delve_goroot,
            include_tests: self.include_tests,
        }
    }
}

/// Options for building and rendering the import graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit `rankdir="LR"`.
    pub horizontal: bool,
    /// Emit edges out of standard-library packages.
    pub delve_goroot: bool,
    /// Include test imports when deriving edges.
    pub include_tests: bool,
}

/// Splits a comma-separated option value.
///
/// Empty entries are dropped, so `""` yields nothing and `"a,,b"` yields
/// `["a", "b"]`. An empty prefix would otherwise match every path.
///
/// # Example
///
/// ```
/// use godepgraph::config::split_list;
///
/// assert_eq!(split_list("github.com/,golang.org/x/"), vec!["github.com/", "golang.org/x/"]);
/// assert!(split_list("").is_empty());
/// ```
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
