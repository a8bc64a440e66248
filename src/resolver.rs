//! Depth-first import resolution.
//!
//! [`Resolver`] walks the import graph from a root package, asking a
//! [`PackageSource`] for each newly seen import path and recording the
//! results in the run's [`PackageStore`]. Traversal uses an explicit stack,
//! visiting packages in the same pre-order a recursive descent would.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, trace};

use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::filter::PackageFilter;
use crate::graph::{IdAllocator, PackageStore};
use crate::parser::{LoadMode, PackageSource};

/// All mutable state of a single run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Options for this run.
    pub config: GraphConfig,
    /// Inclusion rules derived from `config`.
    pub filter: PackageFilter,
    /// Resolved packages.
    pub store: PackageStore,
    /// Node IDs handed out so far.
    pub ids: IdAllocator,
    /// Requested paths that were loaded and filtered out.
    pruned: HashSet<String>,
    /// Requested paths that were loaded and stored.
    visited: HashSet<String>,
}

impl RunContext {
    /// Creates an empty context for `config`.
    pub fn new(config: GraphConfig) -> Self {
        Self {
            filter: PackageFilter::from_config(&config),
            config,
            store: PackageStore::new(),
            ids: IdAllocator::new(),
            pruned: HashSet::new(),
            visited: HashSet::new(),
        }
    }
}

/// Result of a single resolution step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// On the exact-match denylist; the provider was not asked.
    Denylisted,
    /// Seen earlier in this run.
    AlreadyResolved,
    /// Loaded but filtered out; its imports are not explored.
    Excluded,
    /// Loaded and stored under its canonical path.
    Stored {
        import_path: String,
        /// Whether its imports get explored.
        expanded: bool,
    },
}

/// Counts of step outcomes for one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    pub stored: usize,
    pub excluded: usize,
    pub denylisted: usize,
    pub already_resolved: usize,
}

impl ResolveSummary {
    fn record(&mut self, outcome: &ResolveOutcome) {
        match outcome {
            ResolveOutcome::Denylisted => self.denylisted += 1,
            ResolveOutcome::AlreadyResolved => self.already_resolved += 1,
            ResolveOutcome::Excluded => self.excluded += 1,
            ResolveOutcome::Stored { .. } => self.stored += 1,
        }
    }
}

/// Resolves packages relative to one search root.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use godepgraph::config::GraphConfig;
/// use godepgraph::parser::{InMemorySource, Package};
/// use godepgraph::resolver::{Resolver, RunContext};
///
/// let source = InMemorySource::new()
///     .with_package(Package::new("app").with_imports(["lib/a", "lib/b"]))
///     .with_package(Package::new("lib/a").with_imports(["lib/b"]))
///     .with_package(Package::new("lib/b"));
///
/// let mut ctx = RunContext::new(GraphConfig::default());
/// Resolver::new(&source, Path::new(".")).resolve(&mut ctx, "app").unwrap();
///
/// assert_eq!(ctx.store.len(), 3);
/// assert_eq!(source.load_count(), 3);
/// ```
pub struct Resolver<'a, S: PackageSource + ?Sized> {
    source: &'a S,
    root: &'a Path,
}

impl<'a, S: PackageSource + ?Sized> Resolver<'a, S> {
    /// Creates a resolver querying `source` from `root`.
    pub fn new(source: &'a S, root: &'a Path) -> Self {
        Self { source, root }
    }

    /// Loads `import_path` and everything it transitively imports.
    ///
    /// Stops at the first provider failure.
    pub fn resolve(&self, ctx: &mut RunContext, import_path: &str) -> Result<ResolveSummary> {
        let mut summary = ResolveSummary::default();
        let mut stack = vec![import_path.to_string()];

        while let Some(path) = stack.pop() {
            let outcome = self.step(ctx, &path)?;
            summary.record(&outcome);

            if let ResolveOutcome::Stored {
                import_path: stored,
                expanded: true,
            } = &outcome
            {
                if let Some(package) = ctx.store.get(stored) {
                    let imports = package.direct_imports(ctx.config.include_tests);
                    stack.extend(imports.into_iter().rev().map(String::from));
                }
            }
        }

        debug!(
            root = import_path,
            stored = summary.stored,
            excluded = summary.excluded,
            "Resolution finished"
        );
        Ok(summary)
    }

    /// Resolves a single path without following its imports.
    pub fn step(&self, ctx: &mut RunContext, import_path: &str) -> Result<ResolveOutcome> {
        if ctx.filter.is_denylisted(import_path) {
            trace!(import_path, "Skipping denylisted package");
            return Ok(ResolveOutcome::Denylisted);
        }
        if ctx.store.contains(import_path) || ctx.visited.contains(import_path) {
            return Ok(ResolveOutcome::AlreadyResolved);
        }
        if ctx.pruned.contains(import_path) {
            return Ok(ResolveOutcome::Excluded);
        }

        let mode = LoadMode {
            include_tests: ctx.config.include_tests,
        };
        let package = self
            .source
            .load(self.root, import_path, mode)
            .map_err(|e| Error::resolution(import_path, e))?;

        if ctx.filter.is_excluded(&package) {
            debug!(import_path, "Package excluded by filter");
            ctx.pruned.insert(import_path.to_string());
            return Ok(ResolveOutcome::Excluded);
        }

        let expanded = !package.is_standard_library() || ctx.config.delve_goroot;
        let canonical = package.import_path.clone();
        trace!(
            import_path,
            package = %package,
            imports = package.imports.len(),
            expanded,
            "Storing package"
        );

        ctx.visited.insert(import_path.to_string());
        if !ctx.store.insert(package) {
            // Reached under a different requested path.
            return Ok(ResolveOutcome::AlreadyResolved);
        }

        Ok(ResolveOutcome::Stored {
            import_path: canonical,
            expanded,
        })
    }
}
