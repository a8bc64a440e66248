//! Shared types for package metadata.
//!
//! This module defines the package descriptor produced by every metadata
//! provider. Field names follow the JSON emitted by `go list -json`, so the
//! same struct deserializes straight from the toolchain output.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Metadata for a single resolved Go package.
///
/// Descriptors are created once by a provider and never mutated afterwards.
///
/// # Example
///
/// ```
/// use godepgraph::parser::types::Package;
///
/// let json = r#"{"ImportPath": "fmt", "Goroot": true, "Imports": ["io", "os"]}"#;
/// let pkg: Package = serde_json::from_str(json).unwrap();
/// assert!(pkg.is_standard_library());
/// assert_eq!(pkg.imports, vec!["io", "os"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Package {
    /// Canonical import path, the unique key of the package.
    pub import_path: String,

    /// Package name from the `package` clause.
    #[serde(default)]
    pub name: String,

    /// Directory holding the package sources.
    #[serde(default)]
    pub dir: Option<String>,

    /// True if the package lives under GOROOT.
    #[serde(default)]
    pub goroot: bool,

    /// Source files that `import "C"`.
    #[serde(default)]
    pub cgo_files: Vec<String>,

    /// Direct imports of the non-test sources.
    #[serde(default)]
    pub imports: Vec<String>,

    /// Imports of `_test.go` files in the same package.
    #[serde(default)]
    pub test_imports: Vec<String>,

    /// Imports of `_test.go` files in the external `_test` package.
    #[serde(default)]
    pub x_test_imports: Vec<String>,

    /// Load error reported by `go list -e`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PackageError>,
}

/// Error record embedded in `go list` output.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PackageError {
    /// Human-readable message.
    pub err: String,
}

impl Package {
    /// Creates a descriptor with no imports.
    pub fn new(import_path: impl Into<String>) -> Self {
        Self {
            import_path: import_path.into(),
            ..Self::default()
        }
    }

    /// Marks the package as part of the standard library.
    pub fn standard(mut self) -> Self {
        self.goroot = true;
        self
    }

    /// Sets the regular imports.
    pub fn with_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports = imports.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the in-package test imports.
    pub fn with_test_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.test_imports = imports.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the external test package imports.
    pub fn with_x_test_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.x_test_imports = imports.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the cgo source files.
    pub fn with_cgo_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cgo_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if the package belongs to the Go distribution.
    pub fn is_standard_library(&self) -> bool {
        self.goroot
    }

    /// Returns true if the package contains cgo sources.
    pub fn has_native_interop(&self) -> bool {
        !self.cgo_files.is_empty()
    }

    /// Returns the classification used for node styling.
    pub fn kind(&self) -> PackageKind {
        if self.is_standard_library() {
            PackageKind::Standard
        } else if self.has_native_interop() {
            PackageKind::Cgo
        } else {
            PackageKind::Regular
        }
    }

    /// Returns the effective direct imports of this package.
    ///
    /// Test imports are appended when `include_tests` is set. The result is
    /// deduplicated in first-seen order and never contains the package's own
    /// import path (an external test package importing the package under test).
    ///
    /// # Example
    ///
    /// ```
    /// use godepgraph::parser::types::Package;
    ///
    /// let pkg = Package::new("lib/a")
    ///     .with_imports(["fmt", "lib/b"])
    ///     .with_x_test_imports(["lib/a", "lib/b", "testing"]);
    ///
    /// assert_eq!(pkg.direct_imports(false), vec!["fmt", "lib/b"]);
    /// assert_eq!(pkg.direct_imports(true), vec!["fmt", "lib/b", "testing"]);
    /// ```
    pub fn direct_imports(&self, include_tests: bool) -> Vec<&str> {
        let mut all: Vec<&str> = self.imports.iter().map(String::as_str).collect();
        if include_tests {
            all.extend(self.test_imports.iter().map(String::as_str));
            all.extend(self.x_test_imports.iter().map(String::as_str));
        }

        let mut found = HashSet::new();
        all.into_iter()
            .filter(|imp| *imp != self.import_path)
            .filter(|imp| found.insert(*imp))
            .collect()
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.import_path, self.kind())
    }
}

/// Three-way package classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageKind {
    /// Part of the Go standard library.
    Standard,
    /// Uses cgo.
    Cgo,
    /// Everything else.
    Regular,
}

impl PackageKind {
    /// Returns the Graphviz fill color for this kind.
    pub fn color(&self) -> &'static str {
        match self {
            PackageKind::Standard => "palegreen",
            PackageKind::Cgo => "darkgoldenrod1",
            PackageKind::Regular => "paleturquoise",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PackageKind::Standard => "stdlib",
            PackageKind::Cgo => "cgo",
            PackageKind::Regular => "regular",
        };
        write!(f, "{}", s)
    }
}

/// Options passed to a provider for each lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadMode {
    /// Whether test import lists are wanted.
    pub include_tests: bool,
}
