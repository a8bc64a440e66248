//! The package-metadata provider seam.
//!
//! The resolver never touches the filesystem itself. It asks a
//! [`PackageSource`] for each import path and treats any failure as fatal.

use std::path::{Path, PathBuf};

use super::types::{LoadMode, Package};

/// Errors that can occur while loading package metadata.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Failed to read from disk or spawn a process.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse provider JSON output.
    #[error("failed to parse package metadata: {0}")]
    Json(#[from] serde_json::Error),

    /// `go list` exited unsuccessfully.
    #[error("{stderr}")]
    Command { stderr: String },

    /// The metadata itself carries a load error.
    #[error("{0}")]
    Package(String),

    /// No directory matches the import path.
    #[error("cannot find package \"{import_path}\" in any of:\n{}", format_searched(.searched))]
    NotFound {
        import_path: String,
        searched: Vec<PathBuf>,
    },

    /// The directory exists but has no buildable Go files.
    #[error("no buildable Go source files in {}", .dir.display())]
    NoGoFiles { dir: PathBuf },

    /// Source files in one directory declare different packages.
    #[error("found packages {first} ({first_file}) and {second} ({second_file}) in {}", .dir.display())]
    MultiplePackages {
        dir: PathBuf,
        first: String,
        first_file: String,
        second: String,
        second_file: String,
    },

    /// A Go source file could not be parsed.
    #[error("failed to parse {}", .path.display())]
    Syntax { path: PathBuf },

    /// Tree-sitter could not load the Go grammar.
    #[error("tree-sitter Go language initialization failed")]
    LanguageInit,
}

fn format_searched(searched: &[PathBuf]) -> String {
    searched
        .iter()
        .map(|p| format!("\t{}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A source of package metadata.
///
/// Given a search root and an import path, returns the package descriptor or
/// a descriptive error. Implementations must not cache across runs; the
/// resolver already guarantees each path is requested at most once.
pub trait PackageSource {
    /// Loads metadata for `import_path` as seen from `root`.
    fn load(&self, root: &Path, import_path: &str, mode: LoadMode) -> ProviderResult<Package>;
}

impl<T: PackageSource + ?Sized> PackageSource for &T {
    fn load(&self, root: &Path, import_path: &str, mode: LoadMode) -> ProviderResult<Package> {
        (**self).load(root, import_path, mode)
    }
}

impl<T: PackageSource + ?Sized> PackageSource for Box<T> {
    fn load(&self, root: &Path, import_path: &str, mode: LoadMode) -> ProviderResult<Package> {
        (**self).load(root, import_path, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_lists_search_paths() {
        let err = ProviderError::NotFound {
            import_path: "lib/x".to_string(),
            searched: vec![
                PathBuf::from("/goroot/src/lib/x"),
                PathBuf::from("/gopath/src/lib/x"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "cannot find package \"lib/x\" in any of:\n\t/goroot/src/lib/x\n\t/gopath/src/lib/x"
        );
    }

    #[test]
    fn test_command_error_is_verbatim() {
        let err = ProviderError::Command {
            stderr: "package nope is not in std".to_string(),
        };
        assert_eq!(err.to_string(), "package nope is not in std");
    }
}
