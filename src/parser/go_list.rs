//! Provider backed by the Go toolchain.
//!
//! Runs `go list -json` for each requested import path and deserializes the
//! resulting package record.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, trace};

use super::provider::{PackageSource, ProviderError, ProviderResult};
use super::types::{LoadMode, Package};

/// Loads package metadata by invoking `go list`.
#[derive(Debug, Clone)]
pub struct GoListProvider {
    binary: PathBuf,
    build_tags: Vec<String>,
}

impl Default for GoListProvider {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl GoListProvider {
    /// Creates a provider that calls `go` from `PATH`.
    pub fn new(build_tags: Vec<String>) -> Self {
        Self {
            binary: PathBuf::from("go"),
            build_tags,
        }
    }

    /// Uses a specific `go` executable.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Returns the arguments passed to `go` for `import_path`.
    pub fn args(&self, import_path: &str) -> Vec<String> {
        let mut args = vec!["list".to_string(), "-json".to_string()];
        if !self.build_tags.is_empty() {
            args.push(format!("-tags={}", self.build_tags.join(",")));
        }
        args.push("--".to_string());
        args.push(import_path.to_string());
        args
    }
}

impl PackageSource for GoListProvider {
    fn load(&self, root: &Path, import_path: &str, _mode: LoadMode) -> ProviderResult<Package> {
        let args = self.args(import_path);
        debug!(
            binary = %self.binary.display(),
            root = %root.display(),
            import_path,
            "Running go list"
        );

        let output = Command::new(&self.binary)
            .args(&args)
            .current_dir(root)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ProviderError::Command { stderr });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        trace!(bytes = stdout.len(), "go list output received");
        parse_str(&stdout)
    }
}

/// Parses a single `go list -json` record.
///
/// # Example
///
/// ```
/// use godepgraph::parser::go_list::parse_str;
///
/// let pkg = parse_str(r#"{"ImportPath": "os", "Goroot": true}"#).unwrap();
/// assert_eq!(pkg.import_path, "os");
/// ```
pub fn parse_str(content: &str) -> ProviderResult<Package> {
    let pkg: Package = serde_json::from_str(content)?;
    if let Some(error) = &pkg.error {
        return Err(ProviderError::Package(error.err.clone()));
    }
    Ok(pkg)
}
