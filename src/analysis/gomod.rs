//! Minimal `go.mod` reading for module-aware lookups.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::parser::ProviderResult;

/// The parts of a `go.mod` file used to map import paths to directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoModule {
    /// Module path from the `module` directive.
    pub path: String,
    /// Directory containing `go.mod`.
    pub dir: PathBuf,
    /// `require` entries as (module path, version).
    pub requires: Vec<(String, String)>,
}

impl GoModule {
    /// Finds the `go.mod` governing `start`, searching parent directories.
    pub fn find(start: &Path) -> ProviderResult<Option<Self>> {
        for dir in start.ancestors() {
            let manifest = dir.join("go.mod");
            if manifest.is_file() {
                let content = fs::read_to_string(&manifest)?;
                let module = Self::parse(&content, dir);
                debug!(
                    manifest = %manifest.display(),
                    module = ?module.as_ref().map(|m| m.path.as_str()),
                    "Found go.mod"
                );
                return Ok(module);
            }
        }
        Ok(None)
    }

    /// Parses `go.mod` text. Returns `None` without a `module` directive.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::Path;
    /// use godepgraph::analysis::gomod::GoModule;
    ///
    /// let text = "module example.com/app\n\nrequire github.com/pkg/errors v0.9.1\n";
    /// let module = GoModule::parse(text, Path::new("/src/app")).unwrap();
    /// assert_eq!(module.path, "example.com/app");
    /// assert_eq!(module.requires[0].1, "v0.9.1");
    /// ```
    pub fn parse(content: &str, dir: &Path) -> Option<Self> {
        let mut path = None;
        let mut requires = Vec::new();
        let mut in_require_block = false;

        for raw in content.lines() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }

            if in_require_block {
                if line == ")" {
                    in_require_block = false;
                } else if let Some(req) = parse_requirement(line) {
                    requires.push(req);
                }
                continue;
            }

            let mut words = line.split_whitespace();
            match words.next() {
                Some("module") => path = words.next().map(unquote),
                Some("require") => {
                    let rest = line["require".len()..].trim();
                    if rest == "(" {
                        in_require_block = true;
                    } else if let Some(req) = parse_requirement(rest) {
                        requires.push(req);
                    }
                }
                _ => {}
            }
        }

        Some(Self {
            path: path?,
            dir: dir.to_path_buf(),
            requires,
        })
    }

    /// Maps an import path inside this module to its directory.
    pub fn local_dir(&self, import_path: &str) -> Option<PathBuf> {
        if import_path == self.path {
            return Some(self.dir.clone());
        }
        let rest = import_path.strip_prefix(&self.path)?.strip_prefix('/')?;
        Some(self.dir.join(rest))
    }

    /// Returns the required module providing `import_path` (longest match).
    pub fn requirement_for<'a>(&'a self, import_path: &'a str) -> Option<(&'a str, &'a str, &'a str)> {
        self.requires
            .iter()
            .filter_map(|(module, version)| {
                let rest = if import_path == module {
                    ""
                } else {
                    import_path.strip_prefix(module.as_str())?.strip_prefix('/')?
                };
                Some((module.as_str(), version.as_str(), rest))
            })
            .max_by_key(|(module, _, _)| module.len())
    }
}

/// Escapes a module path for the module cache: upper case `X` becomes `!x`.
pub fn escape_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

fn parse_requirement(line: &str) -> Option<(String, String)> {
    let mut words = line.split_whitespace();
    let module = unquote(words.next()?);
    let version = words.next()?.to_string();
    Some((module, version))
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn unquote(word: &str) -> String {
    word.trim_matches('"').to_string()
}
