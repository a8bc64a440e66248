//! Import extraction from Go source files using tree-sitter.

use std::fs;
use std::path::Path;

use tree_sitter::{Node, Parser};

use crate::parser::{ProviderError, ProviderResult};

/// The parts of a Go file header that matter for dependency analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoFile {
    /// Name from the `package` clause.
    pub package_name: String,
    /// Import paths in declaration order.
    pub imports: Vec<String>,
}

impl GoFile {
    /// Returns true if the file uses cgo.
    pub fn imports_c(&self) -> bool {
        self.imports.iter().any(|i| i == "C")
    }
}

/// Parses Go sources and extracts their package clause and imports.
pub struct GoFileAnalyzer {
    parser: Parser,
}

impl GoFileAnalyzer {
    /// Creates an analyzer with the Go grammar loaded.
    pub fn new() -> ProviderResult<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|_| ProviderError::LanguageInit)?;
        Ok(Self { parser })
    }

    /// Reads and analyzes a file.
    pub fn analyze_file(&mut self, path: &Path) -> ProviderResult<GoFile> {
        let content = fs::read_to_string(path)?;
        self.analyze_source(&content, path)
    }

    /// Analyzes source text. `path` is only used in errors.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::Path;
    /// use godepgraph::analysis::imports::GoFileAnalyzer;
    ///
    /// let src = "package web\n\nimport (\n\t\"fmt\"\n\th \"net/http\"\n)\n";
    /// let mut analyzer = GoFileAnalyzer::new().unwrap();
    /// let file = analyzer.analyze_source(src, Path::new("web.go")).unwrap();
    ///
    /// assert_eq!(file.package_name, "web");
    /// assert_eq!(file.imports, vec!["fmt", "net/http"]);
    /// ```
    pub fn analyze_source(&mut self, source: &str, path: &Path) -> ProviderResult<GoFile> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ProviderError::Syntax {
                path: path.to_path_buf(),
            })?;

        let root = tree.root_node();
        let mut file = GoFile::default();
        let mut cursor = root.walk();

        for child in root.children(&mut cursor) {
            match child.kind() {
                "package_clause" => {
                    if let Some(name) = package_name(&child, source) {
                        file.package_name = name.to_string();
                    }
                }
                "import_declaration" => collect_imports(&child, source, &mut file.imports),
                _ => {}
            }
        }

        if file.package_name.is_empty() {
            return Err(ProviderError::Syntax {
                path: path.to_path_buf(),
            });
        }
        Ok(file)
    }
}

fn package_name<'a>(node: &Node, source: &'a str) -> Option<&'a str> {
    let mut cursor = node.walk();
    let ident = node
        .children(&mut cursor)
        .find(|c| c.kind() == "package_identifier")?;
    node_text(&ident, source)
}

/// Collects paths from an `import_declaration`, descending into spec lists.
fn collect_imports(node: &Node, source: &str, imports: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_spec" => {
                if let Some(path) = child
                    .child_by_field_name("path")
                    .and_then(|p| string_value(&p, source))
                {
                    imports.push(path);
                }
            }
            "import_spec_list" => collect_imports(&child, source, imports),
            _ => {}
        }
    }
}

fn node_text<'a>(node: &Node, source: &'a str) -> Option<&'a str> {
    source.get(node.start_byte()..node.end_byte())
}

/// Extracts a string literal's value (removes quotes).
fn string_value(node: &Node, source: &str) -> Option<String> {
    let text = node_text(node, source)?;
    let trimmed = text.trim_matches(['"', '`']);
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}
