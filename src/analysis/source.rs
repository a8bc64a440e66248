//! Provider that reads Go source trees directly.
//!
//! Import paths are located under GOROOT, the enclosing Go module (its own
//! packages, its `vendor` directory and required modules in the module
//! cache) and GOPATH. Each package directory's `.go` files are filtered by
//! build constraints and parsed with tree-sitter for their imports.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use super::constraint::BuildContext;
use super::gomod::{escape_module_path, GoModule};
use super::imports::GoFileAnalyzer;
use crate::parser::{LoadMode, Package, PackageSource, ProviderError, ProviderResult};

/// Default GOROOT when neither the CLI nor the environment sets one.
pub const DEFAULT_GOROOT: &str = "/usr/local/go";

/// Where an import path was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Package directory.
    pub dir: PathBuf,
    /// Import path to record for the package.
    pub import_path: String,
    /// True if the directory is inside GOROOT.
    pub goroot: bool,
}

/// Loads package metadata by parsing Go sources.
#[derive(Debug)]
pub struct SourceTreeProvider {
    goroot: PathBuf,
    gopath: Vec<PathBuf>,
    mod_cache: Option<PathBuf>,
    context: BuildContext,
    modules: RefCell<HashMap<PathBuf, Option<GoModule>>>,
}

impl SourceTreeProvider {
    /// Creates a provider over explicit GOROOT and GOPATH entries.
    ///
    /// The module cache defaults to `pkg/mod` under the first GOPATH entry.
    pub fn new(goroot: impl Into<PathBuf>, gopath: Vec<PathBuf>, context: BuildContext) -> Self {
        let mod_cache = gopath.first().map(|p| p.join("pkg").join("mod"));
        Self {
            goroot: goroot.into(),
            gopath,
            mod_cache,
            context,
            modules: RefCell::new(HashMap::new()),
        }
    }

    /// Creates a provider from `GOROOT`, `GOPATH` and `GOMODCACHE`.
    ///
    /// Explicit values take precedence over the environment. GOPATH
    /// defaults to `$HOME/go`.
    pub fn from_env(
        build_tags: Vec<String>,
        goroot: Option<PathBuf>,
        gopath: Option<String>,
    ) -> Self {
        let goroot = goroot
            .or_else(|| env::var_os("GOROOT").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GOROOT));

        let gopath: Vec<PathBuf> = match gopath.or_else(|| env::var("GOPATH").ok()) {
            Some(value) => env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect(),
            None => env::var_os("HOME")
                .map(|home| vec![PathBuf::from(home).join("go")])
                .unwrap_or_default(),
        };

        let mut provider = Self::new(goroot, gopath, BuildContext::from_env(build_tags));
        if let Some(cache) = env::var_os("GOMODCACHE") {
            provider.mod_cache = Some(PathBuf::from(cache));
        }
        provider
    }

    /// Overrides the module cache directory.
    pub fn with_mod_cache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.mod_cache = Some(dir.into());
        self
    }

    /// Finds the directory for `import_path` as seen from `root`.
    pub fn locate(&self, root: &Path, import_path: &str) -> ProviderResult<Location> {
        let mut searched = Vec::new();

        if is_local_import(import_path) {
            let dir = root.join(import_path);
            if !dir.is_dir() {
                searched.push(dir);
                return Err(not_found(import_path, searched));
            }
            let (canonical, goroot) = self
                .import_path_for_dir(&dir)?
                .unwrap_or_else(|| (import_path.to_string(), false));
            return Ok(Location {
                dir,
                import_path: canonical,
                goroot,
            });
        }

        if is_standard_path(import_path) {
            let dir = self.goroot.join("src").join(import_path);
            if let Some(location) = found(dir, import_path, true, &mut searched) {
                return Ok(location);
            }
        }

        if let Some(module) = self.module_for(root)? {
            if let Some(dir) = module.local_dir(import_path) {
                if let Some(location) = found(dir, import_path, false, &mut searched) {
                    return Ok(location);
                }
            }

            let vendored = module.dir.join("vendor").join(import_path);
            if let Some(location) = found(vendored, import_path, false, &mut searched) {
                return Ok(location);
            }

            if let (Some(cache), Some((path, version, rest))) =
                (&self.mod_cache, module.requirement_for(import_path))
            {
                let dir = cache
                    .join(format!("{}@{}", escape_module_path(path), version))
                    .join(rest);
                if let Some(location) = found(dir, import_path, false, &mut searched) {
                    return Ok(location);
                }
            }
        }

        // Dependencies vendored into the standard library itself.
        let std_vendored = self.goroot.join("src").join("vendor").join(import_path);
        if let Some(location) = found(std_vendored, import_path, true, &mut searched) {
            return Ok(location);
        }

        for gopath in &self.gopath {
            let dir = gopath.join("src").join(import_path);
            if let Some(location) = found(dir, import_path, false, &mut searched) {
                return Ok(location);
            }
        }

        Err(not_found(import_path, searched))
    }

    /// Derives the import path of a directory from the GOROOT, module or
    /// GOPATH tree containing it. The flag is true inside GOROOT.
    fn import_path_for_dir(&self, dir: &Path) -> ProviderResult<Option<(String, bool)>> {
        let dir = fs::canonicalize(dir)?;

        let goroot_src = self.goroot.join("src");
        let goroot_src = fs::canonicalize(&goroot_src).unwrap_or(goroot_src);
        if let Some(rel) = relative_import_path(&dir, &goroot_src) {
            return Ok(Some((rel, true)));
        }

        if let Some(module) = self.module_for(&dir)? {
            if let Ok(rel) = dir.strip_prefix(&module.dir) {
                let rel = slash_path(rel);
                let path = if rel.is_empty() {
                    module.path.clone()
                } else {
                    format!("{}/{}", module.path, rel)
                };
                return Ok(Some((path, false)));
            }
        }

        for gopath in &self.gopath {
            let src = gopath.join("src");
            let src = fs::canonicalize(&src).unwrap_or(src);
            if let Some(rel) = relative_import_path(&dir, &src) {
                return Ok(Some((rel, false)));
            }
        }

        Ok(None)
    }

    fn module_for(&self, root: &Path) -> ProviderResult<Option<GoModule>> {
        if let Some(cached) = self.modules.borrow().get(root) {
            return Ok(cached.clone());
        }
        let module = GoModule::find(root)?;
        self.modules
            .borrow_mut()
            .insert(root.to_path_buf(), module.clone());
        Ok(module)
    }

    /// Reads one package directory.
    pub fn read_package(&self, location: Location, mode: LoadMode) -> ProviderResult<Package> {
        let mut analyzer = GoFileAnalyzer::new()?;
        let mut package_name: Option<(String, String)> = None;
        let mut imports = BTreeSet::new();
        let mut test_imports = BTreeSet::new();
        let mut x_test_imports = BTreeSet::new();
        let mut cgo_files = Vec::new();
        let mut buildable = 0usize;

        for path in list_go_files(&location.dir)? {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let is_test = file_name.ends_with("_test.go");

            if is_test && !mode.include_tests {
                continue;
            }
            if !self.context.matches_file_name(&file_name) {
                trace!(file = %file_name, "Excluded by file name constraint");
                continue;
            }

            let source = fs::read_to_string(&path)?;
            match self.context.matches_source(&source) {
                Ok(true) => {}
                Ok(false) => {
                    trace!(file = %file_name, "Excluded by build constraint");
                    continue;
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Ignoring file with invalid build constraint");
                    continue;
                }
            }

            let file = analyzer.analyze_source(&source, &path)?;
            if file.package_name == "documentation" {
                continue;
            }
            if file.imports_c() && !self.context.cgo_enabled {
                continue;
            }

            let is_x_test = is_test && file.package_name.ends_with("_test");
            if !is_x_test {
                if let Some((name, first_file)) = &package_name {
                    if *name != file.package_name {
                        return Err(ProviderError::MultiplePackages {
                            dir: location.dir.clone(),
                            first: name.clone(),
                            first_file: first_file.clone(),
                            second: file.package_name.clone(),
                            second_file: file_name,
                        });
                    }
                }
                if package_name.is_none() {
                    package_name = Some((file.package_name.clone(), file_name.clone()));
                }
            }

            if is_x_test {
                x_test_imports.extend(file.imports);
            } else if is_test {
                test_imports.extend(file.imports);
            } else {
                if file.imports_c() {
                    cgo_files.push(file_name);
                }
                imports.extend(file.imports);
            }
            buildable += 1;
        }

        if buildable == 0 {
            return Err(ProviderError::NoGoFiles { dir: location.dir });
        }

        Ok(Package {
            import_path: location.import_path,
            name: package_name.map(|(name, _)| name).unwrap_or_default(),
            dir: Some(location.dir.display().to_string()),
            goroot: location.goroot,
            cgo_files,
            imports: imports.into_iter().collect(),
            test_imports: test_imports.into_iter().collect(),
            x_test_imports: x_test_imports.into_iter().collect(),
            error: None,
        })
    }
}

impl PackageSource for SourceTreeProvider {
    fn load(&self, root: &Path, import_path: &str, mode: LoadMode) -> ProviderResult<Package> {
        let location = self.locate(root, import_path)?;
        debug!(
            import_path,
            dir = %location.dir.display(),
            goroot = location.goroot,
            "Located package"
        );
        self.read_package(location, mode)
    }
}

fn found(
    dir: PathBuf,
    import_path: &str,
    goroot: bool,
    searched: &mut Vec<PathBuf>,
) -> Option<Location> {
    if dir.is_dir() {
        return Some(Location {
            dir,
            import_path: import_path.to_string(),
            goroot,
        });
    }
    searched.push(dir);
    None
}

fn not_found(import_path: &str, searched: Vec<PathBuf>) -> ProviderError {
    ProviderError::NotFound {
        import_path: import_path.to_string(),
        searched,
    }
}

/// Lists the candidate `.go` files of a package directory, sorted by name.
fn list_go_files(dir: &Path) -> ProviderResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let candidate = {
            let name = entry.file_name().to_string_lossy();
            !name.starts_with('_') && !name.starts_with('.') && name.ends_with(".go")
        };
        if !candidate {
            continue;
        }
        files.push(entry.into_path());
    }
    Ok(files)
}

/// Import path of `dir` below `base`, if `dir` is strictly inside it.
fn relative_import_path(dir: &Path, base: &Path) -> Option<String> {
    let rel = slash_path(dir.strip_prefix(base).ok()?);
    (!rel.is_empty()).then_some(rel)
}

fn slash_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_local_import(import_path: &str) -> bool {
    import_path == "."
        || import_path == ".."
        || import_path.starts_with("./")
        || import_path.starts_with("../")
}

/// Standard library paths have no dot in their first element.
fn is_standard_path(import_path: &str) -> bool {
    let first = import_path.split('/').next().unwrap_or(import_path);
    !first.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    struct Fixture {
        _tmp: TempDir,
        goroot: PathBuf,
        gopath: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let goroot = tmp.path().join("goroot");
            let gopath = tmp.path().join("gopath");

            write(&goroot, "src/fmt/print.go", "package fmt\n\nimport (\n\t\"io\"\n\t\"os\"\n)\n");
            write(&goroot, "src/fmt/format.go", "package fmt\n\nimport \"io\"\n");
            write(&goroot, "src/io/io.go", "package io\n");
            write(&goroot, "src/os/file.go", "package os\n");
            write(&goroot, "src/testing/testing.go", "package testing\n");
            write(
                &goroot,
                "src/vendor/golang.org/x/net/dns/dns.go",
                "package dns\n",
            );

            Self {
                _tmp: tmp,
                goroot,
                gopath,
            }
        }

        fn provider(&self) -> SourceTreeProvider {
            SourceTreeProvider::new(
                &self.goroot,
                vec![self.gopath.clone()],
                BuildContext::new("linux", "amd64", Vec::new()),
            )
        }

        fn app_dir(&self) -> PathBuf {
            self.gopath.join("src/example.com/app")
        }
    }

    #[test]
    fn test_locate_stdlib() {
        let fx = Fixture::new();
        let location = fx.provider().locate(&fx.gopath, "fmt").unwrap();
        assert!(location.goroot);
        assert_eq!(location.dir, fx.goroot.join("src/fmt"));
    }

    #[test]
    fn test_load_stdlib_merges_and_sorts_imports() {
        let fx = Fixture::new();
        let pkg = fx
            .provider()
            .load(&fx.gopath, "fmt", LoadMode::default())
            .unwrap();
        assert_eq!(pkg.import_path, "fmt");
        assert_eq!(pkg.name, "fmt");
        assert!(pkg.is_standard_library());
        assert_eq!(pkg.imports, vec!["io", "os"]);
    }

    #[test]
    fn test_gopath_package_with_constraints_and_tests() {
        let fx = Fixture::new();
        let app = fx.app_dir();
        write(&app, "main.go", "package main\n\nimport (\n\t\"fmt\"\n\t\"example.com/app/lib\"\n)\n");
        write(&app, "main_windows.go", "package main\n\nimport \"syscall\"\n");
        write(&app, "tagged.go", "//go:build integration\n\npackage main\n\nimport \"net\"\n");
        write(&app, "_scratch.go", "package scratch\n\nimport \"bogus\"\n");
        write(&app, "main_test.go", "package main\n\nimport \"testing\"\n");
        write(&app, "ext_test.go", "package main_test\n\nimport (\n\t\"example.com/app\"\n\t\"testing\"\n)\n");
        write(&fx.gopath, "src/example.com/app/lib/lib.go", "package lib\n");

        let provider = fx.provider();
        let pkg = provider
            .load(&app, "example.com/app", LoadMode { include_tests: true })
            .unwrap();

        assert!(!pkg.is_standard_library());
        assert_eq!(pkg.imports, vec!["example.com/app/lib", "fmt"]);
        assert_eq!(pkg.test_imports, vec!["testing"]);
        assert_eq!(pkg.x_test_imports, vec!["example.com/app", "testing"]);

        let pkg = provider
            .load(&app, "example.com/app", LoadMode::default())
            .unwrap();
        assert!(pkg.test_imports.is_empty());
        assert!(pkg.x_test_imports.is_empty());
    }

    #[test]
    fn test_user_build_tags() {
        let fx = Fixture::new();
        let app = fx.app_dir();
        write(&app, "main.go", "package main\n");
        write(&app, "tagged.go", "//go:build integration\n\npackage main\n\nimport \"net\"\n");

        let provider = SourceTreeProvider::new(
            &fx.goroot,
            vec![fx.gopath.clone()],
            BuildContext::new("linux", "amd64", vec!["integration".into()]),
        );
        let pkg = provider
            .load(&app, "example.com/app", LoadMode::default())
            .unwrap();
        assert_eq!(pkg.imports, vec!["net"]);
    }

    #[test]
    fn test_cgo_files() {
        let fx = Fixture::new();
        write(
            &fx.gopath,
            "src/example.com/sqlite/db.go",
            "package sqlite\n\n// #include <sqlite3.h>\nimport \"C\"\n",
        );
        write(&fx.gopath, "src/example.com/sqlite/util.go", "package sqlite\n");

        let pkg = fx
            .provider()
            .load(&fx.gopath, "example.com/sqlite", LoadMode::default())
            .unwrap();
        assert!(pkg.has_native_interop());
        assert_eq!(pkg.cgo_files, vec!["db.go"]);
        assert_eq!(pkg.imports, vec!["C"]);
    }

    #[test]
    fn test_module_lookup() {
        let fx = Fixture::new();
        let tmp = tempfile::tempdir().unwrap();
        let module = tmp.path().join("svc");
        write(
            &module,
            "go.mod",
            "module example.com/svc\n\nrequire github.com/Foo/bar v1.2.3\n",
        );
        write(&module, "main.go", "package main\n\nimport \"github.com/Foo/bar/baz\"\n");
        write(&module, "internal/db/db.go", "package db\n");
        write(&module, "vendor/example.org/v/v.go", "package v\n");

        let cache = tmp.path().join("modcache");
        write(&cache, "github.com/!foo/bar@v1.2.3/baz/baz.go", "package baz\n");

        let provider = fx.provider().with_mod_cache(&cache);

        let loc = provider.locate(&module, "example.com/svc/internal/db").unwrap();
        assert_eq!(loc.dir, module.join("internal/db"));

        let loc = provider.locate(&module, "example.org/v").unwrap();
        assert_eq!(loc.dir, module.join("vendor/example.org/v"));

        let loc = provider.locate(&module, "github.com/Foo/bar/baz").unwrap();
        assert_eq!(loc.dir, cache.join("github.com/!foo/bar@v1.2.3/baz"));
        assert!(!loc.goroot);
    }

    #[test]
    fn test_std_vendored_package() {
        let fx = Fixture::new();
        let loc = fx
            .provider()
            .locate(&fx.gopath, "golang.org/x/net/dns")
            .unwrap();
        assert!(loc.goroot);
        assert_eq!(loc.import_path, "golang.org/x/net/dns");
    }

    #[test]
    fn test_local_import() {
        let fx = Fixture::new();
        let app = fx.app_dir();
        write(&app, "util/util.go", "package util\n");

        let loc = fx.provider().locate(&app, "./util").unwrap();
        assert_eq!(loc.dir, app.join("./util"));
        assert_eq!(loc.import_path, "example.com/app/util");
        assert!(!loc.goroot);
    }

    #[test]
    fn test_local_import_outside_known_trees_keeps_path() {
        let fx = Fixture::new();
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "loose/loose.go", "package loose\n");

        let loc = fx.provider().locate(tmp.path(), "./loose").unwrap();
        assert_eq!(loc.import_path, "./loose");
    }

    #[test]
    fn test_local_import_in_goroot_is_standard() {
        let fx = Fixture::new();
        let loc = fx
            .provider()
            .locate(&fx.goroot.join("src/fmt"), "../io")
            .unwrap();
        assert_eq!(loc.import_path, "io");
        assert!(loc.goroot);
    }

    #[test]
    fn test_local_root_uses_module_path() {
        let fx = Fixture::new();
        let tmp = tempfile::tempdir().unwrap();
        let module = tmp.path().join("m");
        write(&module, "go.mod", "module example.com/m\n\ngo 1.22\n");
        write(&module, "m.go", "package m\n");
        write(&module, "sub/sub.go", "package sub\n");
        write(
            &module,
            "m_test.go",
            "package m_test\n\nimport (\n\t\"example.com/m\"\n\t\"testing\"\n)\n",
        );

        let provider = fx.provider();
        let loc = provider.locate(&module, "./sub").unwrap();
        assert_eq!(loc.import_path, "example.com/m/sub");

        let config = GraphConfig {
            include_tests: true,
            ..GraphConfig::default()
        };
        let dot = crate::generate(&provider, &module, ".", config).unwrap();
        let nodes: Vec<&str> = dot.lines().filter(|l| l.contains("[label=")).collect();
        assert_eq!(
            nodes,
            vec![
                "0 [label=\"example.com/m\" style=\"filled\" color=\"paleturquoise\"];",
                "1 [label=\"testing\" style=\"filled\" color=\"palegreen\"];",
            ]
        );
        let edges: Vec<&str> = dot.lines().filter(|l| l.contains("->")).collect();
        assert_eq!(edges, vec!["0 -> 1;"]);
    }

    #[test]
    fn test_legacy_build_ignore_generator_is_skipped() {
        let fx = Fixture::new();
        write(
            &fx.gopath,
            "src/example.com/atom/atom.go",
            "package atom\n\nimport \"io\"\n",
        );
        write(
            &fx.gopath,
            "src/example.com/atom/gen.go",
            "// +build ignore\n\npackage main\n\nimport \"os\"\n",
        );

        let pkg = fx
            .provider()
            .load(&fx.gopath, "example.com/atom", LoadMode::default())
            .unwrap();
        assert_eq!(pkg.name, "atom");
        assert_eq!(pkg.imports, vec!["io"]);
    }

    #[test]
    fn test_test_only_package() {
        let fx = Fixture::new();
        write(
            &fx.gopath,
            "src/example.com/e2e/flow_test.go",
            "package e2e\n\nimport \"testing\"\n",
        );

        let provider = fx.provider();
        let pkg = provider
            .load(&fx.gopath, "example.com/e2e", LoadMode { include_tests: true })
            .unwrap();
        assert!(pkg.imports.is_empty());
        assert_eq!(pkg.test_imports, vec!["testing"]);

        let err = provider
            .load(&fx.gopath, "example.com/e2e", LoadMode::default())
            .unwrap_err();
        assert!(matches!(err, ProviderError::NoGoFiles { .. }));
    }

    #[test]
    fn test_not_found_lists_searched_dirs() {
        let fx = Fixture::new();
        let err = fx
            .provider()
            .locate(&fx.gopath, "nosuchpkg")
            .unwrap_err();
        match err {
            ProviderError::NotFound {
                import_path,
                searched,
            } => {
                assert_eq!(import_path, "nosuchpkg");
                assert!(searched.contains(&fx.goroot.join("src/nosuchpkg")));
                assert!(searched.contains(&fx.gopath.join("src/nosuchpkg")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_no_buildable_files() {
        let fx = Fixture::new();
        write(&fx.gopath, "src/example.com/empty/only_windows.go", "package empty\n");
        write(&fx.gopath, "src/example.com/empty/README.md", "docs\n");

        let err = fx
            .provider()
            .load(&fx.gopath, "example.com/empty", LoadMode::default())
            .unwrap_err();
        assert!(matches!(err, ProviderError::NoGoFiles { .. }));
    }

    #[test]
    fn test_multiple_packages_in_directory() {
        let fx = Fixture::new();
        write(&fx.gopath, "src/example.com/mixed/a.go", "package a\n");
        write(&fx.gopath, "src/example.com/mixed/b.go", "package b\n");

        let err = fx
            .provider()
            .load(&fx.gopath, "example.com/mixed", LoadMode::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::MultiplePackages { ref first, ref second, .. } if first == "a" && second == "b"
        ));
    }

    #[test]
    fn test_standard_path_detection() {
        assert!(is_standard_path("fmt"));
        assert!(is_standard_path("net/http"));
        assert!(!is_standard_path("github.com/pkg/errors"));
        assert!(!is_standard_path("example.com"));
        assert!(is_local_import("./x"));
        assert!(is_local_import("../x"));
        assert!(!is_local_import(".hidden"));
    }
}
