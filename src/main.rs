use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use godepgraph::analysis::SourceTreeProvider;
use godepgraph::config::{split_list, GraphConfig};
use godepgraph::parser::{GoListProvider, PackageSource};

#[derive(Parser)]
#[command(name = "godepgraph")]
#[command(version)]
#[command(about = "Print the import graph of a Go package in Graphviz DOT format", long_about = None)]
struct Cli {
    /// Import path of the package to graph
    #[arg(value_name = "PACKAGE")]
    packages: Vec<String>,

    /// Ignore packages in the Go standard library
    #[arg(short = 's')]
    ignore_stdlib: bool,

    /// Show dependencies of packages in the Go standard library
    #[arg(short = 'd')]
    delve_goroot: bool,

    /// A comma-separated list of prefixes to ignore
    #[arg(short = 'p', value_name = "PREFIXES", default_value = "")]
    ignore_prefixes: String,

    /// A comma-separated list of packages to ignore
    #[arg(short = 'i', value_name = "PACKAGES", default_value = "")]
    ignore_packages: String,

    /// A comma-separated list of prefixes to include
    #[arg(short = 'o', value_name = "PREFIXES", default_value = "")]
    only_prefixes: String,

    /// A comma-separated list of build tags to consider satisfied during the build
    #[arg(long, value_name = "TAGS", default_value = "")]
    tags: String,

    /// Lay out the dependency graph horizontally instead of vertically
    #[arg(long)]
    horizontal: bool,

    /// Include test packages
    #[arg(short = 't')]
    include_tests: bool,

    /// Where package metadata comes from
    #[arg(long, value_enum, default_value_t = ProviderKind::GoList)]
    provider: ProviderKind,

    /// GOROOT for the source provider (defaults to $GOROOT)
    #[arg(long)]
    goroot: Option<PathBuf>,

    /// GOPATH for the source provider (defaults to $GOPATH, then $HOME/go)
    #[arg(long)]
    gopath: Option<String>,

    /// Verbose logging on stderr (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderKind {
    /// Ask the Go toolchain (`go list -json`)
    GoList,
    /// Parse Go sources under GOROOT, the module and GOPATH
    Source,
}

impl Cli {
    fn config(&self) -> GraphConfig {
        GraphConfig {
            ignore_stdlib: self.ignore_stdlib,
            delve_goroot: self.delve_goroot,
            ignored_packages: split_list(&self.ignore_packages),
            ignored_prefixes: split_list(&self.ignore_prefixes),
            only_prefixes: split_list(&self.only_prefixes),
            build_tags: split_list(&self.tags),
            horizontal: self.horizontal,
            include_tests: self.include_tests,
        }
    }

    fn source(&self, config: &GraphConfig) -> Box<dyn PackageSource> {
        match self.provider {
            ProviderKind::GoList => Box::new(GoListProvider::new(config.build_tags.clone())),
            ProviderKind::Source => Box::new(SourceTreeProvider::from_env(
                config.build_tags.clone(),
                self.goroot.clone(),
                self.gopath.clone(),
            )),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let package = godepgraph::single_package(&cli.packages)?;

    let config = cli.config();
    let source = cli.source(&config);
    let cwd = env::current_dir().context("failed to get cwd")?;

    let dot = godepgraph::generate(&*source, &cwd, package, config)?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(dot.as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write graph")?;
    Ok(())
}
