//! yangc: command-line driver for the YANG compiler.
//!
//! Parses and resolves a set of YANG modules, printing
//! `path:line:col: message` for every error and exiting non-zero on
//! failure.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;
use yangc_core::compile_files;
use yangc_core::resolver::ResolvedTree;
use yangc_core::schema::{NodeId, NodeKind};
use yangc_core::source::{CompileOptions, RevisionPolicy};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RevisionPolicyArg {
    /// A pinned import revision must exist on disk.
    Strict,
    /// Fall back to the newest available revision.
    Latest,
}

impl From<RevisionPolicyArg> for RevisionPolicy {
    fn from(arg: RevisionPolicyArg) -> Self {
        match arg {
            RevisionPolicyArg::Strict => RevisionPolicy::Strict,
            RevisionPolicyArg::Latest => RevisionPolicy::Latest,
        }
    }
}

/// YANG compiler front-end.
#[derive(Debug, Parser)]
#[command(name = "yangc", version, about)]
struct Cli {
    /// YANG module files to compile.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory to search for imported modules (repeatable).
    #[arg(short = 'I', long = "search-dir", value_name = "DIR")]
    search_dirs: Vec<PathBuf>,

    /// Revision selection for imports that pin a revision-date.
    #[arg(long, value_enum, default_value = "strict")]
    revision_policy: RevisionPolicyArg,

    /// Increase log verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dump the resolved schema tree to stdout.
    #[arg(long)]
    dump_tree: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let options = CompileOptions {
        search_dirs: cli.search_dirs.clone(),
        revision_policy: cli.revision_policy.into(),
    };

    match compile_files(&cli.files, &options) {
        Ok(resolved) => {
            for &module in resolved.modules() {
                info!(
                    module = resolved.tree().name(module),
                    namespace = resolved
                        .module_namespace(module)
                        .map_or("", |ns| resolved.tree().get_str(ns)),
                    "compiled"
                );
            }
            if cli.dump_tree {
                for &module in resolved.modules() {
                    dump(&resolved, module, 0);
                }
            }
            ExitCode::SUCCESS
        }
        Err(errors) => {
            for error in &errors.errors {
                eprintln!("{error}");
            }
            eprintln!("compilation failed with {} error(s)", errors.len());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Print one node and its subtree, indented, skipping grouping templates.
fn dump(resolved: &ResolvedTree, node: NodeId, depth: usize) {
    let tree = resolved.tree();
    if tree[node].kind == NodeKind::Grouping {
        return;
    }
    let indent = "  ".repeat(depth);
    let kind = tree[node].kind.keyword();
    let name = tree.name(node);
    match tree[node].namespace {
        Some(ns) => println!("{indent}{kind} {name} [{}]", tree.get_str(ns)),
        None => println!("{indent}{kind} {name}"),
    }
    for child in tree.children(node) {
        dump(resolved, child, depth + 1);
    }
}
