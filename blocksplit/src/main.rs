//! Main binary entry point for the `blocksplit` analysis tool.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use blocksplit::analyzer;
use blocksplit::ast;
use blocksplit::cfg::FlowGraph;
use blocksplit::config::Config;
use blocksplit::output;

/// Command line interface configuration using `clap`.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "blocksplit - control-flow based block boundary extraction for C-family sources",
    long_about = None
)]
struct Cli {
    /// Paths to analyze (files or directories).
    /// When no paths are provided, defaults to the current directory.
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Output raw JSON instead of styled tables.
    #[arg(long)]
    json: bool,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Disable the degraded fallback for functions whose graph build fails.
    #[arg(long)]
    no_fallback: bool,

    /// Emit one Graphviz DOT graph per function instead of split lines.
    /// Only valid with explicit file arguments.
    #[arg(long)]
    dot: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let start = cli
        .paths
        .first()
        .map_or_else(|| Path::new("."), PathBuf::as_path);
    let mut config = Config::load_from_path(start);
    if cli.no_fallback {
        config.analysis.fallback = Some(false);
    }

    let mut buffer = Vec::new();
    if cli.dot {
        print_dot_graphs(&mut buffer, &cli.paths)?;
    } else {
        let reports = analyzer::analyze_paths(&cli.paths, &config)?;
        if cli.json {
            output::print_json(&mut buffer, &reports)?;
        } else {
            output::print_reports(&mut buffer, &reports)?;
        }
    }

    match cli.output {
        Some(path) => fs::write(&path, &buffer)
            .with_context(|| format!("failed to write output to {}", path.display()))?,
        None => std::io::stdout().write_all(&buffer)?,
    }
    Ok(())
}

fn print_dot_graphs(writer: &mut impl Write, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        for func in ast::parse_functions(&source)? {
            let graph = FlowGraph::from_function(&func)?;
            writeln!(writer, "// {}: {}", path.display(), graph.name)?;
            writeln!(writer, "{}", graph.to_dot())?;
        }
    }
    Ok(())
}
