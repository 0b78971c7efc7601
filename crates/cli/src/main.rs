use anyhow::Context;
use clap::{Parser, Subcommand};
use common::{AnalysisConfig, CliOverrides};
use oracle::{CallGraph, Session};
use scribe::{DirectorySink, MemorySink};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pdflow")]
#[command(about = "Personal-data flow reports from call-graph facts", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence when set).
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a fact stream unit by unit and write one report per unit with entry points.
    Analyze {
        /// NDJSON fact file (`.gz` is decompressed).
        facts: PathBuf,
        /// Report directory (overrides pdflow.toml and PDFLOW_OUTPUT_DIR).
        #[arg(long)]
        out: Option<PathBuf>,
        /// Explicit config file instead of ./pdflow.toml.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Package segments compared when deciding whether a missing method may still arrive.
        #[arg(long)]
        namespace_depth: Option<usize>,
        /// Write best-effort reports for entries still waiting at the end of the stream.
        #[arg(long)]
        emit_partial: bool,
    },
    /// Render every report in a directory into a single report.html.
    Visualize {
        /// Directory holding `<name>.json` reports.
        dir: PathBuf,
    },
    /// Print the registered call graph as Graphviz DOT.
    Graph {
        /// NDJSON fact file (`.gz` is decompressed).
        facts: PathBuf,
        /// Write DOT here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Explicit config file instead of ./pdflow.toml.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: .env: {}", e);
        }
    }

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    match &cli.command {
        Commands::Analyze {
            facts,
            out,
            config,
            namespace_depth,
            emit_partial,
        } => {
            let overrides = CliOverrides {
                output_dir: out.clone(),
                namespace_depth: *namespace_depth,
                emit_partial_on_finish: emit_partial.then_some(true),
            };
            cmd_analyze(&root, facts, config.as_deref(), &overrides)?
        }
        Commands::Visualize { dir } => cmd_visualize(dir)?,
        Commands::Graph {
            facts,
            output,
            config,
        } => cmd_graph(&root, facts, output.as_deref(), config.as_deref())?,
    }

    Ok(())
}

/// Logs go to stderr so that `graph` output on stdout stays clean.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

fn cmd_analyze(
    root: &Path,
    facts: &Path,
    config_path: Option<&Path>,
    overrides: &CliOverrides,
) -> anyhow::Result<()> {
    let config = AnalysisConfig::load(root, config_path, Some(overrides))
        .context("Failed to load configuration")?;
    let output_dir = config.output_dir.clone();

    let mut session = Session::new(config, DirectorySink::new(&output_dir));
    let delivery = courier::deliver_units(facts, |unit| {
        session.ingest(&unit);
    });
    // Unresolved entries are logged even when the stream broke off.
    let summary = session.finish();
    let delivery =
        delivery.with_context(|| format!("Failed to read facts from {}", facts.display()))?;
    let stats = summary.stats;

    println!("+------------------------------------------+");
    println!("| PDFLOW ANALYZE                           |");
    println!("+------------------------------------------+");
    println!("| Units          : {:>22} |", stats.units_seen);
    println!("| Skipped units  : {:>22} |", stats.units_skipped);
    println!("| Malformed units: {:>22} |", delivery.malformed);
    println!("| Methods        : {:>22} |", stats.methods_registered);
    println!("| Duplicates     : {:>22} |", stats.duplicate_registrations);
    println!("| Reports written: {:>22} |", stats.reports_written);
    println!("| Write failures : {:>22} |", stats.write_failures);
    println!("| Retries        : {:>22} |", stats.retries);
    println!("| Rewrites       : {:>22} |", stats.refreshes);
    println!("| Unresolved     : {:>22} |", summary.unresolved.len());
    println!("| Out of scope   : {:>22} |", summary.out_of_scope.len());
    println!("+------------------------------------------+");
    println!("Reports in: {}", output_dir.display());

    if !summary.unresolved.is_empty() {
        println!("\nUNRESOLVED REPORTS:");
        for entry in &summary.unresolved {
            println!("  {}", entry.name);
            for missing in &entry.waiting_for {
                println!("    waiting for {missing}");
            }
        }
    }

    if !summary.out_of_scope.is_empty() {
        println!("\nBLOCKED OUTSIDE NAMESPACE:");
        for entry in &summary.out_of_scope {
            println!("  {}", entry.name);
            for missing in &entry.waiting_for {
                println!("    reaches {missing}");
            }
        }
    }

    if summary.partial_reports_written > 0 {
        println!(
            "\n{} partial report(s) written for unresolved entries.",
            summary.partial_reports_written
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// visualize
// ---------------------------------------------------------------------------

fn cmd_visualize(dir: &Path) -> anyhow::Result<()> {
    let html = scribe::html::render_directory(dir)
        .with_context(|| format!("Failed to render reports in {}", dir.display()))?;
    println!("Wrote {}", html.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// graph
// ---------------------------------------------------------------------------

fn cmd_graph(
    root: &Path,
    facts: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let config =
        AnalysisConfig::load(root, config_path, None).context("Failed to load configuration")?;
    let mut session = Session::new(config, MemorySink::new());
    courier::deliver_units(facts, |unit| {
        session.ingest(&unit);
    })
    .with_context(|| format!("Failed to read facts from {}", facts.display()))?;

    let graph = CallGraph::build(session.registry(), session.index());
    let dot = graph.to_dot();
    match output {
        Some(path) => std::fs::write(path, &dot)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{dot}"),
    }

    let cycles = graph.cycles();
    eprintln!("+------------------------------------------+");
    eprintln!("| PDFLOW GRAPH                             |");
    eprintln!("+------------------------------------------+");
    eprintln!("| Methods        : {:>22} |", graph.stats.node_count);
    eprintln!("| Call edges     : {:>22} |", graph.stats.call_edges);
    eprintln!("| Impl edges     : {:>22} |", graph.stats.implementation_edges);
    eprintln!("| Unresolved     : {:>22} |", graph.stats.unresolved);
    eprintln!("| Cycles         : {:>22} |", cycles.len());
    eprintln!("+------------------------------------------+");

    Ok(())
}
