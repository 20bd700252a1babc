// SPDX-License-Identifier: MIT OR Apache-2.0
//! `nodeflow` - run saved node graphs from the command line.
//!
//! Stands in for the editor's "execute" button: loads a graph file, orders
//! it, runs it and reports what every node did.

mod settings;

use clap::{Parser, Subcommand};
use nodeflow_graph::{
    create_default_registry, ExecutionError, ExecutionReport, Executor, ExecutorOptions, Graph,
    GraphDocument, NodeId, NodeOutcome,
};
use settings::{Settings, SETTINGS_FILE_NAME};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run and inspect nodeflow graphs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Settings file
    #[arg(long, default_value = SETTINGS_FILE_NAME)]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a graph
    Run {
        /// Graph file; falls back to the settings' default graph
        graph: Option<PathBuf>,
        /// Only run this node and what it feeds
        #[arg(short, long)]
        trigger: Option<u32>,
        /// Log every pin value written
        #[arg(long)]
        trace_values: bool,
    },
    /// Print the execution order of a graph
    Order {
        /// Graph file
        graph: PathBuf,
    },
    /// List the available node types
    Types,
    /// Write a settings file with default values
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let settings = match Settings::load_or_default(&cli.settings) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to read settings {}: {e}", cli.settings.display());
            std::process::exit(2);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_filter));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(cli.command, &cli.settings, &settings) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(
    command: Command,
    settings_path: &Path,
    settings: &Settings,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Run {
            graph,
            trigger,
            trace_values,
        } => {
            let path = graph
                .or_else(|| settings.default_graph.clone())
                .ok_or("No graph given and no default_graph in settings")?;
            let mut graph = load_graph(&path)?;

            let executor = Executor::with_options(ExecutorOptions {
                trace_values: trace_values || settings.trace_values,
            });
            let result = match trigger {
                Some(id) => executor.run_triggered(&mut graph, NodeId(id)),
                None => executor.run_graph(&mut graph),
            };
            let report = match result {
                Ok(report) => report,
                Err(err) => {
                    if let ExecutionError::Unimplemented { completed, .. } = &err {
                        print_report(&graph, completed);
                    }
                    return Err(err.into());
                }
            };
            print_report(&graph, &report);

            if !report.succeeded() {
                return Err(format!("{} node(s) failed", report.failures().count()).into());
            }
        }
        Command::Order { graph } => {
            let graph = load_graph(&graph)?;
            for (step, id) in graph.topological_order()?.into_iter().enumerate() {
                if let Some(node) = graph.node(id) {
                    println!("{step:>3}  {id:<5} {}", node.title);
                }
            }
        }
        Command::Types => {
            let registry = create_default_registry();
            for descriptor in registry.descriptors() {
                println!(
                    "{:<14} {:<12} {}",
                    descriptor.type_name,
                    descriptor.category.display_name(),
                    descriptor.description
                );
            }
        }
        Command::Init { force } => {
            if settings_path.exists() && !force {
                return Err(format!("{} already exists", settings_path.display()).into());
            }
            Settings::default().save(settings_path)?;
            tracing::info!("Wrote {}", settings_path.display());
        }
    }
    Ok(())
}

fn load_graph(path: &Path) -> Result<Graph, Box<dyn std::error::Error>> {
    let registry = create_default_registry();
    let document = GraphDocument::load(path)?;
    let (mut graph, report) = document.to_graph(&registry);

    if !report.is_complete() {
        tracing::warn!(
            "{}: skipped {} node(s) and {} connection(s)",
            path.display(),
            report.skipped_nodes.len(),
            report.skipped_connections.len()
        );
    }
    if let Some(stem) = path.file_stem() {
        graph.name = stem.to_string_lossy().into_owned();
    }
    tracing::info!(
        "Loaded graph {} ({} nodes, {} connections)",
        graph.name,
        graph.node_count(),
        graph.connection_count()
    );
    Ok(graph)
}

fn print_report(graph: &Graph, report: &ExecutionReport) {
    for id in report.order() {
        let title = graph.node(id).map_or("?", |n| n.title.as_str());
        match report.outcome(id) {
            Some(NodeOutcome::Succeeded) => println!("ok      {id:<5} {title}"),
            Some(NodeOutcome::Failed(err)) => println!("FAILED  {id:<5} {title}: {err}"),
            Some(NodeOutcome::Skipped) | None => println!("skipped {id:<5} {title}"),
        }
    }
    for message in report.messages() {
        println!("{}: {}", message.node, message.text);
    }
}
