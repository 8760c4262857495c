//! Flow runner CLI
//!
//! Builds a graph from a JSON description using the built-in node types,
//! runs it and prints the sink results as JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use flow_engine::{EngineConfig, Graph, NodeRegistry, RunReport};

#[derive(Parser)]
#[command(name = "flow-run")]
#[command(author, version, about = "Run a flow graph description", long_about = None)]
struct Cli {
    /// Graph description file to run (JSON)
    #[arg(value_name = "GRAPH_FILE", required_unless_present = "list_nodes")]
    graph_file: Option<PathBuf>,

    /// Engine configuration file (JSON)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Stop after this many iterations (overrides the config file)
    #[arg(long, value_name = "N")]
    max_iterations: Option<u64>,

    /// Print the graph overview after the run
    #[arg(long)]
    show_graph: bool,

    /// List the available node types and exit
    #[arg(long)]
    list_nodes: bool,
}

fn load_config(path: Option<&Path>, max_iterations: Option<u64>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if max_iterations.is_some() {
        config.max_iterations = max_iterations;
    }
    Ok(config)
}

fn run_graph(path: &Path, config: EngineConfig, registry: &NodeRegistry) -> Result<(Graph, RunReport)> {
    let mut graph = Graph::from_json_file(path, registry)
        .with_context(|| format!("Failed to build graph from {}", path.display()))?;
    graph.set_config(config);
    let report = graph.process().context("Graph processing failed")?;
    Ok((graph, report))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    flow_nodes::link();
    let registry = NodeRegistry::with_builtins();

    if cli.list_nodes {
        for key in registry.node_types() {
            println!("{}", key);
        }
        return Ok(());
    }

    let Some(graph_file) = cli.graph_file else {
        anyhow::bail!("No graph file given");
    };
    let config = load_config(cli.config.as_deref(), cli.max_iterations)?;

    let (graph, report) = run_graph(&graph_file, config, &registry)?;
    log::info!(
        "Ran {} iterations in {:.3} s",
        report.iterations,
        report.elapsed_secs()
    );
    if cli.show_graph {
        println!("{}", graph);
    }
    println!("{}", serde_json::to_string_pretty(&report.results)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"max_iterations": 10}"#).unwrap();

        assert_eq!(load_config(Some(&path), None).unwrap().max_iterations, Some(10));
        assert_eq!(load_config(Some(&path), Some(2)).unwrap().max_iterations, Some(2));
        assert_eq!(load_config(None, None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_run_graph_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(
            &path,
            r#"{"nodes": {
                "range": {"class": "range-source", "inputs": {"stop": {"default": 4}}},
                "max": {"class": "array-max", "inputs": {
                    "array": {"connection": {"node": "range", "output": "array"}}
                }}
            }}"#,
        )
        .unwrap();

        flow_nodes::link();
        let registry = NodeRegistry::with_builtins();
        let (_, report) = run_graph(&path, EngineConfig::default(), &registry).unwrap();
        assert_eq!(report.result("max", "value"), Some(&json!(4)));
        // The range has a connected output, so only the max node is a sink
        assert!(report.results.iter().all(|r| r.node == "max"));
    }

    #[test]
    fn test_missing_graph_file_reports_path() {
        let registry = NodeRegistry::new();
        let err = run_graph(Path::new("/nonexistent/graph.json"), EngineConfig::default(), &registry)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/graph.json"));
    }
}
