// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` graph inspector.
//!
//! Builds a small gameplay graph, deep-copies it through the registry,
//! checks that the copy is isolated from its source and prints a summary.
//!
//! Usage: `ordoplay_graph_inspect [settings.ron]`

use ordoplay_node_graph::graphs::gameplay;
use ordoplay_node_graph::{
    ConnectionError, CopyError, GraphError, GraphHandle, GraphId, GraphRegistry, GraphSettings,
    Node, NodeId, Port, RegistryError,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Errors surfaced by the inspector
#[derive(Debug, thiserror::Error)]
enum InspectError {
    #[error("Failed to load settings from {path}: {source}")]
    Settings {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Copy(#[from] CopyError),
    #[error("Copy {copy} still links to {count} source nodes")]
    NotIsolated { copy: GraphId, count: usize },
}

struct Summary {
    source: GraphId,
    copy: GraphId,
    nodes: usize,
    connections: usize,
}

fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ordoplay_node_graph=info,ordoplay_graph_inspect=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting OrdoPlay graph inspector v{}", env!("CARGO_PKG_VERSION"));

    match load_settings().and_then(run) {
        Ok(summary) => {
            println!("source graph : {}", summary.source);
            println!("copied graph : {}", summary.copy);
            println!("nodes        : {}", summary.nodes);
            println!("connections  : {}", summary.connections);
        }
        Err(e) => {
            tracing::error!("Inspection failed: {e}");
            std::process::exit(1);
        }
    }
}

fn load_settings() -> Result<GraphSettings, InspectError> {
    match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => GraphSettings::load(&path).map_err(|source| InspectError::Settings { path, source }),
        None => Ok(GraphSettings::default()),
    }
}

fn run(settings: GraphSettings) -> Result<Summary, InspectError> {
    let registry = GraphRegistry::with_settings(settings);
    let source = registry.create(
        Arc::new(gameplay::gameplay_schema()),
        Arc::new(gameplay::create_gameplay_registry()),
        Some(GraphId::new("inspect-source")),
    )?;

    let source_nodes = build_sample(&source)?;
    let copy = source.duplicate()?;

    let summary = {
        let graph = copy.read();
        let stray = graph
            .nodes()
            .flat_map(|n| n.ports().flat_map(Port::links))
            .filter(|link| source_nodes.contains(&link.node))
            .count();
        if stray > 0 {
            return Err(InspectError::NotIsolated {
                copy: graph.id().clone(),
                count: stray,
            });
        }

        let missing = graph.missing_required_types();
        if !missing.is_empty() {
            tracing::warn!("Copy is missing required node types: {:?}", missing);
        }

        Summary {
            source: source.id(),
            copy: graph.id().clone(),
            nodes: graph.node_count(),
            connections: graph.connection_count(),
        }
    };

    copy.on_teardown();
    source.on_teardown();
    tracing::info!("{} graphs left registered", registry.len());
    Ok(summary)
}

/// Begin play -> branch, with both branch outcomes printing and the false
/// path looping back into the branch.
fn build_sample(handle: &GraphHandle) -> Result<HashSet<NodeId>, InspectError> {
    let mut graph = handle.write();
    let begin = graph.add_node(gameplay::EVENT_BEGIN_PLAY)?;
    let branch = graph.add_node("branch")?;
    let on_true = graph.add_node("print_string")?;
    let on_false = graph.add_node("print_string")?;

    graph.connect(begin, "Exec", branch, "Exec")?;
    graph.connect(branch, "True", on_true, "Exec")?;
    graph.connect(branch, "False", on_false, "Exec")?;
    graph.connect(on_false, "Then", branch, "Exec")?;

    Ok(graph.nodes().map(Node::id).collect())
}
