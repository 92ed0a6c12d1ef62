// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless effect graph driver.
//!
//! Loads a graph description (RON), resolves it on the software device and
//! reports what each pass sent to the device:
//! - the first pass creates every native effect and pushes everything
//! - later passes on the same device push nothing
//! - after a simulated device loss everything is recreated and pushed again
//!
//! Usage: `canvas_effects_demo [graph.ron]`. Set `RUST_LOG=canvas_effects=trace`
//! to see every individual push.

mod config;
mod graph;

use canvas_effects::software::SoftwareDevice;
use canvas_effects::EffectError;
use config::{ConfigError, DemoConfig, DEFAULT_GRAPH};
use graph::EffectGraph;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Resolve failed: {0}")]
    Resolve(#[from] EffectError),
}

fn main() {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["canvas_effects=debug", "canvas_effects_demo=info"] {
        if let Ok(directive) = directive.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting canvas effects demo v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(std::env::args_os().nth(1).map(PathBuf::from)) {
        tracing::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}

fn run(path: Option<PathBuf>) -> Result<(), DemoError> {
    let config = match &path {
        Some(path) => {
            tracing::info!("Loading graph from {}", path.display());
            DemoConfig::load(path)?
        }
        None => DemoConfig::from_ron(DEFAULT_GRAPH)?,
    };

    let mut device = SoftwareDevice::new();
    let graph = EffectGraph::build(&config, &device)?;
    tracing::info!("Built graph with {} nodes, output '{}'", graph.node_count(), config.output);

    for pass in 0..config.passes {
        resolve_pass(&graph, &device, &format!("pass {pass}"))?;
    }

    for reset in 0..config.device_resets {
        tracing::info!("Simulating device loss #{}", reset + 1);
        device = device.replace();
        resolve_pass(&graph, &device, &format!("after reset {}", reset + 1))?;
        resolve_pass(&graph, &device, &format!("steady after reset {}", reset + 1))?;
    }

    for node in &config.nodes {
        let realized = graph.node(&node.name).is_some_and(|effect| effect.is_realized());
        tracing::debug!("Node '{}' realized: {}", node.name, realized);
    }

    graph.close();
    tracing::info!("Closed graph, {} native releases recorded", device.log().count(|call| {
        matches!(call, canvas_effects::software::NativeCall::Release { .. })
    }));
    Ok(())
}

fn resolve_pass(graph: &EffectGraph, device: &Arc<SoftwareDevice>, label: &str) -> Result<(), DemoError> {
    let log = device.log();
    log.clear();

    let image = graph.output().resolve(&device.context())?;
    tracing::info!(
        "{label}: {:?}, {} created, {} property pushes, {} input pushes",
        image,
        log.creations(),
        log.value_pushes(),
        log.input_pushes(),
    );
    Ok(())
}
