//! Route manager CLI.
//!
//! # Architecture Overview
//!
//! ```text
//!   locations (args | stdin | watched file)
//!          │
//!          ▼
//!   ┌──────────────┐    ┌──────────────┐    ┌────────────────┐
//!   │  navigation  │───▶│   routing    │───▶│ state machine  │
//!   │  normalize,  │    │ match, gates │    │ enter / exit   │
//!   │  generations │◀───│ clean/dirty  │    │                │
//!   └──────────────┘    └──────────────┘    └────────────────┘
//!          │
//!          ▼
//!   JSON report per location (stdout), logs on stderr
//! ```
//!
//! Without a config file the tree is empty and every location falls
//! through to "not found".

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use route_manager::config::{load_config, ManagerConfig};
use route_manager::lifecycle::{LocationWatcher, Shutdown};
use route_manager::navigation::{Location, NavigationOutcome, Navigator, PathStateMachine, StateMachine};
use route_manager::observability::logging::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "route-manager")]
#[command(about = "Resolve locations against a route tree and report the resulting state", long_about = None)]
struct Cli {
    /// TOML file declaring the route tree
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Watch a file and navigate whenever it changes
    #[arg(short, long)]
    watch: Option<PathBuf>,

    /// Overrides observability.log_level
    #[arg(long)]
    log_level: Option<String>,

    /// Locations to resolve in order; read from stdin when absent
    locations: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ManagerConfig::default(),
    };
    let level = cli.log_level.as_deref().unwrap_or(&config.observability.log_level);
    init_tracing(level);

    tracing::info!(
        config = ?cli.config,
        routes = config.routes.len(),
        "route-manager v0.1.0 starting"
    );

    let root = config.route_tree().build()?;
    let navigator = Arc::new(Navigator::new(
        root,
        PathStateMachine::new(),
        config.navigation.clone(),
    ));

    if let Some(outcome) = navigator.start().await {
        print_report(&navigator, &outcome);
    }

    if let Some(path) = &cli.watch {
        return watch(navigator, path).await;
    }

    if !cli.locations.is_empty() {
        for location in &cli.locations {
            navigate(&navigator, location).await;
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !line.trim().is_empty() {
            navigate(&navigator, &line).await;
        }
    }
    Ok(())
}

async fn navigate<M: StateMachine>(navigator: &Navigator<M>, input: &str) {
    match input.parse::<Location>() {
        Ok(location) => {
            let outcome = navigator.set_location(location).await;
            print_report(navigator, &outcome);
        }
        Err(e) => tracing::warn!(input = %input, error = %e, "Skipping malformed location"),
    }
}

async fn watch(
    navigator: Arc<Navigator<PathStateMachine>>,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Shutdown::new();
    let (watcher, updates) = LocationWatcher::new(path);
    let handle = watcher.run()?;

    let mut outcomes = navigator.outcomes();
    let task = tokio::spawn(navigator.clone().run(updates, shutdown.subscribe()));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            outcome = outcomes.recv() => match outcome {
                Ok(NavigationOutcome::Stale) => {}
                Ok(outcome) => print_report(&navigator, &outcome),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Report output fell behind, skipping outcomes");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            signal = &mut ctrl_c => {
                signal?;
                break;
            }
        }
    }

    shutdown.trigger();
    drop(handle);
    task.await?;

    tracing::info!(location = ?navigator.location(), "Shutdown complete");
    Ok(())
}

fn print_report<M: StateMachine>(navigator: &Navigator<M>, outcome: &NavigationOutcome) {
    let state = navigator.machine().current_state().map(String::from);
    let report = json!({
        "location": navigator.location(),
        "outcome": outcome.label(),
        "state": state,
        "params": navigator.params(),
        "context": navigator.context(),
        "title": navigator.document_title(),
    });
    println!("{report}");
}
