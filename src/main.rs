//! Tracker tree host process.
//!
//! # Architecture Overview
//!
//! ```text
//!   call sites                 ┌──────────────────────────────────────────┐
//!   ──────────                 │               TRACKER TREE               │
//!   factory.locate("a/b") ────▶│  registry (DashMap<TrackerPath, NodeRef>)│
//!                              │      │                                   │
//!   client.bump(1) ───────────▶│      ▼                                   │
//!   client.info("…") ─────────▶│  node loops (one tokio task per path)    │
//!   client.shutdown() ────────▶│      │ last unbind → remove own slot     │
//!                              │      ▼                                   │
//!                              │  log sink (tracing)                      │
//!                              └──────────────────────────────────────────┘
//!        reporter: periodic JSON snapshots    metrics: Prometheus scrape
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use tracker_tree::config::{load_config, TrackerConfig};
use tracker_tree::lifecycle::{signals, Shutdown};
use tracker_tree::observability::reporter::TreeReporter;
use tracker_tree::observability::{logging, metrics, TracingSink};
use tracker_tree::tree::TokioHost;
use tracker_tree::{TrackerClientFactory, TrackerTree};

#[derive(Parser)]
#[command(name = "tracker-tree")]
#[command(about = "Hosts an in-process tracker tree", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level.
    #[arg(short, long)]
    log_level: Option<String>,

    /// Bind a few trackers and feed them until shutdown.
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TrackerConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    logging::init_logging(&config.observability);
    tracing::info!("tracker-tree v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        history_capacity = config.tree.history_capacity,
        max_depth = config.tree.max_depth,
        report_interval_secs = config.observability.report_interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let tree = TrackerTree::new(
        config.tree.clone(),
        Arc::new(TokioHost::current()),
        Arc::new(TracingSink),
    );
    let factory = TrackerClientFactory::new(tree.clone());
    let shutdown = Shutdown::new();

    let reporter = TreeReporter::new(
        tree.clone(),
        Duration::from_secs(config.observability.report_interval_secs),
    );
    let reporter_task = tokio::spawn(reporter.run(shutdown.subscribe()));

    let demo_task = if cli.demo {
        Some(tokio::spawn(run_demo(factory.clone(), shutdown.subscribe())))
    } else {
        None
    };

    signals::wait_for_shutdown_signal().await;

    shutdown.trigger();
    if let Some(task) = demo_task {
        let _ = task.await;
    }
    let _ = reporter_task.await;
    tree.shutdown();

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Simulated service traffic: a request counter, an event log and
/// short-lived session trackers.
async fn run_demo(factory: TrackerClientFactory, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
    let requests = match factory.locate_counter("demo/http/requests") {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Demo could not bind request counter");
            return;
        }
    };
    let events = match factory.locate_log("demo/http/events") {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Demo could not bind event log");
            return;
        }
    };

    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    let mut tick: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tick += 1;
                let _ = requests.bump(1);

                let session_path = format!("demo/sessions/s{}", tick % 4);
                if let Ok(session) = factory.locate_counter(&session_path) {
                    let _ = session.bump(1);
                    let _ = session.detach();
                }

                if tick % 10 == 0 {
                    let _ = events.info(format!("served {} requests", tick));
                }
                if tick % 25 == 0 {
                    let _ = events.warning("slow upstream response");
                }
            }
            _ = shutdown.recv() => break,
        }
    }

    let _ = requests.shutdown();
    let _ = events.shutdown();
    tracing::info!(ticks = tick, "Demo workload stopped");
}
