//! API Performance Monitor
//!
//! Periodically probes registered HTTP endpoints, records every observation and
//! alerts on state changes without flooding the on-call channels.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────────┐
//!                  │                       API MONITOR                         │
//!                  │                                                           │
//!   monitor-cli ───┼─▶ ┌─────────┐  upsert/list   ┌─────────┐                  │
//!   curl        ───┼─▶ │   api   │───────────────▶│  store  │◀──────┐          │
//!                  │   └─────────┘                └────┬────┘       │          │
//!                  │                                   │ targets    │ observe  │
//!                  │                                   ▼            │          │
//!                  │   ┌───────────────────────────────────────────────────┐   │
//!                  │   │ monitor::runner  (tick, semaphore fan-out ≤ 20)    │   │
//!                  │   │   prober ─▶ classifier ─▶ throttle ─▶ message     │   │     Endpoints
//!                  │   │     │                                             │───┼──▶ (HTTP GET)
//!                  │   └─────┼──────────────────────────────┬──────────────┘   │
//!                  │         │                              ▼                  │
//!                  │         │                     ┌────────────────┐          │
//!                  │         │                     │ alert dispatch │──────────┼──▶ SMTP / webhook
//!                  │         │                     └────────────────┘          │
//!                  │  ┌──────┴─────────────────────────────────────────────┐   │
//!                  │  │ config (TOML + env) · observability · lifecycle     │   │
//!                  │  └────────────────────────────────────────────────────┘   │
//!                  └──────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use api_monitor::alert::AlertDispatcher;
use api_monitor::api::{self, ApiState};
use api_monitor::config::resolve_config;
use api_monitor::lifecycle::{wait_for_signal, Shutdown};
use api_monitor::monitor::{HttpProber, Runner};
use api_monitor::observability::{logging, metrics};
use api_monitor::store::{MemoryStore, Store};

#[derive(Parser)]
#[command(name = "api-monitor")]
#[command(about = "HTTP endpoint monitor with throttled alerting", long_about = None)]
struct Args {
    /// TOML configuration file; defaults and environment variables apply without one.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = resolve_config(args.config.as_deref())?;
    logging::init(&config.observability.log_level);

    tracing::info!("api-monitor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        interval_secs = config.monitor.interval_secs,
        timeout_ms = config.monitor.timeout_ms,
        default_slow_ms = config.monitor.default_slow_ms,
        max_concurrency = config.monitor.max_concurrency,
        throttle_window_secs = config.monitor.throttle_window_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = Arc::new(match &config.store.snapshot_path {
        Some(path) => MemoryStore::load_from_file(path, config.store.retention_per_target)?,
        None => MemoryStore::new(config.store.retention_per_target),
    });

    let prober = HttpProber::new(config.monitor.timeout(), &config.monitor.user_agent)?;
    let alerts = AlertDispatcher::from_config(&config.alerts);
    let shutdown = Shutdown::new();

    let runner = Runner::new(
        store.clone() as Arc<dyn Store>,
        Arc::new(prober),
        alerts,
        &config.monitor,
    );
    let runner_task = tokio::spawn(runner.run(shutdown.subscribe()));

    let api_task = if config.api.enabled {
        let listener = TcpListener::bind(&config.api.bind_address).await?;
        let router = api::router(
            ApiState {
                store: store.clone(),
                default_slow_ms: config.monitor.default_slow_ms,
            },
            &config.api,
        );
        Some(tokio::spawn(api::serve(listener, router, shutdown.subscribe())))
    } else {
        tracing::info!("REST API disabled");
        None
    };

    wait_for_signal().await;
    tracing::info!(subscribers = shutdown.receiver_count(), "Shutting down");
    shutdown.trigger();

    if let Err(e) = runner_task.await {
        tracing::error!(error = %e, "Runner task failed");
    }
    if let Some(task) = api_task {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "API server failed"),
            Err(e) => tracing::error!(error = %e, "API server task failed"),
            Ok(Ok(())) => {}
        }
    }

    if let Err(e) = store.save_to_file() {
        tracing::error!(error = %e, "Failed to save target snapshot");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
