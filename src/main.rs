//! Styler Cache - a grouped TTL cache service
//!
//! `serve` (the default) runs the HTTP service; `self-check` runs the cache
//! contract suite once and exits non-zero below the threshold.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use styler_cache::api::create_router;
use styler_cache::{run_cache_self_check, spawn_cleanup_task, AppState, Config};

#[derive(Parser, Debug)]
#[command(name = "styler_cache", version, about = "Grouped TTL cache service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP cache service
    Serve {
        /// Port to listen on (overrides SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run the cache self-check suite and print or save the JSON report
    SelfCheck {
        /// Write the report to this path instead of stdout
        #[arg(short, long)]
        report: Option<PathBuf>,
        /// Minimum passing percentage (overrides HEALTH_THRESHOLD)
        #[arg(short, long)]
        threshold: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "styler_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let outcome = match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => serve(config, port).await.map(|_| true),
        Command::SelfCheck { report, threshold } => self_check(&config, report, threshold),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

/// Runs the suite once; Ok(false) means the score missed the threshold.
fn self_check(
    config: &Config,
    report_path: Option<PathBuf>,
    threshold: Option<f64>,
) -> anyhow::Result<bool> {
    let report = run_cache_self_check(threshold.unwrap_or(config.health_threshold));

    match report_path {
        Some(path) => report
            .write_json(&path)
            .with_context(|| format!("writing report to {}", path.display()))?,
        None => println!("{}", report.to_json()?),
    }

    if report.is_success() {
        info!("Self-check passed with {:.1}%", report.score());
    } else {
        warn!(
            "Self-check failed: {:.1}% is below {:.1}%",
            report.score(),
            report.threshold()
        );
    }
    Ok(report.is_success())
}

/// Startup sequence: state, cleanup task, router, listener, graceful shutdown.
async fn serve(config: Config, port: Option<u16>) -> anyhow::Result<()> {
    info!("Starting Styler Cache service");
    info!(
        "Configuration loaded: max_entries={}, default_ttl={}s, port={}, cleanup_interval={}s, key_prefix={}",
        config.max_entries,
        config.default_ttl,
        port.unwrap_or(config.server_port),
        config.cleanup_interval,
        config.key_prefix
    );

    let state = AppState::from_config(&config);

    let cleanup_handle = spawn_cleanup_task(
        state.cache.clone(),
        Duration::from_secs(config.cleanup_interval),
    );

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.server_port)));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("serving HTTP")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the cleanup task.
async fn shutdown_signal(cleanup_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
