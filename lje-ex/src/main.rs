//! lje-ex (Laser Juke Explorer) - data explorer service
//!
//! Serves cascading filters, custom list editing, statistics and label
//! export over one data folder (discs.csv, titles.csv, lists/).

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lje_common::config::{resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV};
use lje_common::SessionSettings;
use lje_ex::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for lje-ex
#[derive(Parser, Debug)]
#[command(name = "lje-ex")]
#[command(about = "Laser Juke Explorer data service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "LJE_PORT")]
    port: Option<u16>,

    /// Data folder holding discs.csv, titles.csv and lists/
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "LJE_CONFIG")]
    config: Option<PathBuf>,
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("lje_ex={0},lje_common={0},tower_http=info", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        None => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load_or_default(args.config.as_deref());
    init_tracing(&config)?;

    info!("Starting Laser Juke Explorer (lje-ex) v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    info!("Root folder: {} (override with --root-folder or {})", root_folder.display(), ROOT_FOLDER_ENV);

    let sources = config.data_sources(&root_folder);
    for path in [&sources.discs, &sources.titles] {
        if !path.is_file() {
            warn!("Source file missing: {} (sessions cannot open until it exists)", path.display());
        }
    }

    let settings = SessionSettings::from_config(&config).context("Invalid filter configuration")?;
    info!(filters = ?settings.filters, rotate = ?settings.rotate, "filter chain configured");

    // Capped at one year
    let idle_minutes = config.session_idle_minutes.min(60 * 24 * 365) as i64;
    let idle = chrono::Duration::minutes(idle_minutes);
    let state = AppState::new(sources, settings, idle);
    let app = build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("lje-ex listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
