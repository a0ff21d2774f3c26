//! splitchaind - batch disbursement behind a risk-assessment gate
//!
//! Serves:
//! - `POST /v1/disperse` to run one batch
//! - `GET /v1/transactions` for the in-memory history
//! - `GET /v1/health`

use anyhow::Context;
use clap::Parser;
use splitchain_service::config::ServiceConfig;
use splitchain_service::{build_router, ServiceState};
use std::net::SocketAddr;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "splitchaind", version, about = "Splitchain batch disbursement REST service")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SPLITCHAIN_CONFIG")]
    config: Option<String>,

    /// Listen address, overrides `server.listen_addr`
    #[arg(short, long, env = "SPLITCHAIN_LISTEN_ADDR")]
    listen: Option<SocketAddr>,

    /// Log level, overrides `logging.level`
    #[arg(long, env = "SPLITCHAIN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "SPLITCHAIN_LOG_JSON")]
    json: bool,

    /// Start with the demo transaction history
    #[arg(long)]
    seed_demo_history: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ServiceConfig::load(cli.config.as_deref())
        .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;
    if let Some(listen) = cli.listen {
        config.server.listen_addr = listen;
    }
    if let Some(level) = cli.log_level.clone() {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;
    config.server.seed_demo_history |= cli.seed_demo_history;

    init_tracing(&config.logging.level, config.logging.json);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = ServiceState::bootstrap(&config, shutdown_rx)?;

    let mut app = build_router(state);
    if config.server.enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    let listener = tokio::net::TcpListener::bind(config.server.listen_addr).await?;
    info!("splitchaind listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // In-flight batches observe this and stop at their next await point.
            shutdown_tx.send_replace(true);
        })
        .await?;

    info!("splitchaind shut down");
    Ok(())
}

fn init_tracing(level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.to_string().into());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
