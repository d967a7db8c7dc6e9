use anyhow::{anyhow, Context, Result};
use payment_gateway::{logging, router, AppState, Config};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use wallet_ledger::Ledger;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;
    config.validate().map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    logging::init(config.env);

    info!(
        env = ?config.env,
        data_dir = %config.ledger.data_dir.display(),
        "Starting payment gateway"
    );

    let ledger_config = config.ledger.clone();
    let ledger = tokio::task::spawn_blocking(move || Ledger::open(ledger_config))
        .await?
        .context("Failed to open ledger")?;

    let state = AppState::new(ledger);
    let app = router(state.clone(), config.server.request_timeout());

    let bind_addr = config.server.bind_addr().map_err(|e| anyhow!(e))?;
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Gateway listening on: {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, closing ledger");
    match Arc::try_unwrap(state.ledger) {
        Ok(ledger) => tokio::task::spawn_blocking(move || ledger.close())
            .await?
            .context("Failed to close ledger")?,
        Err(_) => warn!("Ledger still in use at shutdown; store closes on last drop"),
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
