//! tally-exporter binary.
//!
//! - Loads `tally.yaml` (or `$TALLY_CONFIG`), falling back to defaults
//! - Serves `GET /metrics` on port 9100 unless overridden
//! - Sweeps expired entries in the background until ctrl-c or SIGTERM

use tally_core::error::{Result, TallyError};
use tracing_subscriber::{fmt, EnvFilter};

use tally_exporter::queue::Sweeper;
use tally_exporter::{config, instrument, AppState};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
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
    tracing::info!("signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("TALLY_CONFIG").unwrap_or_else(|_| "tally.yaml".to_string());
    let mut cfg = config::load_or_default(&path)?;
    config::apply_env_overrides(&mut cfg)?;
    let listen = cfg.socket_addr()?;

    let state = AppState::new(cfg)?;
    instrument::install_panic_hook(state.queue());
    let sweeper = Sweeper::spawn(state.queue(), state.cfg().sweep_config());

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| TallyError::Internal(format!("failed to bind {listen}: {e}")))?;
    tracing::info!(%listen, "tally-exporter starting");
    tracing::info!("metrics available at http://{listen}/metrics");

    let served = state.server().serve(listener, shutdown_signal()).await;
    sweeper.stop().await;

    served.map_err(|e| TallyError::Internal(format!("server failed: {e}")))
}
