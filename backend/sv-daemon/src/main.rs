use sv_daemon::{AppState, DaemonError, build_router, logger};

use sv_config::{Config, DaemonFileInfo};
use sv_core::{FileStore, ServerFactory, SupervisorRegistry};

use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Pick up SVCTL_* overrides from a local .env before loading config
    let _ = dotenvy::dotenv();

    // Load and validate configuration
    let config = Config::load()?;
    config.validate()?;

    // Initialize logger (before any other logging)
    logger::initialize(&config.logging, &config.log_dir()?)?;

    info!("Starting svctl-daemon v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    // Supervisors for every server registered in an earlier run
    let state_path = Config::state_path()?;
    info!("Server state: {}", state_path.display());
    let registry = Arc::new(SupervisorRegistry::new(
        Arc::new(ServerFactory),
        Arc::new(FileStore::new(state_path)),
        config.supervisor.clone(),
    ));

    let report = registry.recover().await;
    for failure in &report.failures {
        match &failure.path {
            Some(path) => warn!(path = %path.display(), "Not recovered: {}", failure.error.summary()),
            None => error!("Reading registered servers failed: {}", failure.error.summary()),
        }
    }

    // Create TCP listener
    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| DaemonError::bind(&bind_addr, e))?;

    // Get actual bound address (port 0 picks a free one)
    let actual_addr = listener.local_addr().map_err(DaemonError::serve)?;
    info!("Control surface listening on {}", actual_addr);

    // Discovery file for svctl
    match DaemonFileInfo::write(actual_addr.port(), &config.daemon.host) {
        Ok(path) => info!("Daemon file written: {}", path.display()),
        Err(e) => {
            registry.shutdown().await;
            return Err(e.into());
        }
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let app = build_router(AppState::new(Arc::clone(&registry)));
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await
        .map_err(DaemonError::serve);

    // Servers keep running; the next daemon adopts them
    registry.shutdown().await;

    if let Err(e) = DaemonFileInfo::remove() {
        warn!("Failed to remove daemon file: {}", e);
    }

    served?;
    info!("Graceful shutdown complete");
    Ok(())
}

async fn wait_for_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(terminate) => terminate,
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                wait_for_ctrl_c(shutdown).await;
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
            _ = terminate.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
        }
        shutdown.cancel();
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c(shutdown).await;
}

async fn wait_for_ctrl_c(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl+C, initiating graceful shutdown");
            shutdown.cancel();
        }
        Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
    }
}
