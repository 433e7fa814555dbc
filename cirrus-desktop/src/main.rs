mod app;

use anyhow::{Context, Result};
use cirrus_infrastructure::{CirrusPaths, ConfigService, init_logging, pump_frames};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use crate::app::{AppBootstrap, bootstrap};

#[tokio::main]
async fn main() -> Result<()> {
    let paths = CirrusPaths::from_platform().context("Failed to resolve cirrus directories")?;
    let _log_guard = init_logging(&paths.logs_dir()).context("Failed to initialize logging")?;

    let config_service = ConfigService::new(paths.config_file());
    let config = config_service
        .get_config()
        .with_context(|| format!("Failed to load {}", config_service.path().display()))?;
    tracing::info!(
        "[Main] Starting cirrus-desktop ({:?} deployment)",
        config.deployment
    );

    let shutdown = CancellationToken::new();
    let AppBootstrap {
        shell,
        setup,
        events,
        router: _router,
        focus: _focus,
    } = bootstrap(paths, config, shutdown.clone()).await?;

    let handle = shell.start(setup);

    // Socket frames arrive on stdin, one JSON object per line.
    let pump = tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = pump_frames(stdin, &events).await {
            tracing::error!("[Main] Socket pump failed: {}", e);
        }
    });

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("[Main] Failed to listen for Ctrl-C: {}", e);
            }
            tracing::info!("[Main] Interrupt received, shutting down");
        }
        _ = shutdown.cancelled() => {
            tracing::info!("[Main] Shutdown requested");
        }
    }

    pump.abort();
    handle.shutdown().await;
    tracing::info!("[Main] Stopped");
    Ok(())
}
