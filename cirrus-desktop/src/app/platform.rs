use std::process::Command;

use async_trait::async_trait;
use cirrus_core::error::{CirrusError, Result};
use cirrus_core::platform::{NativeClient, Notifier};
use tokio_util::sync::CancellationToken;

/// Restarts the desktop client by spawning a fresh copy of the current
/// executable and then asking this process to shut down.
pub struct ProcessRestarter {
    shutdown: CancellationToken,
}

impl ProcessRestarter {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }
}

#[async_trait]
impl NativeClient for ProcessRestarter {
    async fn restart(&self) -> Result<()> {
        let exe = std::env::current_exe()
            .map_err(|e| CirrusError::Restart(format!("Cannot locate executable: {}", e)))?;
        let args: Vec<String> = std::env::args().skip(1).collect();

        Command::new(&exe)
            .args(&args)
            .spawn()
            .map_err(|e| CirrusError::Restart(format!("Failed to spawn {:?}: {}", exe, e)))?;

        tracing::info!("[Restart] Spawned replacement process, shutting down");
        self.shutdown.cancel();
        Ok(())
    }
}

/// Surfaces user-facing errors in the log; the desktop host has no toast UI.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_error(&self, message: &str) {
        tracing::error!("[Notify] {}", message);
    }
}
