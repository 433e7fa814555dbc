//! Ties the session background tasks to the bootstrap gate and the
//! authenticated flag: mounted while the gate is open and the user is signed
//! in, unmounted otherwise.

use std::sync::Arc;

use cirrus_core::session::AuthFlag;
use tokio_util::sync::CancellationToken;

use crate::activity::ActivityMonitor;
use crate::bootstrap::{BootstrapGate, GateView};

pub struct SessionLifecycle {
    gate: Arc<BootstrapGate>,
    auth: Arc<AuthFlag>,
    monitor: Arc<ActivityMonitor>,
}

impl SessionLifecycle {
    pub fn new(gate: Arc<BootstrapGate>, auth: Arc<AuthFlag>, monitor: Arc<ActivityMonitor>) -> Self {
        Self {
            gate,
            auth,
            monitor,
        }
    }

    pub async fn view(&self) -> GateView {
        self.gate.view(self.auth.is_authenticated().await)
    }

    pub fn is_mounted(&self) -> bool {
        self.monitor.is_mounted()
    }

    /// Supervises mounting until cancelled; always leaves tasks unmounted.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = self.gate.wait_open() => {}
        }
        tracing::info!("[Lifecycle] Bootstrap gate open");

        let mut auth_rx = self.auth.subscribe();
        self.auth.refresh().await;

        loop {
            let authenticated = *auth_rx.borrow_and_update();
            if authenticated {
                if self.monitor.mount() {
                    tracing::info!("[Lifecycle] Signed in, session tasks started");
                }
            } else if self.monitor.unmount().await {
                tracing::info!("[Lifecycle] Signed out, session tasks stopped");
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = auth_rx.changed() => if changed.is_err() { break },
            }
        }

        self.monitor.unmount().await;
        tracing::info!("[Lifecycle] Stopped");
    }
}
