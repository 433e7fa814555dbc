//! Bootstrap gate.
//!
//! The authenticated UI and every overlay stay behind a loading placeholder
//! until one-time setup has finished AND the persisted query cache has been
//! restored.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use cirrus_core::error::Result;
use tokio::sync::watch;

use crate::cache::RestorePhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitPhase {
    NotStarted,
    Initializing,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapState {
    pub init: InitPhase,
    pub restore: RestorePhase,
}

impl BootstrapState {
    pub fn is_open(&self) -> bool {
        self.init == InitPhase::Ready && self.restore == RestorePhase::Restored
    }
}

/// What the shell should render right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateView {
    /// Loading placeholder; nothing else renders.
    Loading,
    /// Authenticated tree plus shared overlays.
    Authenticated,
    /// Public routes plus shared overlays.
    Unauthenticated,
}

impl GateView {
    /// Overlays shared by both trees (transfers, previews, prompts).
    pub fn shows_overlays(self) -> bool {
        self != Self::Loading
    }
}

/// One-time application setup run by the gate.
#[async_trait]
pub trait Initializer: Send + Sync {
    async fn setup(&self) -> Result<()>;
}

pub struct BootstrapGate {
    started: AtomicBool,
    init_tx: watch::Sender<InitPhase>,
    restore_rx: watch::Receiver<RestorePhase>,
}

impl BootstrapGate {
    pub fn new(restore_rx: watch::Receiver<RestorePhase>) -> Self {
        let (init_tx, _) = watch::channel(InitPhase::NotStarted);
        Self {
            started: AtomicBool::new(false),
            init_tx,
            restore_rx,
        }
    }

    /// Runs setup in the background. Only the first call per gate does
    /// anything; later calls return false.
    ///
    /// A failed setup is logged and leaves the gate in `Initializing` for
    /// good. There is no retry and no error view.
    pub fn start(self: &Arc<Self>, initializer: Arc<dyn Initializer>) -> bool {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("[Bootstrap] Setup already started, skipping");
            return false;
        }

        self.init_tx.send_replace(InitPhase::Initializing);
        let gate = Arc::clone(self);
        tokio::spawn(async move {
            match initializer.setup().await {
                Ok(()) => {
                    tracing::info!("[Bootstrap] Setup done");
                    gate.init_tx.send_replace(InitPhase::Ready);
                }
                Err(e) => {
                    tracing::error!("[Bootstrap] Setup failed: {}", e);
                }
            }
        });
        true
    }

    pub fn state(&self) -> BootstrapState {
        BootstrapState {
            init: *self.init_tx.borrow(),
            restore: *self.restore_rx.borrow(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    pub fn view(&self, authenticated: bool) -> GateView {
        match (self.is_open(), authenticated) {
            (false, _) => GateView::Loading,
            (true, true) => GateView::Authenticated,
            (true, false) => GateView::Unauthenticated,
        }
    }

    /// Resolves once both setup and cache restore have completed. Never
    /// resolves if setup failed.
    pub async fn wait_open(&self) {
        let mut init = self.init_tx.subscribe();
        let mut restore = self.restore_rx.clone();
        let init_ready = init.wait_for(|phase| *phase == InitPhase::Ready).await.is_ok();
        let restored = restore
            .wait_for(|phase| *phase == RestorePhase::Restored)
            .await
            .is_ok();
        if !(init_ready && restored) {
            // A sender went away before reaching the terminal state.
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_core::CirrusError;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::time::Instant;

    struct DelayedSetup {
        delay: Duration,
        fail: bool,
        runs: AtomicUsize,
    }

    impl DelayedSetup {
        fn new(delay: Duration, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                delay,
                fail,
                runs: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Initializer for DelayedSetup {
        async fn setup(&self) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(CirrusError::initialization("worker failed to boot"));
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_opens_when_last_prerequisite_completes() {
        let (restore_tx, restore_rx) = watch::channel(RestorePhase::Restoring);
        let gate = Arc::new(BootstrapGate::new(restore_rx));
        let started_at = Instant::now();

        gate.start(DelayedSetup::new(Duration::from_secs(5), false));
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(8)).await;
            restore_tx.send_replace(RestorePhase::Restored);
            // Keep the sender alive past the transition.
            std::future::pending::<()>().await;
        });

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(gate.state().init, InitPhase::Ready);
        assert!(!gate.is_open());
        assert_eq!(gate.view(true), GateView::Loading);

        gate.wait_open().await;
        let elapsed = started_at.elapsed();
        assert!(elapsed >= Duration::from_secs(8), "opened early: {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(8_010), "opened late: {:?}", elapsed);
        assert_eq!(gate.view(true), GateView::Authenticated);
        assert_eq!(gate.view(false), GateView::Unauthenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_setup_runs_once() {
        let (_restore_tx, restore_rx) = watch::channel(RestorePhase::Restored);
        let gate = Arc::new(BootstrapGate::new(restore_rx));
        let setup = DelayedSetup::new(Duration::from_millis(10), false);

        assert_eq!(gate.state().init, InitPhase::NotStarted);
        assert!(gate.start(setup.clone()));
        assert!(!gate.start(setup.clone()));
        gate.wait_open().await;
        assert!(!gate.start(setup.clone()));
        assert_eq!(setup.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_setup_keeps_loading() {
        let (_restore_tx, restore_rx) = watch::channel(RestorePhase::Restored);
        let gate = Arc::new(BootstrapGate::new(restore_rx));
        gate.start(DelayedSetup::new(Duration::from_secs(1), true));

        let opened = tokio::time::timeout(Duration::from_secs(30), gate.wait_open()).await;
        assert!(opened.is_err());
        assert_eq!(gate.state().init, InitPhase::Initializing);
        assert!(!GateView::Loading.shows_overlays());
        assert_eq!(gate.view(true), GateView::Loading);
    }
}
