//! Session watchdog.
//!
//! Probes the account endpoint while signed in. The next probe is armed only
//! after the previous one settles, so probes never overlap and a hanging
//! call delays the chain instead of skipping a beat.

use std::sync::Arc;
use std::time::Duration;

use cirrus_core::backend::AccountApi;
use tokio_util::sync::CancellationToken;

use super::context::SessionContext;
use crate::logout::LogoutCoordinator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Healthy,
    /// Inside a public link; probe skipped, chain continues.
    Skipped,
    /// No longer signed in; chain ends.
    SignedOut,
    /// The backend rejected our credentials; logout was triggered.
    Unauthorized,
    /// Any other failure; chain ends without retry.
    Failed,
}

impl ProbeOutcome {
    /// Whether another probe should be scheduled after this one.
    pub fn should_continue(self) -> bool {
        matches!(self, Self::Healthy | Self::Skipped)
    }
}

pub struct SessionWatchdog {
    context: SessionContext,
    api: Arc<dyn AccountApi>,
    logout: Arc<LogoutCoordinator>,
    interval: Duration,
    authorization_markers: Vec<String>,
}

impl SessionWatchdog {
    pub fn new(
        context: SessionContext,
        api: Arc<dyn AccountApi>,
        logout: Arc<LogoutCoordinator>,
        interval: Duration,
        authorization_markers: Vec<String>,
    ) -> Self {
        Self {
            context,
            api,
            logout,
            interval,
            authorization_markers,
        }
    }

    pub async fn probe(&self) -> ProbeOutcome {
        let session = self.context.session().await;
        if !session.authenticated {
            return ProbeOutcome::SignedOut;
        }
        if session.is_inside_public_link {
            return ProbeOutcome::Skipped;
        }

        match self.api.fetch_account().await {
            Ok(_) => ProbeOutcome::Healthy,
            Err(e) if e.is_authorization_failure(&self.authorization_markers) => {
                tracing::warn!("[Watchdog] Session rejected, logging out: {}", e);
                self.logout.spawn_logout();
                ProbeOutcome::Unauthorized
            }
            Err(e) => {
                // Known gap: non-authorization failures end the chain.
                tracing::warn!("[Watchdog] Probe failed, polling stopped: {}", e);
                ProbeOutcome::Failed
            }
        }
    }

    /// Probes immediately, then again `interval` after each probe settles,
    /// until a probe says stop or the token is cancelled.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        tracing::info!("[Watchdog] Started ({:?} interval)", self.interval);
        loop {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.probe() => outcome,
            };
            tracing::debug!("[Watchdog] Probe: {:?}", outcome);
            if !outcome.should_continue() {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        tracing::info!("[Watchdog] Stopped");
    }
}
