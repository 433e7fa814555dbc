//! Logout coordination.
//!
//! Single entry point that tears down local session state and leaves the
//! authenticated view, either by restarting the native client or by
//! navigating to the login page.

use std::sync::Arc;

use cirrus_core::error::Result;
use cirrus_core::platform::{Deployment, NavigateOptions, Notifier};
use cirrus_core::session::AuthFlag;
use cirrus_core::storage::KeyValueStore;
use cirrus_core::sync::SingleSlot;
use cirrus_core::CirrusError;
use tokio::task::JoinHandle;

use crate::cache::QueryClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoutOutcome {
    Completed,
    /// Nobody is signed in; nothing to tear down.
    NotAuthenticated,
    /// Another logout is already tearing down this session.
    AlreadyInProgress,
    /// Teardown stopped partway; the user was notified.
    Failed(CirrusError),
}

pub struct LogoutCoordinator {
    auth: Arc<AuthFlag>,
    local_storage: Arc<dyn KeyValueStore>,
    offline_store: Arc<dyn KeyValueStore>,
    /// In-memory query results; cleared so nothing re-persists them.
    queries: Arc<QueryClient>,
    deployment: Deployment,
    notifier: Arc<dyn Notifier>,
    login_path: String,
    in_flight: SingleSlot,
}

impl LogoutCoordinator {
    pub fn new(
        auth: Arc<AuthFlag>,
        local_storage: Arc<dyn KeyValueStore>,
        offline_store: Arc<dyn KeyValueStore>,
        queries: Arc<QueryClient>,
        deployment: Deployment,
        notifier: Arc<dyn Notifier>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            auth,
            local_storage,
            offline_store,
            queries,
            deployment,
            notifier,
            login_path: login_path.into(),
            in_flight: SingleSlot::new(),
        }
    }

    /// Logs out if signed in. Safe to call concurrently; only the first
    /// caller performs the teardown.
    pub async fn logout(&self) -> LogoutOutcome {
        let Some(_guard) = self.in_flight.try_acquire() else {
            tracing::debug!("[Logout] Already in progress, skipping");
            return LogoutOutcome::AlreadyInProgress;
        };

        if !self.auth.is_authenticated().await {
            return LogoutOutcome::NotAuthenticated;
        }

        tracing::info!("[Logout] Tearing down session ({:?})", self.deployment);
        match self.teardown().await {
            Ok(()) => LogoutOutcome::Completed,
            Err(e) => {
                tracing::error!("[Logout] Teardown failed: {}", e);
                self.notifier.notify_error(&e.user_message());
                LogoutOutcome::Failed(e)
            }
        }
    }

    /// Runs [`logout`](Self::logout) on its own task.
    ///
    /// Background tasks use this so the teardown outlives them: clearing
    /// the authenticated flag unmounts the very task that asked to log out.
    pub fn spawn_logout(self: &Arc<Self>) -> JoinHandle<LogoutOutcome> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.logout().await })
    }

    async fn teardown(&self) -> Result<()> {
        self.local_storage.clear().await?;
        // Local storage held the authenticated flag; let subscribers see it go.
        self.auth.refresh().await;

        // Memory first: the persist loop writes whatever the client still holds.
        self.queries.clear().await;
        self.offline_store.clear().await?;

        match &self.deployment {
            Deployment::Desktop(client) => client.restart().await?,
            Deployment::Browser(navigator) => navigator.navigate(
                &self.login_path,
                NavigateOptions {
                    replace: true,
                    reset_scroll: true,
                },
            )?,
        }
        Ok(())
    }
}
