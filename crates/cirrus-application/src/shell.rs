//! Composition of the session lifecycle components.

use std::sync::Arc;
use std::time::Duration;

use cirrus_core::backend::{AccountApi, PresenceApi};
use cirrus_core::config::ShellConfig;
use cirrus_core::event::EventBus;
use cirrus_core::platform::{Deployment, Notifier};
use cirrus_core::session::AuthFlag;
use cirrus_core::storage::KeyValueStore;
use tokio::sync::watch;

use crate::activity::{
    ActivityMonitor, PresenceReporter, PushInvalidationListener, ScheduledTask, SessionContext,
    SessionWatchdog,
};
use crate::bootstrap::{BootstrapGate, Initializer};
use crate::cache::{PersistedQueryCache, QueryClient, QueryDefaults};
use crate::lifecycle::SessionLifecycle;
use crate::logout::LogoutCoordinator;

/// Everything the shell consumes from its host.
pub struct ShellPorts {
    pub local_storage: Arc<dyn KeyValueStore>,
    pub offline_store: Arc<dyn KeyValueStore>,
    pub presence_api: Arc<dyn PresenceApi>,
    pub account_api: Arc<dyn AccountApi>,
    pub deployment: Deployment,
    pub notifier: Arc<dyn Notifier>,
    pub events: EventBus,
    pub focus: watch::Receiver<bool>,
    pub location: watch::Receiver<String>,
}

pub struct Shell {
    pub auth: Arc<AuthFlag>,
    pub query_cache: Arc<PersistedQueryCache>,
    pub gate: Arc<BootstrapGate>,
    pub logout: Arc<LogoutCoordinator>,
    pub lifecycle: Arc<SessionLifecycle>,
    persist_throttle: Duration,
}

impl Shell {
    pub fn build(config: &ShellConfig, ports: ShellPorts) -> Self {
        let auth = Arc::new(AuthFlag::new(
            ports.local_storage.clone(),
            config.session.authenticated_key.clone(),
        ));

        let client = Arc::new(QueryClient::new(QueryDefaults::default()));
        let query_cache = Arc::new(PersistedQueryCache::new(
            client.clone(),
            ports.offline_store.clone(),
            &config.cache,
        ));
        let gate = Arc::new(BootstrapGate::new(query_cache.restore_status()));

        let logout = Arc::new(LogoutCoordinator::new(
            auth.clone(),
            ports.local_storage,
            ports.offline_store,
            client,
            ports.deployment,
            ports.notifier,
            config.session.login_path.clone(),
        ));

        let context = SessionContext::new(
            ports.focus,
            ports.location,
            auth.clone(),
            config.session.public_link_markers.clone(),
        );
        let presence = Arc::new(PresenceReporter::new(
            context.clone(),
            ports.presence_api,
            config.presence.throttle(),
        ));
        let watchdog = Arc::new(SessionWatchdog::new(
            context,
            ports.account_api,
            logout.clone(),
            config.watchdog.interval(),
            config.watchdog.authorization_markers.clone(),
        ));
        let push = Arc::new(PushInvalidationListener::new(ports.events, logout.clone()));
        let monitor = Arc::new(ActivityMonitor::new(
            presence,
            watchdog,
            push,
            config.presence.tick(),
        ));
        let lifecycle = Arc::new(SessionLifecycle::new(gate.clone(), auth.clone(), monitor));

        Self {
            auth,
            query_cache,
            gate,
            logout,
            lifecycle,
            persist_throttle: config.cache.persist_throttle(),
        }
    }

    /// Starts setup, cache restore, cache persistence and the lifecycle
    /// supervisor.
    pub fn start(&self, initializer: Arc<dyn Initializer>) -> ShellHandle {
        self.gate.start(initializer);

        let cache = self.query_cache.clone();
        let restore = ScheduledTask::spawn("cache-restore", move |cancel| async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                // Failures are logged by restore itself.
                _ = cache.restore() => {}
            }
        });

        let cache = self.query_cache.clone();
        let throttle = self.persist_throttle;
        let persist = ScheduledTask::spawn("cache-persist", move |cancel| {
            cache.run_persist_loop(throttle, cancel)
        });

        let lifecycle = self.lifecycle.clone();
        let supervisor = ScheduledTask::spawn("lifecycle", move |cancel| lifecycle.run(cancel));

        ShellHandle {
            tasks: vec![supervisor, persist, restore],
        }
    }
}

/// Running shell tasks, stopped in order by [`ShellHandle::shutdown`].
pub struct ShellHandle {
    tasks: Vec<ScheduledTask>,
}

impl ShellHandle {
    pub async fn shutdown(self) {
        for task in self.tasks {
            task.shutdown().await;
        }
    }
}
