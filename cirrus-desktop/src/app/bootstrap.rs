use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use cirrus_application::{Initializer, Shell, ShellPorts};
use cirrus_core::config::{DeploymentKind, ShellConfig};
use cirrus_core::error::{CirrusError, Result as CirrusResult};
use cirrus_core::event::EventBus;
use cirrus_core::platform::{Deployment, NativeClient, Navigator};
use cirrus_infrastructure::{CirrusPaths, HistoryRouter, HttpBackend, JsonDirStore};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::app::platform::{ProcessRestarter, TracingNotifier};

const START_ROUTE: &str = "/drive";

/// One-time setup run behind the bootstrap gate.
pub struct AppSetup {
    paths: CirrusPaths,
    config: ShellConfig,
}

impl AppSetup {
    pub fn new(paths: CirrusPaths, config: ShellConfig) -> Self {
        Self { paths, config }
    }
}

#[async_trait]
impl Initializer for AppSetup {
    async fn setup(&self) -> CirrusResult<()> {
        for dir in [
            self.paths.local_storage_dir(),
            self.paths.offline_store_dir(),
        ] {
            tokio::fs::create_dir_all(&dir).await?;
        }

        if self.config.presence.tick_ms == 0 || self.config.watchdog.interval_ms == 0 {
            return Err(CirrusError::initialization(
                "presence.tick_ms and watchdog.interval_ms must be positive",
            ));
        }
        if self.config.backend.api_key.is_none() {
            tracing::warn!("[Bootstrap] No backend.api_key configured; requests will be rejected");
        }

        tracing::info!(
            "[Bootstrap] Setup complete ({:?} deployment)",
            self.config.deployment
        );
        Ok(())
    }
}

/// Everything `main` needs after composition.
pub struct AppBootstrap {
    pub shell: Shell,
    pub setup: Arc<AppSetup>,
    pub events: EventBus,
    pub router: Arc<HistoryRouter>,
    /// Keeps the focus channel open; the desktop window is treated as focused.
    pub focus: watch::Sender<bool>,
}

/// Composition root: builds the concrete adapters and wires the shell.
pub async fn bootstrap(
    paths: CirrusPaths,
    config: ShellConfig,
    shutdown: CancellationToken,
) -> Result<AppBootstrap> {
    let local_storage = Arc::new(
        JsonDirStore::open(paths.local_storage_dir())
            .await
            .context("Failed to open local storage")?,
    );
    let offline_store = Arc::new(
        JsonDirStore::open(paths.offline_store_dir())
            .await
            .context("Failed to open offline store")?,
    );
    let backend = Arc::new(
        HttpBackend::new(&config.backend).context("Failed to build backend")?,
    );

    let router = HistoryRouter::new(START_ROUTE);
    let deployment = match config.deployment {
        DeploymentKind::Desktop => {
            let client: Arc<dyn NativeClient> = Arc::new(ProcessRestarter::new(shutdown));
            Deployment::Desktop(client)
        }
        DeploymentKind::Browser => {
            let navigator: Arc<dyn Navigator> = router.clone();
            Deployment::Browser(navigator)
        }
    };

    let (focus, focus_rx) = watch::channel(true);
    let events = EventBus::default();

    let shell = Shell::build(
        &config,
        ShellPorts {
            local_storage,
            offline_store,
            presence_api: backend.clone(),
            account_api: backend,
            deployment,
            notifier: Arc::new(TracingNotifier),
            events: events.clone(),
            focus: focus_rx,
            location: router.subscribe(),
        },
    );

    Ok(AppBootstrap {
        shell,
        setup: Arc::new(AppSetup::new(paths, config)),
        events,
        router,
        focus,
    })
}
