//! Fakes for the lifecycle ports, shared by the unit tests in this crate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cirrus_core::backend::{Account, AccountApi, PresenceApi};
use cirrus_core::error::{CirrusError, Result};
use cirrus_core::platform::{NativeClient, NavigateOptions, Navigator, Notifier};
use cirrus_core::session::AuthFlag;
use cirrus_core::storage::KeyValueStore;
use cirrus_infrastructure::storage::InMemoryStore;
use tokio::sync::watch;

use crate::activity::SessionContext;

pub const AUTH_KEY: &str = "authed";

pub fn markers() -> Vec<String> {
    vec!["/f/".to_string(), "/d/".to_string()]
}

/// Presence endpoint with a configurable latency and failure switch.
#[derive(Default)]
pub struct MockPresenceApi {
    pub calls: Mutex<Vec<DateTime<Utc>>>,
    pub latency: Mutex<Duration>,
    pub fail: Mutex<bool>,
}

impl MockPresenceApi {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl PresenceApi for MockPresenceApi {
    async fn report_presence(&self, timestamp: DateTime<Utc>) -> Result<()> {
        self.calls.lock().unwrap().push(timestamp);
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if *self.fail.lock().unwrap() {
            return Err(CirrusError::network("connection reset"));
        }
        Ok(())
    }
}

/// Account endpoint answering from a script; an empty script succeeds.
#[derive(Default)]
pub struct MockAccountApi {
    pub script: Mutex<VecDeque<Result<Account>>>,
    pub calls: AtomicUsize,
}

impl MockAccountApi {
    pub fn push(&self, result: Result<Account>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountApi for MockAccountApi {
    async fn fetch_account(&self) -> Result<Account> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Account::default()))
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub visits: Mutex<Vec<(String, NavigateOptions)>>,
}

impl RecordingNavigator {
    pub fn visit_count(&self) -> usize {
        self.visits.lock().unwrap().len()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str, options: NavigateOptions) -> Result<()> {
        self.visits.lock().unwrap().push((path.to_string(), options));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNativeClient {
    pub restarts: AtomicUsize,
    pub fail_with: Mutex<Option<CirrusError>>,
}

impl RecordingNativeClient {
    pub fn restart_count(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NativeClient for RecordingNativeClient {
    async fn restart(&self) -> Result<()> {
        if let Some(e) = self.fail_with.lock().unwrap().clone() {
            return Err(e);
        }
        self.restarts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_error(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// A signed-in session context with writable focus and location signals.
pub struct ContextHarness {
    pub local: Arc<InMemoryStore>,
    pub auth: Arc<AuthFlag>,
    pub focus: watch::Sender<bool>,
    pub location: watch::Sender<String>,
    pub context: SessionContext,
}

impl ContextHarness {
    pub async fn signed_in() -> Self {
        let local = Arc::new(InMemoryStore::new());
        let store: Arc<dyn KeyValueStore> = local.clone();
        let auth = Arc::new(AuthFlag::new(store, AUTH_KEY));
        auth.set_authenticated(true).await.unwrap();
        let (focus, focus_rx) = watch::channel(true);
        let (location, location_rx) = watch::channel("/drive".to_string());
        let context = SessionContext::new(focus_rx, location_rx, auth.clone(), markers());
        Self {
            local,
            auth,
            focus,
            location,
            context,
        }
    }
}
