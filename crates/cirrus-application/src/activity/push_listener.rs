//! Forced logout on server-pushed invalidation events.

use std::sync::Arc;

use cirrus_core::event::{EventBus, SocketEvent};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::logout::LogoutCoordinator;

pub struct PushInvalidationListener {
    bus: EventBus,
    logout: Arc<LogoutCoordinator>,
}

impl PushInvalidationListener {
    pub fn new(bus: EventBus, logout: Arc<LogoutCoordinator>) -> Self {
        Self { bus, logout }
    }

    /// Opens a subscription. Taken at mount time, before the listening task
    /// first runs, so no event published after mount is missed.
    pub fn subscribe(&self) -> broadcast::Receiver<SocketEvent> {
        self.bus.subscribe()
    }

    /// Returns true when the event forced a logout.
    pub fn handle(&self, event: &SocketEvent) -> bool {
        if !event.is_password_changed() {
            return false;
        }
        tracing::info!("[PushListener] Password changed remotely, logging out");
        self.logout.spawn_logout();
        true
    }

    /// Listens until cancelled. The subscription is dropped on return.
    pub async fn run(
        self: Arc<Self>,
        mut events: broadcast::Receiver<SocketEvent>,
        cancel: CancellationToken,
    ) {
        tracing::debug!("[PushListener] Subscribed");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => {
                        self.handle(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("[PushListener] Missed {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
        tracing::debug!("[PushListener] Unsubscribed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ContextHarness, RecordingNavigator, RecordingNotifier};
    use cirrus_core::platform::Deployment;
    use cirrus_infrastructure::socket::decode_socket_frame;
    use crate::cache::{QueryClient, QueryDefaults};
    use cirrus_infrastructure::storage::InMemoryStore;

    async fn listener() -> (
        ContextHarness,
        EventBus,
        Arc<RecordingNavigator>,
        Arc<PushInvalidationListener>,
    ) {
        let harness = ContextHarness::signed_in().await;
        let navigator = Arc::new(RecordingNavigator::default());
        let logout = Arc::new(LogoutCoordinator::new(
            harness.auth.clone(),
            harness.local.clone(),
            Arc::new(InMemoryStore::new()),
            Arc::new(QueryClient::new(QueryDefaults::default())),
            Deployment::Browser(navigator.clone()),
            Arc::new(RecordingNotifier::default()),
            "/login",
        ));
        let bus = EventBus::default();
        let listener = Arc::new(PushInvalidationListener::new(bus.clone(), logout));
        (harness, bus, navigator, listener)
    }

    #[tokio::test]
    async fn test_password_changed_forces_single_logout() {
        let (harness, bus, navigator, listener) = listener().await;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(listener.clone().run(listener.subscribe(), cancel.clone()));

        bus.publish(SocketEvent::PasswordChanged);
        while navigator.visit_count() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(!harness.auth.is_authenticated().await);
        // A duplicate push after teardown must not navigate again.
        bus.publish(SocketEvent::PasswordChanged);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(navigator.visit_count(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_decoded_frame_with_payload_forces_logout() {
        let (harness, bus, navigator, listener) = listener().await;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(listener.clone().run(listener.subscribe(), cancel.clone()));

        let event = decode_socket_frame(r#"{"type":"passwordChanged","data":{}}"#).unwrap();
        bus.publish(event);
        while navigator.visit_count() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(!harness.auth.is_authenticated().await);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_other_events_ignored() {
        let (harness, _bus, navigator, listener) = listener().await;
        let handled = listener.handle(&SocketEvent::FileTrash {
            uuid: "u1".to_string(),
        });
        assert!(!handled);
        tokio::task::yield_now().await;
        assert!(harness.auth.is_authenticated().await);
        assert_eq!(navigator.visit_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_unsubscribes() {
        let (_harness, bus, _navigator, listener) = listener().await;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(listener.clone().run(listener.subscribe(), cancel.clone()));
        assert_eq!(bus.subscriber_count(), 1);

        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(bus.subscriber_count(), 0);
    }
}
