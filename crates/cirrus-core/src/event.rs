//! Server-pushed socket events and the in-process bus that fans them out.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// Events delivered over the realtime socket.
///
/// Only `PasswordChanged` matters to the session lifecycle; the other
/// variants are decoded so the rest of the shell can react to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum SocketEvent {
    /// The account password changed elsewhere; this session must end.
    PasswordChanged,
    NewEvent {
        #[serde(default)]
        uuid: String,
    },
    FileNew {
        #[serde(default)]
        uuid: String,
        #[serde(default)]
        parent: String,
    },
    FileTrash {
        #[serde(default)]
        uuid: String,
    },
    FolderSubCreated {
        #[serde(default)]
        uuid: String,
        #[serde(default)]
        parent: String,
    },
    /// Any event type this build does not know about.
    #[serde(skip)]
    Other { event_type: String, payload: Value },
}

impl SocketEvent {
    pub fn event_type(&self) -> &str {
        match self {
            Self::PasswordChanged => "passwordChanged",
            Self::NewEvent { .. } => "newEvent",
            Self::FileNew { .. } => "fileNew",
            Self::FileTrash { .. } => "fileTrash",
            Self::FolderSubCreated { .. } => "folderSubCreated",
            Self::Other { event_type, .. } => event_type,
        }
    }

    /// True for `passwordChanged` however it was decoded, including a frame
    /// that only survived as [`SocketEvent::Other`].
    pub fn is_password_changed(&self) -> bool {
        match self {
            Self::PasswordChanged => true,
            Self::Other { event_type, .. } => event_type == "passwordChanged",
            _ => false,
        }
    }
}

/// Fan-out bus for socket events.
///
/// Each subscriber holds a `broadcast::Receiver`; dropping it unsubscribes.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SocketEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SocketEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event, returning the number of subscribers reached.
    pub fn publish(&self, event: SocketEvent) -> usize {
        // No subscribers is not an error for a push channel.
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
