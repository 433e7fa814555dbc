use std::sync::Arc;

use cirrus_core::session::{AuthFlag, Session};
use tokio::sync::watch;

/// Reactive inputs shared by the session background tasks.
#[derive(Clone)]
pub struct SessionContext {
    focus: watch::Receiver<bool>,
    location: watch::Receiver<String>,
    auth: Arc<AuthFlag>,
    public_link_markers: Vec<String>,
}

impl SessionContext {
    pub fn new(
        focus: watch::Receiver<bool>,
        location: watch::Receiver<String>,
        auth: Arc<AuthFlag>,
        public_link_markers: Vec<String>,
    ) -> Self {
        Self {
            focus,
            location,
            auth,
            public_link_markers,
        }
    }

    /// Whether the window currently has input focus.
    pub fn has_focus(&self) -> bool {
        *self.focus.borrow()
    }

    pub fn location(&self) -> String {
        self.location.borrow().clone()
    }

    pub fn auth(&self) -> &Arc<AuthFlag> {
        &self.auth
    }

    /// Current session snapshot, reading the authenticated flag from storage.
    pub async fn session(&self) -> Session {
        let authenticated = self.auth.is_authenticated().await;
        let location = self.location();
        Session::new(authenticated, &location, &self.public_link_markers)
    }
}
