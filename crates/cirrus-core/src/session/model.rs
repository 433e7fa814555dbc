//! Session context as seen by the lifecycle components.

use serde::{Deserialize, Serialize};

/// Snapshot of the session context at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub authenticated: bool,
    /// Derived from the current location; see [`is_public_link`].
    pub is_inside_public_link: bool,
}

impl Session {
    pub fn new(authenticated: bool, location: &str, public_link_markers: &[String]) -> Self {
        Self {
            authenticated,
            is_inside_public_link: is_public_link(location, public_link_markers),
        }
    }

    /// Whether session background work (presence, probes) may run.
    pub fn is_active(&self) -> bool {
        self.authenticated && !self.is_inside_public_link
    }
}

/// Returns true when the path points into an unauthenticated public link.
pub fn is_public_link<S: AsRef<str>>(location: &str, markers: &[S]) -> bool {
    markers
        .iter()
        .any(|marker| location.contains(marker.as_ref()))
}
