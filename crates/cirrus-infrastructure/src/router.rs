//! In-process history router backing the browser deployment.

use std::sync::{Arc, Mutex};

use cirrus_core::error::{CirrusError, Result};
use cirrus_core::platform::{NavigateOptions, Navigator};
use tokio::sync::watch;

/// Keeps a navigation history and publishes the current location.
///
/// The session context reads the location through the receiver returned by
/// [`HistoryRouter::subscribe`].
pub struct HistoryRouter {
    history: Mutex<Vec<String>>,
    location: watch::Sender<String>,
}

impl HistoryRouter {
    pub fn new(initial: impl Into<String>) -> Arc<Self> {
        let initial = initial.into();
        let (location, _) = watch::channel(initial.clone());
        Arc::new(Self {
            history: Mutex::new(vec![initial]),
            location,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.location.subscribe()
    }

    pub fn current(&self) -> String {
        self.location.borrow().clone()
    }

    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }
}

impl Navigator for HistoryRouter {
    fn navigate(&self, path: &str, options: NavigateOptions) -> Result<()> {
        if !path.starts_with('/') {
            return Err(CirrusError::Navigation(format!(
                "Route must be absolute: {}",
                path
            )));
        }

        {
            let mut history = self
                .history
                .lock()
                .map_err(|e| CirrusError::internal(format!("History lock poisoned: {}", e)))?;
            match history.last_mut() {
                Some(last) if options.replace => *last = path.to_string(),
                _ => history.push(path.to_string()),
            }
        }

        if options.reset_scroll {
            tracing::debug!("[Router] Scroll reset for {}", path);
        }
        self.location.send_replace(path.to_string());
        tracing::info!("[Router] Navigated to {}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_replace() {
        let router = HistoryRouter::new("/drive");
        let location = router.subscribe();

        router.navigate("/f/abc", NavigateOptions::default()).unwrap();
        assert_eq!(router.history(), vec!["/drive", "/f/abc"]);

        router
            .navigate(
                "/login",
                NavigateOptions {
                    replace: true,
                    reset_scroll: true,
                },
            )
            .unwrap();
        assert_eq!(router.history(), vec!["/drive", "/login"]);
        assert_eq!(*location.borrow(), "/login");
        assert_eq!(router.current(), "/login");
    }

    #[test]
    fn test_relative_route_rejected() {
        let router = HistoryRouter::new("/drive");
        let err = router.navigate("login", NavigateOptions::default()).unwrap_err();
        assert!(matches!(err, CirrusError::Navigation(_)));
        assert_eq!(router.history(), vec!["/drive"]);
    }
}
