//! Host platform ports: navigation, native restart, user notifications.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing one.
    pub replace: bool,
    pub reset_scroll: bool,
}

/// Browser-style navigation between views.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str, options: NavigateOptions) -> Result<()>;
}

/// Restart hook exposed by the native desktop wrapper.
#[async_trait]
pub trait NativeClient: Send + Sync {
    async fn restart(&self) -> Result<()>;
}

/// User-visible error notification (toast).
pub trait Notifier: Send + Sync {
    fn notify_error(&self, message: &str);
}

/// How the shell leaves the authenticated view.
///
/// Desktop and browser deployments are mutually exclusive: a desktop build
/// restarts the client, a browser build navigates to the login view.
#[derive(Clone)]
pub enum Deployment {
    Desktop(Arc<dyn NativeClient>),
    Browser(Arc<dyn Navigator>),
}

impl std::fmt::Debug for Deployment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Desktop(_) => f.write_str("Deployment::Desktop"),
            Self::Browser(_) => f.write_str("Deployment::Browser"),
        }
    }
}
