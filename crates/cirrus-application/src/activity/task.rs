use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A spawned background task that stops when cancelled or dropped.
///
/// Cancellation is cooperative: the task body receives the token and is
/// expected to `select!` on it at every suspension point it owns.
pub struct ScheduledTask {
    name: &'static str,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    pub fn spawn<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(body(cancel.clone()));
        tracing::debug!("[Task] Spawned {}", name);
        Self {
            name,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancels the task and waits for it to wind down.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
            && e.is_panic()
        {
            tracing::error!("[Task] {} panicked: {}", self.name, e);
        }
        tracing::debug!("[Task] Stopped {}", self.name);
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_loop() {
        let task = ScheduledTask::spawn("looper", |cancel| async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                }
            }
        });
        assert_eq!(task.name(), "looper");
        assert!(!task.is_finished());
        task.shutdown().await;
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let task = ScheduledTask::spawn("dropper", |cancel| async move {
            cancel.cancelled().await;
            let _ = tx.send(());
        });
        drop(task);
        assert!(rx.await.is_ok());
    }
}
