use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::presence::PresenceReporter;
use super::push_listener::PushInvalidationListener;
use super::task::ScheduledTask;
use super::watchdog::SessionWatchdog;

struct MountedTasks {
    presence: ScheduledTask,
    watchdog: ScheduledTask,
    push: ScheduledTask,
}

/// Owns the session background tasks for the lifetime of the authenticated
/// view: presence ticks, watchdog probes and the push listener.
pub struct ActivityMonitor {
    presence: Arc<PresenceReporter>,
    watchdog: Arc<SessionWatchdog>,
    push: Arc<PushInvalidationListener>,
    presence_tick: Duration,
    mounted: Mutex<Option<MountedTasks>>,
}

impl ActivityMonitor {
    pub fn new(
        presence: Arc<PresenceReporter>,
        watchdog: Arc<SessionWatchdog>,
        push: Arc<PushInvalidationListener>,
        presence_tick: Duration,
    ) -> Self {
        Self {
            presence,
            watchdog,
            push,
            presence_tick,
            mounted: Mutex::new(None),
        }
    }

    /// Starts all session tasks. Returns false if they are already running,
    /// so repeated mounts never duplicate timers or subscriptions.
    pub fn mount(&self) -> bool {
        let mut mounted = self.lock_mounted();
        if mounted.is_some() {
            return false;
        }

        self.presence.reset();
        let events = self.push.subscribe();
        let presence = Arc::clone(&self.presence);
        let watchdog = Arc::clone(&self.watchdog);
        let push = Arc::clone(&self.push);
        let tick = self.presence_tick;

        *mounted = Some(MountedTasks {
            presence: ScheduledTask::spawn("presence", move |cancel| presence.run(tick, cancel)),
            watchdog: ScheduledTask::spawn("watchdog", move |cancel| watchdog.run(cancel)),
            push: ScheduledTask::spawn("push-listener", move |cancel| push.run(events, cancel)),
        });
        tracing::info!("[Activity] Mounted");
        true
    }

    /// Stops all session tasks and waits for them to finish. Returns false
    /// if nothing was mounted.
    pub async fn unmount(&self) -> bool {
        let Some(tasks) = self.lock_mounted().take() else {
            return false;
        };
        tasks.presence.shutdown().await;
        tasks.watchdog.shutdown().await;
        tasks.push.shutdown().await;
        tracing::info!("[Activity] Unmounted");
        true
    }

    pub fn is_mounted(&self) -> bool {
        self.lock_mounted().is_some()
    }

    fn lock_mounted(&self) -> std::sync::MutexGuard<'_, Option<MountedTasks>> {
        self.mounted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
