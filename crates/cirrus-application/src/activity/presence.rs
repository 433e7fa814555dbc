//! Presence reporting.
//!
//! Tells the backend the session is in use, at most once per throttle window
//! and never with two reports in flight.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use cirrus_core::backend::PresenceApi;
use cirrus_core::sync::SingleSlot;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::context::SessionContext;

/// Result of a single presence tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Reported,
    /// Not authenticated, or inside a public link.
    Inactive,
    Unfocused,
    Throttled,
    /// A previous report has not settled yet.
    InFlight,
    /// The report failed; it is not retried before the next tick.
    Failed,
}

pub struct PresenceReporter {
    context: SessionContext,
    api: Arc<dyn PresenceApi>,
    throttle: Duration,
    next_allowed_at: Mutex<Option<Instant>>,
    in_flight: SingleSlot,
}

impl PresenceReporter {
    pub fn new(context: SessionContext, api: Arc<dyn PresenceApi>, throttle: Duration) -> Self {
        Self {
            context,
            api,
            throttle,
            next_allowed_at: Mutex::new(None),
            in_flight: SingleSlot::new(),
        }
    }

    /// Forgets the throttle window so the next eligible tick reports.
    pub fn reset(&self) {
        *self.next_allowed() = None;
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_held()
    }

    /// Attempts one presence report if every guard allows it.
    pub async fn tick(&self) -> TickOutcome {
        if !self.context.session().await.is_active() {
            return TickOutcome::Inactive;
        }

        let now = Instant::now();
        if !self.context.has_focus() {
            return TickOutcome::Unfocused;
        }
        if let Some(next) = *self.next_allowed()
            && now < next
        {
            return TickOutcome::Throttled;
        }
        let Some(_guard) = self.in_flight.try_acquire() else {
            return TickOutcome::InFlight;
        };

        match self.api.report_presence(Utc::now()).await {
            Ok(()) => {
                *self.next_allowed() = Some(now + self.throttle);
                tracing::debug!("[Presence] Reported; next in {:?}", self.throttle);
                TickOutcome::Reported
            }
            Err(e) => {
                tracing::error!("[Presence] Report failed: {}", e);
                TickOutcome::Failed
            }
        }
    }

    /// Ticks every `period` until cancelled.
    ///
    /// Each tick runs as its own task so a slow report does not delay the
    /// timer; overlapping ticks are turned away by the in-flight slot.
    pub async fn run(self: Arc<Self>, period: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempts = JoinSet::new();
        tracing::info!("[Presence] Started ({:?} tick)", period);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    while attempts.try_join_next().is_some() {}
                    let reporter = Arc::clone(&self);
                    attempts.spawn(async move { reporter.tick().await });
                }
            }
        }

        attempts.abort_all();
        tracing::info!("[Presence] Stopped");
    }

    fn next_allowed(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.next_allowed_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ContextHarness, MockPresenceApi};

    const THROTTLE: Duration = Duration::from_secs(15);

    async fn reporter() -> (ContextHarness, Arc<MockPresenceApi>, Arc<PresenceReporter>) {
        let harness = ContextHarness::signed_in().await;
        let api = Arc::new(MockPresenceApi::default());
        let reporter = Arc::new(PresenceReporter::new(
            harness.context.clone(),
            api.clone(),
            THROTTLE,
        ));
        (harness, api, reporter)
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttles_within_window() {
        let (_harness, api, reporter) = reporter().await;

        assert_eq!(reporter.tick().await, TickOutcome::Reported);
        for _ in 0..14 {
            tokio::time::advance(Duration::from_secs(1)).await;
            assert_eq!(reporter.tick().await, TickOutcome::Throttled);
        }
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(reporter.tick().await, TickOutcome::Reported);
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_advance_window() {
        let (_harness, api, reporter) = reporter().await;
        api.set_fail(true);

        assert_eq!(reporter.tick().await, TickOutcome::Failed);
        assert!(!reporter.is_in_flight());

        api.set_fail(false);
        assert_eq!(reporter.tick().await, TickOutcome::Reported);
        assert_eq!(api.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_overlapping_reports() {
        let (_harness, api, reporter) = reporter().await;
        api.set_latency(Duration::from_secs(5));

        let slow = tokio::spawn({
            let reporter = reporter.clone();
            async move { reporter.tick().await }
        });
        while !reporter.is_in_flight() {
            tokio::task::yield_now().await;
        }

        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(1)).await;
            assert_eq!(reporter.tick().await, TickOutcome::InFlight);
        }

        assert_eq!(slow.await.unwrap(), TickOutcome::Reported);
        assert_eq!(api.call_count(), 1);
        assert!(!reporter.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_guards_on_session_context() {
        let (harness, api, reporter) = reporter().await;

        harness.focus.send_replace(false);
        assert_eq!(reporter.tick().await, TickOutcome::Unfocused);
        harness.focus.send_replace(true);

        harness.location.send_replace("/f/abc#key".to_string());
        assert_eq!(reporter.tick().await, TickOutcome::Inactive);
        harness.location.send_replace("/share/d/xyz".to_string());
        assert_eq!(reporter.tick().await, TickOutcome::Inactive);
        harness.location.send_replace("/drive".to_string());

        harness.auth.set_authenticated(false).await.unwrap();
        assert_eq!(reporter.tick().await, TickOutcome::Inactive);

        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reports_once_per_window() {
        let (_harness, api, reporter) = reporter().await;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(reporter.clone().run(Duration::from_secs(1), cancel.clone()));

        // First tick lands at t=1s, the throttle re-opens at t=16s.
        tokio::time::sleep(Duration::from_millis(15_500)).await;
        assert_eq!(api.call_count(), 1);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(api.call_count(), 2);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_reopens_window() {
        let (_harness, _api, reporter) = reporter().await;
        assert_eq!(reporter.tick().await, TickOutcome::Reported);
        assert_eq!(reporter.tick().await, TickOutcome::Throttled);
        reporter.reset();
        assert_eq!(reporter.tick().await, TickOutcome::Reported);
    }
}
