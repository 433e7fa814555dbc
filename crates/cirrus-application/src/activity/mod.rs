//! Session activity module.
//!
//! - `context`: Reactive session inputs (focus, location, authenticated flag)
//! - `presence`: Throttled presence reporting
//! - `watchdog`: Self-rescheduling session validity probe
//! - `push_listener`: Forced logout on pushed invalidation events
//! - `monitor`: Mount/unmount of the three background tasks
//! - `task`: Cancellable spawned task handle

mod context;
mod monitor;
mod presence;
mod push_listener;
mod task;
mod watchdog;

pub use context::SessionContext;
pub use monitor::ActivityMonitor;
pub use presence::{PresenceReporter, TickOutcome};
pub use push_listener::PushInvalidationListener;
pub use task::ScheduledTask;
pub use watchdog::{ProbeOutcome, SessionWatchdog};
