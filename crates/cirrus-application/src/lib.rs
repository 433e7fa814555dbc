pub mod activity;
pub mod bootstrap;
pub mod cache;
pub mod lifecycle;
pub mod logout;
pub mod shell;

#[cfg(test)]
mod test_support;

pub use activity::ActivityMonitor;
pub use bootstrap::{BootstrapGate, GateView, Initializer};
pub use cache::{PersistedQueryCache, QueryClient};
pub use lifecycle::SessionLifecycle;
pub use logout::{LogoutCoordinator, LogoutOutcome};
pub use shell::{Shell, ShellHandle, ShellPorts};
