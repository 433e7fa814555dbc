//! Query cache: in-memory client plus durable persistence.

mod persister;
mod query_client;

pub use persister::{PersistReport, PersistedQueryCache, RestorePhase};
pub use query_client::{QueryClient, QueryDefaults};
