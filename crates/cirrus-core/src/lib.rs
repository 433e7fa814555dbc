pub mod backend;
pub mod config;
pub mod error;
pub mod event;
pub mod platform;
pub mod query;
pub mod session;
pub mod storage;
pub mod sync;

// Re-export common error type
pub use error::{CirrusError, Result};
