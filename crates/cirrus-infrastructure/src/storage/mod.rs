//! Key-value store implementations.

mod json_dir_store;
mod memory_store;

pub use json_dir_store::JsonDirStore;
pub use memory_store::InMemoryStore;
