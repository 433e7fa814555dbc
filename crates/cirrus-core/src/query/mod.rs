//! Query cache domain module.

mod key;
mod model;

pub use key::QueryKey;
pub use model::{
    CachedQuery, ExclusionSet, PersistedCacheEntry, RefetchPolicy, RefetchTrigger,
};
