//! Convenient re-exports for common usage patterns.
//!
//! ```ignore
//! use json_kv::prelude::*;
//!
//! let store: KvStore<u32> = KvStore::open("scores.json")?;
//! store.set("alice", &10)?;
//! ```

pub use crate::kv::{Codec, EncodedValue, JsonCodec, KvError, KvStore, KvStoreBuilder, StoreOptions};
