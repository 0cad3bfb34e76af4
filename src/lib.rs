//! Typed key-value store persisted to a single JSON file.
//!
//! Each store holds values of one type under string keys. Values are encoded
//! individually and kept encoded in memory; they are decoded only when read.
//! Every mutation rewrites the backing file through a staging file and an
//! atomic rename, so the file on disk is always a complete document.
//!
//! # Quick Start
//!
//! ```ignore
//! use json_kv::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User { name: String, age: u32 }
//!
//! let store: KvStore<User> = KvStore::open("users.json")?;
//! store.set("user:42", &User { name: "Rainer".into(), age: 45 })?;
//! let user = store.get("user:42")?;
//! ```
//!
//! The backing file for the example above:
//!
//! ```json
//! {
//!   "user:42": {"name":"Rainer","age":45}
//! }
//! ```
//!
//! # Modules
//!
//! - [`kv`] - The store, its codec strategy, options and errors
//! - [`prelude`] - Common re-exports
//!
//! # Feature Flags
//!
//! - `logging` - Enable library-level tracing (consumers provide their own subscriber)

mod logging;
pub mod kv;
pub mod prelude;

pub use kv::{
    BoxError, Codec, DEFAULT_FILE_MODE, DEFAULT_TEMP_SUFFIX, EncodedValue, JsonCodec, KvError,
    KvStore, KvStoreBuilder, Result, StoreOptions,
};
