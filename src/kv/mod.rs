//! Key-value store module.
//!
//! A [`KvStore`] keeps every entry in memory as an [`EncodedValue`] and writes
//! the whole mapping to a single JSON file on each mutation, using a staging
//! file and an atomic rename.

mod codec;
mod error;
mod file;
mod options;
mod store;

pub use codec::{Codec, EncodedValue, JsonCodec};
pub use error::{BoxError, KvError, Result};
pub use options::{DEFAULT_FILE_MODE, DEFAULT_TEMP_SUFFIX, StoreOptions};
pub use store::{KvStore, KvStoreBuilder};
