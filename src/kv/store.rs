//! KV Store implementation backed by a single JSON file.

use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::logging::{debug, info, trace, warn};

use super::codec::{Codec, EncodedValue, JsonCodec};
use super::error::KvError;
use super::file::{self, Entries};
use super::options::StoreOptions;

/// Typed key-value store persisted to one file.
///
/// Holds every entry in memory in encoded form and rewrites the whole backing
/// file on each mutation. Reads take a shared lock; `set`, `delete` and `clear`
/// hold the exclusive lock until the new document has been renamed into place.
///
/// Only one store per backing file is supported; other writers to the same
/// path, in this process or another, can lose updates.
pub struct KvStore<T, C = JsonCodec> {
    path: PathBuf,
    options: StoreOptions,
    codec: C,
    entries: RwLock<Entries>,
    _marker: PhantomData<fn() -> T>,
}

/// Builder for opening a [`KvStore`] with custom options or a custom codec.
///
/// ```ignore
/// use json_kv::KvStore;
///
/// let store: KvStore<u64> = KvStore::builder("counters.json")
///     .pretty(false)
///     .sync(true)
///     .open()?;
/// ```
pub struct KvStoreBuilder<T, C = JsonCodec> {
    path: PathBuf,
    options: StoreOptions,
    codec: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C> KvStoreBuilder<T, C>
where
    C: Codec<T>,
{
    /// Replace all options at once.
    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.options.pretty = pretty;
        self
    }

    pub fn sync(mut self, sync: bool) -> Self {
        self.options.sync = sync;
        self
    }

    pub fn temp_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.options.temp_suffix = suffix.into();
        self
    }

    pub fn file_mode(mut self, mode: u32) -> Self {
        self.options.file_mode = mode;
        self
    }

    /// Use a different codec for the element type.
    pub fn codec<D: Codec<T>>(self, codec: D) -> KvStoreBuilder<T, D> {
        KvStoreBuilder {
            path: self.path,
            options: self.options,
            codec,
            _marker: PhantomData,
        }
    }

    /// Open the store, creating the backing file if needed.
    pub fn open(self) -> Result<KvStore<T, C>, KvError> {
        KvStore::open_with(self.path, self.options, self.codec)
    }
}

impl<T> KvStore<T, JsonCodec>
where
    T: Serialize + DeserializeOwned,
{
    /// Open a store at `path` with default options and JSON encoding.
    ///
    /// Creates the file containing `{}` if it does not exist. A zero-length
    /// file is treated as an empty store. Any other content must be a JSON
    /// object, otherwise [`KvError::Decode`] is returned.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KvError> {
        Self::open_with(path, StoreOptions::default(), JsonCodec)
    }

    /// Start building a store at `path`.
    pub fn builder(path: impl AsRef<Path>) -> KvStoreBuilder<T, JsonCodec> {
        KvStoreBuilder {
            path: path.as_ref().to_path_buf(),
            options: StoreOptions::default(),
            codec: JsonCodec,
            _marker: PhantomData,
        }
    }
}

impl<T, C> KvStore<T, C>
where
    C: Codec<T>,
{
    /// Open a store at `path` with explicit options and codec.
    pub fn open_with(
        path: impl AsRef<Path>,
        options: StoreOptions,
        codec: C,
    ) -> Result<Self, KvError> {
        let path = path.as_ref().to_path_buf();
        let entries = file::load(&path, &options)?;
        info!(path = %path.display(), keys = entries.len(), "opened store");

        Ok(Self {
            path,
            options,
            codec,
            entries: RwLock::new(entries),
            _marker: PhantomData,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Staging path used while persisting. Its presence after a crash means a
    /// write was interrupted before commit.
    pub fn temp_path(&self) -> PathBuf {
        file::temp_path(&self.path, &self.options)
    }

    /// Store `value` under `key` and persist.
    ///
    /// The value is encoded before anything is touched; an encode failure
    /// leaves the store unchanged. If persisting fails the new value stays in
    /// memory and will be written by the next successful mutation.
    pub fn set(&self, key: &str, value: &T) -> Result<(), KvError> {
        let encoded = self
            .codec
            .encode(value)
            .map_err(|e| KvError::encode(key, e))?;
        trace!(key, bytes = encoded.len(), "set");

        let mut entries = self.write_entries();
        entries.insert(key.to_string(), encoded);
        self.persist(&entries)
    }

    /// Decode the value stored under `key`.
    pub fn get(&self, key: &str) -> Result<T, KvError> {
        let encoded = self
            .get_raw(key)
            .ok_or_else(|| KvError::KeyNotFound(key.to_string()))?;
        trace!(key, "get");

        self.codec
            .decode(&encoded)
            .map_err(|e| KvError::decode_entry(key, e))
    }

    /// The encoded form of the value under `key`, without decoding it.
    pub fn get_raw(&self, key: &str) -> Option<EncodedValue> {
        self.read_entries().get(key).cloned()
    }

    /// Remove `key` and persist. Removing an absent key is not an error and
    /// still rewrites the file.
    pub fn delete(&self, key: &str) -> Result<(), KvError> {
        let mut entries = self.write_entries();
        if entries.remove(key).is_some() {
            debug!(key, "removed entry");
        }
        self.persist(&entries)
    }

    /// Remove every entry and persist an empty document.
    pub fn clear(&self) -> Result<(), KvError> {
        let mut entries = self.write_entries();
        entries.clear();
        self.persist(&entries)
    }

    /// Snapshot of all keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.read_entries().keys().cloned().collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.read_entries().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }

    // Helper methods

    fn persist(&self, entries: &Entries) -> Result<(), KvError> {
        file::persist(&self.path, entries, &self.options).inspect_err(|_e| {
            warn!(
                path = %self.path.display(),
                error = %_e,
                "persist failed; memory is ahead of disk"
            );
        })
    }

    // A panic while the write lock is held can only come from inside persist,
    // after the map was updated, so the map itself is always usable.
    fn read_entries(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(|poisoned| {
            warn!(path = %self.path.display(), "recovering poisoned store lock");
            poisoned.into_inner()
        })
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!(path = %self.path.display(), "recovering poisoned store lock");
            poisoned.into_inner()
        })
    }
}

impl<T, C: fmt::Debug> fmt::Debug for KvStore<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = self
            .entries
            .read()
            .map(|entries| entries.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len());
        f.debug_struct("KvStore")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("codec", &self.codec)
            .field("keys", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Stores integers as JSON strings.
    #[derive(Debug, Default)]
    struct DecimalStringCodec;

    impl Codec<u64> for DecimalStringCodec {
        type Error = serde_json::Error;

        fn encode(&self, value: &u64) -> Result<EncodedValue, Self::Error> {
            EncodedValue::from_json(serde_json::to_string(&value.to_string())?)
        }

        fn decode(&self, encoded: &EncodedValue) -> Result<u64, Self::Error> {
            let text: String = serde_json::from_str(encoded.as_str())?;
            text.parse::<u64>()
                .map_err(|e| serde::de::Error::custom(e.to_string()))
        }
    }

    fn temp_store<T: Serialize + DeserializeOwned>() -> (TempDir, KvStore<T>) {
        let dir = TempDir::new().unwrap();
        let store = KvStore::open(dir.path().join("store.json")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_set_get() {
        let (_dir, store) = temp_store::<i32>();
        store.set("eldenlord", &1).unwrap();
        assert_eq!(store.get("eldenlord").unwrap(), 1);
        assert!(store.contains_key("eldenlord"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_overwrite() {
        let (_dir, store) = temp_store::<String>();
        store.set("k", &"first".to_string()).unwrap();
        store.set("k", &"second".to_string()).unwrap();
        assert_eq!(store.get("k").unwrap(), "second");
        assert_eq!(store.keys(), vec!["k".to_string()]);
    }

    #[test]
    fn test_empty_key_is_valid() {
        let (_dir, store) = temp_store::<bool>();
        store.set("", &true).unwrap();
        assert!(store.get("").unwrap());
    }

    #[test]
    fn test_get_missing() {
        let (_dir, store) = temp_store::<i32>();
        let err = store.get("nope").unwrap_err();
        assert!(err.is_not_found());
        assert!(store.get_raw("nope").is_none());
    }

    #[test]
    fn test_get_raw_is_encoded_form() {
        let (_dir, store) = temp_store::<Vec<u8>>();
        store.set("bytes", &vec![1, 2, 3]).unwrap();
        assert_eq!(store.get_raw("bytes").unwrap().as_str(), "[1,2,3]");
    }

    #[test]
    fn test_clear() {
        let (_dir, store) = temp_store::<i32>();
        store.set("a", &1).unwrap();
        store.set("b", &2).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());

        let contents = fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents.trim(), "{}");
    }

    #[test]
    fn test_custom_codec() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");

        let store: KvStore<u64, DecimalStringCodec> = KvStore::builder(&path)
            .pretty(false)
            .codec(DecimalStringCodec)
            .open()
            .unwrap();
        store.set("big", &u64::MAX).unwrap();
        assert_eq!(store.get("big").unwrap(), u64::MAX);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, r#"{"big":"18446744073709551615"}"#);
    }

    #[test]
    fn test_builder_options_are_kept() {
        let dir = TempDir::new().unwrap();
        let store: KvStore<i32> = KvStore::builder(dir.path().join("s.json"))
            .sync(true)
            .temp_suffix(".staging")
            .open()
            .unwrap();
        assert!(store.options().sync);
        assert_eq!(store.temp_path(), dir.path().join("s.json.staging"));
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let (_dir, store) = temp_store::<i32>();
        store.set("a", &1).unwrap();

        let poisoner = std::thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _guard = store.entries.write();
                    panic!("poison the store lock");
                })
                .join()
        });
        assert!(poisoner.is_err());
        assert!(store.entries.is_poisoned());

        store.set("b", &2).unwrap();
        store.delete("a").unwrap();
        assert_eq!(store.get("b").unwrap(), 2);
        assert_eq!(store.keys(), vec!["b".to_string()]);

        let reopened: KvStore<i32> = KvStore::open(store.path()).unwrap();
        assert_eq!(reopened.get("b").unwrap(), 2);
    }

    #[test]
    fn test_debug_shows_key_count() {
        let (_dir, store) = temp_store::<i32>();
        store.set("a", &1).unwrap();
        let debug = format!("{:?}", store);
        assert!(debug.contains("keys: 1"), "{debug}");
    }
}
