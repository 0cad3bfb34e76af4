//! Common test utilities and fixtures.

#![allow(dead_code)]

use std::path::PathBuf;

use json_kv::KvStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

/// Struct value used by the store tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Person {
    pub name: String,
    pub age: u32,
}

impl Person {
    pub fn new(name: &str, age: u32) -> Self {
        Self {
            name: name.to_string(),
            age,
        }
    }
}

/// Temporary directory holding one backing file path.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> anyhow::Result<Self> {
        init_logging();
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// Path of the backing file. The file itself is not created.
    pub fn store_path(&self) -> PathBuf {
        self.dir.path().join("store.json")
    }

    /// Open (or reopen) the store in this directory.
    pub fn open<T: Serialize + DeserializeOwned>(&self) -> anyhow::Result<KvStore<T>> {
        Ok(KvStore::open(self.store_path())?)
    }

    /// Parsed contents of the backing file.
    pub fn document(&self) -> anyhow::Result<serde_json::Value> {
        let bytes = std::fs::read(self.store_path())?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Install a test subscriber when the `logging` feature is enabled.
/// Run with `RUST_LOG=json_kv=trace` to see store activity.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Sort a key snapshot, since the store does not order keys.
pub fn sorted(mut keys: Vec<String>) -> Vec<String> {
    keys.sort();
    keys
}
