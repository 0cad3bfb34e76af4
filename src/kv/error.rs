//! Error types for the KV store module.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Boxed error produced by a [`Codec`](super::Codec) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during KV store operations.
#[derive(Error, Debug)]
pub enum KvError {
    /// Creating, reading, writing or renaming a file failed.
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The backing file (`key` is `None`) or a single entry could not be
    /// parsed into the expected shape.
    #[error("Failed to decode {}: {source}", decode_target(.key.as_deref()))]
    Decode {
        key: Option<String>,
        #[source]
        source: BoxError,
    },

    /// A value passed to `set` could not be encoded. Nothing was modified.
    #[error("Failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("Key not found: {0}")]
    KeyNotFound(String),
}

/// A [`Result`] type alias using [`KvError`].
pub type Result<T, E = KvError> = std::result::Result<T, E>;

fn decode_target(key: Option<&str>) -> String {
    match key {
        Some(key) => format!("entry '{}'", key),
        None => "backing file".to_string(),
    }
}

impl KvError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn decode_file(source: impl Into<BoxError>) -> Self {
        Self::Decode {
            key: None,
            source: source.into(),
        }
    }

    pub(crate) fn decode_entry(key: &str, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            key: Some(key.to_string()),
            source: source.into(),
        }
    }

    pub(crate) fn encode(key: &str, source: impl Into<BoxError>) -> Self {
        Self::Encode {
            key: key.to_string(),
            source: source.into(),
        }
    }

    /// Returns `true` if this is a missing-key error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_))
    }

    /// Returns `true` if this is an I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns `true` if this is a decode error.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Returns `true` if this is an encode error.
    pub fn is_encode(&self) -> bool {
        matches!(self, Self::Encode { .. })
    }
}
