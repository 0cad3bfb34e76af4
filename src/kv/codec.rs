//! Value encoding for store entries.
//!
//! Every entry is kept as an [`EncodedValue`]: a JSON fragment produced by the
//! store's [`Codec`] and embedded verbatim in the backing document. Entries are
//! only decoded when read.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// The encoded form of one stored value.
///
/// Serializes as the raw JSON it wraps, so a map of encoded values is written
/// as an ordinary JSON object.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedValue(Box<RawValue>);

impl EncodedValue {
    /// Wrap a JSON text, validating that it is a single JSON value.
    pub fn from_json(json: impl Into<String>) -> Result<Self, serde_json::Error> {
        RawValue::from_string(json.into()).map(Self)
    }

    /// The JSON text of this value.
    pub fn as_str(&self) -> &str {
        self.0.get()
    }

    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl PartialEq for EncodedValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for EncodedValue {}

impl fmt::Debug for EncodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EncodedValue").field(&self.as_str()).finish()
    }
}

impl fmt::Display for EncodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding strategy for the element type `T` of a store.
///
/// A store is bound to one codec when it is opened; every `set` goes through
/// [`Codec::encode`] and every `get` through [`Codec::decode`].
pub trait Codec<T> {
    type Error: std::error::Error + Send + Sync + 'static;

    fn encode(&self, value: &T) -> Result<EncodedValue, Self::Error>;

    fn decode(&self, encoded: &EncodedValue) -> Result<T, Self::Error>;
}

/// Standard serde JSON encoding. This is the default codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    type Error = serde_json::Error;

    /// Fails when the JSON form cannot be read back as `T`. serde_json writes
    /// non-finite floats as `null`, which would otherwise be stored and then
    /// rejected by every later `get`.
    fn encode(&self, value: &T) -> Result<EncodedValue, Self::Error> {
        let raw = serde_json::value::to_raw_value(value)?;
        serde_json::from_str::<T>(raw.get())?;
        Ok(EncodedValue(raw))
    }

    fn decode(&self, encoded: &EncodedValue) -> Result<T, Self::Error> {
        serde_json::from_str(encoded.as_str())
    }
}
