//! Store configuration.

use serde::Deserialize;

/// Default suffix appended to the backing path for the staging file.
pub const DEFAULT_TEMP_SUFFIX: &str = ".tmp";

/// Default permissions for files created by the store (`rw-r--r--`).
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Options controlling how a store writes its backing file.
///
/// Every field has a default, so the struct can be embedded in an
/// application's own configuration and only the overridden keys given:
///
/// ```ignore
/// #[derive(Deserialize)]
/// struct AppConfig {
///     #[serde(default)]
///     store: json_kv::StoreOptions,
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Pretty-print the document on persist.
    pub pretty: bool,
    /// `fsync` the staging file before renaming it over the backing file.
    pub sync: bool,
    /// Suffix appended to the backing path to form the staging path.
    pub temp_suffix: String,
    /// Permission bits for newly created files. Ignored on non-Unix targets.
    pub file_mode: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            sync: false,
            temp_suffix: DEFAULT_TEMP_SUFFIX.to_string(),
            file_mode: DEFAULT_FILE_MODE,
        }
    }
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Set the staging file suffix. An empty suffix falls back to the default,
    /// since staging onto the backing path itself would defeat the rename.
    pub fn temp_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.temp_suffix = suffix.into();
        self
    }

    pub fn file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }

    pub(crate) fn effective_temp_suffix(&self) -> &str {
        if self.temp_suffix.is_empty() {
            DEFAULT_TEMP_SUFFIX
        } else {
            &self.temp_suffix
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = StoreOptions::default();
        assert!(options.pretty);
        assert!(!options.sync);
        assert_eq!(options.temp_suffix, ".tmp");
        assert_eq!(options.file_mode, 0o644);
    }

    #[test]
    fn test_parse_partial_config() {
        let options: StoreOptions = serde_json::from_str(r#"{"sync": true}"#).unwrap();
        assert_eq!(options, StoreOptions::new().sync(true));

        let options: StoreOptions =
            serde_json::from_str(r#"{"pretty": false, "temp_suffix": ".staging", "file_mode": 384}"#)
                .unwrap();
        assert!(!options.pretty);
        assert_eq!(options.temp_suffix, ".staging");
        assert_eq!(options.file_mode, 0o600);
    }

    #[test]
    fn test_empty_suffix_falls_back() {
        let options = StoreOptions::new().temp_suffix("");
        assert_eq!(options.effective_temp_suffix(), ".tmp");
        let options = StoreOptions::new().temp_suffix(".next");
        assert_eq!(options.effective_temp_suffix(), ".next");
    }
}
