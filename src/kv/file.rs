//! Backing file protocol: load-or-initialize and atomic persist.
//!
//! The document is a single JSON object mapping each key to its encoded value.
//! Persisting writes the whole document to a staging path next to the backing
//! file and renames it into place; the rename is the only commit point, so a
//! crash mid-write leaves the previous document intact.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::logging::{debug, warn};

use super::codec::EncodedValue;
use super::error::KvError;
use super::options::StoreOptions;

/// In-memory form of the backing document.
pub(crate) type Entries = HashMap<String, EncodedValue>;

/// Content written for a store with no entries.
const EMPTY_DOCUMENT: &[u8] = b"{}";

/// Staging path for `path`: the backing path with the suffix appended.
pub(crate) fn temp_path(path: &Path, options: &StoreOptions) -> PathBuf {
    let mut staged: OsString = path.as_os_str().to_owned();
    staged.push(options.effective_temp_suffix());
    PathBuf::from(staged)
}

/// Read the backing file into memory, creating it if it does not exist.
///
/// A zero-length file is an empty store and is left as is. Entries are not
/// decoded beyond checking that each one is well-formed JSON.
pub(crate) fn load(path: &Path, options: &StoreOptions) -> Result<Entries, KvError> {
    let staged = temp_path(path, options);
    if staged.exists() {
        warn!(
            path = %staged.display(),
            "staging file found; a previous write was interrupted"
        );
    }

    match fs::read(path) {
        Ok(bytes) if bytes.is_empty() => {
            debug!(path = %path.display(), "backing file is empty");
            Ok(Entries::new())
        }
        Ok(bytes) => {
            let entries: Entries = serde_json::from_slice(&bytes).map_err(KvError::decode_file)?;
            debug!(path = %path.display(), keys = entries.len(), "loaded backing file");
            Ok(entries)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            write_file(path, EMPTY_DOCUMENT, options).map_err(|e| KvError::io(path, e))?;
            debug!(path = %path.display(), "created backing file");
            Ok(Entries::new())
        }
        Err(e) => Err(KvError::io(path, e)),
    }
}

/// Commit the full mapping: write the staging file, then rename it over `path`.
pub(crate) fn persist(
    path: &Path,
    entries: &Entries,
    options: &StoreOptions,
) -> Result<(), KvError> {
    // Keys are strings and every value is already-valid raw JSON, so
    // serializing the document cannot fail; an error here would be a
    // serde_json bug, surfaced as an I/O failure on the backing path.
    let bytes = if options.pretty {
        serde_json::to_vec_pretty(entries)
    } else {
        serde_json::to_vec(entries)
    }
    .map_err(|e| KvError::io(path, e.into()))?;

    let staged = temp_path(path, options);
    write_file(&staged, &bytes, options).map_err(|e| KvError::io(&staged, e))?;
    fs::rename(&staged, path).map_err(|e| KvError::io(path, e))?;

    debug!(
        path = %path.display(),
        keys = entries.len(),
        bytes = bytes.len(),
        "persisted backing file"
    );
    Ok(())
}

fn write_file(path: &Path, contents: &[u8], options: &StoreOptions) -> io::Result<()> {
    let mut open = OpenOptions::new();
    open.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        open.mode(options.file_mode);
    }

    let mut file = open.open(path)?;
    file.write_all(contents)?;
    if options.sync {
        file.sync_all()?;
    }
    Ok(())
}
