pub mod ledger;
pub mod session;

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// Common surface of the session store and the score ledger.
pub trait KeyValueStore {
    type Value;

    /// `ttl` of `None` means the store's default lifetime.
    fn set(&self, key: &str, value: Self::Value, ttl: Option<Duration>) -> Result<(), StoreError>;
    fn get(&self, key: &str) -> Option<Self::Value>;
    /// Returns whether something was removed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Reads a whole JSON document. A missing or unreadable file counts as empty.
fn load_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return T::default(),
        Err(err) => {
            warn!("Could not read {}, starting empty: {}", path.display(), err);
            return T::default();
        }
    };
    if contents.trim().is_empty() {
        return T::default();
    }
    serde_json::from_str(&contents).unwrap_or_else(|err| {
        warn!("Corrupt data in {}, starting empty: {}", path.display(), err);
        T::default()
    })
}

/// Replaces the file with the full serialized `value`.
fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = temp_file_for(path);
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// `scores` and `scores.json` get different temp files.
fn temp_file_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
