use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, ValidationError};
use crate::store::{load_json, save_json, Clock, KeyValueStore, SystemClock};

pub const MAX_USERNAME_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionField {
    Username,
    Email,
}

impl SessionField {
    fn name(self) -> &'static str {
        match self {
            SessionField::Username => "username",
            SessionField::Email => "email",
        }
    }
}

pub fn session_key(chat_id: i64, field: SessionField) -> String {
    format!("{}:{}", chat_id, field.name())
}

pub fn validate_username(raw: &str) -> Result<String, ValidationError> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(ValidationError::EmptyUsername);
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ValidationError::UsernameTooLong {
            max: MAX_USERNAME_LEN,
        });
    }
    Ok(username.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Short-lived, expiring key-value pairs, kept in one JSON file.
pub struct SessionStore<C: Clock = SystemClock> {
    path: PathBuf,
    default_ttl: Duration,
    clock: C,
    entries: Mutex<BTreeMap<String, SessionEntry>>,
}

impl SessionStore<SystemClock> {
    pub fn open(path: impl Into<PathBuf>, default_ttl: Duration) -> Self {
        Self::with_clock(path, default_ttl, SystemClock)
    }
}

impl<C: Clock> SessionStore<C> {
    pub fn with_clock(path: impl Into<PathBuf>, default_ttl: Duration, clock: C) -> Self {
        let path = path.into();
        let entries: BTreeMap<String, SessionEntry> = load_json(&path);
        info!("Loaded {} session entries from {}", entries.len(), path.display());
        Self {
            path,
            default_ttl,
            clock,
            entries: Mutex::new(entries),
        }
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, SessionEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, entries: &mut BTreeMap<String, SessionEntry>) -> Result<(), StoreError> {
        let now = self.clock.now();
        entries.retain(|_, entry| entry.expires_at > now);
        save_json(&self.path, &*entries)
    }

    pub fn identify(&self, chat_id: i64, username: &str) -> Result<PlayerIdentity, StoreError> {
        self.set(&session_key(chat_id, SessionField::Username), username.to_string(), None)?;
        info!("Chat {} is now playing as {}", chat_id, username);
        Ok(PlayerIdentity {
            username: username.to_string(),
        })
    }

    pub fn current_player(&self, chat_id: i64) -> Option<PlayerIdentity> {
        self.get(&session_key(chat_id, SessionField::Username))
            .map(|username| PlayerIdentity { username })
    }

    /// Forgets who is playing in this chat. Recorded scores stay.
    pub fn logout(&self, chat_id: i64) -> Result<(), StoreError> {
        let mut entries = self.entries();
        entries.remove(&session_key(chat_id, SessionField::Username));
        entries.remove(&session_key(chat_id, SessionField::Email));
        self.persist(&mut entries)?;
        info!("Chat {} logged out", chat_id);
        Ok(())
    }
}

impl<C: Clock> KeyValueStore for SessionStore<C> {
    type Value = String;

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), StoreError> {
        let expires_at = self.clock.now() + ttl.unwrap_or(self.default_ttl);
        let mut entries = self.entries();
        entries.insert(key.to_string(), SessionEntry { value, expires_at });
        self.persist(&mut entries)?;
        debug!("Session key {} set until {}", key, expires_at);
        Ok(())
    }

    fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        self.entries()
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries();
        let removed = entries.remove(key).is_some();
        self.persist(&mut entries)?;
        Ok(removed)
    }
}
