use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::Duration;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::{load_json, save_json, KeyValueStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub username: String,
    pub score: u32,
}

/// Durable username -> score mapping, one entry per username.
///
/// Every mutation re-reads the file, applies the change and writes the whole
/// collection back while holding the lock, so concurrent writers in this
/// process never lose each other's updates.
pub struct ScoreLedger {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ScoreLedger {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load(&self) -> Vec<ScoreEntry> {
        load_json(&self.path)
    }

    /// Replaces the score of `username`, or appends a new entry.
    pub fn record_score(&self, username: &str, score: u32) -> Result<(), StoreError> {
        let _guard = self.guard();
        let mut entries = self.load();
        match entries.iter_mut().find(|entry| entry.username == username) {
            Some(entry) => entry.score = score,
            None => entries.push(ScoreEntry {
                username: username.to_string(),
                score,
            }),
        }
        save_json(&self.path, &entries)?;
        info!("Recorded score {} for {}", score, username);
        Ok(())
    }

    /// Entries in the order they were first recorded.
    pub fn list_scores(&self) -> Vec<ScoreEntry> {
        let _guard = self.guard();
        self.load()
    }
}

impl KeyValueStore for ScoreLedger {
    type Value = u32;

    // Ledger entries never expire; the ttl is ignored.
    fn set(&self, key: &str, value: u32, _ttl: Option<Duration>) -> Result<(), StoreError> {
        self.record_score(key, value)
    }

    fn get(&self, key: &str) -> Option<u32> {
        self.list_scores()
            .into_iter()
            .find(|entry| entry.username == key)
            .map(|entry| entry.score)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let _guard = self.guard();
        let mut entries = self.load();
        let before = entries.len();
        entries.retain(|entry| entry.username != key);
        if entries.len() == before {
            return Ok(false);
        }
        save_json(&self.path, &entries)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn temp_ledger() -> (ScoreLedger, PathBuf) {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "trivia_bot_ledger_{}_{}.json",
            std::process::id(),
            id
        ));
        let _ = std::fs::remove_file(&path);
        (ScoreLedger::open(&path), path)
    }

    fn entry(username: &str, score: u32) -> ScoreEntry {
        ScoreEntry {
            username: username.to_string(),
            score,
        }
    }

    #[test]
    fn missing_file_is_an_empty_ledger() {
        let (ledger, _) = temp_ledger();
        assert!(ledger.list_scores().is_empty());
        assert_eq!(ledger.get("alice"), None);
    }

    #[test]
    fn recording_twice_keeps_one_entry() {
        let (ledger, _) = temp_ledger();
        ledger.record_score("alice", 5).unwrap();
        ledger.record_score("alice", 5).unwrap();
        assert_eq!(ledger.list_scores(), vec![entry("alice", 5)]);
    }

    #[test]
    fn later_score_replaces_earlier_one_in_place() {
        let (ledger, _) = temp_ledger();
        ledger.record_score("alice", 3).unwrap();
        ledger.record_score("bob", 1).unwrap();
        ledger.record_score("alice", 7).unwrap();
        assert_eq!(ledger.list_scores(), vec![entry("alice", 7), entry("bob", 1)]);
    }

    #[test]
    fn scores_survive_reopening() {
        let (ledger, path) = temp_ledger();
        ledger.set("carol", 9, Some(Duration::seconds(1))).unwrap();
        drop(ledger);

        let reopened = ScoreLedger::open(&path);
        assert_eq!(reopened.get("carol"), Some(9));
    }

    #[test]
    fn delete_removes_only_that_player() {
        let (ledger, _) = temp_ledger();
        ledger.record_score("alice", 2).unwrap();
        ledger.record_score("bob", 4).unwrap();
        assert!(ledger.delete("alice").unwrap());
        assert!(!ledger.delete("alice").unwrap());
        assert_eq!(ledger.list_scores(), vec![entry("bob", 4)]);
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let (ledger, path) = temp_ledger();
        std::fs::write(&path, "[{\"username\": 12").unwrap();
        assert!(ledger.list_scores().is_empty());
        ledger.record_score("dave", 3).unwrap();
        assert_eq!(ledger.list_scores(), vec![entry("dave", 3)]);
    }

    #[test]
    fn concurrent_writers_do_not_lose_updates() {
        let (ledger, _) = temp_ledger();
        let ledger = Arc::new(ledger);
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    ledger.record_score(&format!("player{}", i), i).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let mut names: Vec<_> = ledger.list_scores().into_iter().map(|e| e.username).collect();
        names.sort();
        assert_eq!(names.len(), 8);
        names.dedup();
        assert_eq!(names.len(), 8);
    }
}
