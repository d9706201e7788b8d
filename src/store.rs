//! Persistent user store
//!
//! A flat JSON document mapping user id -> progress record, read once at
//! startup and rewritten wholesale after every mutation. This is not a
//! database: there is no locking and no concurrent-writer protection. The
//! bot processes one event at a time, so the read-modify-write-flush
//! sequence is safe in practice; running multiple instances against the
//! same document is not supported.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;

/// Referral credit stops raising a user's level past this.
pub const MAX_REFERRAL_LEVEL: u32 = 3;

/// Per-user progress state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    /// Access level, starts at 1 and only ever increases (via referrals).
    pub level: u32,
    /// User ids this user has been credited for inviting.
    #[serde(default)]
    pub invited: Vec<String>,
    /// Lessons answered correctly at least once.
    #[serde(default)]
    pub completed_lessons: Vec<String>,
    /// Display name used as this user's referral-link token. Assigned at
    /// registration, immutable thereafter.
    pub referral_name: String,
}

impl Default for UserRecord {
    /// A fresh, unregistered profile: level 1, nothing completed.
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl UserRecord {
    fn new(referral_name: String) -> Self {
        Self {
            level: 1,
            invited: Vec::new(),
            completed_lessons: Vec::new(),
            referral_name,
        }
    }

    /// Whether the user has completed the given lesson.
    pub fn has_completed(&self, lesson: &str) -> bool {
        self.completed_lessons.iter().any(|l| l == lesson)
    }
}

/// The user store: in-memory map plus the backing JSON document.
#[derive(Debug)]
pub struct UserStore {
    path: PathBuf,
    users: HashMap<String, UserRecord>,
}

impl UserStore {
    /// Load the store from its backing document, or start empty if the
    /// document does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        let users = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str(&contents)?
        } else {
            HashMap::new()
        };
        let store = Self {
            path: path.to_path_buf(),
            users,
        };
        info!(users = store.users.len(), path = %store.path.display(), "User store loaded");
        Ok(store)
    }

    /// Rewrite the backing document from the in-memory map.
    fn flush(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.users)?;
        std::fs::write(&self.path, contents)?;
        debug!(users = self.users.len(), "User store flushed");
        Ok(())
    }

    /// Look up a user record.
    pub fn get(&self, user_id: &str) -> Option<&UserRecord> {
        self.users.get(user_id)
    }

    /// The user's level, defaulting to 1 for unknown users.
    pub fn level_of(&self, user_id: &str) -> u32 {
        self.users.get(user_id).map(|u| u.level).unwrap_or(1)
    }

    /// Create a record for a first-time user. Returns true if the record
    /// was created, false if the user already existed (in which case
    /// nothing changes — records are created exactly once).
    pub fn get_or_create(&mut self, user_id: &str, display_name: &str) -> Result<bool> {
        if self.users.contains_key(user_id) {
            return Ok(false);
        }
        self.users
            .insert(user_id.to_string(), UserRecord::new(display_name.to_string()));
        self.flush()?;
        info!(user_id, display_name, "Registered new user");
        Ok(true)
    }

    /// Record a correctly answered lesson. Idempotent: a second call with
    /// the same lesson id changes nothing.
    pub fn record_completion(&mut self, user_id: &str, lesson: &str) -> Result<()> {
        let Some(record) = self.users.get_mut(user_id) else {
            return Ok(());
        };
        if record.has_completed(lesson) {
            return Ok(());
        }
        record.completed_lessons.push(lesson.to_string());
        self.flush()?;
        debug!(user_id, lesson, "Lesson completion recorded");
        Ok(())
    }

    /// Credit a referrer for bringing in `new_user_id`.
    ///
    /// Scans for a record whose `referral_name` matches the token, whose
    /// level is still below the referral cap, and which has not already
    /// been credited for this invitee. The first eligible match (iteration
    /// order is unspecified) gets +1 level and the invitee recorded.
    /// Returns true if someone was credited.
    pub fn apply_referral(&mut self, referrer_token: &str, new_user_id: &str) -> Result<bool> {
        let matched = self.users.iter_mut().find(|(_, record)| {
            record.referral_name == referrer_token
                && record.level < MAX_REFERRAL_LEVEL
                && !record.invited.iter().any(|id| id == new_user_id)
        });
        let Some((referrer_id, record)) = matched else {
            return Ok(false);
        };
        record.level += 1;
        record.invited.push(new_user_id.to_string());
        let referrer_id = referrer_id.clone();
        self.flush()?;
        info!(referrer = %referrer_id, invitee = new_user_id, "Referral credited");
        Ok(true)
    }

    /// Iterate over all (user id, record) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UserRecord)> {
        self.users.iter().map(|(id, record)| (id.as_str(), record))
    }

    /// Number of registered users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the store has no users.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> UserStore {
        UserStore::load(&dir.path().join("users.json")).unwrap()
    }

    #[test]
    fn test_creation_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);

        assert!(store.get_or_create("100", "Alice").unwrap());
        let record = store.get("100").unwrap().clone();
        assert_eq!(record.level, 1);
        assert!(record.invited.is_empty());
        assert!(record.completed_lessons.is_empty());
        assert_eq!(record.referral_name, "Alice");

        // Second contact leaves the record untouched.
        assert!(!store.get_or_create("100", "SomeoneElse").unwrap());
        assert_eq!(store.get("100").unwrap(), &record);
    }

    #[test]
    fn test_referral_credits_and_caps() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.get_or_create("1", "Alice").unwrap();

        assert!(store.apply_referral("Alice", "2").unwrap());
        assert!(store.apply_referral("Alice", "3").unwrap());
        assert_eq!(store.get("1").unwrap().level, 3);

        // Level 3 is the referral cap.
        assert!(!store.apply_referral("Alice", "4").unwrap());
        assert_eq!(store.get("1").unwrap().level, 3);
    }

    #[test]
    fn test_referral_never_double_credits_an_invitee() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.get_or_create("1", "Alice").unwrap();

        assert!(store.apply_referral("Alice", "2").unwrap());
        assert!(!store.apply_referral("Alice", "2").unwrap());
        assert_eq!(store.get("1").unwrap().level, 2);
        assert_eq!(store.get("1").unwrap().invited, vec!["2"]);
    }

    #[test]
    fn test_referral_with_unknown_token() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.get_or_create("1", "Alice").unwrap();
        assert!(!store.apply_referral("Nobody", "2").unwrap());
    }

    #[test]
    fn test_completion_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut store = store_in(&dir);
        store.get_or_create("1", "Alice").unwrap();

        store.record_completion("1", "Metrics quiz").unwrap();
        store.record_completion("1", "Metrics quiz").unwrap();
        assert_eq!(store.get("1").unwrap().completed_lessons, vec!["Metrics quiz"]);
    }

    #[test]
    fn test_round_trip_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        {
            let mut store = UserStore::load(&path).unwrap();
            store.get_or_create("1", "Alice").unwrap();
            store.get_or_create("2", "Bob").unwrap();
            store.apply_referral("Alice", "2").unwrap();
            store.record_completion("2", "Metrics quiz").unwrap();
        }

        let reloaded = UserStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        let alice = reloaded.get("1").unwrap();
        assert_eq!(alice.level, 2);
        assert_eq!(alice.invited, vec!["2"]);
        let bob = reloaded.get("2").unwrap();
        assert_eq!(bob.level, 1);
        assert_eq!(bob.completed_lessons, vec!["Metrics quiz"]);
    }

    #[test]
    fn test_level_of_unknown_user_defaults_to_one() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.level_of("ghost"), 1);
    }
}
