/// Persistence boundary: a single JSON snapshot behind a key-value store.
///
/// ## What is stored
///   `{ score, completed_rooms, hints, game_state }` under `STORAGE_KEY`.
///   The selected room is not stored, so a snapshot taken mid-room is
///   restored into the menu.
///
/// ## Failure policy
///   Reads tolerate absent or malformed data by falling back to defaults.
///   Write failures are returned to the caller, who logs and carries on;
///   the in-memory session is always authoritative.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::session::{GameSession, Phase};

pub const STORAGE_KEY: &str = "escapeword-storage";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Opaque key-value store.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

// ══════════════════════════════════════════════════════════════
// Stores
// ══════════════════════════════════════════════════════════════

/// One file per key: `<dir>/<key>.json`.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        // atomic replace
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, self.path(key))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store; nothing survives the process.
#[derive(Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Where the file store lives when the config does not say.
/// Exe directory if writable, else `~/.local/share/escapeword`, else CWD.
pub fn default_save_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let test_path = parent.join(".write_test_escapeword");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/escapeword");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Snapshot
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub score: u32,
    pub completed_rooms: Vec<String>,
    pub hints: u32,
    pub game_state: Phase,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            score: 0,
            completed_rooms: vec![],
            hints: 3,
            game_state: Phase::Menu,
        }
    }
}

pub fn capture_snapshot(s: &GameSession) -> Snapshot {
    Snapshot {
        score: s.score,
        completed_rooms: s.completed_rooms.iter().cloned().collect(),
        hints: s.hints,
        game_state: s.phase,
    }
}

/// Restore persisted fields. Without a room to play, any in-room phase
/// comes back as the menu.
pub fn restore_snapshot(s: &mut GameSession, snap: &Snapshot) {
    s.score = snap.score;
    s.completed_rooms = snap.completed_rooms.iter().cloned().collect();
    s.hints = snap.hints;
    s.phase = Phase::Menu;
}

pub fn save_session(store: &mut dyn Storage, s: &GameSession) -> Result<(), StorageError> {
    let text = serde_json::to_string(&capture_snapshot(s))?;
    store.set(STORAGE_KEY, &text)
}

/// Read the snapshot, or defaults if it is absent, unreadable or malformed.
pub fn load_snapshot(store: &dyn Storage) -> Snapshot {
    let text = match store.get(STORAGE_KEY) {
        Ok(Some(text)) => text,
        Ok(None) => return Snapshot::default(),
        Err(e) => {
            log::warn!("could not read saved progress: {e}");
            return Snapshot::default();
        }
    };
    match serde_json::from_str(&text) {
        Ok(snap) => snap,
        Err(e) => {
            log::warn!("saved progress is malformed, starting fresh: {e}");
            Snapshot::default()
        }
    }
}

pub fn clear_saved(store: &mut dyn Storage) -> Result<(), StorageError> {
    store.remove(STORAGE_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;

    fn session() -> GameSession {
        let mut s = GameSession::new(RulesConfig::default());
        s.score = 1234;
        s.hints = 2;
        s.completed_rooms.insert("space".into());
        s.completed_rooms.insert("egypt".into());
        s
    }

    #[test]
    fn absent_snapshot_gives_defaults() {
        let store = MemoryStorage::default();
        assert_eq!(load_snapshot(&store), Snapshot::default());
    }

    #[test]
    fn malformed_snapshot_gives_defaults() {
        let mut store = MemoryStorage::default();
        store.set(STORAGE_KEY, "{ not json").unwrap();
        assert_eq!(load_snapshot(&store), Snapshot::default());

        store.set(STORAGE_KEY, r#"{"score": -5}"#).unwrap();
        assert_eq!(load_snapshot(&store), Snapshot::default());
    }

    #[test]
    fn missing_fields_default_individually() {
        let mut store = MemoryStorage::default();
        store.set(STORAGE_KEY, r#"{"score": 40, "completedRooms": ["haunted"]}"#).unwrap();
        let snap = load_snapshot(&store);
        assert_eq!(snap.score, 40);
        assert_eq!(snap.completed_rooms, vec!["haunted".to_string()]);
        assert_eq!(snap.hints, 3);
        assert_eq!(snap.game_state, Phase::Menu);
    }

    #[test]
    fn saved_session_restores_into_menu() {
        let mut store = MemoryStorage::default();
        let mut s = session();
        s.phase = Phase::Playing;
        save_session(&mut store, &s).unwrap();

        let text = store.get(STORAGE_KEY).unwrap().unwrap();
        assert!(text.contains(r#""gameState":"playing""#));

        let mut fresh = GameSession::new(RulesConfig::default());
        restore_snapshot(&mut fresh, &load_snapshot(&store));
        assert_eq!(fresh.score, 1234);
        assert_eq!(fresh.hints, 2);
        assert_eq!(fresh.completed_rooms, s.completed_rooms);
        assert_eq!(fresh.phase, Phase::Menu);
    }

    #[test]
    fn file_storage_round_trip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStorage::new(dir.path().join("nested"));
        assert!(store.get(STORAGE_KEY).unwrap().is_none());

        save_session(&mut store, &session()).unwrap();
        assert!(store.dir().join("escapeword-storage.json").exists());
        assert_eq!(load_snapshot(&store).score, 1234);

        clear_saved(&mut store).unwrap();
        assert!(store.get(STORAGE_KEY).unwrap().is_none());
        // removing twice is fine
        clear_saved(&mut store).unwrap();
    }
}
