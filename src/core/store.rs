use crate::core::grading::GradingState;
use crate::core::photo::{Decision, DuplicateGroup, Photo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The single persisted record shared by every screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    pub has_visited: bool,
    pub target_count: Option<u32>,
    pub yes_photos: Vec<Photo>,
    pub no_photos: Vec<Photo>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub pairwise_decisions: Vec<Decision>,
    pub photos: Vec<Photo>,
    pub refined_yes_photos: Vec<Photo>,
    /// Ids ticked on the summary screen, in refined-set order.
    pub selected_photo_ids: Vec<String>,
    pub grading: GradingState,
    pub drive_link: Option<String>,
    pub drive_submitted_at: Option<DateTime<Utc>>,
    /// Milliseconds since the Unix epoch.
    pub session_started_at: Option<i64>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Keys written by other tools. Carried through every update untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionState {
    /// Clear everything a new swipe pass produces. The manifest cache and
    /// the prepare-screen fields survive.
    pub fn clear_session(&mut self) {
        self.yes_photos.clear();
        self.no_photos.clear();
        self.duplicate_groups.clear();
        self.pairwise_decisions.clear();
        // Refined ids must come from the current accepted set.
        self.refined_yes_photos.clear();
        self.selected_photo_ids.clear();
    }
}

/// Snapshot storage. Backends move raw text; the provided methods own the
/// read-modify-write discipline so callers never see a partial snapshot.
pub trait StateStore {
    fn load(&self) -> Result<Option<String>, StoreError>;
    fn save(&self, raw: &str) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;

    /// Current snapshot, or defaults when absent or unreadable.
    fn read(&self) -> SessionState {
        let raw = match self.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => return SessionState::default(),
            Err(e) => {
                log::warn!("Failed to load state, using defaults: {}", e);
                return SessionState::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("Failed to parse state, resetting: {}", e);
                if let Err(e) = self.clear() {
                    log::warn!("Failed to discard corrupt state: {}", e);
                }
                SessionState::default()
            }
        }
    }

    /// Replace the stored snapshot with `state`, stamped with `lastUpdated`.
    fn write(&self, state: SessionState) -> Result<SessionState, StoreError> {
        let snapshot = SessionState {
            last_updated: Some(Utc::now()),
            ..state
        };
        self.save(&serde_json::to_string_pretty(&snapshot)?)?;
        Ok(snapshot)
    }

    fn update<F>(&self, transform: F) -> Result<SessionState, StoreError>
    where
        F: FnOnce(&mut SessionState),
        Self: Sized,
    {
        let mut state = self.read();
        transform(&mut state);
        self.write(state)
    }

    fn reset(&self) -> Result<SessionState, StoreError> {
        self.write(SessionState::default())
    }
}

/// JSON file on disk. Writes go to a sibling temp file and are renamed over
/// the target.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(None),
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, raw: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp = self.temp_path();
        fs::write(&temp, raw)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store for ephemeral runs and tests. Counts saves.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    raw: RefCell<Option<String>>,
    saves: Cell<usize>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: RefCell::new(Some(raw.into())),
            saves: Cell::new(0),
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.get()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.raw.borrow().clone())
    }

    fn save(&self, raw: &str) -> Result<(), StoreError> {
        *self.raw.borrow_mut() = Some(raw.to_string());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.raw.borrow_mut() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_defaults_when_absent() {
        let store = MemoryStateStore::new();
        let state = store.read();

        assert!(!state.has_visited);
        assert!(state.target_count.is_none());
        assert!(state.yes_photos.is_empty());
        assert!(state.last_updated.is_none());
    }

    #[test]
    fn test_corrupt_state_is_discarded() {
        let store = MemoryStateStore::with_raw("{not json");
        let state = store.read();

        assert_eq!(state, SessionState::default());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_partial_state_merges_over_defaults() {
        let store = MemoryStateStore::with_raw(
            r#"{"targetCount": 12, "driveLink": "https://drive/x", "yesPhotos": [{"id": "photo-0", "src": "a.jpg"}]}"#,
        );
        let state = store.read();

        assert_eq!(state.target_count, Some(12));
        assert_eq!(state.drive_link.as_deref(), Some("https://drive/x"));
        assert_eq!(state.yes_photos.len(), 1);
        assert_eq!(state.yes_photos[0].filename, "");
        assert!(state.no_photos.is_empty());
        assert!(state.extra.is_empty());
    }

    #[test]
    fn test_update_keeps_fields_it_does_not_own() {
        let store = MemoryStateStore::with_raw(
            r#"{"driveLink": "https://drive/x", "sessionStartedAt": 1, "theme": {"dark": true}}"#,
        );
        store.update(|s| s.target_count = Some(3)).unwrap();

        let raw: Value = serde_json::from_str(&store.load().unwrap().unwrap()).unwrap();
        assert_eq!(raw["driveLink"], "https://drive/x");
        assert_eq!(raw["sessionStartedAt"], 1);
        assert_eq!(raw["theme"]["dark"], true);
        assert_eq!(raw["targetCount"], 3);

        let state = store.read();
        assert_eq!(state.session_started_at, Some(1));
        assert_eq!(state.extra.get("theme"), Some(&serde_json::json!({"dark": true})));
    }

    #[test]
    fn test_update_is_read_modify_write() {
        let store = MemoryStateStore::new();
        store.update(|s| s.target_count = Some(5)).unwrap();
        let next = store.update(|s| s.has_visited = true).unwrap();

        assert_eq!(next.target_count, Some(5));
        assert!(next.has_visited);
        assert!(next.last_updated.is_some());
        assert_eq!(store.saves(), 2);
        assert_eq!(store.read(), next);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let store = MemoryStateStore::new();
        store.update(|s| s.target_count = Some(5)).unwrap();
        let state = store.reset().unwrap();

        assert!(state.target_count.is_none());
        assert!(state.last_updated.is_some());
    }

    #[test]
    fn test_clear_session_keeps_manifest_cache() {
        let mut state = SessionState {
            target_count: Some(3),
            photos: vec![Photo::new("photo-0", "a.jpg")],
            yes_photos: vec![Photo::new("photo-0", "a.jpg")],
            ..SessionState::default()
        };
        state.clear_session();

        assert!(state.yes_photos.is_empty());
        assert_eq!(state.photos.len(), 1);
        assert_eq!(state.target_count, Some(3));
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("state.json");
        let store = FileStateStore::new(&path);

        assert_eq!(store.read(), SessionState::default());

        store.update(|s| s.target_count = Some(20)).unwrap();
        assert!(path.exists());
        assert!(!temp_dir.path().join("nested").join("state.json.tmp").exists());

        let reopened = FileStateStore::new(&path);
        assert_eq!(reopened.read().target_count, Some(20));
    }

    #[test]
    fn test_file_store_discards_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");
        fs::write(&path, "garbage").unwrap();

        let store = FileStateStore::new(&path);
        assert_eq!(store.read(), SessionState::default());
        assert!(!path.exists());
    }
}
