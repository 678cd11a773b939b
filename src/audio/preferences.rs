use crate::error::{AudioError, AudioResult};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Key the mute flag is stored under.
pub const MUTED_KEY: &str = "audioMuted";

/// Persistence of the single mute preference.
pub trait PreferenceStore: Send + Sync {
    /// `Ok(None)` when nothing was stored yet.
    fn load_muted(&self) -> AudioResult<Option<bool>>;
    fn save_muted(&self, muted: bool) -> AudioResult<()>;
}

/// Preferences kept as a flat JSON object in a file, e.g.
/// `<app data>/preferences.json`. Unknown keys are preserved on write.
pub struct JsonPreferenceStore {
    path: PathBuf,
}

impl JsonPreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> AudioResult<Map<String, Value>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(unavailable(&self.path, e)),
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AudioError::PersistenceUnavailable(format!(
                "{} is not a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(unavailable(&self.path, e)),
        }
    }
}

fn unavailable(path: &std::path::Path, e: impl std::fmt::Display) -> AudioError {
    AudioError::PersistenceUnavailable(format!("{}: {}", path.display(), e))
}

impl PreferenceStore for JsonPreferenceStore {
    fn load_muted(&self) -> AudioResult<Option<bool>> {
        let map = self.read_map()?;
        Ok(map.get(MUTED_KEY).and_then(Value::as_bool))
    }

    fn save_muted(&self, muted: bool) -> AudioResult<()> {
        // A corrupt file is overwritten rather than blocking the toggle
        let mut map = self.read_map().unwrap_or_default();
        map.insert(MUTED_KEY.to_string(), Value::Bool(muted));

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| unavailable(parent, e))?;
        }
        let raw = serde_json::to_string_pretty(&Value::Object(map))
            .map_err(|e| unavailable(&self.path, e))?;
        std::fs::write(&self.path, raw).map_err(|e| unavailable(&self.path, e))
    }
}

/// Process-local store, for headless runs and tests.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    muted: Mutex<Option<bool>>,
}

impl MemoryPreferenceStore {
    pub fn with_muted(muted: bool) -> Self {
        Self {
            muted: Mutex::new(Some(muted)),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load_muted(&self) -> AudioResult<Option<bool>> {
        Ok(*self.muted.lock())
    }

    fn save_muted(&self, muted: bool) -> AudioResult<()> {
        *self.muted.lock() = Some(muted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("soundscape-{}", uuid::Uuid::new_v4()))
            .join("preferences.json")
    }

    #[test]
    fn test_missing_file_reads_as_unset() {
        let store = JsonPreferenceStore::new(temp_path());
        assert_eq!(store.load_muted(), Ok(None));
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path();
        let store = JsonPreferenceStore::new(&path);
        store.save_muted(true).unwrap();
        assert_eq!(store.load_muted(), Ok(Some(true)));
        store.save_muted(false).unwrap();
        assert_eq!(JsonPreferenceStore::new(&path).load_muted(), Ok(Some(false)));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_other_keys_survive_save() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{ "theme": "dark" }"#).unwrap();

        let store = JsonPreferenceStore::new(&path);
        store.save_muted(true).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["theme"], "dark");
        assert_eq!(value[MUTED_KEY], true);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_corrupt_file_is_unavailable() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[1, 2").unwrap();

        let store = JsonPreferenceStore::new(&path);
        assert!(matches!(
            store.load_muted(),
            Err(AudioError::PersistenceUnavailable(_))
        ));
        store.save_muted(true).unwrap();
        assert_eq!(store.load_muted(), Ok(Some(true)));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryPreferenceStore::default();
        assert_eq!(store.load_muted(), Ok(None));
        store.save_muted(true).unwrap();
        assert_eq!(store.load_muted(), Ok(Some(true)));
    }
}
