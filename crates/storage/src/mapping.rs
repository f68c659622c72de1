//! Mapping store implementations

use crate::StorageError;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Action name meaning "do nothing"
pub const NO_ACTION: &str = "NONE";

/// Actions a gesture may be mapped to
pub const AVAILABLE_ACTIONS: &[&str] = &[
    "NONE",
    "PLAY",
    "PAUSE",
    "NEXT",
    "PREVIOUS",
    "VOLUME_UP",
    "VOLUME_DOWN",
    "MUTE",
    "HOME",
    "FAVORITE",
];

/// Built-in gesture table
pub const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    ("Open_Palm", "PAUSE"),
    ("Closed_Fist", "PLAY"),
    ("Thumb_Up", "VOLUME_UP"),
    ("Thumb_Down", "VOLUME_DOWN"),
    ("Pointing_Up", "HOME"),
    ("Pointing_Down", "VOLUME_DOWN"),
    ("Victory", "PLAY"),
    ("ILoveYou", "FAVORITE"),
    ("Pinch", "MUTE"),
    ("Two_Fingers_Up", "PLAY"),
    ("Two_Fingers_Left", "PREVIOUS"),
    ("Two_Fingers_Right", "NEXT"),
    ("Swipe_Left", "PREVIOUS"),
    ("Swipe_Right", "NEXT"),
];

/// Default action for a gesture; unknown gestures map to "NONE"
pub fn default_action(gesture: &str) -> &'static str {
    DEFAULT_MAPPINGS
        .iter()
        .find(|(g, _)| *g == gesture)
        .map_or(NO_ACTION, |&(_, a)| a)
}

fn validate_action(action: &str) -> Result<(), StorageError> {
    if AVAILABLE_ACTIONS.contains(&action) {
        Ok(())
    } else {
        Err(StorageError::UnknownAction(action.to_string()))
    }
}

/// Effective table: defaults overlaid with user overrides
fn merged(overrides: &HashMap<String, String>) -> BTreeMap<String, String> {
    let mut table: BTreeMap<String, String> = DEFAULT_MAPPINGS
        .iter()
        .map(|(g, a)| (g.to_string(), a.to_string()))
        .collect();
    table.extend(overrides.iter().map(|(g, a)| (g.clone(), a.clone())));
    table
}

/// Gesture-to-action lookup and update
pub trait MappingStore: Send + Sync {
    /// Action for a gesture, falling back to the default table
    fn get(&self, gesture: &str) -> Result<String, StorageError>;

    /// Persist a single mapping edit
    fn set(&self, gesture: &str, action: &str) -> Result<(), StorageError>;

    /// Every known gesture with its effective action
    fn mappings(&self) -> Result<BTreeMap<String, String>, StorageError>;

    fn available_actions(&self) -> &'static [&'static str] {
        AVAILABLE_ACTIONS
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryMappingStore {
    overrides: Mutex<HashMap<String, String>>,
}

impl MemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.overrides
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }
}

impl MappingStore for MemoryMappingStore {
    fn get(&self, gesture: &str) -> Result<String, StorageError> {
        Ok(self
            .lock()?
            .get(gesture)
            .cloned()
            .unwrap_or_else(|| default_action(gesture).to_string()))
    }

    fn set(&self, gesture: &str, action: &str) -> Result<(), StorageError> {
        validate_action(action)?;
        self.lock()?.insert(gesture.to_string(), action.to_string());
        debug!("Mapped {} -> {}", gesture, action);
        Ok(())
    }

    fn mappings(&self) -> Result<BTreeMap<String, String>, StorageError> {
        Ok(merged(&*self.lock()?))
    }
}

/// JSON file store, re-read on every lookup
///
/// The file holds only user overrides as a flat `{"gesture": "ACTION"}`
/// object; a missing file means all defaults.
#[derive(Debug)]
pub struct JsonMappingStore {
    path: PathBuf,
    /// Serializes read-modify-write in `set`
    write_lock: Mutex<()>,
}

impl JsonMappingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Using mapping file {}", path.display());
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<HashMap<String, String>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, overrides: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(overrides)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl MappingStore for JsonMappingStore {
    fn get(&self, gesture: &str) -> Result<String, StorageError> {
        let overrides = self.load()?;
        Ok(overrides
            .get(gesture)
            .cloned()
            .unwrap_or_else(|| default_action(gesture).to_string()))
    }

    fn set(&self, gesture: &str, action: &str) -> Result<(), StorageError> {
        validate_action(action)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;

        let mut overrides = match self.load() {
            Ok(o) => o,
            Err(StorageError::Serialization(e)) => {
                warn!("Mapping file unreadable ({}), starting from defaults", e);
                HashMap::new()
            }
            Err(e) => return Err(e),
        };
        overrides.insert(gesture.to_string(), action.to_string());
        self.save(&overrides)?;
        info!("Mapped {} -> {}", gesture, action);
        Ok(())
    }

    fn mappings(&self) -> Result<BTreeMap<String, String>, StorageError> {
        Ok(merged(&self.load()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "cabin-mappings-{}-{}.json",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn test_default_table() {
        assert_eq!(default_action("Open_Palm"), "PAUSE");
        assert_eq!(default_action("ILoveYou"), "FAVORITE");
        assert_eq!(default_action("Swipe_Right"), "NEXT");
        assert_eq!(default_action("Wave"), NO_ACTION);
    }

    #[test]
    fn test_memory_store_overrides() {
        let store = MemoryMappingStore::new();
        assert_eq!(store.get("Thumb_Up").unwrap(), "VOLUME_UP");

        store.set("Thumb_Up", "MUTE").unwrap();
        assert_eq!(store.get("Thumb_Up").unwrap(), "MUTE");
        assert_eq!(store.mappings().unwrap()["Thumb_Up"], "MUTE");
        assert_eq!(store.mappings().unwrap().len(), DEFAULT_MAPPINGS.len());
    }

    #[test]
    fn test_rejects_unknown_action() {
        let store = MemoryMappingStore::new();
        assert!(matches!(
            store.set("Thumb_Up", "SELF_DESTRUCT"),
            Err(StorageError::UnknownAction(_))
        ));
    }

    #[test]
    fn test_json_store_reads_on_every_get() {
        let path = temp_path("reread");
        let _ = fs::remove_file(&path);
        let store = JsonMappingStore::new(&path);

        assert_eq!(store.get("Closed_Fist").unwrap(), "PLAY");
        store.set("Closed_Fist", "HOME").unwrap();
        assert_eq!(store.get("Closed_Fist").unwrap(), "HOME");

        // Edit made behind the store's back is visible on the next lookup
        fs::write(&path, r#"{"Closed_Fist": "NEXT"}"#).unwrap();
        assert_eq!(store.get("Closed_Fist").unwrap(), "NEXT");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_json_store_recovers_from_corrupt_file() {
        let path = temp_path("corrupt");
        fs::write(&path, "not json").unwrap();
        let store = JsonMappingStore::new(&path);

        assert!(store.get("Pinch").is_err());
        store.set("Pinch", "PAUSE").unwrap();
        assert_eq!(store.get("Pinch").unwrap(), "PAUSE");

        let _ = fs::remove_file(&path);
    }
}
