//! Per-voice backend preferences
//!
//! Some voices simply sound better on a particular backend; the
//! preference map pins them there ahead of default routing. The map is
//! persisted as a small JSON object and written atomically
//! (temp-then-rename) so a crash never leaves a torn file. Reads are
//! snapshot lookups; writes are serialized through one mutex.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Mutex, RwLock};

use tracing::{info, warn};

use crate::profiles::BackendKind;

/// Persistent `voice → backend` routing overrides
pub struct VoicePreferences {
    path: PathBuf,
    map: RwLock<HashMap<String, BackendKind>>,
    write_lock: Mutex<()>,
}

impl VoicePreferences {
    /// Load preferences from disk; a missing or corrupt file starts empty
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(saved) => {
                    let mut map = HashMap::new();
                    for (voice, backend) in saved {
                        match BackendKind::parse(&backend) {
                            Some(kind) => {
                                map.insert(voice.to_lowercase(), kind);
                            }
                            None => warn!("dropping preference {voice} -> unknown backend {backend}"),
                        }
                    }
                    info!("loaded {} voice preferences from {}", map.len(), path.display());
                    map
                }
                Err(e) => {
                    warn!("ignoring corrupt preferences file {}: {e}", path.display());
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self {
            path,
            map: RwLock::new(map),
            write_lock: Mutex::new(()),
        }
    }

    /// Preferred backend for a voice, if any
    pub fn get(&self, voice: &str) -> Option<BackendKind> {
        self.map
            .read()
            .expect("preferences lock poisoned")
            .get(&voice.to_lowercase())
            .copied()
    }

    /// Set the preferred backend for a voice and flush to disk
    pub fn set(&self, voice: &str, backend: BackendKind) {
        let _guard = self.write_lock.lock().expect("preferences write lock poisoned");
        self.map
            .write()
            .expect("preferences lock poisoned")
            .insert(voice.to_lowercase(), backend);
        self.flush();
    }

    /// Remove a preference; returns whether one existed
    pub fn remove(&self, voice: &str) -> bool {
        let _guard = self.write_lock.lock().expect("preferences write lock poisoned");
        let removed = self
            .map
            .write()
            .expect("preferences lock poisoned")
            .remove(&voice.to_lowercase())
            .is_some();
        if removed {
            self.flush();
        }
        removed
    }

    /// Snapshot of the full map, sorted by voice name
    pub fn all(&self) -> BTreeMap<String, BackendKind> {
        self.map
            .read()
            .expect("preferences lock poisoned")
            .iter()
            .map(|(voice, &backend)| (voice.clone(), backend))
            .collect()
    }

    /// Write the snapshot atomically; failures are logged, not fatal
    ///
    /// A crash between map update and flush loses at most one advisory
    /// preference.
    fn flush(&self) {
        let snapshot: BTreeMap<String, &'static str> = self
            .map
            .read()
            .expect("preferences lock poisoned")
            .iter()
            .map(|(voice, backend)| (voice.clone(), backend.as_str()))
            .collect();

        let serialized = match serde_json::to_string_pretty(&snapshot) {
            Ok(s) => s,
            Err(e) => {
                warn!("failed to serialize preferences: {e}");
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("failed to create {}: {e}", parent.display());
                return;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        if let Err(e) = std::fs::write(&tmp, serialized) {
            warn!("failed to write {}: {e}", tmp.display());
            return;
        }
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            warn!("failed to replace {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_prefs_path() -> PathBuf {
        std::env::temp_dir().join(format!("unified-tts-prefs-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_set_get_remove() {
        let path = temp_prefs_path();
        let prefs = VoicePreferences::load(&path);

        assert!(prefs.get("morgan").is_none());
        prefs.set("Morgan", BackendKind::VoxCpm);
        // Lookups are case-insensitive
        assert_eq!(prefs.get("morgan"), Some(BackendKind::VoxCpm));
        assert_eq!(prefs.get("MORGAN"), Some(BackendKind::VoxCpm));

        assert!(prefs.remove("morgan"));
        assert!(!prefs.remove("morgan"));
        assert!(prefs.get("morgan").is_none());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_survives_restart() {
        let path = temp_prefs_path();
        {
            let prefs = VoicePreferences::load(&path);
            prefs.set("rick", BackendKind::OpenAudio);
        }
        let reloaded = VoicePreferences::load(&path);
        assert_eq!(reloaded.get("rick"), Some(BackendKind::OpenAudio));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let path = temp_prefs_path();
        std::fs::write(&path, b"{ not json").unwrap();
        let prefs = VoicePreferences::load(&path);
        assert!(prefs.all().is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unknown_backend_entries_dropped() {
        let path = temp_prefs_path();
        std::fs::write(&path, r#"{"rick": "openaudio", "morty": "bogus"}"#).unwrap();
        let prefs = VoicePreferences::load(&path);
        assert_eq!(prefs.get("rick"), Some(BackendKind::OpenAudio));
        assert!(prefs.get("morty").is_none());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_no_leftover_temp_file() {
        let path = temp_prefs_path();
        let prefs = VoicePreferences::load(&path);
        prefs.set("summer", BackendKind::Kokoro);
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let _ = std::fs::remove_file(&path);
    }
}
