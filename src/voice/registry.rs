//! Voice clone discovery and catalog management
//!
//! A clone voice is one immediate subdirectory of the voice directory:
//!
//! ```text
//! $UNIFIED_TTS_VOICE_DIR/
//!     rick/
//!         reference.wav      (mp3/flac also accepted)
//!         transcript.txt     (optional; improves clone fidelity)
//! ```
//!
//! The registry merges these with the voice lists the configured
//! backends report at startup. Clone-directory entries shadow
//! backend-reported entries of the same name. Rebuilds happen on
//! explicit reload, never per request; reads are snapshot lookups.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::profiles::BackendKind;

/// Reference audio extensions accepted, in probe order
const REFERENCE_EXTENSIONS: &[&str] = &["wav", "mp3", "flac"];

/// One entry of the merged voice catalog
#[derive(Debug, Clone, Serialize)]
pub struct Voice {
    /// Identifier, unique across the merged catalog
    pub name: String,
    /// Display category reported by the owning backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Owning backend; absent for clone voices usable by any clone backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,
    /// Reference audio on disk, present for clone voices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_path: Option<PathBuf>,
    /// Transcript of the reference audio
    #[serde(skip)]
    pub transcript: Option<String>,
}

impl Voice {
    /// A catalog voice owned by one backend
    pub fn catalog(name: impl Into<String>, backend: BackendKind, category: Option<String>) -> Self {
        Self {
            name: name.into(),
            category,
            backend: Some(backend),
            reference_path: None,
            transcript: None,
        }
    }

    /// Whether this voice carries a reference asset for cloning
    pub fn is_clone(&self) -> bool {
        self.reference_path.is_some()
    }
}

/// The merged, read-mostly voice catalog
pub struct VoiceRegistry {
    voice_dir: PathBuf,
    voices: RwLock<HashMap<String, Voice>>,
}

impl VoiceRegistry {
    pub fn new(voice_dir: impl Into<PathBuf>) -> Self {
        Self {
            voice_dir: voice_dir.into(),
            voices: RwLock::new(HashMap::new()),
        }
    }

    pub fn voice_dir(&self) -> &Path {
        &self.voice_dir
    }

    /// Rebuild the catalog from the clone directory and the given
    /// backend-reported voices; returns the resulting catalog size
    ///
    /// Backend entries land first so clone entries overwrite duplicates.
    pub fn rebuild(&self, backend_voices: Vec<Voice>) -> usize {
        let mut merged: HashMap<String, Voice> = HashMap::new();
        for voice in backend_voices {
            merged.insert(voice.name.clone(), voice);
        }

        let clones = self.scan_clone_dir();
        let clone_count = clones.len();
        for voice in clones {
            merged.insert(voice.name.clone(), voice);
        }

        let total = merged.len();
        info!(
            clones = clone_count,
            total, "voice catalog rebuilt from {}", self.voice_dir.display()
        );

        *self.voices.write().expect("voice registry lock poisoned") = merged;
        total
    }

    /// Look up one voice by name
    pub fn get(&self, name: &str) -> Option<Voice> {
        self.voices
            .read()
            .expect("voice registry lock poisoned")
            .get(name)
            .cloned()
    }

    /// All voices, sorted by name
    pub fn all(&self) -> Vec<Voice> {
        let mut voices: Vec<Voice> = self
            .voices
            .read()
            .expect("voice registry lock poisoned")
            .values()
            .cloned()
            .collect();
        voices.sort_by(|a, b| a.name.cmp(&b.name));
        voices
    }

    pub fn count(&self) -> usize {
        self.voices.read().expect("voice registry lock poisoned").len()
    }

    /// Scan the clone directory; failures are logged and skipped
    fn scan_clone_dir(&self) -> Vec<Voice> {
        let entries = match std::fs::read_dir(&self.voice_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "voice directory {} not readable: {e}",
                    self.voice_dir.display()
                );
                return Vec::new();
            }
        };

        let mut voices = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match load_clone_voice(name, &path) {
                Ok(Some(voice)) => voices.push(voice),
                Ok(None) => debug!("skipping {name}: no reference audio"),
                Err(e) => warn!("skipping voice {name}: {e}"),
            }
        }
        voices
    }
}

/// Load one clone-voice directory, or None when no reference exists
fn load_clone_voice(name: &str, dir: &Path) -> std::io::Result<Option<Voice>> {
    let reference = REFERENCE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("reference.{ext}")))
        .find(|p| p.is_file());
    let Some(reference_path) = reference else {
        return Ok(None);
    };

    // Confirm the reference is actually readable before registering
    std::fs::File::open(&reference_path)?;

    let transcript_file = dir.join("transcript.txt");
    let transcript = if transcript_file.is_file() {
        Some(std::fs::read_to_string(&transcript_file)?.trim().to_string())
    } else {
        None
    };

    Ok(Some(Voice {
        name: name.to_string(),
        category: None,
        backend: None,
        reference_path: Some(reference_path),
        transcript,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_voice_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("unified-tts-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn add_clone(dir: &Path, name: &str, with_transcript: bool) {
        let voice_dir = dir.join(name);
        std::fs::create_dir_all(&voice_dir).unwrap();
        std::fs::write(voice_dir.join("reference.wav"), b"RIFF").unwrap();
        if with_transcript {
            std::fs::write(voice_dir.join("transcript.txt"), "hello there\n").unwrap();
        }
    }

    #[test]
    fn test_scan_discovers_clones() {
        let dir = temp_voice_dir();
        add_clone(&dir, "rick", true);
        add_clone(&dir, "morty", false);
        // A directory without reference audio is skipped
        std::fs::create_dir_all(dir.join("empty")).unwrap();

        let registry = VoiceRegistry::new(&dir);
        assert_eq!(registry.rebuild(Vec::new()), 2);

        let rick = registry.get("rick").unwrap();
        assert!(rick.is_clone());
        assert_eq!(rick.transcript.as_deref(), Some("hello there"));
        assert!(registry.get("morty").unwrap().transcript.is_none());
        assert!(registry.get("empty").is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_clone_entries_shadow_backend_entries() {
        let dir = temp_voice_dir();
        add_clone(&dir, "emma", false);

        let registry = VoiceRegistry::new(&dir);
        registry.rebuild(vec![
            Voice::catalog("emma", BackendKind::Kokoro, None),
            Voice::catalog("bf_lily", BackendKind::Kokoro, Some("British Female".into())),
        ]);

        assert_eq!(registry.count(), 2);
        let emma = registry.get("emma").unwrap();
        assert!(emma.is_clone(), "clone entry must win over backend entry");
        assert_eq!(registry.get("bf_lily").unwrap().backend, Some(BackendKind::Kokoro));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory_is_empty_catalog() {
        let registry = VoiceRegistry::new("/nonexistent/voices");
        assert_eq!(registry.rebuild(Vec::new()), 0);
    }
}
