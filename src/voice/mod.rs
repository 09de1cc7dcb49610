//! Voice catalog and routing preferences
//!
//! Discovery of voice-clone assets on disk, the merged voice catalog,
//! and the persisted per-voice backend preferences.

pub mod prefs;
pub mod registry;

pub use prefs::VoicePreferences;
pub use registry::{Voice, VoiceRegistry};
