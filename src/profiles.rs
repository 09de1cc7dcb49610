//! Backend capability profiles
//!
//! Each backend family has a generation ceiling beyond which quality
//! collapses or the request fails outright. The profile table drives
//! the chunker (how to split), the stitcher (crossfade width) and the
//! pipeline (whether chunking applies at all).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag identifying an upstream engine family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Kokoro neural catalog (OpenAI-shaped REST server)
    Kokoro,
    /// OpenAudio / Fish Speech voice cloning
    OpenAudio,
    /// VoxCPM character cloning behind a Gradio session API
    VoxCpm,
    /// VoxCPM 1.5 clone server (OpenAI-compatible, 44.1 kHz)
    VoxCpm15,
    /// Kyutai / Moshi emotion presets
    Kyutai,
    /// Higgs generative characters
    Higgs,
    /// VibeVoice streaming presets
    VibeVoice,
    /// ElevenLabs hosted cloud API
    ElevenLabs,
}

impl BackendKind {
    /// All kinds, in the stable order the router falls back through
    pub const ALL: [BackendKind; 8] = [
        BackendKind::Kokoro,
        BackendKind::OpenAudio,
        BackendKind::VoxCpm15,
        BackendKind::VoxCpm,
        BackendKind::Higgs,
        BackendKind::VibeVoice,
        BackendKind::Kyutai,
        BackendKind::ElevenLabs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Kokoro => "kokoro",
            BackendKind::OpenAudio => "openaudio",
            BackendKind::VoxCpm => "voxcpm",
            BackendKind::VoxCpm15 => "voxcpm15",
            BackendKind::Kyutai => "kyutai",
            BackendKind::Higgs => "higgs",
            BackendKind::VibeVoice => "vibevoice",
            BackendKind::ElevenLabs => "elevenlabs",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "kokoro" => Some(BackendKind::Kokoro),
            "openaudio" => Some(BackendKind::OpenAudio),
            "voxcpm" => Some(BackendKind::VoxCpm),
            "voxcpm15" => Some(BackendKind::VoxCpm15),
            "kyutai" => Some(BackendKind::Kyutai),
            "higgs" => Some(BackendKind::Higgs),
            "vibevoice" => Some(BackendKind::VibeVoice),
            "elevenlabs" => Some(BackendKind::ElevenLabs),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static capability record for one backend kind
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BackendProfile {
    /// Backend family this profile describes
    pub kind: BackendKind,
    /// Hard word ceiling; a chunk over this fails the request
    pub max_words: usize,
    /// Hard character ceiling
    pub max_chars: usize,
    /// Soft target the chunker packs toward
    pub optimal_words: usize,
    /// Whether long text must be split for this backend at all
    pub needs_chunking: bool,
    /// Crossfade width applied when stitching this backend's chunks
    pub crossfade_ms: u32,
    /// Sample rate the backend natively emits
    pub native_sample_rate: u32,
}

const PROFILES: [BackendProfile; 8] = [
    BackendProfile {
        kind: BackendKind::Kokoro,
        max_words: 200,
        max_chars: 1200,
        optimal_words: 150,
        needs_chunking: true,
        crossfade_ms: 30,
        native_sample_rate: 24_000,
    },
    BackendProfile {
        kind: BackendKind::OpenAudio,
        max_words: 75,
        max_chars: 400,
        optimal_words: 50,
        needs_chunking: true,
        crossfade_ms: 50,
        native_sample_rate: 44_100,
    },
    BackendProfile {
        kind: BackendKind::VoxCpm,
        max_words: 75,
        max_chars: 400,
        optimal_words: 50,
        needs_chunking: true,
        crossfade_ms: 50,
        native_sample_rate: 16_000,
    },
    BackendProfile {
        kind: BackendKind::VoxCpm15,
        max_words: 150,
        max_chars: 800,
        optimal_words: 100,
        needs_chunking: true,
        crossfade_ms: 50,
        native_sample_rate: 44_100,
    },
    BackendProfile {
        kind: BackendKind::Kyutai,
        max_words: 40,
        max_chars: 250,
        optimal_words: 30,
        needs_chunking: true,
        crossfade_ms: 30,
        native_sample_rate: 24_000,
    },
    BackendProfile {
        kind: BackendKind::Higgs,
        max_words: 100,
        max_chars: 600,
        optimal_words: 75,
        needs_chunking: true,
        crossfade_ms: 50,
        native_sample_rate: 24_000,
    },
    BackendProfile {
        kind: BackendKind::VibeVoice,
        max_words: 100,
        max_chars: 500,
        optimal_words: 75,
        needs_chunking: true,
        crossfade_ms: 80,
        native_sample_rate: 24_000,
    },
    BackendProfile {
        kind: BackendKind::ElevenLabs,
        max_words: 2500,
        max_chars: 15_000,
        optimal_words: 500,
        // The cloud service handles long input itself
        needs_chunking: false,
        crossfade_ms: 0,
        native_sample_rate: 44_100,
    },
];

/// Look up the capability profile for a backend kind
pub fn profile(kind: BackendKind) -> &'static BackendProfile {
    PROFILES
        .iter()
        .find(|p| p.kind == kind)
        .expect("every BackendKind has a profile entry")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_profile() {
        for kind in BackendKind::ALL {
            let p = profile(kind);
            assert_eq!(p.kind, kind);
        }
    }

    #[test]
    fn test_profile_invariants() {
        for kind in BackendKind::ALL {
            let p = profile(kind);
            assert!(
                p.optimal_words <= p.max_words,
                "{kind}: optimal must not exceed the hard ceiling"
            );
            assert!(p.max_chars > 0 && p.native_sample_rate > 0);
        }
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in BackendKind::ALL {
            assert_eq!(BackendKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(BackendKind::parse("KOKORO"), Some(BackendKind::Kokoro));
        assert_eq!(BackendKind::parse("nope"), None);
    }
}
