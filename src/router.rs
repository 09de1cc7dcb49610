//! Backend routing and failover chains
//!
//! Given a resolved voice, the router produces the ordered list of
//! adapters to try. Affinity runs strongest-first: an explicit backend
//! in the request, then a stored voice preference, then a unique
//! capability claim, then the default backend. Every other adapter
//! that claims the voice joins the tail as a failover chain, with
//! down-health adapters demoted behind healthy ones but never removed.
//! Identical inputs always yield identical chains.

use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::adapters::RegisteredAdapter;
use crate::core::error::{Result, TtsError};
use crate::profiles::BackendKind;
use crate::voice::{Voice, VoicePreferences};

/// Routes synthesis requests across the adapter set
pub struct Router {
    adapters: Vec<Arc<RegisteredAdapter>>,
    default_backend: RwLock<BackendKind>,
}

impl Router {
    pub fn new(adapters: Vec<Arc<RegisteredAdapter>>, default_backend: BackendKind) -> Self {
        Self {
            adapters,
            default_backend: RwLock::new(default_backend),
        }
    }

    /// All registered adapters in construction order
    pub fn adapters(&self) -> &[Arc<RegisteredAdapter>] {
        &self.adapters
    }

    pub fn get(&self, kind: BackendKind) -> Option<Arc<RegisteredAdapter>> {
        self.adapters.iter().find(|a| a.kind() == kind).cloned()
    }

    pub fn default_backend(&self) -> BackendKind {
        *self.default_backend.read().expect("router lock poisoned")
    }

    /// Switch the default backend; refuses kinds that are not registered
    pub fn set_default(&self, kind: BackendKind) -> bool {
        if self.get(kind).is_none() {
            return false;
        }
        *self.default_backend.write().expect("router lock poisoned") = kind;
        true
    }

    /// Build the ordered adapter chain for one voice
    pub fn chain(
        &self,
        voice: &Voice,
        explicit: Option<BackendKind>,
        prefs: &VoicePreferences,
    ) -> Result<Vec<Arc<RegisteredAdapter>>> {
        // An explicit backend that supports the voice is used alone
        if let Some(kind) = explicit {
            if let Some(adapter) = self.get(kind) {
                if adapter.backend.supports_voice(voice) {
                    return Ok(vec![adapter]);
                }
            }
            debug!("explicit backend {kind:?} does not support '{}'", voice.name);
        }

        let candidates: Vec<Arc<RegisteredAdapter>> = self
            .adapters
            .iter()
            .filter(|a| a.backend.supports_voice(voice))
            .cloned()
            .collect();

        if candidates.is_empty() {
            return Err(TtsError::VoiceUnknown {
                voice: voice.name.clone(),
            });
        }

        let head = self.pick_head(voice, prefs, &candidates);

        let mut chain = Vec::with_capacity(candidates.len());
        if let Some(head) = head {
            chain.push(head);
        }
        for candidate in candidates {
            if !chain.iter().any(|a| a.kind() == candidate.kind()) {
                chain.push(candidate);
            }
        }

        // Down adapters stay eligible but move behind the healthy ones
        let (up, down): (Vec<_>, Vec<_>) =
            chain.into_iter().partition(|a| !a.health.is_down());
        let mut chain = up;
        chain.extend(down);
        Ok(chain)
    }

    /// Strongest affinity among preference, unique claim, and default
    fn pick_head(
        &self,
        voice: &Voice,
        prefs: &VoicePreferences,
        candidates: &[Arc<RegisteredAdapter>],
    ) -> Option<Arc<RegisteredAdapter>> {
        if let Some(preferred) = prefs.get(&voice.name) {
            // A preference naming an unregistered backend is ignored
            match self.get(preferred) {
                Some(adapter) if adapter.backend.supports_voice(voice) => {
                    return Some(adapter);
                }
                _ => debug!(
                    "preference for '{}' names unusable backend {preferred:?}",
                    voice.name
                ),
            }
        }

        if candidates.len() == 1 {
            return Some(candidates[0].clone());
        }

        let default = self.default_backend();
        candidates.iter().find(|a| a.kind() == default).cloned()
    }
}
