//! Per-adapter health tracking
//!
//! Health starts unknown, moves with every synthesis attempt, and a
//! backed-off probe may restore a down adapter. Updates are plain
//! atomics: concurrent requests may briefly read a stale state, which
//! costs at most one extra attempt against a freshly-down backend.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Consecutive failures before an adapter is considered down
const DOWN_THRESHOLD: u32 = 3;

/// Minimum wait between probes of a down adapter
const PROBE_BACKOFF: Duration = Duration::from_secs(30);

/// Observed availability of one adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Unknown,
    Up,
    Down,
}

/// Atomic health record for one adapter
pub struct BackendHealth {
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    last_probe: Mutex<Option<Instant>>,
}

const STATE_UNKNOWN: u8 = 0;
const STATE_UP: u8 = 1;
const STATE_DOWN: u8 = 2;

impl BackendHealth {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(STATE_UNKNOWN),
            consecutive_failures: AtomicU32::new(0),
            last_probe: Mutex::new(None),
        }
    }

    pub fn availability(&self) -> Availability {
        match self.state.load(Ordering::Relaxed) {
            STATE_UP => Availability::Up,
            STATE_DOWN => Availability::Down,
            _ => Availability::Unknown,
        }
    }

    pub fn is_down(&self) -> bool {
        self.availability() == Availability::Down
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Record a successful synthesis or probe
    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.state.store(STATE_UP, Ordering::Relaxed);
    }

    /// Record a transient failure; trips to down at the threshold
    pub fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= DOWN_THRESHOLD {
            self.state.store(STATE_DOWN, Ordering::Relaxed);
        }
    }

    /// Whether a down adapter is due for a probe, marking the attempt
    pub fn probe_due(&self) -> bool {
        if !self.is_down() {
            return false;
        }
        let mut last = self.last_probe.lock().expect("health probe lock poisoned");
        match *last {
            Some(at) if at.elapsed() < PROBE_BACKOFF => false,
            _ => {
                *last = Some(Instant::now());
                true
            }
        }
    }
}

impl Default for BackendHealth {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let health = BackendHealth::new();
        assert_eq!(health.availability(), Availability::Unknown);

        health.record_success();
        assert_eq!(health.availability(), Availability::Up);

        health.record_failure();
        health.record_failure();
        assert_eq!(health.availability(), Availability::Up);
        health.record_failure();
        assert_eq!(health.availability(), Availability::Down);
        assert_eq!(health.consecutive_failures(), 3);

        health.record_success();
        assert_eq!(health.availability(), Availability::Up);
        assert_eq!(health.consecutive_failures(), 0);
    }

    #[test]
    fn test_probe_backoff() {
        let health = BackendHealth::new();
        // Not down yet: no probe needed
        assert!(!health.probe_due());

        for _ in 0..3 {
            health.record_failure();
        }
        assert!(health.probe_due());
        // Second ask inside the backoff window is suppressed
        assert!(!health.probe_due());
    }
}
