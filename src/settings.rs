//! Harness configuration
//!
//! Loaded from JSON when a path is given; anything missing or malformed
//! falls back to defaults with a warning. The collision core itself takes no
//! configuration beyond the worker count handed to it at the call site.

use std::path::Path;
use std::thread;

use serde::{Deserialize, Serialize};

/// Demo harness settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// RNG seed for the spawned field
    pub seed: u64,
    pub bubble_count: usize,
    pub cat_count: usize,
    pub shrine_count: usize,
    /// Ticks to run before exiting
    pub ticks: u64,
    /// Worker pool size override; derived from the host when absent
    pub worker_threads: Option<usize>,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            seed: 0x00B0_BB1E,
            bubble_count: 20_000,
            cat_count: 24,
            shrine_count: 4,
            ticks: 600,
            worker_threads: None,
        }
    }
}

impl SimSettings {
    /// Load settings from a JSON file, falling back to defaults on any error
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    log::warn!("Ignoring malformed settings file {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!("Could not read settings file {}: {err}", path.display());
                Self::default()
            }
        }
    }

    /// Worker pool size: the configured override, or hardware concurrency
    /// minus one (the simulation thread keeps a core), never below three.
    pub fn worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            let hardware = thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
            hardware.saturating_sub(1).max(3)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_floor_is_three() {
        let settings = SimSettings {
            worker_threads: None,
            ..Default::default()
        };
        assert!(settings.worker_threads() >= 3);

        let pinned = SimSettings {
            worker_threads: Some(1),
            ..Default::default()
        };
        assert_eq!(pinned.worker_threads(), 1);
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = SimSettings {
            seed: 42,
            bubble_count: 123,
            worker_threads: Some(8),
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).expect("serialize");
        let back: SimSettings = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.seed, 42);
        assert_eq!(back.bubble_count, 123);
        assert_eq!(back.worker_threads, Some(8));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let back: SimSettings = serde_json::from_str(r#"{"bubble_count": 99}"#).expect("deserialize");
        assert_eq!(back.bubble_count, 99);
        assert_eq!(back.ticks, SimSettings::default().ticks);
    }
}
