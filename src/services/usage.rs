//! Usage-frequency tracking for ranked results.
//!
//! Blends frequency (how often) with recency (how recently) using an
//! exponential decay:
//!
//! ```text
//! frequency = frequency_score × decay_factor
//! decay_factor = e^(-λ × age_days)
//! λ = ln(2) / half_life_days
//! ```
//!
//! With a 14-day half-life, a result picked 14 days ago carries half the
//! recency weight of one picked today. The output feeds the scorer's
//! `usageFrequency` term on a roughly 0-100 scale.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::result::ResultKind;

/// Half-life in days for the exponential decay function.
const HALF_LIFE_DAYS: f64 = 14.0;

/// Decay constant: λ = ln(2) / half_life
const LAMBDA: f64 = std::f64::consts::LN_2 / HALF_LIFE_DAYS;

/// Maximum age in days before an entry is pruned.
const MAX_AGE_DAYS: u64 = 90;

/// Debounce interval for saving (in number of updates).
const SAVE_DEBOUNCE_COUNT: u32 = 5;

/// A single usage entry tracking frequency and recency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEntry {
    pub id: String,

    pub kind: ResultKind,

    /// Number of times this result was picked.
    pub count: u32,

    /// Unix timestamp of last use.
    pub last_used: u64,

    /// Unix timestamp of first use.
    pub first_used: u64,
}

impl UsageEntry {
    fn new(id: String, kind: ResultKind) -> Self {
        let now = now_secs();
        Self {
            id,
            kind,
            count: 1,
            last_used: now,
            first_used: now,
        }
    }

    fn record_use(&mut self) {
        self.count += 1;
        self.last_used = now_secs();
    }

    /// Age in days since last use.
    fn age_days(&self) -> f64 {
        let age_secs = now_secs().saturating_sub(self.last_used);
        age_secs as f64 / 86400.0
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Usage store with debounced persistence.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageTracker {
    /// Map of result id to usage entry.
    entries: HashMap<String, UsageEntry>,

    /// Number of updates since last save.
    #[serde(skip)]
    updates_since_save: u32,

    /// Path to the data file; `None` keeps the tracker memory-only.
    #[serde(skip)]
    data_path: Option<PathBuf>,
}

impl UsageTracker {
    /// A tracker that never touches disk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load usage data from the default location. Returns an empty
    /// tracker if the file is missing or corrupted.
    pub fn load() -> Self {
        Self::load_path(Self::default_path())
    }

    /// Load usage data backed by a custom path.
    pub fn load_from(path: impl Into<PathBuf>) -> Self {
        Self::load_path(Some(path.into()))
    }

    fn load_path(data_path: Option<PathBuf>) -> Self {
        let mut tracker = match &data_path {
            Some(path) if path.exists() => match fs::read_to_string(path) {
                Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
                Err(_) => Self::default(),
            },
            _ => Self::default(),
        };

        tracker.data_path = data_path;
        tracker.prune_stale();
        tracker
    }

    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("vela").join("usage.json"))
    }

    /// Frequency score for a result, `0.0` when it was never used.
    ///
    /// Combined score: 40% log-scaled frequency, 60% decayed recency,
    /// sized so recently common items land in the 0-100 range.
    pub fn frequency(&self, id: &str) -> f64 {
        let Some(entry) = self.entries.get(id) else {
            return 0.0;
        };

        let freq_score = (entry.count as f64 + 1.0).ln();
        let recency_score = (-LAMBDA * entry.age_days()).exp();

        0.4 * freq_score * 10.0 + 0.6 * recency_score * 100.0
    }

    /// Record that a result was picked. Saves to disk every few updates.
    pub fn record_use(&mut self, id: &str, kind: ResultKind) {
        self.entries
            .entry(id.to_string())
            .and_modify(|e| e.record_use())
            .or_insert_with(|| UsageEntry::new(id.to_string(), kind));

        self.updates_since_save += 1;

        if self.updates_since_save >= SAVE_DEBOUNCE_COUNT {
            self.save();
        }
    }

    /// Remove entries not used in `MAX_AGE_DAYS`.
    pub fn prune_stale(&mut self) {
        let cutoff_secs = now_secs().saturating_sub(MAX_AGE_DAYS * 86400);

        let before_count = self.entries.len();
        self.entries.retain(|_, e| e.last_used > cutoff_secs);

        if self.entries.len() != before_count {
            self.save();
        }
    }

    /// Save data to disk. Best-effort; a failed write is retried on the
    /// next debounce tick.
    pub fn save(&mut self) {
        self.updates_since_save = 0;

        let Some(ref path) = self.data_path else {
            return;
        };

        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        if let Ok(json) = serde_json::to_string_pretty(self) {
            let _ = fs::write(path, json);
        }
    }

    /// Force an immediate save (e.g., on shutdown).
    pub fn flush(&mut self) {
        if self.updates_since_save > 0 {
            self.save();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
