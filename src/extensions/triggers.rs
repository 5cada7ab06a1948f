//! Trigger and abbreviation routing.
//!
//! Decides which loaded extensions a query should reach. An extension is
//! eligible when the query starts with one of its declared trigger
//! prefixes, or when a user-defined abbreviation bound to it matches.
//! Several extensions matching the same query is normal; there is no
//! single-winner claim on a trigger.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::loader::ExtensionHost;
use super::manifest::ExtensionManifest;
use super::ExtensionId;
use crate::config::ExtensionsConfig;
use crate::error::{PipelineError, PipelineResult};

/// A user-defined shorthand bound to one extension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AbbreviationEntry {
    pub keyword: String,

    pub extension_id: ExtensionId,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Persistent storage for abbreviation entries.
///
/// Keeps entries in a JSON file, cached in memory and saved on demand
/// (and best-effort on drop).
pub struct AbbreviationStore {
    /// Backing file; `None` keeps the store memory-only.
    path: Option<PathBuf>,

    entries: Vec<AbbreviationEntry>,

    /// Whether the cache has unsaved changes.
    dirty: bool,
}

impl AbbreviationStore {
    /// Open the store at the default location, loading existing entries.
    pub fn new() -> Self {
        Self::with_path(Self::default_path())
    }

    /// Open a store backed by a custom path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load_from_path(&path).unwrap_or_default();

        Self {
            path: Some(path),
            entries,
            dirty: false,
        }
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Vec::new(),
            dirty: false,
        }
    }

    /// Open the store honoring the configured path override.
    pub fn from_config(config: &ExtensionsConfig) -> Self {
        match &config.abbreviations_path {
            Some(path) => Self::with_path(path),
            None => Self::new(),
        }
    }

    fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("vela").join("abbreviations.json"))
            .unwrap_or_else(|| PathBuf::from("abbreviations.json"))
    }

    fn load_from_path(path: &Path) -> Option<Vec<AbbreviationEntry>> {
        if !path.exists() {
            return None;
        }

        let contents = fs::read_to_string(path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    pub fn entries(&self) -> &[AbbreviationEntry] {
        &self.entries
    }

    /// Add an abbreviation, replacing any entry with the same keyword.
    pub fn add(&mut self, keyword: impl Into<String>, extension_id: impl Into<ExtensionId>) {
        let entry = AbbreviationEntry {
            keyword: keyword.into(),
            extension_id: extension_id.into(),
            enabled: true,
        };

        self.entries.retain(|e| e.keyword != entry.keyword);
        self.entries.push(entry);
        self.dirty = true;
    }

    /// Remove an abbreviation by keyword. Returns whether one existed.
    pub fn remove(&mut self, keyword: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.keyword != keyword);

        let removed = self.entries.len() != before;
        if removed {
            self.dirty = true;
        }
        removed
    }

    /// Enable or disable an abbreviation. Returns whether it existed.
    pub fn set_enabled(&mut self, keyword: &str, enabled: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.keyword == keyword) {
            Some(entry) => {
                entry.enabled = enabled;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Save entries to disk. Memory-only stores are a no-op.
    pub fn save(&mut self) -> PipelineResult<()> {
        if !self.dirty {
            return Ok(());
        }

        let Some(path) = &self.path else {
            self.dirty = false;
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PipelineError::StoreFailed(format!("create directory: {e}")))?;
        }

        let contents = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| PipelineError::StoreFailed(format!("serialize abbreviations: {e}")))?;

        fs::write(path, contents)
            .map_err(|e| PipelineError::StoreFailed(format!("write {}: {e}", path.display())))?;

        self.dirty = false;
        Ok(())
    }
}

impl Default for AbbreviationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AbbreviationStore {
    fn drop(&mut self) {
        let _ = self.save();
    }
}

/// Extension ids eligible for `query`, in registration order.
///
/// An extension is excluded when its sandbox context is missing or
/// disabled, regardless of how well its triggers match.
pub fn resolve_eligible(
    query: &str,
    host: &ExtensionHost,
    abbreviations: &AbbreviationStore,
) -> Vec<ExtensionId> {
    let query_lower = query.to_lowercase();

    host.registration_order()
        .iter()
        .filter(|id| host.sandbox().is_enabled(id))
        .filter(|id| {
            let Some(handle) = host.handle(id) else {
                return false;
            };

            trigger_match(&query_lower, &handle.manifest)
                || abbreviation_match(&query_lower, id, abbreviations)
        })
        .cloned()
        .collect()
}

/// Any declared trigger is a case-insensitive prefix of the query.
fn trigger_match(query_lower: &str, manifest: &ExtensionManifest) -> bool {
    manifest
        .trigger_prefixes()
        .any(|prefix| query_lower.starts_with(&prefix.to_lowercase()))
}

/// An enabled abbreviation for this extension equals the query exactly,
/// or the query is `"<keyword>:"` followed by anything.
fn abbreviation_match(
    query_lower: &str,
    extension_id: &str,
    abbreviations: &AbbreviationStore,
) -> bool {
    abbreviations
        .entries()
        .iter()
        .filter(|entry| entry.enabled && entry.extension_id == extension_id)
        .any(|entry| {
            let keyword_lower = entry.keyword.to_lowercase();
            query_lower == keyword_lower || query_lower.starts_with(&format!("{keyword_lower}:"))
        })
}
