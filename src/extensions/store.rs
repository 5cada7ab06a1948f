//! Persistent record of installed extensions.
//!
//! This module provides:
//! - `InstalledRecord` - One installed extension: where it lives, whether
//!   it is enabled, and any user permission overrides
//! - `ExtensionStateStore` - The storage seam the host loads from and
//!   writes through
//! - `JsonStateStore` / `MemoryStateStore` - File-backed and in-memory
//!   implementations

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::ExtensionId;
use crate::error::{PipelineError, PipelineResult};

/// Where an extension was installed from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InstallSource {
    /// Unpacked into the extensions directory by hand.
    #[default]
    Local,

    /// Installed from the extension registry.
    Registry,

    /// Linked from a development checkout.
    Dev,

    /// A source this build does not know. Records with this source are
    /// preserved on disk but skipped at load time.
    #[serde(other)]
    Unrecognized,
}

/// One installed extension as persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstalledRecord {
    pub id: ExtensionId,

    /// Directory containing the extension's `vela.toml`.
    pub path: PathBuf,

    #[serde(default)]
    pub source: InstallSource,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// User permission overrides. `None` means the manifest's declared set
    /// applies unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granted_permissions: Option<Vec<String>>,
}

fn default_enabled() -> bool {
    true
}

impl InstalledRecord {
    pub fn new(id: impl Into<ExtensionId>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            source: InstallSource::Local,
            enabled: true,
            granted_permissions: None,
        }
    }

    pub fn with_source(mut self, source: InstallSource) -> Self {
        self.source = source;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Storage seam for installed-extension records.
///
/// Mutations are write-through: the persistent record changes before any
/// in-memory state derived from it.
pub trait ExtensionStateStore: Send + Sync {
    /// All persisted records, in install order.
    fn installed(&self) -> PipelineResult<Vec<InstalledRecord>>;

    /// Insert or replace the record with the same id.
    fn upsert(&self, record: InstalledRecord) -> PipelineResult<()>;

    /// Remove the record; missing ids are not an error.
    fn remove(&self, extension_id: &str) -> PipelineResult<()>;

    /// Flip the persisted enabled flag.
    fn set_enabled(&self, extension_id: &str, enabled: bool) -> PipelineResult<()>;

    /// Replace the persisted permission overrides.
    fn set_permissions(&self, extension_id: &str, permissions: Vec<String>) -> PipelineResult<()>;
}

/// File-backed store keeping records as pretty-printed JSON.
pub struct JsonStateStore {
    path: PathBuf,
    records: Mutex<Vec<InstalledRecord>>,
}

impl JsonStateStore {
    /// Open the store at the default location, loading existing records.
    pub fn new() -> Self {
        Self::with_path(Self::default_path())
    }

    /// Open a store at a custom path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = Self::load_from_path(&path).unwrap_or_default();

        Self {
            path,
            records: Mutex::new(records),
        }
    }

    fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("vela").join("extensions.json"))
            .unwrap_or_else(|| PathBuf::from("extensions.json"))
    }

    fn load_from_path(path: &Path) -> Option<Vec<InstalledRecord>> {
        if !path.exists() {
            return None;
        }

        let contents = fs::read_to_string(path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    fn persist(&self, records: &[InstalledRecord]) -> PipelineResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PipelineError::StoreFailed(format!("create directory: {e}")))?;
        }

        let contents = serde_json::to_string_pretty(records)
            .map_err(|e| PipelineError::StoreFailed(format!("serialize records: {e}")))?;

        fs::write(&self.path, contents)
            .map_err(|e| PipelineError::StoreFailed(format!("write {}: {e}", self.path.display())))
    }

    fn lock(&self) -> PipelineResult<std::sync::MutexGuard<'_, Vec<InstalledRecord>>> {
        self.records
            .lock()
            .map_err(|_| PipelineError::StoreFailed("state store lock poisoned".to_string()))
    }
}

impl Default for JsonStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionStateStore for JsonStateStore {
    fn installed(&self) -> PipelineResult<Vec<InstalledRecord>> {
        Ok(self.lock()?.clone())
    }

    fn upsert(&self, record: InstalledRecord) -> PipelineResult<()> {
        let mut records = self.lock()?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.persist(&records)
    }

    fn remove(&self, extension_id: &str) -> PipelineResult<()> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|r| r.id != extension_id);
        if records.len() == before {
            return Ok(());
        }
        self.persist(&records)
    }

    fn set_enabled(&self, extension_id: &str, enabled: bool) -> PipelineResult<()> {
        let mut records = self.lock()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == extension_id)
            .ok_or_else(|| {
                PipelineError::StoreFailed(format!("no installed record for '{extension_id}'"))
            })?;
        record.enabled = enabled;
        self.persist(&records)
    }

    fn set_permissions(&self, extension_id: &str, permissions: Vec<String>) -> PipelineResult<()> {
        let mut records = self.lock()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == extension_id)
            .ok_or_else(|| {
                PipelineError::StoreFailed(format!("no installed record for '{extension_id}'"))
            })?;
        record.granted_permissions = Some(permissions);
        self.persist(&records)
    }
}

/// In-memory store for tests and ephemeral hosts.
#[derive(Default)]
pub struct MemoryStateStore {
    records: Mutex<Vec<InstalledRecord>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<InstalledRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    fn lock(&self) -> PipelineResult<std::sync::MutexGuard<'_, Vec<InstalledRecord>>> {
        self.records
            .lock()
            .map_err(|_| PipelineError::StoreFailed("state store lock poisoned".to_string()))
    }
}

impl ExtensionStateStore for MemoryStateStore {
    fn installed(&self) -> PipelineResult<Vec<InstalledRecord>> {
        Ok(self.lock()?.clone())
    }

    fn upsert(&self, record: InstalledRecord) -> PipelineResult<()> {
        let mut records = self.lock()?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    fn remove(&self, extension_id: &str) -> PipelineResult<()> {
        self.lock()?.retain(|r| r.id != extension_id);
        Ok(())
    }

    fn set_enabled(&self, extension_id: &str, enabled: bool) -> PipelineResult<()> {
        let mut records = self.lock()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == extension_id)
            .ok_or_else(|| {
                PipelineError::StoreFailed(format!("no installed record for '{extension_id}'"))
            })?;
        record.enabled = enabled;
        Ok(())
    }

    fn set_permissions(&self, extension_id: &str, permissions: Vec<String>) -> PipelineResult<()> {
        let mut records = self.lock()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == extension_id)
            .ok_or_else(|| {
                PipelineError::StoreFailed(format!("no installed record for '{extension_id}'"))
            })?;
        record.granted_permissions = Some(permissions);
        Ok(())
    }
}
