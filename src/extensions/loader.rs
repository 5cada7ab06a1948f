//! Extension host - loads extensions and keeps the sandbox in step.
//!
//! The ExtensionHost is responsible for:
//! - Reading and validating manifests from extension directories
//! - Resolving each extension's code module and normalizing its shape
//! - Registering loaded extensions with the `SandboxRegistry`
//! - Replaying persisted enabled flags and permission grants at startup
//! - Writing enable/grant mutations back through the state store
//!
//! The handle map here and the context map in the sandbox must describe
//! the same set of extensions at all times. Every path that touches one
//! touches the other.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::manifest::ExtensionManifest;
use super::module::{CommandModule, ExtensionModule, ModuleExports};
use super::sandbox::SandboxRegistry;
use super::store::{ExtensionStateStore, InstallSource, InstalledRecord, JsonStateStore};
use super::ExtensionId;
use crate::config::ExtensionsConfig;
use crate::error::{PipelineError, PipelineResult};

/// Configuration for the extension host.
#[derive(Clone)]
pub struct HostConfig {
    /// Directory containing unpacked extensions.
    pub extensions_dir: PathBuf,

    /// Produces the code module behind each manifest.
    pub resolver: Arc<dyn ModuleResolver>,

    /// Persisted installed-extension records; `None` for ephemeral hosts.
    pub state_store: Option<Arc<dyn ExtensionStateStore>>,
}

impl HostConfig {
    /// Host wiring from the `[extensions]` config section. Explicit paths
    /// override the platform defaults.
    pub fn from_config(config: &ExtensionsConfig, resolver: Arc<dyn ModuleResolver>) -> Self {
        let store: Arc<dyn ExtensionStateStore> = match &config.state_path {
            Some(path) => Arc::new(JsonStateStore::with_path(path)),
            None => Arc::new(JsonStateStore::new()),
        };

        Self {
            extensions_dir: config
                .directory
                .clone()
                .unwrap_or_else(default_extensions_dir),
            resolver,
            state_store: Some(store),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            extensions_dir: default_extensions_dir(),
            resolver: Arc::new(StaticResolver::new()),
            state_store: None,
        }
    }
}

impl std::fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostConfig")
            .field("extensions_dir", &self.extensions_dir)
            .field("state_store", &self.state_store.is_some())
            .finish()
    }
}

fn default_extensions_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("vela").join("extensions"))
        .unwrap_or_else(|| PathBuf::from("extensions"))
}

/// Produces an extension's code module from its manifest and directory.
pub trait ModuleResolver: Send + Sync {
    fn resolve(&self, manifest: &ExtensionManifest, dir: &Path) -> Result<ModuleExports, String>;
}

type ExportsFactory = Box<dyn Fn() -> ModuleExports + Send + Sync>;

/// Resolver backed by modules registered ahead of time, keyed by
/// extension id. Extensions without a registered module fall back to
/// their declarative commands.
#[derive(Default)]
pub struct StaticResolver {
    factories: HashMap<ExtensionId, ExportsFactory>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module<F>(mut self, extension_id: impl Into<ExtensionId>, factory: F) -> Self
    where
        F: Fn() -> ModuleExports + Send + Sync + 'static,
    {
        self.factories
            .insert(extension_id.into(), Box::new(factory));
        self
    }
}

impl ModuleResolver for StaticResolver {
    fn resolve(&self, manifest: &ExtensionManifest, _dir: &Path) -> Result<ModuleExports, String> {
        match self.factories.get(manifest.id()) {
            Some(factory) => Ok(factory()),
            None => Err(format!("no module registered for '{}'", manifest.id())),
        }
    }
}

/// The normalized in-memory record for one loaded extension.
pub struct ExtensionHandle {
    pub manifest: ExtensionManifest,
    pub module: Arc<dyn ExtensionModule>,
}

impl std::fmt::Debug for ExtensionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionHandle")
            .field("id", &self.manifest.id())
            .finish()
    }
}

/// A load failure the host recorded instead of propagating.
///
/// Carries a placeholder manifest, so callers must branch on the error
/// text being present, never on the placeholder id: simultaneous
/// failures share it.
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub manifest: ExtensionManifest,
    pub error: String,
}

/// Result of loading one extension directory.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Loaded, registered with the sandbox, and searchable.
    Loaded(ExtensionId),

    /// Module resolution failed; recorded, not thrown.
    Failed(LoadFailure),
}

/// Owns every loaded extension and its sandbox context.
pub struct ExtensionHost {
    config: HostConfig,

    /// Permission and enablement state per extension.
    sandbox: SandboxRegistry,

    /// Normalized handles by extension id.
    handles: HashMap<ExtensionId, ExtensionHandle>,

    /// Load order; extension results merge in this order.
    registration_order: Vec<ExtensionId>,

    /// Failures recorded by `load` and `load_installed`.
    failures: Vec<LoadFailure>,
}

impl ExtensionHost {
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            sandbox: SandboxRegistry::new(),
            handles: HashMap::new(),
            registration_order: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Load one extension from a directory containing `vela.toml`.
    ///
    /// Manifest problems are hard errors. A module that fails to resolve
    /// is a soft `LoadOutcome::Failed` so one broken extension cannot
    /// take down a bulk load.
    pub fn load(&mut self, dir: &Path) -> PipelineResult<LoadOutcome> {
        let manifest = ExtensionManifest::load(dir)?;
        manifest.validate()?;

        let id = manifest.id().to_string();
        if self.handles.contains_key(&id) {
            return Err(PipelineError::DuplicateExtension(id));
        }

        let exports = match self.config.resolver.resolve(&manifest, dir) {
            Ok(exports) => exports,
            Err(error) => match CommandModule::from_manifest(&manifest) {
                Some(commands) => {
                    debug!(
                        extension = id.as_str(),
                        "no code module, serving declarative commands"
                    );
                    ModuleExports::Bundled(Box::new(commands))
                }
                None => {
                    warn!(
                        extension = id.as_str(),
                        error = error.as_str(),
                        "extension module failed to load"
                    );
                    let failure = LoadFailure {
                        manifest: ExtensionManifest::placeholder(directory_name(dir)),
                        error: PipelineError::LoadFailed {
                            extension: id,
                            message: error,
                        }
                        .to_string(),
                    };
                    self.failures.push(failure.clone());
                    return Ok(LoadOutcome::Failed(failure));
                }
            },
        };

        let module = exports.into_module();

        // Sandbox registration comes first: an extension must never be
        // reachable through a handle before it has a context.
        self.sandbox
            .register_extension(&id, manifest.extension.permissions.iter().cloned())?;
        self.handles.insert(id.clone(), ExtensionHandle { manifest, module });
        self.registration_order.push(id.clone());

        Ok(LoadOutcome::Loaded(id))
    }

    /// Load every persisted record from the state store.
    ///
    /// Records with an unrecognized install source are skipped. Each
    /// record's enabled flag and permission overrides are applied to the
    /// sandbox immediately after registration, before control returns,
    /// so a disabled extension never runs even transiently.
    pub fn load_installed(&mut self) -> PipelineResult<Vec<LoadOutcome>> {
        let Some(store) = self.config.state_store.clone() else {
            return Ok(Vec::new());
        };

        let mut outcomes = Vec::new();

        for record in store.installed()? {
            if record.source == InstallSource::Unrecognized {
                warn!(
                    extension = record.id.as_str(),
                    "skipping record with unrecognized install source"
                );
                continue;
            }

            match self.load_record(&record) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(
                        extension = record.id.as_str(),
                        error = %e,
                        "failed to load installed extension"
                    );
                }
            }
        }

        Ok(outcomes)
    }

    fn load_record(&mut self, record: &InstalledRecord) -> PipelineResult<LoadOutcome> {
        let outcome = self.load(&record.path)?;

        if let LoadOutcome::Loaded(id) = &outcome {
            if let Some(granted) = &record.granted_permissions {
                self.sandbox.set_permissions(id, granted.iter().cloned())?;
            }
            self.sandbox.set_enabled(id, record.enabled)?;
        }

        Ok(outcome)
    }

    /// Load every extension directory under `extensions_dir`, sorted by
    /// name for a deterministic registration order. Directories without a
    /// manifest are ignored; invalid ones are logged and skipped.
    pub fn load_directory(&mut self) -> PipelineResult<Vec<LoadOutcome>> {
        let extensions_dir = self.config.extensions_dir.clone();

        if !extensions_dir.exists() {
            return Ok(Vec::new());
        }

        let mut dirs: Vec<PathBuf> = std::fs::read_dir(&extensions_dir)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        let mut outcomes = Vec::new();
        for path in dirs {
            match self.load(&path) {
                Ok(outcome) => outcomes.push(outcome),
                Err(PipelineError::ManifestNotFound(_)) => continue,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping extension");
                }
            }
        }

        Ok(outcomes)
    }

    /// Unregister and drop an extension.
    pub fn unload(&mut self, extension_id: &str) -> PipelineResult<()> {
        if !self.handles.contains_key(extension_id) {
            return Err(PipelineError::NotLoaded(extension_id.to_string()));
        }

        self.sandbox.unregister_extension(extension_id)?;
        self.handles.remove(extension_id);
        self.registration_order.retain(|id| id != extension_id);
        Ok(())
    }

    /// Enable or disable an extension, writing through the state store
    /// before the in-memory sandbox changes.
    pub fn set_extension_enabled(
        &mut self,
        extension_id: &str,
        enabled: bool,
    ) -> PipelineResult<()> {
        if self.sandbox.get_context(extension_id).is_none() {
            return Err(PipelineError::NotRegistered(extension_id.to_string()));
        }

        if let Some(store) = &self.config.state_store {
            store.set_enabled(extension_id, enabled)?;
        }

        self.sandbox.set_enabled(extension_id, enabled)
    }

    /// Grant one permission token. Already-granted tokens are a no-op.
    pub fn grant_permission(&mut self, extension_id: &str, token: &str) -> PipelineResult<()> {
        let mut tokens = self.granted_permissions(extension_id)?;
        if tokens.iter().any(|t| t == token) {
            return Ok(());
        }
        tokens.push(token.to_string());
        self.persist_permissions(extension_id, tokens)
    }

    /// Revoke one permission token. Missing tokens are a no-op.
    pub fn revoke_permission(&mut self, extension_id: &str, token: &str) -> PipelineResult<()> {
        let mut tokens = self.granted_permissions(extension_id)?;
        let before = tokens.len();
        tokens.retain(|t| t != token);
        if tokens.len() == before {
            return Ok(());
        }
        self.persist_permissions(extension_id, tokens)
    }

    fn granted_permissions(&self, extension_id: &str) -> PipelineResult<Vec<String>> {
        let context = self
            .sandbox
            .get_context(extension_id)
            .ok_or_else(|| PipelineError::NotRegistered(extension_id.to_string()))?;
        Ok(context.granted_permissions.iter().cloned().collect())
    }

    fn persist_permissions(
        &mut self,
        extension_id: &str,
        tokens: Vec<String>,
    ) -> PipelineResult<()> {
        if let Some(store) = &self.config.state_store {
            store.set_permissions(extension_id, tokens.clone())?;
        }
        self.sandbox.set_permissions(extension_id, tokens)
    }

    /// Record a diagnostic from a failed extension search.
    pub fn record_search_error(&mut self, extension_id: &str, message: impl Into<String>) {
        self.sandbox.record_error(extension_id, message);
    }

    /// Clear a previous diagnostic after a successful search.
    pub fn clear_search_error(&mut self, extension_id: &str) {
        self.sandbox.clear_error(extension_id);
    }

    pub fn sandbox(&self) -> &SandboxRegistry {
        &self.sandbox
    }

    pub fn handle(&self, extension_id: &str) -> Option<&ExtensionHandle> {
        self.handles.get(extension_id)
    }

    pub fn is_loaded(&self, extension_id: &str) -> bool {
        self.handles.contains_key(extension_id)
    }

    /// Loaded extension ids in registration order.
    pub fn registration_order(&self) -> &[ExtensionId] {
        &self.registration_order
    }

    /// Loaded manifests in registration order.
    pub fn manifests(&self) -> impl Iterator<Item = &ExtensionManifest> {
        self.registration_order
            .iter()
            .filter_map(|id| self.handles.get(id))
            .map(|handle| &handle.manifest)
    }

    /// Clone the module handles for the given ids, skipping any that are
    /// not loaded. Input order is preserved.
    pub fn modules_for(&self, ids: &[ExtensionId]) -> Vec<(ExtensionId, Arc<dyn ExtensionModule>)> {
        ids.iter()
            .filter_map(|id| {
                self.handles
                    .get(id)
                    .map(|handle| (id.clone(), Arc::clone(&handle.module)))
            })
            .collect()
    }

    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    pub fn extension_count(&self) -> usize {
        self.handles.len()
    }
}

fn directory_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::result::{ResultKind, SearchResult};
    use crate::extensions::manifest::PLACEHOLDER_ID;
    use std::fs;
    use tempfile::tempdir;

    fn create_test_extension(dir: &Path, id: &str) -> PathBuf {
        create_test_extension_with(dir, id, "")
    }

    fn create_test_extension_with(dir: &Path, id: &str, extra: &str) -> PathBuf {
        let ext_dir = dir.join(id);
        fs::create_dir_all(&ext_dir).unwrap();

        let manifest = format!(
            r#"
[extension]
id = "{id}"
name = "{id} Extension"
version = "1.0.0"
permissions = ["write:clipboard"]
triggers = ["{id}"]
{extra}
"#
        );

        fs::write(ext_dir.join("vela.toml"), manifest).unwrap();
        ext_dir
    }

    fn echo_exports(id: &str) -> ModuleExports {
        let id = id.to_string();
        ModuleExports::Parts {
            search: Box::new(move |query| {
                Ok(vec![SearchResult::new(
                    format!("{id}-hit"),
                    query.to_string(),
                    ResultKind::Plugin,
                )])
            }),
            execute: None,
        }
    }

    fn host_with_module(ext_dir: &Path, id: &'static str) -> ExtensionHost {
        let config = HostConfig {
            extensions_dir: ext_dir.to_path_buf(),
            resolver: Arc::new(StaticResolver::new().with_module(id, move || echo_exports(id))),
            state_store: None,
        };
        ExtensionHost::new(config)
    }

    #[test]
    fn test_load_registers_extension() {
        let temp = tempdir().unwrap();
        let ext_dir = create_test_extension(temp.path(), "qr-tools");

        let mut host = host_with_module(temp.path(), "qr-tools");
        let outcome = host.load(&ext_dir).unwrap();

        assert!(matches!(outcome, LoadOutcome::Loaded(ref id) if id == "qr-tools"));
        assert!(host.is_loaded("qr-tools"));
        assert_eq!(host.registration_order(), ["qr-tools".to_string()]);

        let context = host.sandbox().get_context("qr-tools").unwrap();
        assert!(context.enabled);
        assert!(context.granted_permissions.contains("write:clipboard"));
    }

    #[test]
    fn test_missing_manifest_is_a_hard_error() {
        let temp = tempdir().unwrap();
        let empty_dir = temp.path().join("not-an-extension");
        fs::create_dir_all(&empty_dir).unwrap();

        let mut host = ExtensionHost::new(HostConfig::default());
        let err = host.load(&empty_dir).unwrap_err();

        assert!(matches!(err, PipelineError::ManifestNotFound(_)));
    }

    #[test]
    fn test_invalid_manifest_is_a_hard_error() {
        let temp = tempdir().unwrap();
        let ext_dir = temp.path().join("broken");
        fs::create_dir_all(&ext_dir).unwrap();
        fs::write(
            ext_dir.join("vela.toml"),
            "[extension]\nid = \"\"\nname = \"Broken\"\nversion = \"1.0.0\"\n",
        )
        .unwrap();

        let mut host = ExtensionHost::new(HostConfig::default());
        let err = host.load(&ext_dir).unwrap_err();

        assert!(matches!(err, PipelineError::ManifestInvalid { .. }));
        assert_eq!(host.extension_count(), 0);
        assert!(host.sandbox().is_empty());
    }

    #[test]
    fn test_module_failure_is_recorded_not_thrown() {
        let temp = tempdir().unwrap();
        let ext_dir = create_test_extension(temp.path(), "no-code");

        // Resolver has no module for "no-code" and the manifest declares
        // no commands to fall back on.
        let mut host = ExtensionHost::new(HostConfig {
            extensions_dir: temp.path().to_path_buf(),
            ..Default::default()
        });

        let outcome = host.load(&ext_dir).unwrap();

        let LoadOutcome::Failed(failure) = outcome else {
            panic!("expected a soft failure");
        };
        assert_eq!(failure.manifest.id(), PLACEHOLDER_ID);
        assert_eq!(failure.manifest.extension.name, "no-code");
        assert!(failure.error.contains("no module registered"));

        // Nothing was registered anywhere.
        assert_eq!(host.extension_count(), 0);
        assert!(host.sandbox().is_empty());
        assert_eq!(host.failures().len(), 1);
    }

    #[tokio::test]
    async fn test_declarative_commands_stand_in_for_missing_module() {
        let temp = tempdir().unwrap();
        let ext_dir = create_test_extension_with(
            temp.path(),
            "snippets",
            r#"
[[commands]]
keyword = "sig"
title = "Email Signature"
"#,
        );

        let mut host = ExtensionHost::new(HostConfig::default());
        let outcome = host.load(&ext_dir).unwrap();

        assert!(matches!(outcome, LoadOutcome::Loaded(ref id) if id == "snippets"));

        let handle = host.handle("snippets").unwrap();
        let results = handle.module.search("sig").await.unwrap();
        assert_eq!(results[0].title, "Email Signature");
    }

    #[test]
    fn test_duplicate_load_is_rejected() {
        let temp = tempdir().unwrap();
        let ext_dir = create_test_extension(temp.path(), "qr-tools");

        let mut host = host_with_module(temp.path(), "qr-tools");
        host.load(&ext_dir).unwrap();

        let err = host.load(&ext_dir).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateExtension(_)));
        assert_eq!(host.extension_count(), 1);
    }

    #[test]
    fn test_unload_clears_handle_and_context() {
        let temp = tempdir().unwrap();
        let ext_dir = create_test_extension(temp.path(), "qr-tools");

        let mut host = host_with_module(temp.path(), "qr-tools");
        host.load(&ext_dir).unwrap();

        host.unload("qr-tools").unwrap();

        assert!(!host.is_loaded("qr-tools"));
        assert!(host.sandbox().get_context("qr-tools").is_none());
        assert!(host.registration_order().is_empty());

        let err = host.unload("qr-tools").unwrap_err();
        assert!(matches!(err, PipelineError::NotLoaded(_)));
    }

    #[test]
    fn test_load_installed_applies_persisted_state() {
        let temp = tempdir().unwrap();
        let on_path = create_test_extension(temp.path(), "alpha");
        let off_path = create_test_extension(temp.path(), "beta");

        let store = crate::extensions::store::MemoryStateStore::with_records(vec![
            InstalledRecord::new("alpha", &on_path),
            InstalledRecord::new("beta", &off_path).disabled(),
            InstalledRecord::new("ghost", "/nowhere").with_source(InstallSource::Unrecognized),
        ]);

        let resolver = StaticResolver::new()
            .with_module("alpha", || echo_exports("alpha"))
            .with_module("beta", || echo_exports("beta"));

        let mut host = ExtensionHost::new(HostConfig {
            extensions_dir: temp.path().to_path_buf(),
            resolver: Arc::new(resolver),
            state_store: Some(Arc::new(store)),
        });

        let outcomes = host.load_installed().unwrap();

        // The unrecognized source never reached the loader.
        assert_eq!(outcomes.len(), 2);
        assert!(host.sandbox().is_enabled("alpha"));
        assert!(!host.sandbox().is_enabled("beta"));
        assert!(host.sandbox().get_context("ghost").is_none());
    }

    #[test]
    fn test_load_installed_applies_permission_overrides() {
        let temp = tempdir().unwrap();
        let ext_path = create_test_extension(temp.path(), "alpha");

        let mut record = InstalledRecord::new("alpha", &ext_path);
        record.granted_permissions = Some(vec!["network:request".to_string()]);

        let store = crate::extensions::store::MemoryStateStore::with_records(vec![record]);
        let resolver = StaticResolver::new().with_module("alpha", || echo_exports("alpha"));

        let mut host = ExtensionHost::new(HostConfig {
            extensions_dir: temp.path().to_path_buf(),
            resolver: Arc::new(resolver),
            state_store: Some(Arc::new(store)),
        });
        host.load_installed().unwrap();

        // Overrides replace the manifest's declared set.
        let context = host.sandbox().get_context("alpha").unwrap();
        assert!(context.granted_permissions.contains("network:request"));
        assert!(!context.granted_permissions.contains("write:clipboard"));
    }

    #[test]
    fn test_grant_and_revoke_write_through_store() {
        let temp = tempdir().unwrap();
        let ext_path = create_test_extension(temp.path(), "alpha");

        let store = Arc::new(crate::extensions::store::MemoryStateStore::with_records(
            vec![InstalledRecord::new("alpha", &ext_path)],
        ));
        let resolver = StaticResolver::new().with_module("alpha", || echo_exports("alpha"));

        let mut host = ExtensionHost::new(HostConfig {
            extensions_dir: temp.path().to_path_buf(),
            resolver: Arc::new(resolver),
            state_store: Some(store.clone()),
        });
        host.load_installed().unwrap();

        host.grant_permission("alpha", "network:request").unwrap();
        assert!(host.sandbox().has_permission("alpha", "network:request"));

        let persisted = store.installed().unwrap()[0]
            .granted_permissions
            .clone()
            .unwrap();
        assert!(persisted.contains(&"network:request".to_string()));
        assert!(persisted.contains(&"write:clipboard".to_string()));

        host.revoke_permission("alpha", "write:clipboard").unwrap();
        assert!(!host.sandbox().has_permission("alpha", "write:clipboard"));

        let persisted = store.installed().unwrap()[0]
            .granted_permissions
            .clone()
            .unwrap();
        assert!(!persisted.contains(&"write:clipboard".to_string()));
    }

    #[test]
    fn test_set_enabled_writes_through_store() {
        let temp = tempdir().unwrap();
        let ext_path = create_test_extension(temp.path(), "alpha");

        let store = Arc::new(crate::extensions::store::MemoryStateStore::with_records(
            vec![InstalledRecord::new("alpha", &ext_path)],
        ));
        let resolver = StaticResolver::new().with_module("alpha", || echo_exports("alpha"));

        let mut host = ExtensionHost::new(HostConfig {
            extensions_dir: temp.path().to_path_buf(),
            resolver: Arc::new(resolver),
            state_store: Some(store.clone()),
        });
        host.load_installed().unwrap();

        host.set_extension_enabled("alpha", false).unwrap();

        assert!(!host.sandbox().is_enabled("alpha"));
        assert!(!store.installed().unwrap()[0].enabled);

        let err = host.set_extension_enabled("ghost", true).unwrap_err();
        assert!(matches!(err, PipelineError::NotRegistered(_)));
    }

    #[test]
    fn test_load_directory_skips_non_extension_dirs() {
        let temp = tempdir().unwrap();
        create_test_extension(temp.path(), "alpha");
        create_test_extension(temp.path(), "beta");
        fs::create_dir_all(temp.path().join("stray-data")).unwrap();

        let resolver = StaticResolver::new()
            .with_module("alpha", || echo_exports("alpha"))
            .with_module("beta", || echo_exports("beta"));

        let mut host = ExtensionHost::new(HostConfig {
            extensions_dir: temp.path().to_path_buf(),
            resolver: Arc::new(resolver),
            state_store: None,
        });

        let outcomes = host.load_directory().unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            host.registration_order(),
            ["alpha".to_string(), "beta".to_string()]
        );
    }

    #[test]
    fn test_host_config_honors_configured_overrides() {
        let temp = tempdir().unwrap();
        let ext_config = ExtensionsConfig {
            directory: Some(temp.path().join("exts")),
            state_path: Some(temp.path().join("state.json")),
            abbreviations_path: None,
        };

        let config = HostConfig::from_config(&ext_config, Arc::new(StaticResolver::new()));

        assert_eq!(config.extensions_dir, temp.path().join("exts"));
        assert!(config.state_store.is_some());
    }

    #[test]
    fn test_missing_extensions_dir_is_empty_not_fatal() {
        let mut host = ExtensionHost::new(HostConfig {
            extensions_dir: PathBuf::from("/nonexistent/path"),
            ..Default::default()
        });

        assert!(host.load_directory().unwrap().is_empty());
        assert_eq!(host.extension_count(), 0);
    }

    #[test]
    fn test_modules_for_preserves_input_order() {
        let temp = tempdir().unwrap();
        create_test_extension(temp.path(), "alpha");
        create_test_extension(temp.path(), "beta");

        let resolver = StaticResolver::new()
            .with_module("alpha", || echo_exports("alpha"))
            .with_module("beta", || echo_exports("beta"));

        let mut host = ExtensionHost::new(HostConfig {
            extensions_dir: temp.path().to_path_buf(),
            resolver: Arc::new(resolver),
            state_store: None,
        });
        host.load_directory().unwrap();

        let ids = vec![
            "beta".to_string(),
            "missing".to_string(),
            "alpha".to_string(),
        ];
        let modules = host.modules_for(&ids);

        let ordered: Vec<&str> = modules.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ordered, ["beta", "alpha"]);
    }
}
