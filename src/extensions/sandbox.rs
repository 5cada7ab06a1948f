//! Sandbox registry - per-extension runtime state.
//!
//! The registry owns one `SandboxContext` per registered extension: granted
//! permissions, the enabled flag, and the last recorded error. It is pure
//! bookkeeping with no I/O; persistence and write-back live in the host
//! (`loader`), which seeds the registry from the external state store.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

use super::ExtensionId;

/// Runtime state for one registered extension.
///
/// Created on register, mutated only by `set_enabled`, permission grants,
/// and error recording, destroyed on unregister. A context with
/// `enabled == false` must never be the source of a contributed result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SandboxContext {
    pub extension_id: ExtensionId,

    pub granted_permissions: BTreeSet<String>,

    /// Defaults to true unless persisted state says otherwise.
    pub enabled: bool,

    #[serde(default)]
    pub last_error: Option<String>,
}

impl SandboxContext {
    fn new(extension_id: ExtensionId, permissions: impl IntoIterator<Item = String>) -> Self {
        Self {
            extension_id,
            granted_permissions: permissions.into_iter().collect(),
            enabled: true,
            last_error: None,
        }
    }
}

/// In-memory id → context map with the lifecycle operations.
///
/// State does not survive `unregister_extension` unless the caller
/// re-supplies it on the next registration.
#[derive(Debug, Default)]
pub struct SandboxRegistry {
    contexts: HashMap<ExtensionId, SandboxContext>,
}

impl SandboxRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context for `id`. Fails with `DuplicateExtension` if one
    /// already exists; re-registration must go through unregister first.
    pub fn register_extension(
        &mut self,
        id: &str,
        permissions: impl IntoIterator<Item = String>,
    ) -> PipelineResult<()> {
        if self.contexts.contains_key(id) {
            return Err(PipelineError::DuplicateExtension(id.to_string()));
        }

        self.contexts
            .insert(id.to_string(), SandboxContext::new(id.to_string(), permissions));
        Ok(())
    }

    /// Remove the context for `id`.
    pub fn unregister_extension(&mut self, id: &str) -> PipelineResult<()> {
        self.contexts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| PipelineError::NotRegistered(id.to_string()))
    }

    /// Flip the enabled flag. Granted permissions are untouched.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> PipelineResult<()> {
        let context = self
            .contexts
            .get_mut(id)
            .ok_or_else(|| PipelineError::NotRegistered(id.to_string()))?;
        context.enabled = enabled;
        Ok(())
    }

    /// Replace the granted permission set wholesale.
    pub fn set_permissions(
        &mut self,
        id: &str,
        permissions: impl IntoIterator<Item = String>,
    ) -> PipelineResult<()> {
        let context = self
            .contexts
            .get_mut(id)
            .ok_or_else(|| PipelineError::NotRegistered(id.to_string()))?;
        context.granted_permissions = permissions.into_iter().collect();
        Ok(())
    }

    pub fn get_context(&self, id: &str) -> Option<&SandboxContext> {
        self.contexts.get(id)
    }

    /// The single enforcement query every capability call must pass.
    /// Unregistered extensions hold no permissions.
    pub fn has_permission(&self, id: &str, token: &str) -> bool {
        self.contexts
            .get(id)
            .map(|ctx| ctx.granted_permissions.contains(token))
            .unwrap_or(false)
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.contexts.get(id).map(|ctx| ctx.enabled).unwrap_or(false)
    }

    /// Record a diagnostic against an extension. Missing contexts are
    /// ignored; the failure that produced the diagnostic already unregistered
    /// or never registered the extension.
    pub fn record_error(&mut self, id: &str, message: impl Into<String>) {
        if let Some(context) = self.contexts.get_mut(id) {
            context.last_error = Some(message.into());
        }
    }

    /// Clear the diagnostic after a successful call.
    pub fn clear_error(&mut self, id: &str) {
        if let Some(context) = self.contexts.get_mut(id) {
            context.last_error = None;
        }
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Registered ids, unordered. Registration order lives in the host.
    pub fn extension_ids(&self) -> impl Iterator<Item = &ExtensionId> {
        self.contexts.keys()
    }
}
