//! In-process extension modules.
//!
//! An extension's code exposes its entry points in one of two shapes:
//! a single bundled [`ExtensionModule`] implementation, or separate
//! `search`/`execute` functions. Both normalize into the same internal
//! record at load time; nothing downstream ever re-detects the shape.

use std::sync::Arc;

use async_trait::async_trait;

use super::manifest::{CommandConfig, ExtensionManifest};
use super::ExtensionId;
use crate::core::result::{ResultKind, SearchResult};
use crate::error::PipelineResult;
use crate::executor::ActionData;

/// The search/execute surface an extension exposes once loaded.
#[async_trait]
pub trait ExtensionModule: Send + Sync {
    /// Produce results for a query. The query arrives with any trigger
    /// prefix still attached; modules that care strip it themselves.
    async fn search(&self, query: &str) -> PipelineResult<Vec<SearchResult>>;

    /// Handle an action verb the module defines itself. Returns `false`
    /// when the verb is not one of the module's own.
    async fn execute_action(&self, action: &ActionData) -> PipelineResult<bool> {
        let _ = action;
        Ok(false)
    }
}

/// `search` entry point of a parts-shaped extension.
pub type SearchFn = Box<dyn Fn(&str) -> PipelineResult<Vec<SearchResult>> + Send + Sync>;

/// `execute` entry point of a parts-shaped extension.
pub type ExecuteFn = Box<dyn Fn(&ActionData) -> PipelineResult<bool> + Send + Sync>;

/// The raw entry points an extension exports, before normalization.
pub enum ModuleExports {
    /// One bundled value implementing the whole surface.
    Bundled(Box<dyn ExtensionModule>),

    /// Separate named entry points.
    Parts {
        search: SearchFn,
        execute: Option<ExecuteFn>,
    },
}

impl ModuleExports {
    /// Normalize either shape into the single internal module record.
    /// Runs once at load time.
    pub fn into_module(self) -> Arc<dyn ExtensionModule> {
        match self {
            ModuleExports::Bundled(module) => Arc::from(module),
            ModuleExports::Parts { search, execute } => Arc::new(PartsAdapter { search, execute }),
        }
    }
}

impl std::fmt::Debug for ModuleExports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleExports::Bundled(_) => f.write_str("ModuleExports::Bundled"),
            ModuleExports::Parts { execute, .. } => f
                .debug_struct("ModuleExports::Parts")
                .field("has_execute", &execute.is_some())
                .finish(),
        }
    }
}

/// Adapts parts-shaped exports to the bundled surface.
struct PartsAdapter {
    search: SearchFn,
    execute: Option<ExecuteFn>,
}

#[async_trait]
impl ExtensionModule for PartsAdapter {
    async fn search(&self, query: &str) -> PipelineResult<Vec<SearchResult>> {
        (self.search)(query)
    }

    async fn execute_action(&self, action: &ActionData) -> PipelineResult<bool> {
        match &self.execute {
            Some(execute) => execute(action),
            None => Ok(false),
        }
    }
}

/// Module synthesized from a manifest's `[[commands]]` entries.
///
/// Lets an extension ship searchable commands with baked-in actions and
/// no code at all.
pub struct CommandModule {
    extension_id: ExtensionId,
    commands: Vec<CommandConfig>,
}

impl CommandModule {
    /// Build from a manifest; `None` when it declares no commands.
    pub fn from_manifest(manifest: &ExtensionManifest) -> Option<Self> {
        if manifest.commands.is_empty() {
            return None;
        }
        Some(Self {
            extension_id: manifest.id().to_string(),
            commands: manifest.commands.clone(),
        })
    }
}

#[async_trait]
impl ExtensionModule for CommandModule {
    async fn search(&self, query: &str) -> PipelineResult<Vec<SearchResult>> {
        let needle = query.trim().to_lowercase();

        let results = self
            .commands
            .iter()
            .filter(|cmd| {
                needle.is_empty()
                    || cmd.keyword.to_lowercase().contains(&needle)
                    || cmd.title.to_lowercase().contains(&needle)
            })
            .map(|cmd| {
                SearchResult::new(
                    format!("{}/{}", self.extension_id, cmd.keyword),
                    cmd.title.clone(),
                    ResultKind::Action,
                )
                .with_subtitle(cmd.subtitle.clone())
                .with_action(cmd.action.clone())
            })
            .collect();

        Ok(results)
    }
}
