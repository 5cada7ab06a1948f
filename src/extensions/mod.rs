//! Extension system for vela.
//!
//! Extensions contribute search results and actions through a narrow,
//! permission-checked surface. Their code modules are supplied by a
//! [`ModuleResolver`]; vela never assumes how they were packaged.
//!
//! # Architecture
//!
//! ```text
//! ExtensionHost
//! ├── config: HostConfig (extensions dir, module resolver, state store)
//! ├── sandbox: SandboxRegistry
//! │            └── contexts: HashMap<ExtensionId, SandboxContext>
//! ├── handles: HashMap<ExtensionId, ExtensionHandle { manifest, module }>
//! └── registration_order: Vec<ExtensionId>
//! ```
//!
//! An extension reaches the handle map only after its manifest validates
//! and its sandbox context exists, so permission checks always have a
//! subject. The trigger resolver consults the host for which extensions
//! may respond to a query; the dispatcher then calls their modules under
//! isolation.

pub mod loader;
pub mod manifest;
pub mod module;
pub mod permissions;
pub mod sandbox;
pub mod store;
pub mod triggers;

pub use loader::{
    ExtensionHandle, ExtensionHost, HostConfig, LoadFailure, LoadOutcome, ModuleResolver,
    StaticResolver,
};
pub use manifest::{
    CommandConfig, ExtensionManifest, ExtensionMeta, TriggerSpec, MANIFEST_FILE, PLACEHOLDER_ID,
};
pub use module::{CommandModule, ExecuteFn, ExtensionModule, ModuleExports, SearchFn};
pub use permissions::{
    permission_description, required_permission, NETWORK_REQUEST, READ_CLIPBOARD,
    SHOW_NOTIFICATION, WRITE_CLIPBOARD,
};
pub use sandbox::{SandboxContext, SandboxRegistry};
pub use store::{
    ExtensionStateStore, InstallSource, InstalledRecord, JsonStateStore, MemoryStateStore,
};
pub use triggers::{resolve_eligible, AbbreviationEntry, AbbreviationStore};

/// Unique identifier for an extension.
pub type ExtensionId = String;
