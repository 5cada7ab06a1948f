//! Vela - unified search-and-action pipeline for a keyboard-driven launcher.
//!
//! Vela takes a raw user query, merges candidates from heterogeneous
//! sources (installed applications, files, clipboard history, third-party
//! extensions), ranks them, and safely executes whichever result the user
//! picks. It is an embedded decision engine, not a standalone service:
//! candidate discovery, UI presentation, and the literal capability
//! implementations live behind in-process traits.
//!
//! # Architecture
//!
//! The library is organized into these main modules:
//!
//! - [`config`] - Configuration loading and management
//! - [`core`] - Matcher, scorer, dispatcher, and result types
//! - [`executor`] - Permission-checked action execution
//! - [`extensions`] - Extension loading, sandboxing, and triggers
//! - [`services`] - Supporting state (usage frequency tracking)
//!
//! # Example
//!
//! ```ignore
//! use vela::{Config, SearchService, StaticSource};
//! use vela::core::result::{Candidate, ResultKind};
//! use vela::extensions::{AbbreviationStore, ExtensionHost, HostConfig};
//!
//! let config = Config::load();
//! let mut host = ExtensionHost::new(HostConfig::default());
//! host.load_installed()?;
//!
//! let apps = vec![Candidate::new("app-1", "Terminal", ResultKind::App)];
//! let service = SearchService::new(config)
//!     .with_source(Box::new(StaticSource::new("apps", apps)));
//!
//! let abbreviations = AbbreviationStore::new();
//! let response = service.search("term", &mut host, &abbreviations).await;
//! ```

// Public modules
pub mod config;
pub mod core;
pub mod executor;
pub mod extensions;
pub mod services;

// Internal modules
mod error;

// Re-export commonly used types for convenience
pub use crate::core::{SearchResponse, SearchResult, SearchService, StaticSource};
pub use config::Config;
pub use error::{PipelineError, PipelineResult};
pub use executor::{ActionData, ActionExecutor, ActionOutcome, CapabilityBridge};
pub use extensions::{ExtensionHost, ExtensionId};
