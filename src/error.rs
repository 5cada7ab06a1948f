//! Error types for the search-and-action pipeline.
//!
//! One taxonomy covers the whole crate: manifest validation, extension
//! lifecycle, permission enforcement, per-extension search containment,
//! and action execution.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No manifest file in the extension directory.
    #[error("Manifest not found in extension: {0}")]
    ManifestNotFound(PathBuf),

    /// A required manifest field is missing or malformed. The extension is
    /// not registered; retrying without fixing the manifest is pointless.
    #[error("Invalid manifest in {path}: {message}")]
    ManifestInvalid { path: PathBuf, message: String },

    /// Module resolution or import failed. Surfaced through
    /// `LoadOutcome::Failed`, never thrown past the loader boundary.
    #[error("Failed to load extension '{extension}': {message}")]
    LoadFailed { extension: String, message: String },

    /// An extension with this id is already registered. Re-registration
    /// must go through unregister first.
    #[error("Extension '{0}' is already registered")]
    DuplicateExtension(String),

    /// The extension has no sandbox context.
    #[error("Extension '{0}' is not registered")]
    NotRegistered(String),

    /// The extension was never loaded by this host.
    #[error("Extension '{0}' is not loaded")]
    NotLoaded(String),

    /// A capability was requested without the matching granted permission.
    /// Raised before any bridge call proceeds.
    #[error("Extension '{extension}' denied permission '{permission}'")]
    PermissionDenied {
        extension: String,
        permission: String,
    },

    /// An extension's `search` call failed. Caught at the extension
    /// boundary; never aborts the overall search.
    #[error("Extension '{extension}' search failed: {message}")]
    SearchFailed { extension: String, message: String },

    /// The permission check passed but the bridge call failed, including
    /// its documented fallback where one exists.
    #[error("Action '{action}' failed: {message}")]
    ActionFailed { action: String, message: String },

    /// The external extension-state or abbreviation store rejected a
    /// write-back.
    #[error("State store error: {0}")]
    StoreFailed(String),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors.
    #[error("Manifest parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// JSON serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
