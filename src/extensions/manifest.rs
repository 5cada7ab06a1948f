//! Extension manifest parsing.
//!
//! Each extension has a `vela.toml` manifest file that defines:
//! - Extension metadata (id, name, version, etc.)
//! - Declared permissions (tokens such as `write:clipboard`)
//! - Trigger prefixes that route queries to the extension
//! - Declarative commands (searchable entries with a baked-in action)

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::executor::ActionData;

/// Manifest file name inside an extension directory.
pub const MANIFEST_FILE: &str = "vela.toml";

/// Identifier used when an extension failed to load before its manifest
/// could be read. Two simultaneous failures collide under this id; the
/// registry keeps whichever registered first.
pub const PLACEHOLDER_ID: &str = "unknown";

/// Complete extension manifest parsed from `vela.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionManifest {
    pub extension: ExtensionMeta,

    #[serde(default)]
    pub commands: Vec<CommandConfig>,
}

impl ExtensionManifest {
    /// Load manifest from a directory containing `vela.toml`.
    pub fn load(extension_dir: &Path) -> PipelineResult<Self> {
        let manifest_path = extension_dir.join(MANIFEST_FILE);

        if !manifest_path.exists() {
            return Err(PipelineError::ManifestNotFound(
                extension_dir.to_path_buf(),
            ));
        }

        let content = std::fs::read_to_string(&manifest_path)?;

        toml::from_str(&content).map_err(|e| PipelineError::ManifestInvalid {
            path: manifest_path,
            message: e.to_string(),
        })
    }

    /// Validate the manifest for required fields and constraints.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.extension.id.is_empty() {
            return Err(PipelineError::ManifestInvalid {
                path: MANIFEST_FILE.into(),
                message: "extension.id is required".to_string(),
            });
        }

        if self.extension.name.is_empty() {
            return Err(PipelineError::ManifestInvalid {
                path: MANIFEST_FILE.into(),
                message: "extension.name is required".to_string(),
            });
        }

        if self.extension.version.is_empty() {
            return Err(PipelineError::ManifestInvalid {
                path: MANIFEST_FILE.into(),
                message: "extension.version is required".to_string(),
            });
        }

        for trigger in &self.extension.triggers {
            if trigger.prefix().trim().is_empty() {
                return Err(PipelineError::ManifestInvalid {
                    path: MANIFEST_FILE.into(),
                    message: "trigger prefixes must not be blank".to_string(),
                });
            }
        }

        for cmd in &self.commands {
            if cmd.keyword.is_empty() {
                return Err(PipelineError::ManifestInvalid {
                    path: MANIFEST_FILE.into(),
                    message: "command.keyword is required".to_string(),
                });
            }
            if cmd.title.is_empty() {
                return Err(PipelineError::ManifestInvalid {
                    path: MANIFEST_FILE.into(),
                    message: format!("command '{}' requires a title", cmd.keyword),
                });
            }
        }

        Ok(())
    }

    /// Stand-in manifest for an extension that failed before its manifest
    /// was readable. Carries the directory name so the failure is still
    /// attributable in logs and UI.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            extension: ExtensionMeta {
                id: PLACEHOLDER_ID.to_string(),
                name: name.into(),
                version: "0.0.0".to_string(),
                description: String::new(),
                author: None,
                permissions: Vec::new(),
                triggers: Vec::new(),
            },
            commands: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.extension.id
    }

    /// All trigger prefixes, in declaration order.
    pub fn trigger_prefixes(&self) -> impl Iterator<Item = &str> {
        self.extension.triggers.iter().map(TriggerSpec::prefix)
    }
}

/// Extension metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionMeta {
    /// Unique identifier (lowercase, alphanumeric, hyphens).
    pub id: String,

    /// Human-readable display name.
    pub name: String,

    /// Semantic version (e.g., "1.0.0").
    pub version: String,

    /// Short description.
    #[serde(default)]
    pub description: String,

    /// Author name.
    #[serde(default)]
    pub author: Option<String>,

    /// Permission tokens the extension wants granted (e.g. `write:clipboard`).
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Query prefixes that activate this extension.
    #[serde(default)]
    pub triggers: Vec<TriggerSpec>,
}

/// A trigger prefix, either bare or annotated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TriggerSpec {
    /// `triggers = ["qr"]`
    Simple(String),

    /// `triggers = [{ prefix = "qr", description = "QR code tools" }]`
    Detailed {
        prefix: String,

        #[serde(default)]
        description: String,
    },
}

impl TriggerSpec {
    pub fn prefix(&self) -> &str {
        match self {
            TriggerSpec::Simple(prefix) => prefix,
            TriggerSpec::Detailed { prefix, .. } => prefix,
        }
    }
}

/// A declarative command: a searchable entry whose action is fully
/// described in the manifest, needing no module code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Keyword matched against the query.
    pub keyword: String,

    /// Human-readable command title.
    pub title: String,

    /// Secondary display line.
    #[serde(default)]
    pub subtitle: String,

    /// Action performed when the command is selected.
    #[serde(default)]
    pub action: ActionData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_manifest() {
        let toml = r#"
[extension]
id = "test"
name = "Test Extension"
version = "1.0.0"
"#;

        let manifest: ExtensionManifest = toml::from_str(toml).unwrap();
        assert_eq!(manifest.extension.id, "test");
        assert_eq!(manifest.extension.name, "Test Extension");
        assert_eq!(manifest.extension.version, "1.0.0");
        assert!(manifest.extension.permissions.is_empty());
        assert!(manifest.extension.triggers.is_empty());
        assert!(manifest.commands.is_empty());
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_parse_full_manifest() {
        let toml = r#"
[extension]
id = "qr-tools"
name = "QR Tools"
description = "Generate and read QR codes"
version = "0.2.0"
author = "vela-extensions"
permissions = ["write:clipboard", "show:notification"]
triggers = ["qr", { prefix = "qrcode", description = "Generate a QR code" }]

[[commands]]
keyword = "wifi"
title = "Wi-Fi QR Code"
subtitle = "Encode network credentials"

[commands.action]
type = "popup"

[commands.action.data]
title = "Wi-Fi QR"
body = "Scan to join"
"#;

        let manifest: ExtensionManifest = toml::from_str(toml).unwrap();

        assert_eq!(manifest.extension.id, "qr-tools");
        assert_eq!(
            manifest.extension.author,
            Some("vela-extensions".to_string())
        );
        assert_eq!(manifest.extension.permissions.len(), 2);

        let prefixes: Vec<&str> = manifest.trigger_prefixes().collect();
        assert_eq!(prefixes, vec!["qr", "qrcode"]);

        assert_eq!(manifest.commands.len(), 1);
        assert_eq!(manifest.commands[0].keyword, "wifi");
        assert!(matches!(
            manifest.commands[0].action,
            ActionData::Popup(ref payload) if payload.title == "Wi-Fi QR"
        ));

        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_validate_manifest() {
        let mut manifest = ExtensionManifest::placeholder("broken");
        manifest.extension.id = "test".to_string();
        manifest.extension.version = "1.0.0".to_string();

        assert!(manifest.validate().is_ok());

        // Missing id
        manifest.extension.id = String::new();
        assert!(manifest.validate().is_err());
        manifest.extension.id = "test".to_string();

        // Blank trigger prefix
        manifest.extension.triggers = vec![TriggerSpec::Simple("  ".to_string())];
        assert!(manifest.validate().is_err());
        manifest.extension.triggers.clear();

        // Command without title
        manifest.commands = vec![CommandConfig {
            keyword: "go".to_string(),
            title: String::new(),
            subtitle: String::new(),
            action: ActionData::None,
        }];
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_placeholder_uses_reserved_id() {
        let manifest = ExtensionManifest::placeholder("mystery-dir");
        assert_eq!(manifest.id(), PLACEHOLDER_ID);
        assert_eq!(manifest.extension.name, "mystery-dir");
    }
}
