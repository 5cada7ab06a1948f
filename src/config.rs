use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scoring: ScoringConfig,
    pub search: SearchConfig,
    pub extensions: ExtensionsConfig,
}

/// Weights for the composite relevance score. Constructed once at engine
/// initialization; swap the whole value to retune.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub fuzzy_weight: f64,
    pub frequency_weight: f64,
    pub type_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: usize,

    /// Keystroke debounce window in milliseconds.
    pub debounce_ms: u64,

    /// Upper bound on a single extension's search call in milliseconds.
    pub extension_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionsConfig {
    /// Directory scanned for extension subdirectories. `None` uses the
    /// platform data directory.
    pub directory: Option<PathBuf>,

    /// Persisted extension registry file. `None` uses the default location.
    pub state_path: Option<PathBuf>,

    /// Abbreviation store file. `None` uses the default location.
    pub abbreviations_path: Option<PathBuf>,
}

#[allow(clippy::derivable_impls)]
impl Default for Config {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            search: SearchConfig::default(),
            extensions: ExtensionsConfig::default(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            fuzzy_weight: 0.5,
            frequency_weight: 0.3,
            type_weight: 0.2,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 100,
            debounce_ms: 180,
            extension_timeout_ms: 1500,
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn extension_timeout(&self) -> Duration {
        Duration::from_millis(self.extension_timeout_ms)
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| {
                // Fallback: ~ is not expanded by PathBuf, so use dirs::home_dir
                dirs::home_dir()
                    .map(|h| h.join(".config"))
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
            })
            .join("vela")
            .join("config.toml")
    }

    /// Load config from the default path, or return defaults if not found
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load config from a specific file. Unreadable or unparseable files
    /// fall back to defaults rather than failing startup.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        let mut config = if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => config,
                    Err(e) => {
                        warn!("failed to parse config {}: {e}", path.display());
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("failed to read config {}: {e}", path.display());
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.validate();
        config
    }

    /// Validate and clamp config values to acceptable ranges
    fn validate(&mut self) {
        // Score weights are fractions of the composite sum (0.0 - 1.0)
        self.scoring.fuzzy_weight = self.scoring.fuzzy_weight.clamp(0.0, 1.0);
        self.scoring.frequency_weight = self.scoring.frequency_weight.clamp(0.0, 1.0);
        self.scoring.type_weight = self.scoring.type_weight.clamp(0.0, 1.0);

        // Clamp max_results to reasonable range (1 - 500)
        self.search.max_results = self.search.max_results.clamp(1, 500);

        // Clamp debounce to reasonable range (0 - 1000 ms)
        self.search.debounce_ms = self.search.debounce_ms.clamp(0, 1000);

        // Clamp extension timeout to reasonable range (100 - 10000 ms)
        self.search.extension_timeout_ms = self.search.extension_timeout_ms.clamp(100, 10_000);
    }

    /// Save config to the default path
    pub fn save(&self) -> PipelineResult<()> {
        self.save_to(Self::config_path())
    }

    /// Save config to a specific file, creating parent directories
    pub fn save_to(&self, path: impl AsRef<Path>) -> PipelineResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| PipelineError::StoreFailed(format!("failed to serialize config: {e}")))?;

        fs::write(path, content)?;
        Ok(())
    }
}
