//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/rangetree/rangetree.toml`
//! 3. Local config: `<dir>/.rangetree.toml` (directory given with `-C`)
//! 4. Environment variables: `RANGETREE_*` prefix

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::{Aggregation, ApplicationError};
use crate::domain::UpdateMode;

/// Unified configuration for rangetree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Aggregation used by `run` when not given on the command line (default: sum)
    pub aggregation: Aggregation,
    /// Run updates lazily unless a command asks for eager (default: true)
    pub lazy: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aggregation: Aggregation::Sum,
            lazy: true,
        }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub aggregation: Option<Aggregation>,
    pub lazy: Option<bool>,
}

/// Get the XDG config directory for rangetree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rangetree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("rangetree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".rangetree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Update mode implied by `lazy`.
    pub fn update_mode(&self) -> UpdateMode {
        if self.lazy {
            UpdateMode::Lazy
        } else {
            UpdateMode::Eager
        }
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            aggregation: overlay.aggregation.unwrap_or(self.aggregation),
            lazy: overlay.lazy.unwrap_or(self.lazy),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.rangetree.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_layers(
            global_config_path().as_deref(),
            local_dir,
            Environment::with_prefix("RANGETREE")
                .prefix_separator("_")
                .separator("__"),
        )
    }

    /// Load settings from explicit layers.
    ///
    /// Missing files are skipped; unreadable or malformed ones are errors.
    pub fn load_layers(
        global_path: Option<&Path>,
        local_dir: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_path {
            if global_path.exists() {
                debug!("loading global config: {}", global_path.display());
                let raw = load_raw_settings(global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config
        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("loading local config: {}", local_path.display());
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables (explicit override)
        Self::apply_env_overrides(current, env)
    }

    /// Apply RANGETREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("aggregation") {
            settings.aggregation =
                Aggregation::from_str(&val, true).map_err(|e| ApplicationError::Config {
                    message: format!("RANGETREE_AGGREGATION: {e}"),
                })?;
        }
        match config.get_bool("lazy") {
            Ok(val) => settings.lazy = val,
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => return Err(config_err(e)),
        }

        Ok(settings)
    }

    /// Render as TOML, as it would appear in a config file.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_reading_then_sum_and_lazy() {
        let settings = Settings::default();
        assert_eq!(settings.aggregation, Aggregation::Sum);
        assert_eq!(settings.update_mode(), UpdateMode::Lazy);
    }

    #[test]
    fn given_partial_overlay_when_merging_then_keeps_unspecified_fields() {
        let overlay = RawSettings {
            aggregation: None,
            lazy: Some(false),
        };

        let merged = Settings::default().merge_with(&overlay);

        assert_eq!(merged.aggregation, Aggregation::Sum);
        assert!(!merged.lazy);
    }

    #[test]
    fn given_settings_when_rendered_then_round_trips_through_toml() {
        let settings = Settings {
            aggregation: Aggregation::Max,
            lazy: false,
        };

        let rendered = settings.to_toml().unwrap();

        assert!(rendered.contains("aggregation = \"max\""));
        assert_eq!(toml::from_str::<Settings>(&rendered).unwrap(), settings);
    }
}
