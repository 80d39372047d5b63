//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/yamlnode/yamlnode.toml`
//! 3. Environment variables: `YAMLNODE_*` prefix (`__` separates sections)
//!
//! Settings are attached to a tree when its root is created
//! (`Node::with_settings`). `Node::new()` uses compiled defaults and never
//! touches the filesystem or the environment.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostics::DiagnosticLevel;
use crate::types::Style;

#[derive(Error, Debug)]
#[error("config error: {message}")]
pub struct SettingsError {
    pub message: String,
}

/// Controls `Node::get_content` dumps.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DumpSettings {
    /// Containers deeper than this are elided, `None` = unlimited
    pub max_depth: Option<usize>,
    /// Annotate containers with a non-default style
    pub show_style: bool,
}

/// Raw settings for intermediate parsing (`None` = not specified in the file).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub default_style: Option<Style>,
    pub diagnostics: Option<DiagnosticLevel>,
    pub dump: RawDumpSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawDumpSettings {
    pub max_depth: Option<usize>,
    pub show_style: Option<bool>,
}

/// Unified configuration for yamlnode trees.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Style given to containers created by coercion (push, force_insert, get_or_create)
    pub default_style: Style,
    /// Level at which absorbed structural failures are traced
    pub diagnostics: DiagnosticLevel,
    pub dump: DumpSettings,
}

/// Get the XDG config directory for yamlnode.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "yamlnode").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("yamlnode.toml"))
}

fn load_raw_settings(path: &Path) -> Result<RawSettings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|e| SettingsError {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| SettingsError {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            default_style: overlay.default_style.unwrap_or(self.default_style),
            diagnostics: overlay.diagnostics.unwrap_or(self.diagnostics),
            dump: DumpSettings {
                max_depth: overlay.dump.max_depth.or(self.dump.max_depth),
                show_style: overlay.dump.show_style.unwrap_or(self.dump.show_style),
            },
        }
    }

    /// Load settings with layered precedence: defaults, global file, `YAMLNODE_*`.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Same as [`Settings::load`] with an explicit config file.
    ///
    /// A missing file is not an error; an unreadable or malformed one is.
    pub fn load_from(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut current = Self::default();

        if let Some(path) = path {
            if path.exists() {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Parse a complete TOML document onto the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let raw: RawSettings = toml::from_str(content).map_err(|e| SettingsError {
            message: format!("parse settings: {e}"),
        })?;
        Ok(Self::default().merge_with(&raw))
    }

    /// Apply YAMLNODE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, SettingsError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("YAMLNODE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get::<Style>("default_style") {
            settings.default_style = val;
        }
        if let Ok(val) = config.get::<DiagnosticLevel>("diagnostics") {
            settings.diagnostics = val;
        }
        if let Ok(val) = config.get::<usize>("dump.max_depth") {
            settings.dump.max_depth = Some(val);
        }
        if let Ok(val) = config.get::<bool>("dump.show_style") {
            settings.dump.show_style = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        toml::to_string_pretty(self).map_err(|e| SettingsError {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# yamlnode configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/yamlnode/yamlnode.toml
#   Env:    YAMLNODE_* environment variables, e.g. YAMLNODE_DUMP__MAX_DEPTH=3

# Style for containers created by push / force_insert / get_or_create
# default_style = "default"   # default | block | flow

# tracing level for ignored mutations
# diagnostics = "warn"        # off | debug | warn

[dump]
# max_depth = 8
# show_style = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> SettingsError {
    SettingsError {
        message: e.to_string(),
    }
}
