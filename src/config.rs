//! Settings for how the buildpack loads its environment
//!
//! Supports loading settings from:
//! - Default values
//! - Settings file (buildpack.toml)
//! - Environment variables (BUILDPACK__*)
//!
//! ## Example settings file (buildpack.toml):
//! ```toml
//! [env_file]
//! name = ".env"
//! template = ".env.dist"
//! mode = "merge"
//!
//! [definitions]
//! path = "./envVarDefinitions.json"
//!
//! [diagnostics]
//! dump_config = true
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::schema::EnvDefinitions;

/// Main settings for environment loading
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvSettings {
    /// Project `.env` file settings
    #[serde(default)]
    pub env_file: EnvFileSettings,

    /// Where the variable definitions come from
    #[serde(default)]
    pub definitions: DefinitionsSettings,

    /// Diagnostic output
    #[serde(default)]
    pub diagnostics: DiagnosticsSettings,
}

/// `.env` file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvFileSettings {
    /// File name inside the project directory
    #[serde(default = "default_env_file_name")]
    pub name: String,

    /// Template users are told to copy when the file is missing
    #[serde(default = "default_template_name")]
    pub template: String,

    /// What happens to the parsed file contents
    #[serde(default)]
    pub mode: EnvFileMode,
}

/// How parsed `.env` contents relate to the caller's environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnvFileMode {
    /// The file must exist and parse, but only the caller's mapping is validated
    #[default]
    Diagnostic,
    /// File values fill keys the caller's mapping does not set
    Merge,
}

/// Definitions source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionsSettings {
    /// Custom definitions JSON. The embedded definitions are used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Diagnostic settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsSettings {
    /// Log the validated environment at debug level
    #[serde(default = "default_true")]
    pub dump_config: bool,
}

// Default value functions
fn default_env_file_name() -> String {
    ".env".to_string()
}

fn default_template_name() -> String {
    ".env.dist".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for EnvFileSettings {
    fn default() -> Self {
        Self {
            name: default_env_file_name(),
            template: default_template_name(),
            mode: EnvFileMode::Diagnostic,
        }
    }
}

impl Default for DiagnosticsSettings {
    fn default() -> Self {
        Self { dump_config: true }
    }
}

impl EnvSettings {
    /// Load settings from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load settings, layering a specific file over the default locations
    pub fn load_from(settings_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let settings_locations = ["buildpack.toml", ".buildpack.toml", "config/buildpack.toml"];

        for location in settings_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "pwa-studio", "buildpack") {
            let xdg_config = config_dir.config_dir().join("buildpack.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = settings_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (BUILDPACK__*)
        builder = builder.add_source(
            Environment::with_prefix("BUILDPACK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?;
        settings.try_deserialize()
    }

    /// Save settings to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Resolve the definitions these settings point at
    pub fn load_definitions(&self) -> Result<EnvDefinitions> {
        match &self.definitions.path {
            Some(path) => EnvDefinitions::from_path(path),
            None => EnvDefinitions::builtin().cloned(),
        }
    }
}
