//! Environment configuration pipeline
//!
//! 1. Build the validation schema from the declared sections
//! 2. Require the project `.env` file
//! 3. Apply backward-compatibility changes to the caller's environment
//! 4. Validate and return the typed configuration
//!
//! Any failure aborts the whole load. Warnings from step 3 are emitted before
//! a validation failure is reported.

use std::path::Path;

use tracing::{debug, Level};

use crate::compat::CompatibilityTransformer;
use crate::config::{EnvFileMode, EnvSettings};
use crate::dotenv::{assert_dev_env_file, EnvMap};
use crate::error::Result;
use crate::reporter::{Reporter, TracingReporter};
use crate::schema::EnvDefinitions;
use crate::validate::{ValidatedConfig, ValidationSchema};
use crate::version::BuildpackRelease;

/// Loads and validates the buildpack environment for a project
#[derive(Debug, Clone)]
pub struct EnvironmentConfigurator {
    definitions: EnvDefinitions,
    settings: EnvSettings,
    release: BuildpackRelease,
}

impl EnvironmentConfigurator {
    pub fn new(definitions: EnvDefinitions) -> Self {
        Self {
            definitions,
            settings: EnvSettings::default(),
            release: BuildpackRelease::current(),
        }
    }

    /// Build from settings, loading the definitions they point at
    pub fn from_settings(settings: EnvSettings) -> Result<Self> {
        let definitions = settings.load_definitions()?;
        Ok(Self {
            definitions,
            settings,
            release: BuildpackRelease::current(),
        })
    }

    pub fn with_settings(mut self, settings: EnvSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_release(mut self, release: BuildpackRelease) -> Self {
        self.release = release;
        self
    }

    pub fn definitions(&self) -> &EnvDefinitions {
        &self.definitions
    }

    pub fn settings(&self) -> &EnvSettings {
        &self.settings
    }

    /// Run the full pipeline against `env` for the project in `dir`
    pub fn configure(&self, env: &EnvMap, dir: &Path, reporter: &dyn Reporter) -> Result<ValidatedConfig> {
        let validation = ValidationSchema::from_sections(&self.definitions.sections);

        let env_file = &self.settings.env_file;
        let from_file = assert_dev_env_file(dir, &env_file.name, &env_file.template, reporter)?;

        let merged;
        let source = match env_file.mode {
            EnvFileMode::Diagnostic => env,
            EnvFileMode::Merge => {
                merged = merge_env_file(env, from_file);
                &merged
            }
        };

        let compat_env = CompatibilityTransformer::new(&self.definitions, &self.release).apply(source, reporter)?;

        let project_config = validation.validate(&compat_env)?;

        if self.settings.diagnostics.dump_config && tracing::enabled!(Level::DEBUG) {
            debug!("Current known env\n{}\n", project_config.to_pretty_lines());
        }

        Ok(project_config)
    }
}

/// Caller values win; the file only fills gaps
fn merge_env_file(env: &EnvMap, from_file: EnvMap) -> EnvMap {
    let mut merged = from_file;
    merged.extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Configure with the embedded definitions and default settings
pub fn configure_environment(env: &EnvMap, dir: &Path, reporter: Option<&dyn Reporter>) -> Result<ValidatedConfig> {
    let definitions = EnvDefinitions::builtin()?.clone();
    let reporter = reporter.unwrap_or(&TracingReporter);
    EnvironmentConfigurator::new(definitions).configure(env, dir, reporter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_merge_prefers_caller_values() {
        let merged = merge_env_file(
            &env(&[("A", "caller")]),
            env(&[("A", "file"), ("B", "file")]),
        );
        assert_eq!(merged, env(&[("A", "caller"), ("B", "file")]));
    }
}
