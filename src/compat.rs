//! Backward-compatibility shims for renamed, removed and re-defaulted variables
//!
//! Walks the change log in name order and warns about every change that
//! affects the current environment. Renamed variables with legacy support have
//! their value forwarded to the new name when the new name is not set yet.

use tracing::debug;

use crate::dotenv::EnvMap;
use crate::error::{EnvError, Result};
use crate::reporter::Reporter;
use crate::schema::{display_value, ChangeKind, ChangeRecord, EnvDefinitions};
use crate::version::BuildpackRelease;

/// Applies a change log to an environment mapping
pub struct CompatibilityTransformer<'a> {
    changes: Vec<&'a ChangeRecord>,
    release: &'a BuildpackRelease,
}

impl<'a> CompatibilityTransformer<'a> {
    pub fn new(definitions: &'a EnvDefinitions, release: &'a BuildpackRelease) -> Self {
        Self {
            changes: definitions.sorted_changes(),
            release,
        }
    }

    /// Build from an explicit change list; the list is sorted by name
    pub fn from_changes(changes: &'a [ChangeRecord], release: &'a BuildpackRelease) -> Self {
        let mut changes: Vec<_> = changes.iter().collect();
        changes.sort_by(|a, b| a.name.cmp(&b.name));
        Self { changes, release }
    }

    /// Produce the adjusted mapping. `env` is never modified.
    pub fn apply(&self, env: &EnvMap, reporter: &dyn Reporter) -> Result<EnvMap> {
        let mut mapped_legacy_values = EnvMap::new();

        for change in &self.changes {
            let current = env.get(&change.name);

            match &change.kind {
                ChangeKind::DefaultChanged => {
                    // Only affects projects relying on the default
                    if current.is_none() {
                        reporter.warn(&self.default_changed_message(change));
                    }
                }
                ChangeKind::Removed => {
                    if let Some(value) = current {
                        reporter.warn(&format!(
                            "Environment variable {} has been removed in {}, because {}. Current value is {}, but it will be ignored.",
                            change.name, self.release, change.reason, value
                        ));
                    }
                }
                ChangeKind::Renamed => {
                    let Some(value) = current else { continue };
                    let new_name = change.renamed_to().ok_or_else(|| EnvError::InvalidChange {
                        name: change.name.clone(),
                        reason: "renamed without a string `update` naming the new variable".to_string(),
                    })?;

                    reporter.warn(&format!(
                        "Environment variable {} has been renamed in {}. Its new name is {}",
                        change.name, self.release, new_name
                    ));

                    if change.support_legacy {
                        if !env.contains_key(new_name) {
                            reporter.warn(
                                "The old variable will continue to work for the next several versions, but migrate it as soon as possible.",
                            );
                            debug!("Forwarding {} to {}", change.name, new_name);
                            mapped_legacy_values.insert(new_name.to_string(), value.clone());
                        }
                    } else {
                        reporter.warn(&format!(
                            "The old variable is no longer functional. Please migrate to the new {} variable as soon as possible.",
                            new_name
                        ));
                    }
                }
                ChangeKind::Unrecognized(change_type) => {
                    return Err(EnvError::UnknownChangeType {
                        name: change.name.clone(),
                        change_type: change_type.clone(),
                    });
                }
            }
        }

        let mut adjusted = env.clone();
        adjusted.extend(mapped_legacy_values);
        Ok(adjusted)
    }

    fn default_changed_message(&self, change: &ChangeRecord) -> String {
        let describe = |v: &Option<serde_json::Value>| {
            v.as_ref().map(display_value).unwrap_or_else(|| "(none)".to_string())
        };
        format!(
            "Default value for {} has changed in {}, due to {}. Old value: {} New value: {} This project does not set a custom value for {}, so this WILL affect the current configuration!",
            change.name,
            self.release,
            change.reason,
            describe(&change.original),
            describe(&change.update),
            change.name
        )
    }
}

/// Apply the definitions' change log to `env`
pub fn apply_backwards_compat_changes(
    env: &EnvMap,
    definitions: &EnvDefinitions,
    release: &BuildpackRelease,
    reporter: &dyn Reporter,
) -> Result<EnvMap> {
    CompatibilityTransformer::new(definitions, release).apply(env, reporter)
}
