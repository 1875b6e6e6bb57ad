//! Error types for environment configuration

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for environment configuration
pub type Result<T> = std::result::Result<T, EnvError>;

/// Environment configuration errors
#[derive(Error, Debug)]
pub enum EnvError {
    /// The project `.env` file is absent or could not be parsed.
    ///
    /// Scaffolding a fresh `.env` from the template is left to the caller;
    /// this error is the point to hook that in.
    #[error("Configuration missing: could not load {path}: {reason}")]
    ConfigurationMissing { path: PathBuf, reason: String },

    #[error("Found unknown change type \"{change_type}\" for {name} while trying to notify about changed env vars")]
    UnknownChangeType { name: String, change_type: String },

    #[error("Invalid change record for {name}: {reason}")]
    InvalidChange { name: String, reason: String },

    #[error("Invalid environment: {0}")]
    Validation(ValidationFailure),

    #[error("Invalid definitions: {0}")]
    InvalidDefinitions(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] config_crate::ConfigError),
}

/// Why a single variable was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidReason {
    /// Not set and no default declared
    Missing,
    /// Set, but could not be coerced to the declared type
    BadValue { value: String, expected: String },
    /// Coerced, but not one of the declared choices
    NotAChoice { value: String, choices: Vec<String> },
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::Missing => write!(f, "missing value and no default"),
            InvalidReason::BadValue { value, expected } => {
                write!(f, "invalid value \"{}\", expected {}", value, expected)
            }
            InvalidReason::NotAChoice { value, choices } => {
                write!(f, "value \"{}\" not in choices [{}]", value, choices.join(", "))
            }
        }
    }
}

/// A variable that failed validation
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidVariable {
    pub name: String,
    pub desc: String,
    pub reason: InvalidReason,
}

/// Every variable that failed validation in one pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationFailure {
    pub invalid: Vec<InvalidVariable>,
}

impl ValidationFailure {
    /// Names of the offending variables, in report order
    pub fn names(&self) -> Vec<&str> {
        self.invalid.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.invalid.iter().any(|v| v.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.invalid.is_empty()
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} variable(s) failed validation", self.invalid.len())?;
        for var in &self.invalid {
            write!(f, "\n    {}: {}", var.name, var.reason)?;
            if !var.desc.is_empty() {
                write!(f, " ({})", var.desc)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failure_lists_every_variable() {
        let failure = ValidationFailure {
            invalid: vec![
                InvalidVariable {
                    name: "PORT".to_string(),
                    desc: String::new(),
                    reason: InvalidReason::Missing,
                },
                InvalidVariable {
                    name: "DEBUG".to_string(),
                    desc: "Verbose output".to_string(),
                    reason: InvalidReason::BadValue {
                        value: "maybe".to_string(),
                        expected: "a boolean".to_string(),
                    },
                },
            ],
        };

        let message = EnvError::Validation(failure.clone()).to_string();
        assert!(message.contains("2 variable(s)"));
        assert!(message.contains("PORT: missing value and no default"));
        assert!(message.contains("DEBUG: invalid value \"maybe\""));
        assert!(message.contains("(Verbose output)"));
        assert_eq!(failure.names(), vec!["PORT", "DEBUG"]);
    }

    #[test]
    fn test_unknown_change_type_message() {
        let err = EnvError::UnknownChangeType {
            name: "OLD_VAR".to_string(),
            change_type: "exploded".to_string(),
        };
        assert!(err.to_string().contains("unknown change type \"exploded\""));
    }
}
