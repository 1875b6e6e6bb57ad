//! PWA Studio Buildpack Environment
//!
//! Validates a project's environment variables against the variables the
//! buildpack declares, and migrates variables that were renamed, removed or
//! re-defaulted between buildpack releases.
//!
//! ## Features
//!
//! - **Typed Validation**: Every declared variable is coerced to its type or defaulted
//! - **Aggregate Errors**: All invalid variables are reported together
//! - **Legacy Forwarding**: Renamed variables keep working for a deprecation window
//! - **Migration Warnings**: Users are told exactly what changed and why
//!
//! ## Pipeline
//!
//! ```text
//! definitions.json ──► ValidationSchema ─────────────────────┐
//!                                                            ▼
//! <dir>/.env ──► assert_dev_env_file                      validate ──► ValidatedConfig
//!                                                            ▲
//! caller env ──► CompatibilityTransformer (change log) ──────┘
//! ```

pub mod compat;
pub mod config;
pub mod dotenv;
pub mod environment;
pub mod error;
pub mod reporter;
pub mod schema;
pub mod validate;
pub mod version;

pub use compat::{apply_backwards_compat_changes, CompatibilityTransformer};
pub use config::{EnvFileMode, EnvSettings};
pub use dotenv::{assert_dev_env_file, process_env, EnvMap};
pub use environment::{configure_environment, EnvironmentConfigurator};
pub use error::{EnvError, InvalidReason, InvalidVariable, Result, ValidationFailure};
pub use reporter::{MemoryReporter, NoticeLevel, Reporter, TracingReporter};
pub use schema::{ChangeKind, ChangeRecord, EnvDefinitions, Section, VarType, VariableSchema};
pub use validate::{ValidatedConfig, ValidationSchema};
pub use version::BuildpackRelease;
