//! Variable declarations and the backward-compatibility change log
//!
//! Both come from a single definitions artifact:
//!
//! ```json
//! {
//!   "sections": [
//!     { "name": "Connecting to a Magento store",
//!       "variables": [ { "name": "MAGENTO_BACKEND_URL", "type": "url", "desc": "..." } ] }
//!   ],
//!   "changes": [
//!     { "name": "ENABLE_SERVICE_WORKER_DEBUGGING", "type": "renamed",
//!       "update": "DEV_SERVER_SERVICE_WORKER_ENABLED", "supportLegacy": true, "reason": "..." }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{EnvError, Result};

/// Definitions shipped with this release of the buildpack
const BUILTIN_DEFINITIONS: &str = include_str!("../definitions/envVarDefinitions.json");

static BUILTIN: OnceLock<EnvDefinitions> = OnceLock::new();

/// Declared type of an environment variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    Str,
    Bool,
    Num,
    Email,
    Host,
    Port,
    Url,
    Json,
}

impl VarType {
    /// Human-readable description used in validation errors
    pub fn expectation(&self) -> &'static str {
        match self {
            VarType::Str => "a string",
            VarType::Bool => "a boolean (true/false)",
            VarType::Num => "a number",
            VarType::Email => "an email address",
            VarType::Host => "a hostname or IP address",
            VarType::Port => "a port number (1-65535)",
            VarType::Url => "a URL with a scheme",
            VarType::Json => "a JSON value",
        }
    }
}

/// A single declared variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VarType,
    #[serde(default)]
    pub desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    /// Used when the variable is absent. `None` makes the variable required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<serde_json::Value>>,
}

impl VariableSchema {
    pub fn new(name: impl Into<String>, var_type: VarType) -> Self {
        Self {
            name: name.into(),
            var_type,
            desc: String::new(),
            example: None,
            default: None,
            choices: None,
        }
    }

    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    pub fn with_choices(mut self, choices: Vec<serde_json::Value>) -> Self {
        self.choices = Some(choices);
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// A presentation group of variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    #[serde(default)]
    pub variables: Vec<VariableSchema>,
}

/// Kind of backward-compatibility change
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChangeKind {
    DefaultChanged,
    Removed,
    Renamed,
    /// A type string this release does not understand; rejected when evaluated
    Unrecognized(String),
}

impl ChangeKind {
    pub fn as_str(&self) -> &str {
        match self {
            ChangeKind::DefaultChanged => "defaultChanged",
            ChangeKind::Removed => "removed",
            ChangeKind::Renamed => "renamed",
            ChangeKind::Unrecognized(other) => other,
        }
    }
}

impl From<String> for ChangeKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "defaultChanged" => ChangeKind::DefaultChanged,
            "removed" => ChangeKind::Removed,
            "renamed" => ChangeKind::Renamed,
            _ => ChangeKind::Unrecognized(s),
        }
    }
}

impl From<ChangeKind> for String {
    fn from(kind: ChangeKind) -> Self {
        kind.as_str().to_string()
    }
}

/// One entry in the change log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<serde_json::Value>,
    /// New default for `defaultChanged`, new variable name for `renamed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<serde_json::Value>,
    #[serde(default)]
    pub support_legacy: bool,
}

impl ChangeRecord {
    pub fn new(name: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            reason: String::new(),
            original: None,
            update: None,
            support_legacy: false,
        }
    }

    pub fn renamed(name: impl Into<String>, new_name: impl Into<String>, support_legacy: bool) -> Self {
        let mut record = Self::new(name, ChangeKind::Renamed);
        record.update = Some(serde_json::Value::String(new_name.into()));
        record.support_legacy = support_legacy;
        record
    }

    pub fn removed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut record = Self::new(name, ChangeKind::Removed);
        record.reason = reason.into();
        record
    }

    pub fn default_changed(
        name: impl Into<String>,
        original: serde_json::Value,
        update: serde_json::Value,
        reason: impl Into<String>,
    ) -> Self {
        let mut record = Self::new(name, ChangeKind::DefaultChanged);
        record.original = Some(original);
        record.update = Some(update);
        record.reason = reason.into();
        record
    }

    /// Target name of a `renamed` record
    pub fn renamed_to(&self) -> Option<&str> {
        self.update.as_ref().and_then(|v| v.as_str())
    }
}

/// The full definitions artifact: declared sections plus the change log
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvDefinitions {
    pub sections: Vec<Section>,
    #[serde(default)]
    pub changes: Vec<ChangeRecord>,
}

impl EnvDefinitions {
    pub fn new(sections: Vec<Section>, changes: Vec<ChangeRecord>) -> Self {
        Self { sections, changes }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let definitions: EnvDefinitions = serde_json::from_str(content)?;
        definitions.check()?;
        Ok(definitions)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Definitions embedded in this release, parsed once per process
    pub fn builtin() -> Result<&'static EnvDefinitions> {
        if let Some(definitions) = BUILTIN.get() {
            return Ok(definitions);
        }
        let parsed = Self::from_json_str(BUILTIN_DEFINITIONS)?;
        Ok(BUILTIN.get_or_init(|| parsed))
    }

    /// All declared variables, in section order
    pub fn variables(&self) -> impl Iterator<Item = &VariableSchema> {
        self.sections.iter().flat_map(|s| s.variables.iter())
    }

    pub fn variable(&self, name: &str) -> Option<&VariableSchema> {
        self.variables().find(|v| v.name == name)
    }

    /// Change log ordered by variable name
    pub fn sorted_changes(&self) -> Vec<&ChangeRecord> {
        let mut changes: Vec<_> = self.changes.iter().collect();
        changes.sort_by(|a, b| a.name.cmp(&b.name));
        changes
    }

    fn check(&self) -> Result<()> {
        if let Some(section) = self.sections.iter().find(|s| s.name.trim().is_empty()) {
            return Err(EnvError::InvalidDefinitions(format!(
                "section with {} variable(s) has no name",
                section.variables.len()
            )));
        }
        if self.variables().any(|v| v.name.trim().is_empty()) {
            return Err(EnvError::InvalidDefinitions(
                "variable declared without a name".to_string(),
            ));
        }
        if self.changes.iter().any(|c| c.name.trim().is_empty()) {
            return Err(EnvError::InvalidDefinitions(
                "change record without a variable name".to_string(),
            ));
        }
        Ok(())
    }
}

/// Render a definitions value the way it reads in a `.env` file
pub(crate) fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
