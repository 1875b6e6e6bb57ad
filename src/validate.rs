//! Typed validation of the environment against declared variables

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::dotenv::EnvMap;
use crate::error::{EnvError, InvalidReason, InvalidVariable, Result, ValidationFailure};
use crate::schema::{display_value, Section, VarType, VariableSchema};

/// Declared variables keyed by name. Later declarations of a name win.
#[derive(Debug, Clone, Default)]
pub struct ValidationSchema {
    variables: BTreeMap<String, VariableSchema>,
}

impl ValidationSchema {
    pub fn from_sections(sections: &[Section]) -> Self {
        let variables = sections
            .iter()
            .flat_map(|s| s.variables.iter())
            .map(|v| (v.name.clone(), v.clone()))
            .collect();
        Self { variables }
    }

    pub fn from_variables(variables: impl IntoIterator<Item = VariableSchema>) -> Self {
        Self {
            variables: variables.into_iter().map(|v| (v.name.clone(), v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Coerce every declared variable, collecting all failures
    pub fn validate(&self, env: &EnvMap) -> Result<ValidatedConfig> {
        let mut values = BTreeMap::new();
        let mut failure = ValidationFailure::default();

        for (name, schema) in &self.variables {
            match resolve(schema, env.get(name)) {
                Ok(value) => {
                    values.insert(name.clone(), value);
                }
                Err(reason) => failure.invalid.push(InvalidVariable {
                    name: name.clone(),
                    desc: schema.desc.clone(),
                    reason,
                }),
            }
        }

        if failure.is_empty() {
            Ok(ValidatedConfig { values })
        } else {
            Err(EnvError::Validation(failure))
        }
    }
}

fn resolve(schema: &VariableSchema, raw: Option<&String>) -> std::result::Result<Value, InvalidReason> {
    let value = match raw {
        Some(raw) => coerce(schema.var_type, raw).ok_or_else(|| InvalidReason::BadValue {
            value: raw.clone(),
            expected: schema.var_type.expectation().to_string(),
        })?,
        None => return schema.default.clone().ok_or(InvalidReason::Missing),
    };

    if let Some(choices) = &schema.choices {
        if !choices.iter().any(|choice| same_choice(choice, &value)) {
            return Err(InvalidReason::NotAChoice {
                value: display_value(&value),
                choices: choices.iter().map(display_value).collect(),
            });
        }
    }
    Ok(value)
}

/// Numbers compare by value, so `1.0` matches a declared `1`
fn same_choice(choice: &Value, value: &Value) -> bool {
    match (choice.as_f64(), value.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => choice == value,
    }
}

/// Convert a raw string to the declared type
pub fn coerce(var_type: VarType, raw: &str) -> Option<Value> {
    match var_type {
        VarType::Str => Some(Value::String(raw.to_string())),
        VarType::Bool => parse_bool(raw).map(Value::Bool),
        VarType::Num => parse_num(raw),
        VarType::Port => parse_port(raw).map(Value::from),
        VarType::Email => email_pattern()
            .is_match(raw)
            .then(|| Value::String(raw.to_string())),
        VarType::Host => is_host(raw).then(|| Value::String(raw.to_string())),
        VarType::Url => url_pattern()
            .is_match(raw)
            .then(|| Value::String(raw.to_string())),
        VarType::Json => serde_json::from_str(raw).ok(),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" | "t" | "yes" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_num(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Value::from(int));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn parse_port(raw: &str) -> Option<u16> {
    let port = raw.parse::<u16>().ok()?;
    // "080" and "+80" parse but are not canonical
    (port >= 1 && port.to_string() == raw).then_some(port)
}

fn is_host(raw: &str) -> bool {
    if raw.parse::<IpAddr>().is_ok() {
        return true;
    }
    let host = raw.strip_suffix('.').unwrap_or(raw);
    !host.is_empty()
        && host.len() <= 253
        && host.split('.').all(|label| host_label_pattern().is_match(label))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern")
    })
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+[^\s]*$").expect("url pattern")
    })
}

fn host_label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9\-]{0,61}[A-Za-z0-9])?$").expect("host label pattern")
    })
}

/// The validated, typed environment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidatedConfig {
    values: BTreeMap<String, Value>,
}

impl ValidatedConfig {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_num(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_port(&self, name: &str) -> Option<u16> {
        self.get(name)
            .and_then(Value::as_u64)
            .and_then(|p| u16::try_from(p).ok())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// One `NAME: value` line per variable, for diagnostics
    pub fn to_pretty_lines(&self) -> String {
        self.values
            .iter()
            .map(|(k, v)| format!("  {}: {}", k, v))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
