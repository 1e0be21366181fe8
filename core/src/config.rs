//! The tagged configuration text format.
//!
//! # Design
//! A configuration is a sequence of lines of the form `<TAG>value`. Values
//! carry no type information on the wire, so `decode` infers one per value
//! in a fixed order: integer, then float, then the raw string. `encode`
//! writes each value back in a form that infers to the same variant, which
//! makes `decode(encode(m)) == m` hold for every mapping whose strings do
//! not themselves look numeric.
//!
//! Order matters to the service and to round-tripping, so the mapping is an
//! `IndexMap`. A repeated tag overwrites the earlier value in place.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The bundled default configuration, sent as the connectivity check.
pub const DEFAULT_CONFIG: &str = include_str!("../resources/default.config");

/// An ordered tag → value mapping.
pub type Config = IndexMap<String, ConfigValue>;

/// A single configuration value with its inferred type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl ConfigValue {
    /// Infer the type of a raw value: integer, then float, then string.
    ///
    /// Numeric attempts ignore surrounding whitespace. Integers that do not
    /// fit in `i64` are kept as floats.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return ConfigValue::Int(value);
        }
        if let Ok(value) = trimmed.parse::<f64>() {
            return ConfigValue::Float(value);
        }
        ConfigValue::Str(raw.to_string())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Float view of a numeric value; integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ConfigValue::Int(value) => Some(*value as f64),
            ConfigValue::Float(value) => Some(*value),
            ConfigValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Int(value) => write!(f, "{value}"),
            ConfigValue::Float(value) => {
                let text = value.to_string();
                // `1.0` displays as `1`, which would come back as an integer.
                if value.is_finite() && !text.contains(['.', 'e', 'E']) {
                    write!(f, "{text}.0")
                } else {
                    f.write_str(&text)
                }
            }
            ConfigValue::Str(value) => f.write_str(value),
        }
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

/// Parse configuration text into an ordered mapping.
///
/// Lines without a `<TAG>` are ignored. Anything after the closing `>` up to
/// the end of the line is the value, including further `<` characters.
pub fn decode(text: &str) -> Config {
    let mut config = Config::new();
    for line in text.lines() {
        if let Some((key, value)) = match_tag(line) {
            config.insert(key.to_string(), ConfigValue::infer(value));
        }
    }
    config
}

/// Render a mapping as configuration text, one `<TAG>value` per line.
pub fn encode(config: &Config) -> String {
    config
        .iter()
        .map(|(key, value)| format!("<{key}>{value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Find `<key>value` in a line: the first `<`, a key of at least one
/// character, the next `>` after it, and the rest of the line.
fn match_tag(line: &str) -> Option<(&str, &str)> {
    let key_start = line.find('<')? + 1;
    let first = line[key_start..].chars().next()?;
    let search_from = key_start + first.len_utf8();
    let close = search_from + line[search_from..].find('>')?;
    Some((&line[key_start..close], &line[close + 1..]))
}
