//! Core configuration types
//!
//! This module defines the data structures that represent a Taskfile.yml.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Application name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Global interpreter to use for commands (e.g., ["sh", "-c"])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<Vec<String>>,

    /// Variables visible to every task
    #[serde(
        default,
        skip_serializing_if = "HashMap::is_empty",
        deserialize_with = "deserialize_scalar_map"
    )]
    pub vars: HashMap<String, String>,

    /// Tasks defined in the configuration
    #[serde(default)]
    pub tasks: HashMap<String, Task>,
}

/// A task definition
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Task {
    /// Short description shown in task listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    /// Commands, run in order
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub cmds: Vec<String>,

    /// Tasks that must complete before this one
    #[serde(default, deserialize_with = "deserialize_string_list")]
    pub deps: Vec<String>,

    /// Glob patterns of input files
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_string_list"
    )]
    pub sources: Vec<String>,

    /// Glob patterns of output files
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_string_list"
    )]
    pub generates: Vec<String>,

    /// Working directory for commands
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dir: String,

    /// Task-scoped variables
    #[serde(
        default,
        skip_serializing_if = "HashMap::is_empty",
        deserialize_with = "deserialize_scalar_map"
    )]
    pub vars: HashMap<String, String>,

    /// Capture command output into this variable
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub set: String,

    /// Extra environment for every command
    #[serde(
        default,
        skip_serializing_if = "HashMap::is_empty",
        deserialize_with = "deserialize_scalar_map"
    )]
    pub env: HashMap<String, String>,
}

/// Custom deserializer for lists that also accepts a single string
fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::String(s) => Ok(vec![s]),
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| scalar_to_string(item).ok_or_else(|| D::Error::custom("list items must be strings")))
            .collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("expected a string or a list of strings")),
    }
}

/// Custom deserializer for maps whose values may be any YAML scalar
fn deserialize_scalar_map<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::Mapping(map) => {
            let mut out = HashMap::new();
            for (key, value) in map {
                let key = scalar_to_string(key)
                    .ok_or_else(|| D::Error::custom("map keys must be scalars"))?;
                let value = scalar_to_string(value).ok_or_else(|| {
                    D::Error::custom(format!("value of '{}' must be a scalar", key))
                })?;
                out.insert(key, value);
            }
            Ok(out)
        }
        Value::Null => Ok(HashMap::new()),
        _ => Err(D::Error::custom("expected a mapping")),
    }
}

fn scalar_to_string(value: serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;

    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}
