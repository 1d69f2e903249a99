// src/pipeline/config.rs
use crate::error::BuildError;
use crate::pipeline::spec::NodeSpec;
use indexmap::IndexMap;
use std::fmt::Display;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// A named group of configuration values with typed getters.
///
/// Every getter falls back to its default when the key is absent. A key that
/// is present but cannot be coerced is a configuration error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    name: String,
    values: IndexMap<String, String>,
}

impl Section {
    pub fn new(name: impl Into<String>, values: IndexMap<String, String>) -> Self {
        Section {
            name: name.into(),
            values,
        }
    }

    /// Section holding the parameters of the node at `index`, named `node<index>:<name>`
    pub fn from_node(index: usize, node: &NodeSpec) -> Self {
        Section::new(format!("node{}:{}", index, node.name), node.params.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.trim())
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or(default).to_string()
    }

    pub fn get_int(&self, key: &str, default: i64) -> Result<i64, BuildError> {
        Ok(self.get_parsed(key)?.unwrap_or(default))
    }

    pub fn get_float(&self, key: &str, default: f64) -> Result<f64, BuildError> {
        Ok(self.get_parsed(key)?.unwrap_or(default))
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, BuildError> {
        match self.get_string(key) {
            None => Ok(default),
            Some(raw) => match raw.to_lowercase().as_str() {
                "1" | "yes" | "true" | "on" => Ok(true),
                "0" | "no" | "false" | "off" => Ok(false),
                _ => Err(self.invalid(key, "not a boolean")),
            },
        }
    }

    /// Path value made absolute against the current directory and normalized
    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        let raw = self.get_string(key)?;
        let path = Path::new(raw);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            match std::env::current_dir() {
                Ok(cwd) => cwd.join(path),
                Err(_) => path.to_path_buf(),
            }
        };
        Some(normalize_path(&absolute))
    }

    /// Delimited list, each element trimmed and parsed
    pub fn get_list<T>(&self, key: &str, delimiter: char) -> Result<Option<Vec<T>>, BuildError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(raw) = self.get_string(key) else {
            return Ok(None);
        };
        raw.split(delimiter)
            .map(|item| {
                item.trim()
                    .parse::<T>()
                    .map_err(|e| self.invalid(key, &e.to_string()))
            })
            .collect::<Result<Vec<T>, BuildError>>()
            .map(Some)
    }

    /// Human-readable duration such as `5s` or `250ms`
    pub fn get_duration(&self, key: &str, default: Duration) -> Result<Duration, BuildError> {
        match self.get_string(key) {
            None => Ok(default),
            Some(raw) => {
                humantime::parse_duration(raw).map_err(|e| self.invalid(key, &e.to_string()))
            }
        }
    }

    fn get_parsed<T>(&self, key: &str) -> Result<Option<T>, BuildError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get_string(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| self.invalid(key, &e.to_string())),
        }
    }

    fn invalid(&self, key: &str, reason: &str) -> BuildError {
        BuildError::ConfigError(format!(
            "failed to parse configuration item [{}]=>{}: {}",
            self.name, key, reason
        ))
    }
}

/// Configuration file contents: sections of key/value pairs.
///
/// The file is YAML, a mapping of section name to a mapping of scalars:
///
/// ```yaml
/// run:
///   pipeline: 'stdin_source | debug_sink'
///   debug: true
/// ```
#[derive(Debug, Clone, Default)]
pub struct Settings {
    sections: IndexMap<String, Section>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, BuildError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            BuildError::ConfigError(format!(
                "failed to read configuration file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, BuildError> {
        let doc: serde_yaml::Value = serde_yaml::from_str(text)
            .map_err(|e| BuildError::ConfigError(format!("malformed configuration: {}", e)))?;

        let mut settings = Settings::default();
        let top = match doc {
            serde_yaml::Value::Null => return Ok(settings),
            serde_yaml::Value::Mapping(mapping) => mapping,
            _ => {
                return Err(BuildError::ConfigError(
                    "configuration must be a mapping of sections".to_string(),
                ))
            }
        };

        for (name, body) in &top {
            let name = scalar_to_string(name).ok_or_else(|| {
                BuildError::ConfigError("section names must be scalars".to_string())
            })?;
            let mut values = IndexMap::new();
            match body {
                serde_yaml::Value::Null => {}
                serde_yaml::Value::Mapping(items) => {
                    for (key, value) in items {
                        let key = scalar_to_string(key).ok_or_else(|| {
                            BuildError::ConfigError(format!(
                                "keys in section '{}' must be scalars",
                                name
                            ))
                        })?;
                        if let Some(value) = value_to_string(value) {
                            values.insert(key, value);
                        } else if !value.is_null() {
                            return Err(BuildError::ConfigError(format!(
                                "value of [{}]=>{} must be a scalar or a list",
                                name, key
                            )));
                        }
                    }
                }
                _ => {
                    return Err(BuildError::ConfigError(format!(
                        "section '{}' must be a mapping",
                        name
                    )))
                }
            }
            settings
                .sections
                .insert(name.clone(), Section::new(name, values));
        }

        Ok(settings)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// The named section; an absent section is empty rather than an error
    pub fn section(&self, name: &str) -> Section {
        self.sections
            .get(name)
            .cloned()
            .unwrap_or_else(|| Section::new(name, IndexMap::new()))
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> + '_ {
        self.sections.values()
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// Lists become comma-delimited strings so `get_list` can read them back
fn value_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .map(scalar_to_string)
            .collect::<Option<Vec<String>>>()
            .map(|parts| parts.join(",")),
        other => scalar_to_string(other),
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
