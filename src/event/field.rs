// src/event/field.rs
use crate::error::EventError;
use crate::event::value::Value;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// The closed set of field types an event value can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    Text,
    Literal,
    Integer,
    Float,
    Datetime,
    Address,
    Hostname,
}

impl FieldType {
    pub const ALL: [FieldType; 7] = [
        FieldType::Text,
        FieldType::Literal,
        FieldType::Integer,
        FieldType::Float,
        FieldType::Datetime,
        FieldType::Address,
        FieldType::Hostname,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Literal => "LITERAL",
            FieldType::Integer => "INTEGER",
            FieldType::Float => "FLOAT",
            FieldType::Datetime => "DATETIME",
            FieldType::Address => "ADDRESS",
            FieldType::Hostname => "HOSTNAME",
        }
    }

    /// Name of the runtime value kind this type stores
    pub fn value_kind(&self) -> &'static str {
        match self {
            FieldType::Text | FieldType::Literal | FieldType::Address | FieldType::Hostname => {
                "string"
            }
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Datetime => "datetime",
        }
    }

    /// Check whether a runtime value may be stored under this type
    pub fn accepts(&self, value: &Value) -> bool {
        self.value_kind() == value.kind()
    }

    /// Coerce a raw external value into the typed representation.
    ///
    /// Datetimes are given as milliseconds since the epoch, either integral
    /// or fractional; fractions below a millisecond are truncated.
    pub fn parse(&self, raw: &str) -> Result<Value, EventError> {
        let parse_error = |message: String| EventError::Parse {
            field_type: *self,
            raw: raw.to_string(),
            message,
        };

        match self {
            FieldType::Text | FieldType::Literal | FieldType::Address | FieldType::Hostname => {
                Ok(Value::String(raw.to_string()))
            }
            FieldType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| parse_error(e.to_string())),
            FieldType::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| parse_error(e.to_string())),
            FieldType::Datetime => {
                let trimmed = raw.trim();
                let millis = match trimmed.parse::<i64>() {
                    Ok(ms) => ms,
                    Err(_) => {
                        let f = trimmed
                            .parse::<f64>()
                            .map_err(|e| parse_error(e.to_string()))?;
                        if !f.is_finite() {
                            return Err(parse_error("timestamp is not finite".to_string()));
                        }
                        f.floor() as i64
                    }
                };
                DateTime::<Utc>::from_timestamp_millis(millis)
                    .map(Value::Datetime)
                    .ok_or_else(|| parse_error("timestamp out of range".to_string()))
            }
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TEXT" => Ok(FieldType::Text),
            "LITERAL" => Ok(FieldType::Literal),
            "INTEGER" => Ok(FieldType::Integer),
            "FLOAT" => Ok(FieldType::Float),
            "DATETIME" => Ok(FieldType::Datetime),
            "ADDRESS" => Ok(FieldType::Address),
            "HOSTNAME" => Ok(FieldType::Hostname),
            _ => Err(EventError::UnknownFieldType(s.to_string())),
        }
    }
}

/// Field name and type, which together identify one value slot in an event
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FieldIdentifier {
    name: Cow<'static, str>,
    field_type: FieldType,
}

impl FieldIdentifier {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldIdentifier {
            name: Cow::Owned(name.into()),
            field_type,
        }
    }

    /// Identifier with a static name, usable in constants
    pub const fn from_static(name: &'static str, field_type: FieldType) -> Self {
        FieldIdentifier {
            name: Cow::Borrowed(name),
            field_type,
        }
    }

    /// Build an identifier from a name and a type name such as `"literal"`
    pub fn from_strings(name: &str, field_type: &str) -> Result<Self, EventError> {
        Ok(FieldIdentifier::new(name, field_type.parse()?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }
}

impl Hash for FieldIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
        self.field_type.hash(state);
    }
}

impl fmt::Display for FieldIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field_type, self.name)
    }
}

/// Borrowed lookup key; hashes exactly like the matching `FieldIdentifier`
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldKey<'a> {
    pub name: &'a str,
    pub field_type: FieldType,
}

impl Hash for FieldKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.field_type.hash(state);
    }
}

impl indexmap::Equivalent<FieldIdentifier> for FieldKey<'_> {
    fn equivalent(&self, key: &FieldIdentifier) -> bool {
        self.field_type == key.field_type && self.name == key.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identifier_equality_needs_name_and_type() {
        let a = FieldIdentifier::new("env", FieldType::Literal);
        let b = FieldIdentifier::from_static("env", FieldType::Literal);
        let c = FieldIdentifier::new("env", FieldType::Text);

        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }

    #[test]
    fn test_field_type_names() {
        for field_type in FieldType::ALL {
            assert_eq!(field_type.as_str().parse::<FieldType>().unwrap(), field_type);
        }
        assert_eq!("literal".parse::<FieldType>().unwrap(), FieldType::Literal);
        assert!(matches!(
            "blob".parse::<FieldType>(),
            Err(EventError::UnknownFieldType(_))
        ));
    }

    #[test]
    fn test_identifier_display() {
        let id = FieldIdentifier::new("env", FieldType::Literal);
        assert_eq!(id.to_string(), "LITERAL:env");
    }

    #[test]
    fn test_parse_datetime_from_millis() {
        let value = FieldType::Datetime.parse("1381234567890").unwrap();
        let dt = value.as_datetime().unwrap();
        assert_eq!(dt.timestamp_millis(), 1381234567890);

        let fractional = FieldType::Datetime.parse("1381234567890.75").unwrap();
        assert_eq!(fractional.as_datetime().unwrap().timestamp_millis(), 1381234567890);

        assert!(FieldType::Datetime.parse("yesterday").is_err());
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(FieldType::Integer.parse(" 42 ").unwrap(), Value::Integer(42));
        assert_eq!(FieldType::Float.parse("2.5").unwrap(), Value::Float(2.5));
        assert!(FieldType::Integer.parse("4.2").is_err());
    }
}
