// src/event.rs
pub mod field;
pub mod value;

pub use field::{FieldIdentifier, FieldType};
pub use value::Value;

use crate::error::EventError;
use chrono::{DateTime, SubsecRound, Utc};
use field::FieldKey;
use indexmap::IndexMap;
use serde::Serialize;

/// One typed record flowing through the pipeline.
///
/// Values are keyed by `(name, type)`, so two fields may share a name as long
/// as their types differ. Every stored value matches the type of its key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    id: Option<String>,
    values: IndexMap<FieldIdentifier, Value>,
}

impl Event {
    pub const SOURCE: FieldIdentifier = FieldIdentifier::from_static("source", FieldType::Literal);
    pub const ORIGIN: FieldIdentifier = FieldIdentifier::from_static("origin", FieldType::Hostname);
    pub const TIMESTAMP: FieldIdentifier =
        FieldIdentifier::from_static("timestamp", FieldType::Datetime);
    pub const MESSAGE: FieldIdentifier = FieldIdentifier::from_static("message", FieldType::Text);

    pub const RESERVED: [FieldIdentifier; 4] =
        [Self::SOURCE, Self::ORIGIN, Self::TIMESTAMP, Self::MESSAGE];

    /// Create an event with no fields
    pub fn new(id: Option<String>) -> Self {
        Event {
            id,
            values: IndexMap::new(),
        }
    }

    /// Create an event from raw external values, parsing each by its field type
    pub fn parse<I, S>(id: Option<String>, values: I) -> Result<Self, EventError>
    where
        I: IntoIterator<Item = (FieldIdentifier, S)>,
        S: AsRef<str>,
    {
        let mut event = Event::new(id);
        for (field, raw) in values {
            let value = field.field_type().parse(raw.as_ref())?;
            event.values.insert(field, value);
        }
        Ok(event)
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, field: &FieldIdentifier) -> bool {
        self.values.contains_key(field)
    }

    pub fn get(&self, field: &FieldIdentifier) -> Option<&Value> {
        self.values.get(field)
    }

    /// Store a value, validating it against the field's declared type first.
    /// On a mismatch the event is left untouched.
    pub fn set(&mut self, field: FieldIdentifier, value: impl Into<Value>) -> Result<(), EventError> {
        let value = match value.into() {
            Value::Datetime(dt) => Value::Datetime(dt.trunc_subsecs(3)),
            other => other,
        };
        if !field.field_type().accepts(&value) {
            return Err(EventError::TypeMismatch {
                field: field.to_string(),
                expected: field.field_type().value_kind(),
                actual: value.kind(),
            });
        }
        self.values.insert(field, value);
        Ok(())
    }

    pub fn remove(&mut self, field: &FieldIdentifier) -> Option<Value> {
        self.values.shift_remove(field)
    }

    /// All fields, reserved ones included, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&FieldIdentifier, &Value)> + '_ {
        self.values.iter()
    }

    /// All non-reserved fields. Each call walks the live map again.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldIdentifier, &Value)> + '_ {
        self.values
            .iter()
            .filter(|(field, _)| !Self::RESERVED.contains(*field))
    }

    fn lookup(&self, name: &str, field_type: FieldType) -> Result<&Value, EventError> {
        self.values
            .get(&FieldKey { name, field_type })
            .ok_or_else(|| EventError::NotFound(format!("{}:{}", field_type, name)))
    }

    fn lookup_str(&self, name: &str, field_type: FieldType) -> Result<&str, EventError> {
        let value = self.lookup(name, field_type)?;
        value.as_str().ok_or_else(|| mismatch(name, field_type, value))
    }

    pub fn text(&self, key: &str) -> Result<&str, EventError> {
        self.lookup_str(key, FieldType::Text)
    }

    pub fn text_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.text(key).unwrap_or(default)
    }

    pub fn literal(&self, key: &str) -> Result<&str, EventError> {
        self.lookup_str(key, FieldType::Literal)
    }

    pub fn literal_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.literal(key).unwrap_or(default)
    }

    pub fn address(&self, key: &str) -> Result<&str, EventError> {
        self.lookup_str(key, FieldType::Address)
    }

    pub fn address_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.address(key).unwrap_or(default)
    }

    pub fn hostname(&self, key: &str) -> Result<&str, EventError> {
        self.lookup_str(key, FieldType::Hostname)
    }

    pub fn hostname_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.hostname(key).unwrap_or(default)
    }

    pub fn integer(&self, key: &str) -> Result<i64, EventError> {
        let value = self.lookup(key, FieldType::Integer)?;
        value
            .as_integer()
            .ok_or_else(|| mismatch(key, FieldType::Integer, value))
    }

    pub fn integer_or(&self, key: &str, default: i64) -> i64 {
        self.integer(key).unwrap_or(default)
    }

    pub fn float(&self, key: &str) -> Result<f64, EventError> {
        let value = self.lookup(key, FieldType::Float)?;
        value
            .as_float()
            .ok_or_else(|| mismatch(key, FieldType::Float, value))
    }

    pub fn float_or(&self, key: &str, default: f64) -> f64 {
        self.float(key).unwrap_or(default)
    }

    pub fn datetime(&self, key: &str) -> Result<DateTime<Utc>, EventError> {
        let value = self.lookup(key, FieldType::Datetime)?;
        value
            .as_datetime()
            .ok_or_else(|| mismatch(key, FieldType::Datetime, value))
    }

    pub fn datetime_or(&self, key: &str, default: DateTime<Utc>) -> DateTime<Utc> {
        self.datetime(key).unwrap_or(default)
    }

    pub fn source(&self) -> Result<&str, EventError> {
        self.literal(Self::SOURCE.name())
    }

    pub fn source_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.literal_or(Self::SOURCE.name(), default)
    }

    pub fn origin(&self) -> Result<&str, EventError> {
        self.hostname(Self::ORIGIN.name())
    }

    pub fn origin_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.hostname_or(Self::ORIGIN.name(), default)
    }

    pub fn timestamp(&self) -> Result<DateTime<Utc>, EventError> {
        self.datetime(Self::TIMESTAMP.name())
    }

    pub fn timestamp_or(&self, default: DateTime<Utc>) -> DateTime<Utc> {
        self.datetime_or(Self::TIMESTAMP.name(), default)
    }

    pub fn message(&self) -> Result<&str, EventError> {
        self.text(Self::MESSAGE.name())
    }

    pub fn message_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.text_or(Self::MESSAGE.name(), default)
    }

    /// Render as `{"id": .., "fields": [{"name", "type", "value"}, ..]}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.record()).unwrap_or_default()
    }

    /// `to_json` as a single line of text
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(&self.record()).unwrap_or_default()
    }

    fn record(&self) -> EventRecord<'_> {
        EventRecord {
            id: self.id.as_deref(),
            fields: self
                .values
                .iter()
                .map(|(field, value)| FieldRecord {
                    name: field.name(),
                    field_type: field.field_type().as_str(),
                    value: value.to_json(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct EventRecord<'a> {
    id: Option<&'a str>,
    fields: Vec<FieldRecord<'a>>,
}

#[derive(Serialize)]
struct FieldRecord<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    field_type: &'static str,
    value: serde_json::Value,
}

fn mismatch(name: &str, field_type: FieldType, value: &Value) -> EventError {
    EventError::TypeMismatch {
        field: format!("{}:{}", field_type, name),
        expected: field_type.value_kind(),
        actual: value.kind(),
    }
}
