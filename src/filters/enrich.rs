// src/filters/enrich.rs
use crate::error::{BuildError, ProcessingError};
use crate::event::{Event, FieldIdentifier, FieldType, Value};
use crate::pipeline::config::Section;
use crate::pipeline::context::FilterResult;
use crate::pipeline::stream::{Filter, Stage};
use std::str::FromStr;

/// Adds a constant field to every event
pub struct EnrichFilter {
    field: Option<FieldIdentifier>,
    raw_value: String,
    value: Option<Value>,
    override_existing: bool,
}

impl EnrichFilter {
    pub fn new() -> Self {
        EnrichFilter {
            field: None,
            raw_value: String::new(),
            value: None,
            override_existing: false,
        }
    }
}

impl Default for EnrichFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for EnrichFilter {
    fn name(&self) -> &str {
        "enrich"
    }

    fn describe(&self) -> String {
        match &self.field {
            Some(field) => format!(
                "enrich({}={:?}, override={})",
                field, self.raw_value, self.override_existing
            ),
            None => "enrich".to_string(),
        }
    }

    fn configure(&mut self, section: &Section) -> Result<(), BuildError> {
        let required = |key: &str| {
            section.get_string(key).ok_or_else(|| {
                BuildError::ConfigError(format!("[{}] requires a '{}' parameter", section.name(), key))
            })
        };

        let name = required("fieldname")?;
        let field_type = FieldType::from_str(required("fieldtype")?)?;
        self.field = Some(FieldIdentifier::new(name.to_string(), field_type));
        self.raw_value = section.get_string_or("value", "");
        self.override_existing = section.get_bool("override", false)?;
        Ok(())
    }

    fn init(&mut self) -> Result<(), ProcessingError> {
        let field = self
            .field
            .as_ref()
            .ok_or_else(|| ProcessingError::NotInitialized("enrich".to_string()))?;
        self.value = Some(field.field_type().parse(&self.raw_value)?);
        Ok(())
    }
}

impl Filter for EnrichFilter {
    fn filter(&mut self, mut event: Event) -> Result<FilterResult, ProcessingError> {
        let (Some(field), Some(value)) = (&self.field, &self.value) else {
            return Err(ProcessingError::NotInitialized("enrich".to_string()));
        };

        if self.override_existing || !event.contains(field) {
            event.set(field.clone(), value.clone())?;
        }
        Ok(FilterResult::Pass(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn enrich(params: &[(&str, &str)]) -> Result<EnrichFilter, BuildError> {
        let values: IndexMap<String, String> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut filter = EnrichFilter::new();
        filter.configure(&Section::new("node1:enrich", values))?;
        Ok(filter)
    }

    #[test]
    fn test_sets_typed_value() {
        let mut filter = enrich(&[("fieldname", "retries"), ("fieldtype", "integer"), ("value", "3")])
            .unwrap();
        filter.init().unwrap();

        let event = match filter.filter(Event::new(None)).unwrap() {
            FilterResult::Pass(event) => event,
            FilterResult::Drop(reason) => panic!("unexpected drop: {}", reason),
        };
        assert_eq!(event.integer("retries").unwrap(), 3);
    }

    #[test]
    fn test_existing_value_kept_unless_override() {
        let params = [("fieldname", "env"), ("fieldtype", "text"), ("value", "prod")];
        let mut keep = enrich(&params).unwrap();
        keep.init().unwrap();

        let mut event = Event::new(None);
        event.set(FieldIdentifier::new("env", FieldType::Text), "dev").unwrap();

        let kept = match keep.filter(event.clone()).unwrap() {
            FilterResult::Pass(event) => event,
            FilterResult::Drop(_) => unreachable!(),
        };
        assert_eq!(kept.text("env").unwrap(), "dev");

        let mut replace = enrich(&[
            ("fieldname", "env"),
            ("fieldtype", "text"),
            ("value", "prod"),
            ("override", "true"),
        ])
        .unwrap();
        replace.init().unwrap();
        let replaced = match replace.filter(event).unwrap() {
            FilterResult::Pass(event) => event,
            FilterResult::Drop(_) => unreachable!(),
        };
        assert_eq!(replaced.text("env").unwrap(), "prod");
    }

    #[test]
    fn test_missing_and_bad_parameters() {
        assert!(enrich(&[("fieldtype", "text")]).is_err());
        assert!(enrich(&[("fieldname", "x")]).is_err());
        assert!(enrich(&[("fieldname", "x"), ("fieldtype", "blob")]).is_err());

        let mut filter = enrich(&[("fieldname", "n"), ("fieldtype", "integer"), ("value", "abc")])
            .unwrap();
        assert!(matches!(filter.init(), Err(ProcessingError::Event(_))));
    }
}
