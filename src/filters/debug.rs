// src/filters/debug.rs
use crate::error::ProcessingError;
use crate::event::Event;
use crate::pipeline::context::FilterResult;
use crate::pipeline::stream::{Filter, Stage};

/// Logs every event at debug level and passes it on unchanged
#[derive(Debug, Default)]
pub struct DebugFilter;

impl DebugFilter {
    pub fn new() -> Self {
        DebugFilter
    }
}

impl Stage for DebugFilter {
    fn name(&self) -> &str {
        "debug_filter"
    }
}

impl Filter for DebugFilter {
    fn filter(&mut self, event: Event) -> Result<FilterResult, ProcessingError> {
        tracing::debug!(id = event.id().unwrap_or("-"), "event: {}", event.to_json());
        Ok(FilterResult::Pass(event))
    }
}
