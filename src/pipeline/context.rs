use crate::event::Event;
use std::time::Duration;

/// Result of passing one event through a filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterResult {
    /// Continue with this (possibly modified) event
    Pass(Event),
    /// Discard the current event only; the run carries on with the next one
    Drop(String),
}

impl FilterResult {
    pub fn drop(reason: impl Into<String>) -> Self {
        FilterResult::Drop(reason.into())
    }

    pub fn is_drop(&self) -> bool {
        matches!(self, FilterResult::Drop(_))
    }
}

/// Lifecycle of a pipeline; a pipeline runs at most once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Stopped,
}

/// Runtime statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProcessingStats {
    /// Events delivered to the sink
    pub processed: usize,
    /// Events discarded by a filter
    pub dropped: usize,
    pub processing_time: Duration,
}

impl ProcessingStats {
    /// Every event the source produced and that reached a verdict
    pub fn total(&self) -> usize {
        self.processed + self.dropped
    }
}
