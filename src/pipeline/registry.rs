// src/pipeline/registry.rs
use crate::error::BuildError;
use crate::filters::{DebugFilter, EnrichFilter, ScriptFilter, SyslogFormatFilter};
use crate::pipeline::stream::Node;
use crate::sinks::{DebugSink, SyslogSink};
use crate::sources::{StdinSource, TailSource};
use indexmap::IndexMap;
use std::fmt;

/// Capability group holding every pipeline stage
pub const PIPELINE_GROUP: &str = "terane.plugin.pipeline";

pub type StageFactory = Box<dyn Fn() -> Node>;

/// Explicit table of stage factories, keyed by `(group, name)`
#[derive(Default)]
pub struct PluginRegistry {
    factories: IndexMap<(String, String), StageFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every stage this crate ships
    pub fn builtin() -> Self {
        let mut registry = PluginRegistry::new();
        registry.register(PIPELINE_GROUP, "stdin_source", || {
            Node::Source(Box::new(StdinSource::new()))
        });
        registry.register(PIPELINE_GROUP, "tail_source", || {
            Node::Source(Box::new(TailSource::new()))
        });
        registry.register(PIPELINE_GROUP, "enrich", || {
            Node::Filter(Box::new(EnrichFilter::new()))
        });
        registry.register(PIPELINE_GROUP, "syslog_format", || {
            Node::Filter(Box::new(SyslogFormatFilter::new()))
        });
        registry.register(PIPELINE_GROUP, "debug_filter", || {
            Node::Filter(Box::new(DebugFilter::new()))
        });
        registry.register(PIPELINE_GROUP, "script_filter", || {
            Node::Filter(Box::new(ScriptFilter::new()))
        });
        registry.register(PIPELINE_GROUP, "debug_sink", || {
            Node::Sink(Box::new(DebugSink::stdout()))
        });
        registry.register(PIPELINE_GROUP, "syslog_sink", || {
            Node::Sink(Box::new(SyslogSink::new()))
        });
        registry
    }

    /// Add a factory; a later registration under the same name replaces the earlier one
    pub fn register<F>(&mut self, group: &str, name: &str, factory: F)
    where
        F: Fn() -> Node + 'static,
    {
        self.factories
            .insert((group.to_string(), name.to_string()), Box::new(factory));
    }

    pub fn resolve(&self, group: &str, name: &str) -> Result<&StageFactory, BuildError> {
        self.factories
            .get(&(group.to_string(), name.to_string()))
            .ok_or_else(|| BuildError::PluginNotFound {
                group: group.to_string(),
                name: name.to_string(),
            })
    }

    pub fn names<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.factories
            .keys()
            .filter(move |(g, _)| g == group)
            .map(|(_, name)| name.as_str())
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}
