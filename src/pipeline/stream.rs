// src/pipeline/stream.rs
use std::fmt;
use std::time::Instant;

use crate::error::{BuildError, ProcessingError};
use crate::event::Event;
use crate::pipeline::config::Section;
use crate::pipeline::context::{FilterResult, PipelineState, ProcessingStats};

/// Lifecycle shared by every pipeline stage
pub trait Stage {
    fn name(&self) -> &str;

    /// One-line description including the configured parameters
    fn describe(&self) -> String {
        self.name().to_string()
    }

    /// Apply node parameters. Called once, before `init`.
    fn configure(&mut self, _section: &Section) -> Result<(), BuildError> {
        Ok(())
    }

    /// Acquire runtime resources (files, sockets)
    fn init(&mut self) -> Result<(), ProcessingError> {
        Ok(())
    }

    /// Release runtime resources. Called exactly once for every stage whose
    /// `init` succeeded.
    fn fini(&mut self) -> Result<(), ProcessingError> {
        Ok(())
    }
}

pub trait Source: Stage {
    /// Next event, or `None` once the input is exhausted
    fn emit(&mut self) -> Result<Option<Event>, ProcessingError>;
}

pub trait Filter: Stage {
    fn filter(&mut self, event: Event) -> Result<FilterResult, ProcessingError>;
}

pub trait Sink: Stage {
    fn consume(&mut self, event: Event) -> Result<(), ProcessingError>;
}

/// An instantiated stage tagged with its role
pub enum Node {
    Source(Box<dyn Source>),
    Filter(Box<dyn Filter>),
    Sink(Box<dyn Sink>),
}

impl Node {
    pub fn role(&self) -> &'static str {
        match self {
            Node::Source(_) => "source",
            Node::Filter(_) => "filter",
            Node::Sink(_) => "sink",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Source(stage) => stage.name(),
            Node::Filter(stage) => stage.name(),
            Node::Sink(stage) => stage.name(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Node::Source(stage) => stage.describe(),
            Node::Filter(stage) => stage.describe(),
            Node::Sink(stage) => stage.describe(),
        }
    }

    pub fn configure(&mut self, section: &Section) -> Result<(), BuildError> {
        match self {
            Node::Source(stage) => stage.configure(section),
            Node::Filter(stage) => stage.configure(section),
            Node::Sink(stage) => stage.configure(section),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node::{}({})", self.role(), self.describe())
    }
}

/// Drives one source through an ordered filter chain into one sink
pub struct Pipeline {
    source: Box<dyn Source>,
    filters: Vec<Box<dyn Filter>>,
    sink: Box<dyn Sink>,
    state: PipelineState,
    stats: ProcessingStats,
}

/// Which stages completed `init`, so only those receive `fini`
#[derive(Debug, Default)]
struct Initialized {
    source: bool,
    sink: bool,
    filters: usize,
}

impl Pipeline {
    pub fn new(source: Box<dyn Source>, sink: Box<dyn Sink>, filters: Vec<Box<dyn Filter>>) -> Self {
        Pipeline {
            source,
            filters,
            sink,
            state: PipelineState::Idle,
            stats: ProcessingStats::default(),
        }
    }

    /// Wire a built node list: the first node must be a source, the last a
    /// sink and everything in between a filter.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, BuildError> {
        if nodes.len() < 2 {
            return Err(BuildError::ConfigError(
                "pipeline must consist of at least one source and one sink".to_string(),
            ));
        }

        let last = nodes.len() - 1;
        let mut source = None;
        let mut sink = None;
        let mut filters = Vec::with_capacity(nodes.len() - 2);

        for (index, node) in nodes.into_iter().enumerate() {
            match (index, node) {
                (0, Node::Source(stage)) => source = Some(stage),
                (i, Node::Sink(stage)) if i == last => sink = Some(stage),
                (i, Node::Filter(stage)) if i != 0 && i != last => filters.push(stage),
                (i, other) => {
                    let expected = if i == 0 {
                        "source"
                    } else if i == last {
                        "sink"
                    } else {
                        "filter"
                    };
                    return Err(BuildError::ConfigError(format!(
                        "node {} '{}' is a {}, but a {} is required in that position",
                        i,
                        other.name(),
                        other.role(),
                        expected
                    )));
                }
            }
        }

        match (source, sink) {
            (Some(source), Some(sink)) => Ok(Pipeline::new(source, sink, filters)),
            _ => Err(BuildError::ConfigError(
                "pipeline must consist of at least one source and one sink".to_string(),
            )),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn processed(&self) -> usize {
        self.stats.processed
    }

    pub fn dropped(&self) -> usize {
        self.stats.dropped
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    /// Run synchronously until the source is exhausted or a stage fails.
    ///
    /// Drops are counted and never surface. Any other error stops the run
    /// and is returned after every initialized stage has been finalized.
    pub fn run(&mut self) -> Result<ProcessingStats, ProcessingError> {
        if self.state != PipelineState::Idle {
            return Err(ProcessingError::AlreadyRun);
        }
        self.state = PipelineState::Running;
        let start_time = Instant::now();
        tracing::info!("executing pipeline '{}'", self);

        let mut initialized = Initialized::default();
        let result = self
            .init_stages(&mut initialized)
            .and_then(|()| self.run_loop());
        let fini_result = self.fini_stages(&initialized);

        self.state = PipelineState::Stopped;
        self.stats.processing_time = start_time.elapsed();
        tracing::info!(
            "processed {} events, dropped {}",
            self.stats.processed,
            self.stats.dropped
        );

        result?;
        fini_result?;
        Ok(self.stats.clone())
    }

    fn init_stages(&mut self, initialized: &mut Initialized) -> Result<(), ProcessingError> {
        self.source
            .init()
            .map_err(|e| init_error(self.source.name(), e))?;
        initialized.source = true;

        self.sink.init().map_err(|e| init_error(self.sink.name(), e))?;
        initialized.sink = true;

        for filter in &mut self.filters {
            filter.init().map_err(|e| init_error(filter.name(), e))?;
            initialized.filters += 1;
        }
        Ok(())
    }

    fn fini_stages(&mut self, initialized: &Initialized) -> Result<(), ProcessingError> {
        let mut first_error = None;
        let mut record = |stage: &str, result: Result<(), ProcessingError>| {
            if let Err(e) = result {
                tracing::warn!("stage '{}' failed to finalize: {}", stage, e);
                if first_error.is_none() {
                    first_error = Some(ProcessingError::StageFini {
                        stage: stage.to_string(),
                        source: Box::new(e),
                    });
                }
            }
        };

        if initialized.source {
            let result = self.source.fini();
            record(self.source.name(), result);
        }
        if initialized.sink {
            let result = self.sink.fini();
            record(self.sink.name(), result);
        }
        for filter in self.filters.iter_mut().take(initialized.filters) {
            let result = filter.fini();
            record(filter.name(), result);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn run_loop(&mut self) -> Result<(), ProcessingError> {
        while let Some(event) = self.source.emit()? {
            match self.apply_filters(event)? {
                FilterResult::Pass(event) => {
                    self.sink.consume(event)?;
                    self.stats.processed += 1;
                }
                FilterResult::Drop(_) => {
                    self.stats.dropped += 1;
                }
            }
        }
        Ok(())
    }

    fn apply_filters(&mut self, event: Event) -> Result<FilterResult, ProcessingError> {
        let mut current = event;

        // Process through all filters in sequence
        for filter in &mut self.filters {
            match filter.filter(current)? {
                FilterResult::Pass(next) => current = next,
                FilterResult::Drop(reason) => {
                    tracing::debug!(filter = filter.name(), "dropped event: {}", reason);
                    return Ok(FilterResult::Drop(reason));
                }
            }
        }

        Ok(FilterResult::Pass(current))
    }
}

fn init_error(stage: &str, error: ProcessingError) -> ProcessingError {
    ProcessingError::StageInit {
        stage: stage.to_string(),
        source: Box::new(error),
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source.describe())?;
        for filter in &self.filters {
            write!(f, " ~> {}", filter.describe())?;
        }
        write!(f, " ~> {}", self.sink.describe())
    }
}
