// src/pipeline.rs
pub mod builder;
pub mod config;
pub mod context;
pub mod registry;
pub mod spec;
pub mod stream;

pub use builder::{build_nodes, build_pipeline};
pub use config::{Section, Settings};
pub use context::{FilterResult, PipelineState, ProcessingStats};
pub use registry::{PluginRegistry, StageFactory, PIPELINE_GROUP};
pub use spec::{parse_pipeline, NodeSpec};
pub use stream::{Filter, Node, Pipeline, Sink, Source, Stage};
