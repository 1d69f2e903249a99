// src/pipeline/builder.rs
use crate::error::BuildError;
use crate::pipeline::config::Section;
use crate::pipeline::registry::{PluginRegistry, PIPELINE_GROUP};
use crate::pipeline::spec::{parse_pipeline, NodeSpec};
use crate::pipeline::stream::{Node, Pipeline};

/// Instantiate and configure every node in order.
///
/// A pipeline needs at least a source and a sink, so fewer than two nodes is
/// rejected before any plugin is looked up.
pub fn build_nodes(nodes: &[NodeSpec], registry: &PluginRegistry) -> Result<Vec<Node>, BuildError> {
    if nodes.len() < 2 {
        return Err(BuildError::ConfigError(
            "pipeline must consist of at least one source and one sink".to_string(),
        ));
    }

    nodes
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let factory = registry.resolve(PIPELINE_GROUP, &spec.name)?;
            let mut node = factory();
            node.configure(&Section::from_node(index, spec))?;
            tracing::debug!("configured {} {}", node.role(), node.describe());
            Ok(node)
        })
        .collect()
}

/// Parse, build and wire a pipeline from its textual spec
pub fn build_pipeline(spec: &str, registry: &PluginRegistry) -> Result<Pipeline, BuildError> {
    let nodes = parse_pipeline(spec)?;
    let nodes = build_nodes(&nodes, registry)?;
    Pipeline::from_nodes(nodes)
}
