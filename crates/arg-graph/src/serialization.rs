use arg_core::errors::{ArgError, ErrorInfo};
use arg_core::provenance::SchemaVersion;
use arg_core::{NodeId, NodeKind};
use serde::{Deserialize, Serialize};

use crate::graph::{ArgGraph, Links, NodeRecord};
use crate::partition::Partition;

const SCHEMA_VERSION: SchemaVersion = SchemaVersion::new(1, 0, 0);

/// Serializes the graph to a compact binary representation using `bincode`.
pub fn graph_to_bytes(graph: &ArgGraph) -> Result<Vec<u8>, ArgError> {
    let serializable = SerializableGraph::from_graph(graph);
    bincode::serialize(&serializable)
        .map_err(|err| ArgError::Serde(ErrorInfo::new("serialize-bytes", err.to_string())))
}

/// Restores a graph from its binary representation.
pub fn graph_from_bytes(bytes: &[u8]) -> Result<ArgGraph, ArgError> {
    let serializable: SerializableGraph = bincode::deserialize(bytes)
        .map_err(|err| ArgError::Serde(ErrorInfo::new("deserialize-bytes", err.to_string())))?;
    serializable.into_graph()
}

/// Serializes the graph to a JSON string.
pub fn graph_to_json(graph: &ArgGraph) -> Result<String, ArgError> {
    let serializable = SerializableGraph::from_graph(graph);
    serde_json::to_string_pretty(&serializable)
        .map_err(|err| ArgError::Serde(ErrorInfo::new("serialize-json", err.to_string())))
}

/// Restores a graph from a JSON string.
pub fn graph_from_json(json: &str) -> Result<ArgGraph, ArgError> {
    let serializable: SerializableGraph = serde_json::from_str(json)
        .map_err(|err| ArgError::Serde(ErrorInfo::new("deserialize-json", err.to_string())))?;
    serializable.into_graph()
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializableGraph {
    schema_version: SchemaVersion,
    partition_count: usize,
    root: u64,
    nodes: Vec<SerializableNode>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializableNode {
    kind: NodeKind,
    height: f64,
    #[serde(default)]
    label: Option<String>,
    parents: Vec<u64>,
    children: Vec<u64>,
    #[serde(default)]
    partition: Vec<bool>,
}

impl SerializableGraph {
    fn from_graph(graph: &ArgGraph) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|record| SerializableNode {
                kind: record.links.kind(),
                height: record.height,
                label: record.label.clone(),
                parents: record.links.parents().iter().map(|id| id.as_raw()).collect(),
                children: record.links.children().iter().map(|id| id.as_raw()).collect(),
                partition: match &record.links {
                    Links::Reassortment { partition, .. } => partition.bits().to_vec(),
                    _ => Vec::new(),
                },
            })
            .collect();
        Self {
            schema_version: SCHEMA_VERSION,
            partition_count: graph.partition_count,
            root: graph.root.as_raw(),
            nodes,
        }
    }

    fn into_graph(self) -> Result<ArgGraph, ArgError> {
        if !SCHEMA_VERSION.is_compatible_with(&self.schema_version) {
            return Err(ArgError::Serde(
                ErrorInfo::new("schema-version", "unsupported graph schema version")
                    .with_context("found", format!("{:?}", self.schema_version)),
            ));
        }
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for (idx, node) in self.nodes.into_iter().enumerate() {
            let parents: Vec<NodeId> = node.parents.into_iter().map(NodeId::from_raw).collect();
            let children: Vec<NodeId> = node.children.into_iter().map(NodeId::from_raw).collect();
            let links = match (node.kind, parents.as_slice(), children.as_slice()) {
                (NodeKind::Tip, [] | [_], []) => Links::Tip {
                    parent: parents.first().copied(),
                },
                (NodeKind::Bifurcation, [] | [_], [a, b]) => Links::Bifurcation {
                    parent: parents.first().copied(),
                    children: [*a, *b],
                },
                (NodeKind::Reassortment, [a, b], [child]) => Links::Reassortment {
                    parents: [*a, *b],
                    child: *child,
                    partition: Partition::from_bits(node.partition),
                },
                _ => {
                    return Err(ArgError::Serde(
                        ErrorInfo::new("arity", "node links do not match its kind")
                            .with_context("node", idx.to_string()),
                    ))
                }
            };
            nodes.push(NodeRecord {
                height: node.height,
                label: node.label,
                links,
            });
        }
        let graph = ArgGraph::from_parts(nodes, NodeId::from_raw(self.root), self.partition_count);
        graph.validate().map_err(|err| {
            ArgError::Serde(
                ErrorInfo::new("invalid-graph", "decoded graph violates invariants")
                    .with_context("cause", err.to_string()),
            )
        })?;
        Ok(graph)
    }
}
