use arg_core::errors::{ArgError, ErrorInfo};
use arg_core::NodeId;

use crate::graph::{ArgGraph, Links};

impl ArgGraph {
    /// Checks the structural invariants of the graph.
    ///
    /// * exactly one parentless node, and it is the recorded root
    /// * every parent is strictly higher than each of its children (which also
    ///   rules out cycles)
    /// * reassortment parents are distinct, bifurcation children are distinct
    /// * every tip carries a label
    /// * parent and child links agree in both directions
    /// * reassortment partitions cover every site partition and give each
    ///   lineage at least one
    pub fn validate(&self) -> Result<(), ArgError> {
        let count = self.nodes.len();
        if count == 0 {
            return Err(integrity_error("empty-graph", "graph has no nodes"));
        }
        if self.root.index() >= count {
            return Err(integrity_error("unknown-root", "root is not a node")
                .with_context("root", self.root));
        }

        let mut parentless = Vec::new();
        for (idx, record) in self.nodes.iter().enumerate() {
            let node = NodeId::from_index(idx);
            if !record.height.is_finite() {
                return Err(integrity_error("non-finite-height", "node height is not finite")
                    .with_context("node", node));
            }
            let parents = record.links.parents();
            let children = record.links.children();
            if let Some(bad) = parents.iter().chain(children).find(|id| id.index() >= count) {
                return Err(integrity_error("dangling-reference", "link to a missing node")
                    .with_context("node", node)
                    .with_context("target", bad));
            }
            if parents.is_empty() {
                parentless.push(node);
            }

            match &record.links {
                Links::Reassortment {
                    parents, partition, ..
                } => {
                    if parents[0] == parents[1] {
                        return Err(integrity_error(
                            "duplicate-parents",
                            "reassortment parents must be distinct",
                        )
                        .with_context("node", node));
                    }
                    if partition.len() != self.partition_count || !partition.is_proper() {
                        return Err(integrity_error(
                            "bad-partition",
                            "partition must split the site partitions between both lineages",
                        )
                        .with_context("node", node)
                        .with_context("sites", partition.len()));
                    }
                }
                Links::Tip { .. } if record.label.is_none() => {
                    return Err(integrity_error("unlabeled-tip", "tips must carry a label")
                        .with_context("node", node));
                }
                Links::Bifurcation { children, .. } if children[0] == children[1] => {
                    return Err(integrity_error(
                        "duplicate-children",
                        "bifurcation children must be distinct",
                    )
                    .with_context("node", node));
                }
                _ => {}
            }

            for parent in parents {
                let upper = &self.nodes[parent.index()];
                if !upper.links.children().contains(&node) {
                    return Err(integrity_error("one-way-link", "parent does not list the child")
                        .with_context("parent", parent)
                        .with_context("child", node));
                }
                if upper.height <= record.height {
                    return Err(integrity_error("height-order", "parent is not above its child")
                        .with_context("parent", parent)
                        .with_context("child", node));
                }
            }
            for child in children {
                if !self.nodes[child.index()].links.parents().contains(&node) {
                    return Err(integrity_error("one-way-link", "child does not list the parent")
                        .with_context("parent", node)
                        .with_context("child", child));
                }
            }
        }

        match parentless.as_slice() {
            [only] if *only == self.root => Ok(()),
            [only] => Err(integrity_error("root-mismatch", "parentless node is not the root")
                .with_context("parentless", only)
                .with_context("root", self.root)),
            _ => Err(integrity_error("root-count", "graph must have exactly one root")
                .with_context("parentless", parentless.len())),
        }
    }
}

fn integrity_error(code: &str, message: &str) -> ArgError {
    ArgError::StructuralIntegrity(ErrorInfo::new(code, message))
}
