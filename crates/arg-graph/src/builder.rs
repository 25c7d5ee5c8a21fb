use arg_core::errors::ArgError;
use arg_core::NodeId;

use crate::graph::{graph_error, ArgGraph, Links, NodeRecord};
use crate::partition::Partition;

#[derive(Debug, Clone)]
enum Declared {
    Tip,
    Bifurcation([NodeId; 2]),
    Reassortment(NodeId, Partition),
}

/// Bottom-up constructor for [`ArgGraph`]s.
///
/// Children must be declared before their parents. Parent slots are assigned
/// in declaration order, so the first node listing a reassortment node as a
/// child becomes its slot-0 parent.
#[derive(Debug, Clone, Default)]
pub struct ArgBuilder {
    declared: Vec<(f64, Option<String>, Declared)>,
    partition_count: usize,
}

impl ArgBuilder {
    /// Starts a graph without genomic site partitions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a graph whose reassortment nodes split `partition_count` sites.
    pub fn with_partition_count(partition_count: usize) -> Self {
        Self {
            declared: Vec::new(),
            partition_count,
        }
    }

    /// Declares a tip.
    pub fn tip(&mut self, label: impl Into<String>, height: f64) -> NodeId {
        self.declare(height, Some(label.into()), Declared::Tip)
    }

    /// Declares a bifurcation over two previously declared nodes.
    pub fn bifurcation(&mut self, height: f64, children: [NodeId; 2]) -> NodeId {
        self.declare(height, None, Declared::Bifurcation(children))
    }

    /// Declares a reassortment node above a previously declared child.
    pub fn reassortment(&mut self, height: f64, child: NodeId, partition: Partition) -> NodeId {
        self.declare(height, None, Declared::Reassortment(child, partition))
    }

    fn declare(&mut self, height: f64, label: Option<String>, kind: Declared) -> NodeId {
        let id = NodeId::from_index(self.declared.len());
        self.declared.push((height, label, kind));
        id
    }

    /// Resolves parent links and validates the result.
    pub fn build(self) -> Result<ArgGraph, ArgError> {
        let count = self.declared.len();
        let mut parents: Vec<Vec<NodeId>> = vec![Vec::new(); count];
        for (idx, (_, _, kind)) in self.declared.iter().enumerate() {
            let children: &[NodeId] = match kind {
                Declared::Tip => &[],
                Declared::Bifurcation(children) => children,
                Declared::Reassortment(child, _) => std::slice::from_ref(child),
            };
            for child in children {
                if child.index() >= idx {
                    return Err(graph_error(
                        "child-declared-late",
                        "children must be declared before their parents",
                    )
                    .with_context("node", NodeId::from_index(idx))
                    .with_context("child", child));
                }
                parents[child.index()].push(NodeId::from_index(idx));
            }
        }

        let mut nodes = Vec::with_capacity(count);
        let mut roots = Vec::new();
        for (idx, ((height, label, kind), node_parents)) in
            self.declared.into_iter().zip(parents).enumerate()
        {
            let node = NodeId::from_index(idx);
            let links = match (kind, node_parents.as_slice()) {
                (Declared::Tip, [] | [_]) => Links::Tip {
                    parent: node_parents.first().copied(),
                },
                (Declared::Bifurcation(children), [] | [_]) => Links::Bifurcation {
                    parent: node_parents.first().copied(),
                    children,
                },
                (Declared::Reassortment(child, partition), [a, b]) => Links::Reassortment {
                    parents: [*a, *b],
                    child,
                    partition,
                },
                _ => {
                    return Err(graph_error("parent-arity", "node has the wrong number of parents")
                        .with_context("node", node)
                        .with_context("parents", node_parents.len()))
                }
            };
            if node_parents.is_empty() {
                roots.push(node);
            }
            nodes.push(NodeRecord {
                height,
                label,
                links,
            });
        }

        let root = match roots.as_slice() {
            [root] => *root,
            _ => {
                return Err(graph_error("root-count", "graph must have exactly one root")
                    .with_context("parentless", roots.len()))
            }
        };
        let graph = ArgGraph::from_parts(nodes, root, self.partition_count);
        graph
            .validate()
            .map_err(|err| ArgError::Graph(err.info().clone()))?;
        Ok(graph)
    }
}
