use arg_core::errors::{ArgError, ErrorInfo};
use arg_core::{Edge, NodeId, NodeKind};

use crate::edit::{Dirty, GraphEvent, Snapshot};
use crate::partition::Partition;

/// Parent/child wiring of a node, tagged by kind so that no two slots alias.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Links {
    Tip {
        parent: Option<NodeId>,
    },
    Bifurcation {
        parent: Option<NodeId>,
        children: [NodeId; 2],
    },
    Reassortment {
        parents: [NodeId; 2],
        child: NodeId,
        partition: Partition,
    },
}

impl Links {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Links::Tip { .. } => NodeKind::Tip,
            Links::Bifurcation { .. } => NodeKind::Bifurcation,
            Links::Reassortment { .. } => NodeKind::Reassortment,
        }
    }

    pub(crate) fn parents(&self) -> &[NodeId] {
        match self {
            Links::Tip { parent } | Links::Bifurcation { parent, .. } => parent.as_slice(),
            Links::Reassortment { parents, .. } => parents,
        }
    }

    pub(crate) fn children(&self) -> &[NodeId] {
        match self {
            Links::Tip { .. } => &[],
            Links::Bifurcation { children, .. } => children,
            Links::Reassortment { child, .. } => std::slice::from_ref(child),
        }
    }

    fn for_each_id_mut(&mut self, mut f: impl FnMut(&mut NodeId)) {
        match self {
            Links::Tip { parent } => parent.iter_mut().for_each(f),
            Links::Bifurcation { parent, children } => {
                parent.iter_mut().for_each(&mut f);
                children.iter_mut().for_each(f);
            }
            Links::Reassortment { parents, child, .. } => {
                parents.iter_mut().for_each(&mut f);
                f(child);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NodeRecord {
    pub(crate) height: f64,
    pub(crate) label: Option<String>,
    pub(crate) links: Links,
}

/// Where a new lineage may be spliced in at a given height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attachment {
    /// An existing branch crossing the height.
    Branch(Edge),
    /// The pseudo-branch above the root, available only above the root height.
    AboveRoot,
}

/// Mutable ancestral recombination graph stored in an index-addressed arena.
///
/// Node identifiers are dense arena indices. Every rewrite primitive is only
/// legal between [`ArgGraph::begin_edit`] and [`ArgGraph::end_edit`]; the
/// commit validates the graph invariants and restores the pre-edit snapshot
/// verbatim when they fail.
#[derive(Debug, Clone)]
pub struct ArgGraph {
    pub(crate) nodes: Vec<NodeRecord>,
    pub(crate) root: NodeId,
    pub(crate) partition_count: usize,
    pub(crate) edits: Vec<Snapshot>,
    pub(crate) events: Vec<GraphEvent>,
    pub(crate) dirty: Dirty,
}

impl PartialEq for ArgGraph {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
            && self.partition_count == other.partition_count
            && self.nodes == other.nodes
    }
}

impl ArgGraph {
    pub(crate) fn from_parts(nodes: Vec<NodeRecord>, root: NodeId, partition_count: usize) -> Self {
        Self {
            nodes,
            root,
            partition_count,
            edits: Vec::new(),
            events: Vec::new(),
            dirty: Dirty::default(),
        }
    }

    pub(crate) fn record(&self, id: NodeId) -> Result<&NodeRecord, ArgError> {
        self.nodes.get(id.index()).ok_or_else(|| {
            graph_error("unknown-node", "node does not exist").with_context("node", id)
        })
    }

    fn record_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord, ArgError> {
        self.nodes.get_mut(id.index()).ok_or_else(|| {
            graph_error("unknown-node", "node does not exist").with_context("node", id)
        })
    }

    /// Root node (the unique node without parents).
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Height of the root node.
    pub fn root_height(&self) -> f64 {
        self.nodes
            .get(self.root.index())
            .map(|record| record.height)
            .unwrap_or(0.0)
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of tip nodes.
    pub fn tip_count(&self) -> usize {
        self.count_kind(NodeKind::Tip)
    }

    /// Number of reassortment nodes.
    pub fn reassortment_count(&self) -> usize {
        self.count_kind(NodeKind::Reassortment)
    }

    fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes
            .iter()
            .filter(|record| record.links.kind() == kind)
            .count()
    }

    /// Number of genomic site partitions carried by reassortment nodes.
    pub fn partition_count(&self) -> usize {
        self.partition_count
    }

    /// Iterator over every node identifier in arena order.
    pub fn node_ids(&self) -> impl ExactSizeIterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::from_index)
    }

    /// Identifier the next pushed node will receive.
    pub fn next_node_id(&self) -> NodeId {
        NodeId::from_index(self.nodes.len())
    }

    /// Nodes of the given kind in arena order.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.node_ids()
            .filter(|id| self.nodes[id.index()].links.kind() == kind)
            .collect()
    }

    /// Every node except the root, in arena order.
    pub fn non_root_nodes(&self) -> Vec<NodeId> {
        self.node_ids().filter(|id| *id != self.root).collect()
    }

    /// Whether `node` is the root.
    pub fn is_root(&self, node: NodeId) -> bool {
        node == self.root
    }

    /// Height of a node.
    pub fn height(&self, node: NodeId) -> Result<f64, ArgError> {
        Ok(self.record(node)?.height)
    }

    /// Kind of a node.
    pub fn kind(&self, node: NodeId) -> Result<NodeKind, ArgError> {
        Ok(self.record(node)?.links.kind())
    }

    /// Tip label, if any.
    pub fn label(&self, node: NodeId) -> Result<Option<&str>, ArgError> {
        Ok(self.record(node)?.label.as_deref())
    }

    /// Parents of a node; empty for the root.
    pub fn parents(&self, node: NodeId) -> Result<&[NodeId], ArgError> {
        Ok(self.record(node)?.links.parents())
    }

    /// Children of a node; empty for tips.
    pub fn children(&self, node: NodeId) -> Result<&[NodeId], ArgError> {
        Ok(self.record(node)?.links.children())
    }

    /// Parent occupying `slot` of `node`.
    pub fn parent(&self, node: NodeId, slot: usize) -> Result<NodeId, ArgError> {
        self.parents(node)?.get(slot).copied().ok_or_else(|| {
            graph_error("missing-parent", "node has no parent in this slot")
                .with_context("node", node)
                .with_context("slot", slot)
        })
    }

    /// Child occupying `slot` of `node`.
    pub fn child(&self, node: NodeId, slot: usize) -> Result<NodeId, ArgError> {
        self.children(node)?.get(slot).copied().ok_or_else(|| {
            graph_error("missing-child", "node has no child in this slot")
                .with_context("node", node)
                .with_context("slot", slot)
        })
    }

    /// Upper endpoint of a branch.
    pub fn edge_parent(&self, edge: Edge) -> Result<NodeId, ArgError> {
        self.parent(edge.child, edge.slot)
    }

    /// The branch from `child` up to `parent`.
    pub fn edge_to(&self, child: NodeId, parent: NodeId) -> Result<Edge, ArgError> {
        self.parents(child)?
            .iter()
            .position(|candidate| *candidate == parent)
            .map(|slot| Edge::new(child, slot))
            .ok_or_else(|| {
                graph_error("not-a-parent", "node is not a parent of the child")
                    .with_context("child", child)
                    .with_context("parent", parent)
            })
    }

    /// For a reassortment node, the parent in the slot other than `slot`.
    pub fn other_parent(&self, node: NodeId, slot: usize) -> Result<Option<NodeId>, ArgError> {
        match &self.record(node)?.links {
            Links::Reassortment { parents, .. } if slot < 2 => Ok(Some(parents[1 - slot])),
            _ => Ok(None),
        }
    }

    /// For a bifurcation, the child other than `child`.
    pub fn other_child(&self, parent: NodeId, child: NodeId) -> Result<NodeId, ArgError> {
        match &self.record(parent)?.links {
            Links::Bifurcation { children, .. } if children[0] == child => Ok(children[1]),
            Links::Bifurcation { children, .. } if children[1] == child => Ok(children[0]),
            _ => Err(graph_error("not-a-child", "node is not a child of the bifurcation")
                .with_context("parent", parent)
                .with_context("child", child)),
        }
    }

    /// Partition assignment of a reassortment node.
    pub fn partition(&self, node: NodeId) -> Result<Option<&Partition>, ArgError> {
        match &self.record(node)?.links {
            Links::Reassortment { partition, .. } => Ok(Some(partition)),
            _ => Ok(None),
        }
    }

    /// Every branch in the graph, ordered by child then slot.
    pub fn edges(&self) -> Vec<Edge> {
        self.nodes
            .iter()
            .enumerate()
            .flat_map(|(idx, record)| {
                let child = NodeId::from_index(idx);
                (0..record.links.parents().len()).map(move |slot| Edge::new(child, slot))
            })
            .collect()
    }

    /// Branches whose lower endpoint is strictly below `height` and whose
    /// upper endpoint is strictly above it.
    pub fn branches_crossing(&self, height: f64) -> Vec<Edge> {
        let mut crossing = Vec::new();
        for (idx, record) in self.nodes.iter().enumerate() {
            if record.height >= height {
                continue;
            }
            for (slot, parent) in record.links.parents().iter().enumerate() {
                if self.nodes[parent.index()].height > height {
                    crossing.push(Edge::new(NodeId::from_index(idx), slot));
                }
            }
        }
        crossing
    }

    /// Attachment points available to a new lineage at `height`: the branches
    /// crossing it, or only the pseudo-branch above the root when `height`
    /// exceeds the root height.
    pub fn attachment_points(&self, height: f64) -> Vec<Attachment> {
        if height > self.root_height() {
            return vec![Attachment::AboveRoot];
        }
        self.branches_crossing(height)
            .into_iter()
            .map(Attachment::Branch)
            .collect()
    }

    /// Sorted tip labels.
    pub fn tip_labels(&self) -> Vec<String> {
        tip_labels_of(&self.nodes)
    }
}

pub(crate) fn tip_labels_of(nodes: &[NodeRecord]) -> Vec<String> {
    let mut labels: Vec<String> = nodes
        .iter()
        .filter(|record| record.links.kind() == NodeKind::Tip)
        .filter_map(|record| record.label.clone())
        .collect();
    labels.sort();
    labels
}

/// Rewrite primitives. None of these validate global invariants; that happens
/// once at [`ArgGraph::end_edit`].
impl ArgGraph {
    fn require_edit(&self, operation: &str) -> Result<(), ArgError> {
        if self.edits.is_empty() {
            return Err(ArgError::Graph(
                ErrorInfo::new("edit-not-open", "graph mutation outside an edit")
                    .with_context("operation", operation)
                    .with_hint("wrap the mutation in begin_edit/end_edit"),
            ));
        }
        Ok(())
    }

    /// Sets the height of a node.
    pub fn set_height(&mut self, node: NodeId, height: f64) -> Result<(), ArgError> {
        self.require_edit("set_height")?;
        if !height.is_finite() {
            return Err(graph_error("non-finite-height", "heights must be finite")
                .with_context("node", node));
        }
        self.record_mut(node)?.height = height;
        self.dirty.heights = true;
        Ok(())
    }

    /// Replaces `old` with `new` among the children of `parent`.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        old: NodeId,
        new: NodeId,
    ) -> Result<(), ArgError> {
        self.require_edit("replace_child")?;
        self.record(new)?;
        let slot = match &mut self.record_mut(parent)?.links {
            Links::Tip { .. } => None,
            Links::Bifurcation { children, .. } => children.iter_mut().find(|c| **c == old),
            Links::Reassortment { child, .. } => Some(child).filter(|c| **c == old),
        };
        match slot {
            Some(slot) => *slot = new,
            None => {
                return Err(graph_error("not-a-child", "node is not a child of the parent")
                    .with_context("parent", parent)
                    .with_context("child", old))
            }
        }
        self.dirty.topology = true;
        Ok(())
    }

    /// Points the parent slot addressed by `edge` at `parent`.
    ///
    /// `None` detaches a single-parent node (used when it becomes the root).
    pub fn set_parent(&mut self, edge: Edge, parent: Option<NodeId>) -> Result<(), ArgError> {
        self.require_edit("set_parent")?;
        if let Some(parent) = parent {
            self.record(parent)?;
        }
        let child = edge.child;
        match (&mut self.record_mut(child)?.links, parent) {
            (Links::Tip { parent: current } | Links::Bifurcation { parent: current, .. }, new)
                if edge.slot == 0 =>
            {
                *current = new;
            }
            (Links::Reassortment { parents, .. }, Some(new)) if edge.slot < 2 => {
                parents[edge.slot] = new;
            }
            _ => {
                return Err(graph_error("bad-parent-slot", "slot cannot hold this parent")
                    .with_context("edge", edge))
            }
        }
        self.dirty.topology = true;
        Ok(())
    }

    /// Exchanges the upper endpoints of two branches: `a.child` moves under the
    /// parent of `b` and `b.child` under the parent of `a`.
    pub fn swap_edges(&mut self, a: Edge, b: Edge) -> Result<(), ArgError> {
        self.require_edit("swap_edges")?;
        let parent_a = self.edge_parent(a)?;
        let parent_b = self.edge_parent(b)?;
        if parent_a == parent_b {
            return Err(graph_error("shared-parent", "branches share their upper endpoint")
                .with_context("a", a)
                .with_context("b", b));
        }
        self.replace_child(parent_a, a.child, b.child)?;
        self.replace_child(parent_b, b.child, a.child)?;
        self.set_parent(a, Some(parent_b))?;
        self.set_parent(b, Some(parent_a))?;
        Ok(())
    }

    /// Appends a bifurcation node and returns its identifier.
    pub fn push_bifurcation(
        &mut self,
        height: f64,
        parent: Option<NodeId>,
        children: [NodeId; 2],
    ) -> Result<NodeId, ArgError> {
        self.require_edit("push_bifurcation")?;
        Ok(self.push(NodeRecord {
            height,
            label: None,
            links: Links::Bifurcation { parent, children },
        }))
    }

    /// Appends a reassortment node and returns its identifier.
    pub fn push_reassortment(
        &mut self,
        height: f64,
        parents: [NodeId; 2],
        child: NodeId,
        partition: Partition,
    ) -> Result<NodeId, ArgError> {
        self.require_edit("push_reassortment")?;
        Ok(self.push(NodeRecord {
            height,
            label: None,
            links: Links::Reassortment {
                parents,
                child,
                partition,
            },
        }))
    }

    fn push(&mut self, record: NodeRecord) -> NodeId {
        let id = self.next_node_id();
        self.nodes.push(record);
        self.dirty.topology = true;
        id
    }

    /// Removes nodes and compacts the arena, shifting higher identifiers down.
    ///
    /// Fails without touching the graph if a surviving node still references
    /// one of the removed nodes.
    pub fn delete_nodes(&mut self, doomed: &[NodeId]) -> Result<(), ArgError> {
        self.require_edit("delete_nodes")?;
        let mut remove = vec![false; self.nodes.len()];
        for id in doomed {
            self.record(*id)?;
            remove[id.index()] = true;
        }
        if remove[self.root.index()] {
            return Err(graph_error("delete-root", "the root cannot be deleted")
                .with_context("root", self.root));
        }
        for (idx, record) in self.nodes.iter().enumerate() {
            if remove[idx] {
                continue;
            }
            let refs = record.links.parents().iter().chain(record.links.children());
            if let Some(dangling) = refs.copied().find(|id| remove[id.index()]) {
                return Err(graph_error(
                    "dangling-reference",
                    "surviving node references a deleted node",
                )
                .with_context("node", NodeId::from_index(idx))
                .with_context("deleted", dangling));
            }
        }

        let mut remap = Vec::with_capacity(self.nodes.len());
        let mut next = 0usize;
        for flag in &remove {
            remap.push(NodeId::from_index(next));
            if !flag {
                next += 1;
            }
        }
        let mut idx = 0usize;
        self.nodes.retain(|_| {
            let keep = !remove[idx];
            idx += 1;
            keep
        });
        for record in &mut self.nodes {
            record.links.for_each_id_mut(|id| *id = remap[id.index()]);
        }
        self.root = remap[self.root.index()];
        self.dirty.topology = true;
        Ok(())
    }

    /// Declares `node` the root. Its parent links must already be detached.
    pub fn set_root(&mut self, node: NodeId) -> Result<(), ArgError> {
        self.require_edit("set_root")?;
        self.record(node)?;
        self.root = node;
        self.dirty.topology = true;
        Ok(())
    }
}

pub(crate) fn graph_error(code: impl Into<String>, message: impl Into<String>) -> ArgError {
    ArgError::Graph(ErrorInfo::new(code, message))
}
