use arg_core::errors::{ArgError, ErrorInfo};
use arg_core::NodeId;
use serde::{Deserialize, Serialize};

use crate::graph::{graph_error, tip_labels_of, ArgGraph, NodeRecord};
use crate::serialization::graph_to_json;

/// Change notification emitted when an outermost edit commits.
///
/// Downstream likelihood caches drain these with [`ArgGraph::take_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum GraphEvent {
    /// Parent/child wiring changed.
    TopologyChanged,
    /// Node count changed by `delta`.
    SizeChanged {
        /// Signed change in node count.
        delta: i64,
    },
    /// At least one node height changed.
    HeightChanged,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Dirty {
    pub(crate) topology: bool,
    pub(crate) heights: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    nodes: Vec<NodeRecord>,
    root: NodeId,
    dirty: Dirty,
}

impl ArgGraph {
    /// Opens an edit. Edits nest; each level snapshots the graph.
    pub fn begin_edit(&mut self) {
        if self.edits.is_empty() {
            self.dirty = Dirty::default();
        }
        self.edits.push(Snapshot {
            nodes: self.nodes.clone(),
            root: self.root,
            dirty: self.dirty,
        });
    }

    /// Whether an edit is currently open.
    pub fn is_editing(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Commits the innermost edit.
    ///
    /// The graph invariants are checked, along with an unchanged tip set and a
    /// node count change of `0` or `±2`. On violation the snapshot taken by the
    /// matching [`ArgGraph::begin_edit`] is restored and
    /// [`ArgError::StructuralIntegrity`] is returned carrying a JSON dump of
    /// the rejected graph.
    pub fn end_edit(&mut self) -> Result<(), ArgError> {
        let snapshot = self
            .edits
            .pop()
            .ok_or_else(|| graph_error("no-open-edit", "end_edit without begin_edit"))?;
        if let Err(err) = self.check_commit(&snapshot) {
            let dump = graph_to_json(self).unwrap_or_else(|dump_err| dump_err.to_string());
            tracing::error!(
                code = %err.info().code,
                graph = %dump,
                "graph edit violated structural invariants, rolling back"
            );
            self.restore(snapshot);
            return Err(err.with_context("graph", dump));
        }
        if self.edits.is_empty() {
            self.emit_events(snapshot.nodes.len());
        }
        Ok(())
    }

    /// Discards the innermost edit, restoring its snapshot.
    pub fn abort_edit(&mut self) -> Result<(), ArgError> {
        let snapshot = self
            .edits
            .pop()
            .ok_or_else(|| graph_error("no-open-edit", "abort_edit without begin_edit"))?;
        self.restore(snapshot);
        Ok(())
    }

    /// Runs `body` inside an edit, committing on success and rolling back if
    /// `body` fails.
    pub fn edit<T>(
        &mut self,
        body: impl FnOnce(&mut ArgGraph) -> Result<T, ArgError>,
    ) -> Result<T, ArgError> {
        self.begin_edit();
        match body(self) {
            Ok(value) => {
                self.end_edit()?;
                Ok(value)
            }
            Err(err) => {
                self.abort_edit()?;
                Err(err)
            }
        }
    }

    /// Drains the pending change notifications.
    pub fn take_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }

    fn check_commit(&self, snapshot: &Snapshot) -> Result<(), ArgError> {
        self.validate()?;
        if tip_labels_of(&snapshot.nodes) != self.tip_labels() {
            return Err(ArgError::StructuralIntegrity(
                ErrorInfo::new("tip-set-changed", "edit changed the set of tips")
                    .with_context("before", snapshot.nodes.len().to_string())
                    .with_context("after", self.nodes.len().to_string()),
            ));
        }
        let delta = self.nodes.len() as i64 - snapshot.nodes.len() as i64;
        if !matches!(delta, -2 | 0 | 2) {
            return Err(ArgError::StructuralIntegrity(
                ErrorInfo::new("node-count-delta", "an edit may only add or remove two nodes")
                    .with_context("delta", delta.to_string()),
            ));
        }
        Ok(())
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.nodes = snapshot.nodes;
        self.root = snapshot.root;
        self.dirty = snapshot.dirty;
    }

    fn emit_events(&mut self, nodes_before: usize) {
        let delta = self.nodes.len() as i64 - nodes_before as i64;
        if self.dirty.topology {
            self.events.push(GraphEvent::TopologyChanged);
        }
        if delta != 0 {
            self.events.push(GraphEvent::SizeChanged { delta });
        }
        if self.dirty.heights {
            self.events.push(GraphEvent::HeightChanged);
        }
        self.dirty = Dirty::default();
    }
}
