//! Reversible-jump pair that inserts or removes one reassortment event: a new
//! bifurcation `B` on one branch and a new reassortment node `R` on another,
//! with `B` as one of the parents of `R`.

use arg_core::errors::{ArgError, ErrorInfo};
use arg_core::{ArgRng, Edge, NodeId, NodeKind};
use arg_graph::{ArgGraph, Attachment, Partition};
use serde::{Deserialize, Serialize};

use crate::hastings::LogDensity;
use crate::heights::HeightProposal;
use crate::operator::MoveReport;
use crate::partition::PartitionScheme;
use crate::selector::CandidateSelector;

/// Distributions used to draw a new event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EventSettings {
    /// Heights of the new bifurcation and reassortment nodes.
    #[serde(default)]
    pub heights: HeightProposal,
    /// Site split carried by the new reassortment node.
    #[serde(default)]
    pub partition: PartitionScheme,
}

impl EventSettings {
    /// Validates both distributions.
    pub fn validate(&self) -> Result<(), ArgError> {
        self.heights.validate()?;
        self.partition.validate()
    }
}

/// Log density of adding an event at the given heights with the given
/// partition, evaluated on the graph before the insertion.
///
/// Covers the height draw, the uniform choice of both attachment points, the
/// parent-slot orientation coin and the partition draw. Returns `-inf` when
/// either height has no attachment point.
pub fn log_add_density(
    graph: &ArgGraph,
    settings: &EventSettings,
    bifurcation_height: f64,
    reassortment_height: f64,
    partition: &Partition,
) -> f64 {
    let bifurcation_points = graph.attachment_points(bifurcation_height).len();
    let reassortment_points = graph.attachment_points(reassortment_height).len();
    if bifurcation_points == 0 || reassortment_points == 0 {
        return f64::NEG_INFINITY;
    }
    let heights = settings.heights.log_density(
        graph.root_height(),
        bifurcation_height,
        reassortment_height,
    );
    LogDensity::default()
        .add(heights)
        .choose(bifurcation_points)
        .choose(reassortment_points)
        .coin()
        .add(settings.partition.log_probability(partition))
        .value()
}

/// A reassortment node together with the parent slots whose parent can be
/// spliced out with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovableEvent {
    /// The reassortment node.
    pub node: NodeId,
    /// Parent slots of `node` holding a deletable bifurcation.
    pub deletable: Vec<usize>,
}

/// Whether the parent of reassortment node `node` in `slot` can be removed
/// together with `node`.
///
/// The parent `D` must be a bifurcation (possibly the root). Splicing it out
/// reattaches its other child `o` to its parent `g` and the child `c` of `node`
/// to the other parent `K`; neither reattachment may create a duplicate link.
/// When `D` is the root, `o` is promoted; in a valid graph `o` is then never a
/// reassortment node, since its other parent would have to lie both above `o`
/// and below `node`.
pub fn removal_is_valid(graph: &ArgGraph, node: NodeId, slot: usize) -> Result<bool, ArgError> {
    let doomed = graph.parent(node, slot)?;
    if graph.kind(doomed)? != NodeKind::Bifurcation {
        return Ok(false);
    }
    let keeper = graph.parent(node, 1 - slot)?;
    let other = graph.other_child(doomed, node)?;
    let other_edge = graph.edge_to(other, doomed)?;
    let child = graph.child(node, 0)?;
    let child_edge = graph.edge_to(child, node)?;
    let grand = graph.parents(doomed)?.first().copied();

    if let Some(g) = grand {
        if graph.other_parent(other, other_edge.slot)? == Some(g) {
            return Ok(false);
        }
    }
    if graph.other_parent(child, child_edge.slot)? == Some(keeper) {
        return Ok(false);
    }
    Ok(!(grand == Some(keeper) && other == child))
}

/// Every reassortment node with at least one deletable parent, in arena order.
pub fn removable_events(graph: &ArgGraph) -> Result<Vec<RemovableEvent>, ArgError> {
    let mut events = Vec::new();
    for node in graph.nodes_of_kind(NodeKind::Reassortment) {
        let mut deletable = Vec::with_capacity(2);
        for slot in 0..2 {
            if removal_is_valid(graph, node, slot)? {
                deletable.push(slot);
            }
        }
        if !deletable.is_empty() {
            events.push(RemovableEvent { node, deletable });
        }
    }
    Ok(events)
}

/// Log density of the remove move picking `node` and its parent `parent`:
/// `-ln m - ln d` over the removable events of `graph`.
pub fn log_remove_density(graph: &ArgGraph, node: NodeId, parent: NodeId) -> Result<f64, ArgError> {
    let events = removable_events(graph)?;
    let slot = graph.edge_to(node, parent)?.slot;
    let event = events
        .iter()
        .find(|event| event.node == node && event.deletable.contains(&slot))
        .ok_or_else(|| {
            ArgError::StructuralIntegrity(
                ErrorInfo::new("irreversible-add", "added event cannot be removed again")
                    .with_context("node", node.to_string())
                    .with_context("parent", parent.to_string()),
            )
        })?;
    Ok(LogDensity::default()
        .choose(events.len())
        .choose(event.deletable.len())
        .value())
}

// Removes reassortment node `node` and its parent in `slot`. Must run inside an
// edit; identifiers above the removed nodes shift down.
fn splice_out(graph: &mut ArgGraph, node: NodeId, slot: usize) -> Result<(), ArgError> {
    let doomed = graph.parent(node, slot)?;
    let keeper = graph.parent(node, 1 - slot)?;
    let other = graph.other_child(doomed, node)?;
    let other_edge = graph.edge_to(other, doomed)?;
    let child = graph.child(node, 0)?;
    let child_edge = graph.edge_to(child, node)?;

    match graph.parents(doomed)?.first().copied() {
        Some(grand) => {
            graph.replace_child(grand, doomed, other)?;
            graph.set_parent(other_edge, Some(grand))?;
        }
        None => {
            graph.set_parent(other_edge, None)?;
            graph.set_root(other)?;
        }
    }
    graph.replace_child(keeper, node, child)?;
    graph.set_parent(child_edge, Some(keeper))?;
    graph.delete_nodes(&[doomed, node])
}

/// Removes a uniformly chosen removable reassortment event.
///
/// Reports `log q_add(after) - log q_remove(before)`. Fails with
/// [`ArgError::NoReassortmentEvent`], leaving the graph untouched, when no
/// event can be removed.
pub fn propose_remove_event(
    graph: &mut ArgGraph,
    rng: &mut dyn ArgRng,
    settings: &EventSettings,
) -> Result<MoveReport, ArgError> {
    let events = removable_events(graph)?;
    if events.is_empty() {
        return Err(ArgError::NoReassortmentEvent(
            ErrorInfo::new("nothing-removable", "graph has no removable reassortment event")
                .with_context("reassortments", graph.reassortment_count().to_string()),
        ));
    }
    let event = &events[rng.uniform_int(events.len())];
    let slot = match event.deletable.as_slice() {
        [first, second] => {
            if rng.coin_flip() {
                *first
            } else {
                *second
            }
        }
        _ => event.deletable[0],
    };
    let log_forward = LogDensity::default()
        .choose(events.len())
        .choose(event.deletable.len())
        .value();

    let node = event.node;
    let doomed = graph.parent(node, slot)?;
    let bifurcation_height = graph.height(doomed)?;
    let reassortment_height = graph.height(node)?;
    let partition = graph.partition(node)?.cloned().unwrap_or_default();

    graph.edit(|g| splice_out(g, node, slot))?;
    let log_reverse = log_add_density(
        graph,
        settings,
        bifurcation_height,
        reassortment_height,
        &partition,
    );
    Ok(MoveReport {
        log_hastings_ratio: log_reverse - log_forward,
        touched: vec![doomed, node],
        description: format!("remove-event:{node}/{doomed}"),
    })
}

/// Inserts a new reassortment event.
///
/// Draw order: the two heights, the bifurcation attachment point, the
/// reassortment attachment point, the parent-slot orientation coin, then the
/// partition. Draws that cannot form a valid event (both nodes on the same
/// branch, no attachment point) fail with [`ArgError::NoValidMove`] before
/// any mutation. Reports `log q_remove(after) - log q_add(before)`.
pub fn propose_add_event(
    graph: &mut ArgGraph,
    rng: &mut dyn ArgRng,
    settings: &EventSettings,
    selector: &CandidateSelector,
) -> Result<MoveReport, ArgError> {
    let (bifurcation_height, reassortment_height) =
        settings.heights.draw(graph.root_height(), rng, selector)?;
    let bifurcation_points = graph.attachment_points(bifurcation_height);
    let reassortment_points = graph.attachment_points(reassortment_height);
    if bifurcation_points.is_empty() || reassortment_points.is_empty() {
        return Err(rejected_draw(
            "no-attachment-point",
            bifurcation_height,
            reassortment_height,
        ));
    }
    let bifurcation_at = bifurcation_points[rng.uniform_int(bifurcation_points.len())];
    let reassortment_at = reassortment_points[rng.uniform_int(reassortment_points.len())];
    let bifurcation_first = rng.coin_flip();
    let partition = settings.partition.draw(graph.partition_count(), rng)?;

    let reassortment_edge = match reassortment_at {
        Attachment::Branch(edge) => edge,
        Attachment::AboveRoot => {
            return Err(rejected_draw(
                "reassortment-above-root",
                bifurcation_height,
                reassortment_height,
            ))
        }
    };
    if bifurcation_height <= reassortment_height {
        return Err(rejected_draw("height-order", bifurcation_height, reassortment_height));
    }
    if bifurcation_at == Attachment::Branch(reassortment_edge) {
        return Err(rejected_draw("shared-branch", bifurcation_height, reassortment_height));
    }

    let log_forward = log_add_density(
        graph,
        settings,
        bifurcation_height,
        reassortment_height,
        &partition,
    );

    let (bifurcation, reassortment, log_reverse) = graph.edit(|g| {
        let bifurcation = g.next_node_id();
        let reassortment = NodeId::from_index(bifurcation.index() + 1);
        let upper = g.edge_parent(reassortment_edge)?;
        let lower = reassortment_edge.child;

        match bifurcation_at {
            Attachment::Branch(edge) => {
                let grand = g.edge_parent(edge)?;
                g.push_bifurcation(bifurcation_height, Some(grand), [edge.child, reassortment])?;
                g.replace_child(grand, edge.child, bifurcation)?;
                g.set_parent(edge, Some(bifurcation))?;
            }
            Attachment::AboveRoot => {
                let old_root = g.root();
                g.push_bifurcation(bifurcation_height, None, [old_root, reassortment])?;
                g.set_parent(Edge::new(old_root, 0), Some(bifurcation))?;
                g.set_root(bifurcation)?;
            }
        }
        let parents = if bifurcation_first {
            [bifurcation, upper]
        } else {
            [upper, bifurcation]
        };
        g.push_reassortment(reassortment_height, parents, lower, partition)?;
        g.replace_child(upper, lower, reassortment)?;
        g.set_parent(reassortment_edge, Some(reassortment))?;

        let log_reverse = log_remove_density(g, reassortment, bifurcation)?;
        Ok((bifurcation, reassortment, log_reverse))
    })?;

    Ok(MoveReport {
        log_hastings_ratio: log_reverse - log_forward,
        touched: vec![bifurcation, reassortment],
        description: format!("add-event:{reassortment}/{bifurcation}"),
    })
}

fn rejected_draw(code: &str, bifurcation_height: f64, reassortment_height: f64) -> ArgError {
    ArgError::NoValidMove(
        ErrorInfo::new(code, "drawn event cannot be inserted")
            .with_context("move", "add-event")
            .with_context("bifurcation_height", bifurcation_height.to_string())
            .with_context("reassortment_height", reassortment_height.to_string()),
    )
}
