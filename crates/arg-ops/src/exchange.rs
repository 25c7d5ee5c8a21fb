use arg_core::errors::{ArgError, ErrorInfo};
use arg_core::{ArgRng, Edge, NodeId, NodeKind};
use arg_graph::ArgGraph;

use crate::operator::MoveReport;
use crate::selector::CandidateSelector;

/// Two branches whose upper endpoints an exchange swaps: `i` moves under
/// `j_parent` and `j` under `i_parent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeCandidate {
    /// Branch above `i`.
    pub i: Edge,
    /// Current parent of `i` on that branch.
    pub i_parent: NodeId,
    /// Branch above `j`.
    pub j: Edge,
    /// Current parent of `j` on that branch.
    pub j_parent: NodeId,
}

/// One lineage of an exchange: the branch that moves and where it lands.
#[derive(Debug, Clone, Copy)]
struct Side {
    edge: Edge,
    lands_on: NodeId,
}

impl ExchangeCandidate {
    fn sides(&self) -> (Side, Side) {
        (
            Side {
                edge: self.i,
                lands_on: self.j_parent,
            },
            Side {
                edge: self.j,
                lands_on: self.i_parent,
            },
        )
    }
}

/// Picks a uniformly random parent branch of `node`.
pub(crate) fn random_parent_edge(
    graph: &ArgGraph,
    node: NodeId,
    rng: &mut dyn ArgRng,
) -> Result<Edge, ArgError> {
    let slots = graph.parents(node)?.len();
    let slot = if slots == 2 { rng.uniform_int(2) } else { 0 };
    Ok(Edge::new(node, slot))
}

/// Exchange precondition: distinct endpoints, height ordering on both sides,
/// and no reassortment lineage landing on its own other parent.
pub fn is_valid_exchange(graph: &ArgGraph, candidate: &ExchangeCandidate) -> Result<bool, ArgError> {
    let (i, j) = (candidate.i.child, candidate.j.child);
    if i == j
        || candidate.i_parent == candidate.j_parent
        || i == candidate.j_parent
        || j == candidate.i_parent
    {
        return Ok(false);
    }
    if graph.height(j)? >= graph.height(candidate.i_parent)?
        || graph.height(i)? >= graph.height(candidate.j_parent)?
    {
        return Ok(false);
    }
    Ok(!conflicts(graph, candidate)?)
}

// Keyed on (kind(i), kind(j)), normalized so a lone reassortment side is second.
fn conflicts(graph: &ArgGraph, candidate: &ExchangeCandidate) -> Result<bool, ArgError> {
    let (a, b) = candidate.sides();
    let (ka, kb) = (graph.kind(a.edge.child)?, graph.kind(b.edge.child)?);
    let (a, b, ka, kb) = if ka == NodeKind::Reassortment && kb != NodeKind::Reassortment {
        (b, a, kb, ka)
    } else {
        (a, b, ka, kb)
    };
    Ok(match (ka, kb) {
        (NodeKind::Reassortment, NodeKind::Reassortment) => {
            lands_on_other_parent(graph, a)? || lands_on_other_parent(graph, b)?
        }
        (_, NodeKind::Reassortment) => lands_on_other_parent(graph, b)?,
        _ => false,
    })
}

fn lands_on_other_parent(graph: &ArgGraph, side: Side) -> Result<bool, ArgError> {
    Ok(graph.other_parent(side.edge.child, side.edge.slot)? == Some(side.lands_on))
}

fn draw_narrow(
    graph: &ArgGraph,
    nodes: &[NodeId],
    rng: &mut dyn ArgRng,
) -> Result<Option<ExchangeCandidate>, ArgError> {
    let i = nodes[rng.uniform_int(nodes.len())];
    let i_edge = random_parent_edge(graph, i, rng)?;
    let i_parent = graph.edge_parent(i_edge)?;
    if graph.is_root(i_parent) {
        return Ok(None);
    }
    let up = random_parent_edge(graph, i_parent, rng)?;
    let j_parent = graph.edge_parent(up)?;
    if graph.kind(j_parent)? != NodeKind::Bifurcation {
        return Ok(None);
    }
    let j = graph.other_child(j_parent, i_parent)?;
    let candidate = ExchangeCandidate {
        i: i_edge,
        i_parent,
        j: graph.edge_to(j, j_parent)?,
        j_parent,
    };
    Ok(is_valid_exchange(graph, &candidate)?.then_some(candidate))
}

fn draw_wide(
    graph: &ArgGraph,
    nodes: &[NodeId],
    rng: &mut dyn ArgRng,
) -> Result<Option<ExchangeCandidate>, ArgError> {
    let i = nodes[rng.uniform_int(nodes.len())];
    let i_edge = random_parent_edge(graph, i, rng)?;
    let j = nodes[rng.uniform_int(nodes.len())];
    let j_edge = random_parent_edge(graph, j, rng)?;
    let candidate = ExchangeCandidate {
        i: i_edge,
        i_parent: graph.edge_parent(i_edge)?,
        j: j_edge,
        j_parent: graph.edge_parent(j_edge)?,
    };
    Ok(is_valid_exchange(graph, &candidate)?.then_some(candidate))
}

/// Finds a narrow-exchange tuple `(i, iP, j, jP)`: `iP` is a non-root parent
/// of `i`, `jP` a bifurcating parent of `iP`, and `j` the other child of `jP`.
pub fn narrow_exchange_candidate(
    graph: &ArgGraph,
    rng: &mut dyn ArgRng,
    selector: &CandidateSelector,
) -> Result<ExchangeCandidate, ArgError> {
    let nodes = graph.non_root_nodes();
    if nodes.is_empty() {
        return Err(no_candidates("narrow-exchange"));
    }
    selector.select(rng, "narrow-exchange", |rng| draw_narrow(graph, &nodes, rng))
}

/// Finds a wide-exchange pair of independently drawn non-root branches.
pub fn wide_exchange_candidate(
    graph: &ArgGraph,
    rng: &mut dyn ArgRng,
    selector: &CandidateSelector,
) -> Result<ExchangeCandidate, ArgError> {
    let nodes = graph.non_root_nodes();
    if nodes.is_empty() {
        return Err(no_candidates("wide-exchange"));
    }
    selector.select(rng, "wide-exchange", |rng| draw_wide(graph, &nodes, rng))
}

/// Swaps the candidate's lineages inside one edit, checking that the tip
/// count is untouched before committing.
pub fn apply_exchange(graph: &mut ArgGraph, candidate: &ExchangeCandidate) -> Result<(), ArgError> {
    let tips = graph.tip_count();
    graph.edit(|g| {
        g.swap_edges(candidate.i, candidate.j)?;
        if g.tip_count() != tips {
            return Err(ArgError::StructuralIntegrity(
                ErrorInfo::new("tip-count", "exchange changed the number of tips")
                    .with_context("before", tips.to_string())
                    .with_context("after", g.tip_count().to_string()),
            ));
        }
        Ok(())
    })
}

/// Narrow exchange. The reported log ratio is always `0`.
pub fn propose_narrow_exchange(
    graph: &mut ArgGraph,
    rng: &mut dyn ArgRng,
    selector: &CandidateSelector,
) -> Result<MoveReport, ArgError> {
    let candidate = narrow_exchange_candidate(graph, rng, selector)?;
    apply_exchange(graph, &candidate)?;
    Ok(exchange_report("narrow-exchange", &candidate))
}

/// Wide exchange. The reported log ratio is always `0`.
pub fn propose_wide_exchange(
    graph: &mut ArgGraph,
    rng: &mut dyn ArgRng,
    selector: &CandidateSelector,
) -> Result<MoveReport, ArgError> {
    let candidate = wide_exchange_candidate(graph, rng, selector)?;
    apply_exchange(graph, &candidate)?;
    Ok(exchange_report("wide-exchange", &candidate))
}

fn exchange_report(name: &str, candidate: &ExchangeCandidate) -> MoveReport {
    MoveReport {
        log_hastings_ratio: 0.0,
        touched: vec![
            candidate.i.child,
            candidate.i_parent,
            candidate.j.child,
            candidate.j_parent,
        ],
        description: format!("{name}:{}<->{}", candidate.i, candidate.j),
    }
}

pub(crate) fn no_candidates(what: &str) -> ArgError {
    ArgError::NoValidMove(
        ErrorInfo::new("no-candidates", "graph has no eligible location for this move")
            .with_context("move", what),
    )
}
