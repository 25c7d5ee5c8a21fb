use std::collections::BTreeSet;

use arg_core::errors::{ArgError, ErrorInfo};
use arg_core::{ArgRng, Edge, NodeId, NodeKind};
use arg_graph::ArgGraph;
use serde::{Deserialize, Serialize};

use crate::exchange::{is_valid_exchange, no_candidates, ExchangeCandidate};
use crate::hastings::{log_count_ratio, LogDensity};
use crate::operator::MoveReport;

/// Variant of the swap move family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwapMode {
    /// Swap one child of a random bifurcation with a lineage crossing its height.
    Bifurcation,
    /// Swap the child of a random reassortment node with a lineage crossing its height.
    Reassortment,
    /// A reassortment swap followed by a bifurcation swap.
    Dual,
    /// Swaps at every eligible internal node in ascending height order.
    Full,
    /// Enumerated narrow exchange with a count-ratio correction.
    Narrow,
}

impl SwapMode {
    /// Operator name for the mode.
    pub fn name(&self) -> &'static str {
        match self {
            SwapMode::Bifurcation => "bifurcation-swap",
            SwapMode::Reassortment => "reassortment-swap",
            SwapMode::Dual => "dual-swap",
            SwapMode::Full => "full-swap",
            SwapMode::Narrow => "narrow-swap",
        }
    }
}

/// A node with at least one parent branch crossing a swap target's height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapCandidate {
    /// Candidate node.
    pub node: NodeId,
    /// Parent slots of `node` whose branch is eligible.
    pub slots: Vec<usize>,
}

/// Lineages that may trade places with `moving`, the branch from a child of
/// `x` up to `x`.
///
/// A branch is eligible when it crosses the height of `x`, does not hang from
/// a child of `x`, and its parent is not already the other parent of the
/// moving child.
pub fn swap_candidates(
    graph: &ArgGraph,
    x: NodeId,
    moving: Edge,
) -> Result<Vec<SwapCandidate>, ArgError> {
    let height = graph.height(x)?;
    let x_children = graph.children(x)?;
    let moving_other = graph.other_parent(moving.child, moving.slot)?;

    let mut candidates: Vec<SwapCandidate> = Vec::new();
    for edge in graph.branches_crossing(height) {
        if x_children.contains(&edge.child) {
            continue;
        }
        if moving_other == Some(graph.edge_parent(edge)?) {
            continue;
        }
        match candidates.last_mut() {
            Some(last) if last.node == edge.child => last.slots.push(edge.slot),
            _ => candidates.push(SwapCandidate {
                node: edge.child,
                slots: vec![edge.slot],
            }),
        }
    }
    Ok(candidates)
}

// Trades `moving` with a uniformly chosen eligible lineage. `Ok(None)` leaves
// the graph untouched when nothing is eligible.
fn swap_at(
    graph: &mut ArgGraph,
    x: NodeId,
    moving: Edge,
    rng: &mut dyn ArgRng,
) -> Result<Option<f64>, ArgError> {
    let forward = swap_candidates(graph, x, moving)?;
    if forward.is_empty() {
        return Ok(None);
    }
    let pick = &forward[rng.uniform_int(forward.len())];
    let slot = match pick.slots.as_slice() {
        [first, second] => {
            if rng.coin_flip() {
                *first
            } else {
                *second
            }
        }
        _ => pick.slots[0],
    };
    let target = Edge::new(pick.node, slot);
    let log_forward = LogDensity::default()
        .choose(forward.len())
        .choose(pick.slots.len())
        .value();

    graph
        .edit(|g| {
            g.swap_edges(moving, target)?;
            let reverse = swap_candidates(g, x, target)?;
            let back = reverse
                .iter()
                .find(|candidate| candidate.node == moving.child)
                .ok_or_else(|| {
                    ArgError::StructuralIntegrity(
                        ErrorInfo::new("irreversible-swap", "swap has no reverse move")
                            .with_context("node", x.to_string()),
                    )
                })?;
            let log_reverse = LogDensity::default()
                .choose(reverse.len())
                .choose(back.slots.len())
                .value();
            Ok(log_reverse - log_forward)
        })
        .map(Some)
}

/// Swaps one child of bifurcation `x` (chosen uniformly) with an eligible
/// lineage crossing the height of `x`.
///
/// Returns `ln q_reverse - ln q_forward`, or `None` with the graph untouched
/// when no lineage is eligible.
pub fn bifurcation_swap(
    graph: &mut ArgGraph,
    x: NodeId,
    rng: &mut dyn ArgRng,
) -> Result<Option<f64>, ArgError> {
    require_kind(graph, x, NodeKind::Bifurcation)?;
    let keep = rng.uniform_int(2);
    let moved = graph.child(x, 1 - keep)?;
    let moving = graph.edge_to(moved, x)?;
    swap_at(graph, x, moving, rng)
}

/// Swaps the child of reassortment node `x` with an eligible lineage crossing
/// the height of `x`. A candidate whose two parent branches both qualify is
/// entered through one of them by a fair coin.
pub fn reassortment_swap(
    graph: &mut ArgGraph,
    x: NodeId,
    rng: &mut dyn ArgRng,
) -> Result<Option<f64>, ArgError> {
    require_kind(graph, x, NodeKind::Reassortment)?;
    let moved = graph.child(x, 0)?;
    let moving = graph.edge_to(moved, x)?;
    swap_at(graph, x, moving, rng)
}

fn require_kind(graph: &ArgGraph, node: NodeId, kind: NodeKind) -> Result<(), ArgError> {
    let actual = graph.kind(node)?;
    if actual != kind {
        return Err(ArgError::Graph(
            ErrorInfo::new("wrong-kind", "swap target has the wrong node kind")
                .with_context("node", node.to_string())
                .with_context("expected", kind.to_string())
                .with_context("actual", actual.to_string()),
        ));
    }
    Ok(())
}

fn swap_random(
    graph: &mut ArgGraph,
    rng: &mut dyn ArgRng,
    kind: NodeKind,
    what: &str,
) -> Result<(NodeId, f64), ArgError> {
    let targets = graph.nodes_of_kind(kind);
    if targets.is_empty() {
        return Err(no_candidates(what));
    }
    let x = targets[rng.uniform_int(targets.len())];
    let swap = match kind {
        NodeKind::Reassortment => reassortment_swap(graph, x, rng)?,
        _ => bifurcation_swap(graph, x, rng)?,
    };
    swap.map(|ratio| (x, ratio))
        .ok_or_else(|| no_candidates(what).with_context("node", x))
}

/// Reassortment swap then bifurcation swap in one edit. Ratios are summed.
pub fn dual_swap(graph: &mut ArgGraph, rng: &mut dyn ArgRng) -> Result<(Vec<NodeId>, f64), ArgError> {
    graph.edit(|g| {
        let (r, first) = swap_random(g, rng, NodeKind::Reassortment, "dual-swap")?;
        let (b, second) = swap_random(g, rng, NodeKind::Bifurcation, "dual-swap")?;
        Ok((vec![r, b], first + second))
    })
}

/// Swaps at every internal node in ascending height order, skipping nodes with
/// no eligible lineage. Ratios are summed.
pub fn full_swap(graph: &mut ArgGraph, rng: &mut dyn ArgRng) -> Result<(Vec<NodeId>, f64), ArgError> {
    let mut order: Vec<(f64, NodeId)> = Vec::new();
    for node in graph.node_ids() {
        if graph.kind(node)? != NodeKind::Tip {
            order.push((graph.height(node)?, node));
        }
    }
    order.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    graph.edit(|g| {
        let mut touched = Vec::new();
        let mut total = 0.0;
        for (_, x) in &order {
            let swapped = match g.kind(*x)? {
                NodeKind::Bifurcation => bifurcation_swap(g, *x, rng)?,
                NodeKind::Reassortment => reassortment_swap(g, *x, rng)?,
                NodeKind::Tip => None,
            };
            if let Some(ratio) = swapped {
                touched.push(*x);
                total += ratio;
            }
        }
        if touched.is_empty() {
            return Err(no_candidates("full-swap"));
        }
        Ok((touched, total))
    })
}

/// Every valid narrow-exchange branch pair, each listed once as an ordered
/// `(lower, higher)` pair of edges.
pub fn narrow_swap_pairs(graph: &ArgGraph) -> Result<Vec<(Edge, Edge)>, ArgError> {
    let mut pairs = BTreeSet::new();
    for i in graph.non_root_nodes() {
        for (slot, i_parent) in graph.parents(i)?.iter().copied().enumerate() {
            if graph.is_root(i_parent) {
                continue;
            }
            for j_parent in graph.parents(i_parent)?.iter().copied() {
                if graph.kind(j_parent)? != NodeKind::Bifurcation {
                    continue;
                }
                let j = graph.other_child(j_parent, i_parent)?;
                let candidate = ExchangeCandidate {
                    i: Edge::new(i, slot),
                    i_parent,
                    j: graph.edge_to(j, j_parent)?,
                    j_parent,
                };
                if is_valid_exchange(graph, &candidate)? {
                    pairs.insert((
                        candidate.i.min(candidate.j),
                        candidate.i.max(candidate.j),
                    ));
                }
            }
        }
    }
    Ok(pairs.into_iter().collect())
}

/// Enumerated narrow exchange: picks one valid pair uniformly and reports
/// `ln(count_after / count_before)`.
pub fn narrow_swap(graph: &mut ArgGraph, rng: &mut dyn ArgRng) -> Result<((Edge, Edge), f64), ArgError> {
    let before = narrow_swap_pairs(graph)?;
    if before.is_empty() {
        return Err(no_candidates("narrow-swap"));
    }
    let pair = before[rng.uniform_int(before.len())];
    graph.edit(|g| {
        g.swap_edges(pair.0, pair.1)?;
        let after = narrow_swap_pairs(g)?.len();
        if after == 0 {
            return Err(ArgError::StructuralIntegrity(ErrorInfo::new(
                "irreversible-swap",
                "narrow swap left no reverse pair",
            )));
        }
        Ok((pair, log_count_ratio(after, before.len())))
    })
}

/// Runs one swap move in the given mode.
pub fn propose_swap(
    graph: &mut ArgGraph,
    rng: &mut dyn ArgRng,
    mode: SwapMode,
) -> Result<MoveReport, ArgError> {
    let (touched, ratio, detail) = match mode {
        SwapMode::Bifurcation | SwapMode::Reassortment => {
            let kind = if mode == SwapMode::Bifurcation {
                NodeKind::Bifurcation
            } else {
                NodeKind::Reassortment
            };
            let (x, ratio) = swap_random(graph, rng, kind, mode.name())?;
            (vec![x], ratio, x.to_string())
        }
        SwapMode::Dual => {
            let (touched, ratio) = dual_swap(graph, rng)?;
            let detail = format!("{}+{}", touched[0], touched[1]);
            (touched, ratio, detail)
        }
        SwapMode::Full => {
            let (touched, ratio) = full_swap(graph, rng)?;
            let detail = format!("{} nodes", touched.len());
            (touched, ratio, detail)
        }
        SwapMode::Narrow => {
            let ((a, b), ratio) = narrow_swap(graph, rng)?;
            (vec![a.child, b.child], ratio, format!("{a}<->{b}"))
        }
    };
    Ok(MoveReport {
        log_hastings_ratio: ratio,
        touched,
        description: format!("{}:{detail}", mode.name()),
    })
}
