use arg_core::errors::ArgError;
use arg_core::{ArgRng, NodeId};

use crate::builder::ArgBuilder;
use crate::graph::{graph_error, ArgGraph};

/// Builds a balanced bifurcating tree with `n_tips` contemporaneous tips.
///
/// Lineages are paired level by level; internal heights are spaced evenly up
/// to `root_height`. With a power-of-two tip count the tree is perfect.
pub fn balanced_tree(n_tips: usize, root_height: f64) -> Result<ArgGraph, ArgError> {
    check_tip_count(n_tips)?;
    if !(root_height.is_finite() && root_height > 0.0) {
        return Err(graph_error("bad-root-height", "root height must be positive")
            .with_context("root_height", root_height));
    }
    let depth = (n_tips as f64).log2().ceil().max(1.0);
    let step = root_height / depth;

    let mut builder = ArgBuilder::new();
    let mut lineages: Vec<NodeId> = (0..n_tips)
        .map(|idx| builder.tip(format!("t{idx}"), 0.0))
        .collect();
    let mut level = 1.0;
    while lineages.len() > 1 {
        let mut next = Vec::with_capacity(lineages.len() / 2 + 1);
        for pair in lineages.chunks(2) {
            match pair {
                [left, right] => next.push(builder.bifurcation(level * step, [*left, *right])),
                [carried] => next.push(*carried),
                _ => {}
            }
        }
        lineages = next;
        level += 1.0;
    }
    builder.build()
}

/// Simulates a tree under the standard coalescent with unit population size.
pub fn coalescent_tree(n_tips: usize, rng: &mut dyn ArgRng) -> Result<ArgGraph, ArgError> {
    check_tip_count(n_tips)?;
    let mut builder = ArgBuilder::new();
    let mut lineages: Vec<NodeId> = (0..n_tips)
        .map(|idx| builder.tip(format!("t{idx}"), 0.0))
        .collect();
    let mut time = 0.0;
    while lineages.len() > 1 {
        let k = lineages.len() as f64;
        time += rng.exponential(k * (k - 1.0) / 2.0);
        let first = lineages.swap_remove(rng.uniform_int(lineages.len()));
        let second = lineages.swap_remove(rng.uniform_int(lineages.len()));
        lineages.push(builder.bifurcation(time, [first, second]));
    }
    builder.build()
}

fn check_tip_count(n_tips: usize) -> Result<(), ArgError> {
    if n_tips < 2 {
        return Err(graph_error("too-few-tips", "a tree needs at least two tips")
            .with_context("tips", n_tips));
    }
    Ok(())
}
