use std::fmt::Debug;

use arg_core::errors::{ArgError, ErrorInfo};
use arg_core::{ArgRng, NodeId};
use arg_graph::ArgGraph;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::OperatorConfig;
use crate::event::{propose_add_event, propose_remove_event, EventSettings};
use crate::exchange::{propose_narrow_exchange, propose_wide_exchange};
use crate::hastings::logistic;
use crate::selector::CandidateSelector;
use crate::swap::{propose_swap, SwapMode};

/// Outcome of a proposal that mutated the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveReport {
    /// `ln q(reverse) - ln q(forward)` for the acceptance step.
    pub log_hastings_ratio: f64,
    /// Nodes rewired, inserted or removed (pre-move identifiers for removals).
    pub touched: Vec<NodeId>,
    /// Human readable description of the move.
    pub description: String,
}

/// A proposal kernel over ARGs.
///
/// `propose` either mutates the graph and returns a [`MoveReport`], or leaves
/// the graph unchanged and returns an error. [`ArgError::is_recoverable`]
/// errors count as rejections; anything else should stop the run.
pub trait ArgOperator: Debug {
    /// Display name.
    fn name(&self) -> &str;

    /// Relative selection frequency.
    fn weight(&self) -> f64;

    /// Proposes one move.
    fn propose(&self, graph: &mut ArgGraph, rng: &mut dyn ArgRng) -> Result<MoveReport, ArgError>;

    /// Continuous tuning knob, if the operator has one.
    fn tuning(&self) -> Option<f64> {
        None
    }

    /// Updates the tuning knob.
    fn set_tuning(&mut self, value: f64) -> Result<(), ArgError> {
        Err(ArgError::Config(
            ErrorInfo::new("not-tunable", "operator has no tuning parameter")
                .with_context("operator", self.name())
                .with_context("value", value.to_string()),
        ))
    }
}

fn traced(
    name: &str,
    graph: &mut ArgGraph,
    propose: impl FnOnce(&mut ArgGraph) -> Result<MoveReport, ArgError>,
) -> Result<MoveReport, ArgError> {
    let span = tracing::debug_span!("propose", operator = name, nodes = graph.node_count());
    let _guard = span.enter();
    let outcome = propose(graph);
    match &outcome {
        Ok(report) => tracing::debug!(
            ratio = report.log_hastings_ratio,
            description = %report.description,
            "proposal applied"
        ),
        Err(err) if err.is_recoverable() => {
            tracing::debug!(code = %err.info().code, "no move")
        }
        Err(err) => tracing::error!(error = %err, "proposal failed"),
    }
    outcome
}

/// Rejection-sampled narrow exchange.
#[derive(Debug, Clone)]
pub struct NarrowExchange {
    /// Selection weight.
    pub weight: f64,
    /// Candidate sampler.
    pub selector: CandidateSelector,
}

impl ArgOperator for NarrowExchange {
    fn name(&self) -> &str {
        "narrow-exchange"
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn propose(&self, graph: &mut ArgGraph, rng: &mut dyn ArgRng) -> Result<MoveReport, ArgError> {
        traced(self.name(), graph, |g| propose_narrow_exchange(g, rng, &self.selector))
    }
}

/// Rejection-sampled wide exchange.
#[derive(Debug, Clone)]
pub struct WideExchange {
    /// Selection weight.
    pub weight: f64,
    /// Candidate sampler.
    pub selector: CandidateSelector,
}

impl ArgOperator for WideExchange {
    fn name(&self) -> &str {
        "wide-exchange"
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn propose(&self, graph: &mut ArgGraph, rng: &mut dyn ArgRng) -> Result<MoveReport, ArgError> {
        traced(self.name(), graph, |g| propose_wide_exchange(g, rng, &self.selector))
    }
}

/// One member of the swap family.
#[derive(Debug, Clone)]
pub struct SwapOperator {
    /// Which swap to run.
    pub mode: SwapMode,
    /// Selection weight.
    pub weight: f64,
}

impl ArgOperator for SwapOperator {
    fn name(&self) -> &str {
        self.mode.name()
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn propose(&self, graph: &mut ArgGraph, rng: &mut dyn ArgRng) -> Result<MoveReport, ArgError> {
        traced(self.name(), graph, |g| propose_swap(g, rng, self.mode))
    }
}

/// Reversible-jump add/remove of reassortment events.
///
/// Adds with probability `logistic(size)` and removes otherwise; the reported
/// ratio carries the matching `-size` / `+size` correction for the choice.
#[derive(Debug, Clone)]
pub struct AddRemoveEventOperator {
    /// Logit of the add probability.
    pub size: f64,
    /// Selection weight.
    pub weight: f64,
    /// Draw distributions for new events.
    pub settings: EventSettings,
    /// Sampler for the height draw.
    pub selector: CandidateSelector,
}

impl ArgOperator for AddRemoveEventOperator {
    fn name(&self) -> &str {
        "add-remove-event"
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn propose(&self, graph: &mut ArgGraph, rng: &mut dyn ArgRng) -> Result<MoveReport, ArgError> {
        traced(self.name(), graph, |g| {
            if rng.bernoulli(logistic(self.size)) {
                let mut report = propose_add_event(g, rng, &self.settings, &self.selector)?;
                report.log_hastings_ratio -= self.size;
                Ok(report)
            } else {
                let mut report = propose_remove_event(g, rng, &self.settings)?;
                report.log_hastings_ratio += self.size;
                Ok(report)
            }
        })
    }

    fn tuning(&self) -> Option<f64> {
        Some(self.size)
    }

    fn set_tuning(&mut self, value: f64) -> Result<(), ArgError> {
        if !value.is_finite() {
            return Err(ArgError::Config(
                ErrorInfo::new("bad-tuning", "size must be finite")
                    .with_context("operator", self.name())
                    .with_context("value", value.to_string()),
            ));
        }
        self.size = value;
        Ok(())
    }
}

/// Builds every operator with a positive weight, keyed by name in a fixed
/// order.
pub fn build_operators(
    config: &OperatorConfig,
) -> Result<IndexMap<String, Box<dyn ArgOperator>>, ArgError> {
    config.validate()?;
    let selector = config.selector();
    let weights = &config.weights;
    let swap = |mode: SwapMode, weight: f64| -> Box<dyn ArgOperator> {
        Box::new(SwapOperator { mode, weight })
    };
    let candidates: Vec<Box<dyn ArgOperator>> = vec![
        Box::new(NarrowExchange {
            weight: weights.narrow_exchange,
            selector,
        }),
        Box::new(WideExchange {
            weight: weights.wide_exchange,
            selector,
        }),
        swap(SwapMode::Bifurcation, weights.bifurcation_swap),
        swap(SwapMode::Reassortment, weights.reassortment_swap),
        swap(SwapMode::Dual, weights.dual_swap),
        swap(SwapMode::Full, weights.full_swap),
        swap(SwapMode::Narrow, weights.narrow_swap),
        Box::new(AddRemoveEventOperator {
            size: config.event.size(),
            weight: weights.add_remove_event,
            settings: config.event.settings(),
            selector,
        }),
    ];

    let mut registry = IndexMap::new();
    for operator in candidates {
        if operator.weight() > 0.0 {
            registry.insert(operator.name().to_string(), operator);
        }
    }
    tracing::info!(operators = registry.len(), "operator registry built");
    Ok(registry)
}
