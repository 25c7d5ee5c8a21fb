#![deny(missing_docs)]
#![doc = "Proposal kernels for ancestral recombination graph MCMC: exchanges, swaps and reversible-jump reassortment events."]

//! Every operator draws all of its randomness from the `&mut dyn ArgRng` it is
//! handed and rewrites the graph inside one transactional edit. A move either
//! commits and reports its log Hastings ratio, or leaves the graph exactly as
//! it was.

/// YAML configuration for the operator mix.
pub mod config;
/// Per-chain and per-move seed derivation.
pub mod determinism;
/// Add and remove reassortment events.
pub mod event;
/// Narrow and wide exchange moves.
pub mod exchange;
/// Log-density arithmetic.
pub mod hastings;
/// Height proposals for new events.
pub mod heights;
/// The operator trait and registry.
pub mod operator;
/// Partition draws for new reassortment nodes.
pub mod partition;
/// Bounded rejection sampling.
pub mod selector;
/// Swap moves.
pub mod swap;

pub use config::{EventConfig, OperatorConfig, OperatorWeights};
pub use event::{
    log_add_density, log_remove_density, propose_add_event, propose_remove_event,
    removable_events, removal_is_valid, EventSettings, RemovableEvent,
};
pub use exchange::{
    apply_exchange, is_valid_exchange, narrow_exchange_candidate, propose_narrow_exchange,
    propose_wide_exchange, wide_exchange_candidate, ExchangeCandidate,
};
pub use heights::HeightProposal;
pub use operator::{
    build_operators, AddRemoveEventOperator, ArgOperator, MoveReport, NarrowExchange,
    SwapOperator, WideExchange,
};
pub use partition::PartitionScheme;
pub use selector::{CandidateSelector, DEFAULT_RETRY_BUDGET};
pub use swap::{
    bifurcation_swap, dual_swap, full_swap, narrow_swap, narrow_swap_pairs, propose_swap,
    reassortment_swap, swap_candidates, SwapCandidate, SwapMode,
};
