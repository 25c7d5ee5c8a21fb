#![deny(missing_docs)]
#![doc = "Arena-backed ancestral recombination graphs with transactional, invariant-checked edits."]

//! Nodes are tips, bifurcations or reassortment events addressed by dense
//! [`NodeId`](arg_core::NodeId)s. Operators rewire the graph through the
//! primitives on [`ArgGraph`] inside `begin_edit`/`end_edit`, which validates
//! the result and rolls back on failure.

mod builder;
mod edit;
mod generators;
mod graph;
mod hash;
mod partition;
mod serialization;
mod validate;

pub use builder::ArgBuilder;
pub use edit::GraphEvent;
pub use generators::{balanced_tree, coalescent_tree};
pub use graph::{ArgGraph, Attachment};
pub use hash::canonical_hash;
pub use partition::Partition;

/// Re-export serialization helpers for downstream crates.
pub use serialization::{graph_from_bytes, graph_from_json, graph_to_bytes, graph_to_json};
