#![deny(missing_docs)]
#![doc = "Core identifiers, structured errors and randomness for ancestral recombination graph (ARG) proposals."]

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod errors;
pub mod provenance;
pub mod rng;

pub use errors::{ArgError, ErrorInfo};
pub use provenance::SchemaVersion;
pub use rng::{derive_substream_seed, ArgRng, RngHandle};

/// Identifier for a node within an ARG arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Creates a new identifier from its raw integer representation.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw integer representation of the identifier.
    pub fn as_raw(&self) -> u64 {
        self.0
    }

    /// Creates an identifier from an arena index.
    pub fn from_index(index: usize) -> Self {
        Self(index as u64)
    }

    /// Returns the arena index addressed by the identifier.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Structural kind of an ARG node, fixing its parent and child arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// Observed taxon: no children, at most one parent.
    Tip,
    /// Ordinary tree node: two distinct children, at most one parent.
    Bifurcation,
    /// Reassortment event: two distinct parents, one child.
    Reassortment,
}

impl NodeKind {
    /// Number of parent slots a non-root node of this kind carries.
    pub fn parent_slots(&self) -> usize {
        match self {
            NodeKind::Tip | NodeKind::Bifurcation => 1,
            NodeKind::Reassortment => 2,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NodeKind::Tip => "tip",
            NodeKind::Bifurcation => "bifurcation",
            NodeKind::Reassortment => "reassortment",
        };
        f.write_str(label)
    }
}

/// A branch, addressed from below: the `slot`-th parent link of `child`.
///
/// Single-parent nodes only have slot `0`; reassortment nodes have slots `0`
/// and `1`. Ordering is by child then slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Lower endpoint of the branch.
    pub child: NodeId,
    /// Parent slot of `child` the branch occupies.
    pub slot: usize,
}

impl Edge {
    /// Creates a branch descriptor.
    pub fn new(child: NodeId, slot: usize) -> Self {
        Self { child, slot }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.child, self.slot)
    }
}
