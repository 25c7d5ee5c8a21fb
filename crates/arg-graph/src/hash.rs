use sha2::{Digest, Sha256};

use crate::graph::{ArgGraph, Links};

/// Computes the canonical structural hash for the provided graph.
///
/// Covers node kinds, exact height bits, labels, links in slot order, and
/// partitions, so two graphs hash equal exactly when they compare equal.
pub fn canonical_hash(graph: &ArgGraph) -> String {
    let mut hasher = Sha256::new();
    hasher.update((graph.partition_count as u64).to_le_bytes());
    hasher.update(graph.root.as_raw().to_le_bytes());
    hasher.update((graph.nodes.len() as u64).to_le_bytes());

    for record in &graph.nodes {
        match &record.links {
            Links::Tip { .. } => hasher.update(b"tip"),
            Links::Bifurcation { .. } => hasher.update(b"bifurcation"),
            Links::Reassortment { .. } => hasher.update(b"reassortment"),
        }
        hasher.update(record.height.to_bits().to_le_bytes());
        match &record.label {
            Some(label) => {
                hasher.update((label.len() as u64).to_le_bytes());
                hasher.update(label.as_bytes());
            }
            None => hasher.update(b"label:none"),
        }
        update_ids(record.links.parents().iter().map(|id| id.as_raw()), &mut hasher);
        update_ids(record.links.children().iter().map(|id| id.as_raw()), &mut hasher);
        if let Links::Reassortment { partition, .. } = &record.links {
            let bits: Vec<u8> = partition.bits().iter().map(|bit| u8::from(*bit)).collect();
            hasher.update((bits.len() as u64).to_le_bytes());
            hasher.update(&bits);
        }
    }

    format!("{:x}", hasher.finalize())
}

fn update_ids(values: impl ExactSizeIterator<Item = u64>, hasher: &mut Sha256) {
    hasher.update((values.len() as u64).to_le_bytes());
    for value in values {
        hasher.update(value.to_le_bytes());
    }
}
