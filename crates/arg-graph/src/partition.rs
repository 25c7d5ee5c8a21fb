use serde::{Deserialize, Serialize};

/// Assignment of genomic site partitions to the two parental lineages of a
/// reassortment node.
///
/// Bit `k` set means site partition `k` is inherited through parent slot 1;
/// unset means parent slot 0. Graphs without site partitions carry empty
/// assignments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Partition {
    bits: Vec<bool>,
}

impl Partition {
    /// Creates an assignment from explicit bits.
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Assignment over zero site partitions.
    pub fn empty() -> Self {
        Self { bits: Vec::new() }
    }

    /// Number of site partitions covered.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the assignment covers no site partitions.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Raw bits.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Number of site partitions following parent slot 1.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|bit| **bit).count()
    }

    /// Both lineages carry at least one site partition (trivially true when
    /// there are none).
    pub fn is_proper(&self) -> bool {
        let ones = self.count_ones();
        self.bits.is_empty() || (ones > 0 && ones < self.bits.len())
    }

    /// Whether the assignment splits the sites at a single breakpoint.
    pub fn is_contiguous(&self) -> bool {
        self.bits.windows(2).filter(|pair| pair[0] != pair[1]).count() == 1
    }
}
