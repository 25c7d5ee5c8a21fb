use arg_core::errors::{ArgError, ErrorInfo};
use arg_core::ArgRng;
use arg_graph::Partition;
use serde::{Deserialize, Serialize};

use crate::hastings::ln_binomial;

/// How a new reassortment node splits the site partitions between its two
/// parental lineages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum PartitionScheme {
    /// Segment reassortment: any proper subset of sites follows parent slot 1.
    ///
    /// With probability `single_site_probability` exactly one uniformly chosen
    /// site is moved; otherwise the subset size is uniform on `1..P-1` and the
    /// subset uniform among those of that size.
    Reassortment {
        /// Probability of the single-site draw.
        #[serde(default)]
        single_site_probability: f64,
    },
    /// Recombination: one breakpoint splits the ordered sites into two
    /// contiguous blocks, each block sent to a uniformly chosen side.
    Recombination,
}

impl Default for PartitionScheme {
    fn default() -> Self {
        PartitionScheme::Reassortment {
            single_site_probability: 0.0,
        }
    }
}

impl PartitionScheme {
    /// Rejects probabilities outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ArgError> {
        if let PartitionScheme::Reassortment {
            single_site_probability,
        } = self
        {
            if !(0.0..=1.0).contains(single_site_probability) {
                return Err(ArgError::Config(
                    ErrorInfo::new("single-site-probability", "probability must lie in [0, 1]")
                        .with_context("value", single_site_probability.to_string()),
                ));
            }
        }
        Ok(())
    }

    /// Draws an assignment over `sites` site partitions. Graphs without site
    /// partitions get an empty assignment and consume no randomness.
    pub fn draw(&self, sites: usize, rng: &mut dyn ArgRng) -> Result<Partition, ArgError> {
        match sites {
            0 => return Ok(Partition::empty()),
            1 => {
                return Err(ArgError::Config(
                    ErrorInfo::new("single-site", "one site partition cannot be split")
                        .with_hint("use zero or at least two site partitions"),
                ))
            }
            _ => {}
        }
        let mut bits = vec![false; sites];
        match *self {
            PartitionScheme::Reassortment {
                single_site_probability,
            } => {
                if single_site_probability > 0.0 && rng.bernoulli(single_site_probability) {
                    bits[rng.uniform_int(sites)] = true;
                } else {
                    let order = rng.random_permutation(sites);
                    let cut = rng.uniform_int(sites - 1);
                    for site in &order[cut + 1..] {
                        bits[*site] = true;
                    }
                }
            }
            PartitionScheme::Recombination => {
                let tail = rng.coin_flip();
                let cut = rng.uniform_int(sites - 1);
                for (site, bit) in bits.iter_mut().enumerate() {
                    *bit = if site > cut { tail } else { !tail };
                }
            }
        }
        Ok(Partition::from_bits(bits))
    }

    /// Log probability that [`PartitionScheme::draw`] returns `partition`.
    pub fn log_probability(&self, partition: &Partition) -> f64 {
        let sites = partition.len();
        if sites == 0 {
            return 0.0;
        }
        if !partition.is_proper() {
            return f64::NEG_INFINITY;
        }
        let n = sites as f64;
        match *self {
            PartitionScheme::Reassortment {
                single_site_probability: s,
            } => {
                let ones = partition.count_ones();
                let subset = (1.0 - s) * (-ln_binomial(sites, ones)).exp() / (n - 1.0);
                let single = if ones == 1 { s / n } else { 0.0 };
                (subset + single).ln()
            }
            PartitionScheme::Recombination => {
                if partition.is_contiguous() {
                    -(2.0 * (n - 1.0)).ln()
                } else {
                    f64::NEG_INFINITY
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arg_core::RngHandle;

    fn all_partitions(sites: usize) -> Vec<Partition> {
        (0..1usize << sites)
            .map(|mask| Partition::from_bits((0..sites).map(|k| mask >> k & 1 == 1).collect()))
            .collect()
    }

    #[test]
    fn probabilities_sum_to_one() {
        let schemes = [
            PartitionScheme::default(),
            PartitionScheme::Reassortment {
                single_site_probability: 0.3,
            },
            PartitionScheme::Recombination,
        ];
        for scheme in schemes {
            for sites in 2..7 {
                let total: f64 = all_partitions(sites)
                    .iter()
                    .map(|p| scheme.log_probability(p).exp())
                    .sum();
                assert!((total - 1.0).abs() < 1e-9, "{scheme:?} sites={sites}");
            }
        }
    }

    #[test]
    fn draws_are_proper_and_have_positive_probability() {
        let mut rng = RngHandle::from_seed(3);
        let schemes = [
            PartitionScheme::Reassortment {
                single_site_probability: 0.5,
            },
            PartitionScheme::Recombination,
        ];
        for scheme in schemes {
            for _ in 0..200 {
                let partition = scheme.draw(5, &mut rng).unwrap();
                assert!(partition.is_proper());
                assert!(scheme.log_probability(&partition).is_finite());
            }
        }
    }

    #[test]
    fn site_count_edge_cases() {
        let mut rng = RngHandle::from_seed(4);
        let scheme = PartitionScheme::default();
        assert!(scheme.draw(0, &mut rng).unwrap().is_empty());
        assert!(matches!(scheme.draw(1, &mut rng), Err(ArgError::Config(_))));
        assert_eq!(scheme.log_probability(&Partition::empty()), 0.0);
        let improper = Partition::from_bits(vec![true, true]);
        assert_eq!(scheme.log_probability(&improper), f64::NEG_INFINITY);
    }
}
