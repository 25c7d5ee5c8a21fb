use arg_core::errors::{ArgError, ErrorInfo};
use arg_core::ArgRng;
use serde::{Deserialize, Serialize};

use crate::selector::CandidateSelector;

fn default_exponential_probability() -> f64 {
    0.9
}

fn default_mixture_probability() -> f64 {
    0.95
}

fn default_above_root_rate() -> f64 {
    4.0
}

/// Distribution of the two node heights drawn by an add-event proposal,
/// scaled by the current root height `T`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "kebab-case")]
pub enum HeightProposal {
    /// Two i.i.d. exponential heights, redrawn while both exceed `T`. The rate
    /// is set so a single draw falls below `T` with probability
    /// `sqrt(below_root_probability)`.
    Exponential {
        /// Probability that both raw draws fall below the root.
        #[serde(default = "default_exponential_probability")]
        below_root_probability: f64,
    },
    /// With probability `below_root_probability` both heights are uniform
    /// below `T`; otherwise the bifurcation sits above the root at an
    /// exponential offset with rate `above_root_rate / T`.
    UniformMixture {
        /// Weight of the below-root component.
        #[serde(default = "default_mixture_probability")]
        below_root_probability: f64,
        /// Rate of the above-root offset in units of `1 / T`.
        #[serde(default = "default_above_root_rate")]
        above_root_rate: f64,
    },
}

impl Default for HeightProposal {
    fn default() -> Self {
        HeightProposal::Exponential {
            below_root_probability: default_exponential_probability(),
        }
    }
}

impl HeightProposal {
    /// Rejects probabilities outside `(0, 1)` and non-positive rates.
    pub fn validate(&self) -> Result<(), ArgError> {
        let (probability, rate) = match *self {
            HeightProposal::Exponential {
                below_root_probability,
            } => (below_root_probability, 1.0),
            HeightProposal::UniformMixture {
                below_root_probability,
                above_root_rate,
            } => (below_root_probability, above_root_rate),
        };
        if !(probability > 0.0 && probability < 1.0) {
            return Err(config_error("below-root-probability", "probability must lie in (0, 1)")
                .with_context("value", probability));
        }
        if !(rate.is_finite() && rate > 0.0) {
            return Err(config_error("above-root-rate", "rate must be positive")
                .with_context("value", rate));
        }
        Ok(())
    }

    /// Draws `(bifurcation_height, reassortment_height)` for a graph with root
    /// height `root_height`. The bifurcation is never the lower of the two.
    pub fn draw(
        &self,
        root_height: f64,
        rng: &mut dyn ArgRng,
        selector: &CandidateSelector,
    ) -> Result<(f64, f64), ArgError> {
        match *self {
            HeightProposal::Exponential {
                below_root_probability,
            } => {
                let rate = exponential_rate(below_root_probability, root_height);
                selector.select(rng, "add-event-heights", |rng| {
                    let first = rng.exponential(rate);
                    let second = rng.exponential(rate);
                    if first > root_height && second > root_height {
                        return Ok(None);
                    }
                    Ok(Some((first.max(second), first.min(second))))
                })
            }
            HeightProposal::UniformMixture {
                below_root_probability,
                above_root_rate,
            } => {
                if rng.bernoulli(below_root_probability) {
                    let first = root_height * rng.uniform_double();
                    let second = root_height * rng.uniform_double();
                    Ok((first.max(second), first.min(second)))
                } else {
                    let reassortment = root_height * rng.uniform_double();
                    let bifurcation = root_height + rng.exponential(above_root_rate / root_height);
                    Ok((bifurcation, reassortment))
                }
            }
        }
    }

    /// Log density of drawing the ordered pair `(bifurcation, reassortment)`.
    pub fn log_density(&self, root_height: f64, bifurcation: f64, reassortment: f64) -> f64 {
        if bifurcation < reassortment || reassortment < 0.0 || reassortment >= root_height {
            return f64::NEG_INFINITY;
        }
        match *self {
            HeightProposal::Exponential {
                below_root_probability,
            } => {
                let rate = exponential_rate(below_root_probability, root_height);
                let truncation = -(-2.0 * rate * root_height).exp_m1();
                2f64.ln() + 2.0 * rate.ln()
                    - rate * (bifurcation + reassortment)
                    - truncation.ln()
            }
            HeightProposal::UniformMixture {
                below_root_probability,
                above_root_rate,
            } => {
                if bifurcation < root_height {
                    below_root_probability.ln() + 2f64.ln() - 2.0 * root_height.ln()
                } else {
                    let rate = above_root_rate / root_height;
                    (1.0 - below_root_probability).ln() - root_height.ln() + rate.ln()
                        - rate * (bifurcation - root_height)
                }
            }
        }
    }
}

fn exponential_rate(below_root_probability: f64, root_height: f64) -> f64 {
    -(1.0 - below_root_probability.sqrt()).ln() / root_height
}

fn config_error(code: &str, message: &str) -> ArgError {
    ArgError::Config(ErrorInfo::new(code, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arg_core::RngHandle;

    fn mixture() -> HeightProposal {
        HeightProposal::UniformMixture {
            below_root_probability: 0.8,
            above_root_rate: 2.0,
        }
    }

    #[test]
    fn draws_are_ordered_and_supported() {
        let mut rng = RngHandle::from_seed(11);
        let selector = CandidateSelector::default();
        for proposal in [HeightProposal::default(), mixture()] {
            for _ in 0..500 {
                let (bif, re) = proposal.draw(2.0, &mut rng, &selector).unwrap();
                assert!(bif >= re);
                assert!(re < 2.0);
                assert!(proposal.log_density(2.0, bif, re).is_finite());
            }
        }
    }

    #[test]
    fn exponential_density_integrates_to_one() {
        let proposal = HeightProposal::default();
        let (root, step, upper) = (1.0, 0.01, 40.0);
        let mut total = 0.0;
        let mut re = step / 2.0;
        while re < root {
            let mut bif = re + step / 2.0;
            while bif < upper {
                total += proposal.log_density(root, bif, re).exp() * step * step;
                bif += step;
            }
            re += step;
        }
        assert!((total - 1.0).abs() < 0.02, "total={total}");
    }

    #[test]
    fn mixture_density_matches_components() {
        let proposal = mixture();
        let below = proposal.log_density(2.0, 1.5, 0.5);
        assert!((below - (0.8f64.ln() + 2f64.ln() - 2.0 * 2f64.ln())).abs() < 1e-12);
        let above = proposal.log_density(2.0, 3.0, 0.5);
        let expected = 0.2f64.ln() - 2f64.ln() + 1.0f64.ln() - 1.0;
        assert!((above - expected).abs() < 1e-12);
        assert_eq!(proposal.log_density(2.0, 0.5, 1.5), f64::NEG_INFINITY);
    }

    #[test]
    fn rejects_bad_settings() {
        let bad = HeightProposal::Exponential {
            below_root_probability: 1.0,
        };
        assert!(matches!(bad.validate(), Err(ArgError::Config(_))));
        let bad_rate = HeightProposal::UniformMixture {
            below_root_probability: 0.5,
            above_root_rate: 0.0,
        };
        assert!(matches!(bad_rate.validate(), Err(ArgError::Config(_))));
        assert!(HeightProposal::default().validate().is_ok());
    }
}
