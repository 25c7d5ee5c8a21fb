use std::fs;
use std::path::Path;

use arg_core::errors::{ArgError, ErrorInfo};
use serde::{Deserialize, Serialize};

use crate::event::EventSettings;
use crate::hastings::logit;
use crate::heights::HeightProposal;
use crate::partition::PartitionScheme;
use crate::selector::{CandidateSelector, DEFAULT_RETRY_BUDGET};

/// YAML-configurable operator mix and proposal settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Attempts spent by rejection-sampled moves before giving up.
    #[serde(default = "default_retry_budget")]
    pub retry_budget: usize,
    /// Relative selection weight of each operator.
    #[serde(default)]
    pub weights: OperatorWeights,
    /// Add/remove event settings.
    #[serde(default)]
    pub event: EventConfig,
}

fn default_retry_budget() -> usize {
    DEFAULT_RETRY_BUDGET
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            retry_budget: default_retry_budget(),
            weights: OperatorWeights::default(),
            event: EventConfig::default(),
        }
    }
}

/// Relative selection weights. Operators with zero weight are not built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorWeights {
    /// Narrow exchange.
    #[serde(default = "default_weight")]
    pub narrow_exchange: f64,
    /// Wide exchange.
    #[serde(default = "default_weight")]
    pub wide_exchange: f64,
    /// Bifurcation swap.
    #[serde(default = "default_weight")]
    pub bifurcation_swap: f64,
    /// Reassortment swap.
    #[serde(default = "default_weight")]
    pub reassortment_swap: f64,
    /// Dual swap.
    #[serde(default = "default_weight")]
    pub dual_swap: f64,
    /// Full swap.
    #[serde(default = "default_weight")]
    pub full_swap: f64,
    /// Enumerated narrow swap.
    #[serde(default = "default_weight")]
    pub narrow_swap: f64,
    /// Combined add/remove event move.
    #[serde(default = "default_weight")]
    pub add_remove_event: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Default for OperatorWeights {
    fn default() -> Self {
        Self {
            narrow_exchange: default_weight(),
            wide_exchange: default_weight(),
            bifurcation_swap: default_weight(),
            reassortment_swap: default_weight(),
            dual_swap: default_weight(),
            full_swap: default_weight(),
            narrow_swap: default_weight(),
            add_remove_event: default_weight(),
        }
    }
}

impl OperatorWeights {
    /// `(operator name, weight)` pairs in registry order.
    pub fn entries(&self) -> [(&'static str, f64); 8] {
        [
            ("narrow-exchange", self.narrow_exchange),
            ("wide-exchange", self.wide_exchange),
            ("bifurcation-swap", self.bifurcation_swap),
            ("reassortment-swap", self.reassortment_swap),
            ("dual-swap", self.dual_swap),
            ("full-swap", self.full_swap),
            ("narrow-swap", self.narrow_swap),
            ("add-remove-event", self.add_remove_event),
        ]
    }
}

/// Add/remove event settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    /// Probability that the combined move proposes an addition.
    #[serde(default = "default_add_probability")]
    pub add_probability: f64,
    /// Height proposal for new events.
    #[serde(default)]
    pub heights: HeightProposal,
    /// Partition draw for new reassortment nodes.
    #[serde(default)]
    pub partition: PartitionScheme,
}

fn default_add_probability() -> f64 {
    0.5
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            add_probability: default_add_probability(),
            heights: HeightProposal::default(),
            partition: PartitionScheme::default(),
        }
    }
}

impl EventConfig {
    /// Draw distributions for new events.
    pub fn settings(&self) -> EventSettings {
        EventSettings {
            heights: self.heights,
            partition: self.partition,
        }
    }

    /// Add probability on the logit scale used as the move's tuning knob.
    pub fn size(&self) -> f64 {
        logit(self.add_probability)
    }
}

impl OperatorConfig {
    /// Parses a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ArgError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|err| {
            ArgError::Serde(ErrorInfo::new("yaml-deserialize", err.to_string()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a YAML file.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, ArgError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|err| {
            ArgError::Config(
                ErrorInfo::new("config-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_yaml_str(&contents).map_err(|err| err.with_context("path", path.display()))
    }

    /// Serializes the configuration as YAML.
    pub fn to_yaml_string(&self) -> Result<String, ArgError> {
        serde_yaml::to_string(self)
            .map_err(|err| ArgError::Serde(ErrorInfo::new("yaml-serialize", err.to_string())))
    }

    /// Checks ranges: a positive retry budget, finite non-negative weights, an
    /// add probability strictly between 0 and 1, and valid event settings.
    pub fn validate(&self) -> Result<(), ArgError> {
        if self.retry_budget == 0 {
            return Err(config_error("retry-budget", "retry budget must be positive"));
        }
        for (name, weight) in self.weights.entries() {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(config_error("operator-weight", "weights must be finite and non-negative")
                    .with_context("operator", name)
                    .with_context("weight", weight));
            }
        }
        let add = self.event.add_probability;
        if !(add > 0.0 && add < 1.0) {
            return Err(config_error("add-probability", "add probability must lie in (0, 1)")
                .with_context("value", add));
        }
        self.event.settings().validate()
    }

    /// Rejection sampler sized by `retry_budget`.
    pub fn selector(&self) -> CandidateSelector {
        CandidateSelector::new(self.retry_budget)
    }
}

fn config_error(code: &str, message: &str) -> ArgError {
    ArgError::Config(ErrorInfo::new(code, message))
}
