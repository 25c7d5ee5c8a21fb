use std::fs;

use arg_core::{ArgError, RngHandle};
use arg_graph::balanced_tree;
use arg_ops::{
    build_operators, ArgOperator, HeightProposal, OperatorConfig, PartitionScheme,
    DEFAULT_RETRY_BUDGET,
};
use tempfile::tempdir;

#[test]
fn empty_document_yields_defaults() {
    let config = OperatorConfig::from_yaml_str("{}").unwrap();
    assert_eq!(config, OperatorConfig::default());
    assert_eq!(config.retry_budget, DEFAULT_RETRY_BUDGET);
    assert_eq!(config.event.add_probability, 0.5);
    assert_eq!(config.event.heights, HeightProposal::default());
    assert_eq!(config.selector().budget(), DEFAULT_RETRY_BUDGET);
}

#[test]
fn yaml_file_overrides_selected_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("operators.yaml");
    fs::write(
        &path,
        r#"
retry_budget: 250
weights:
  wide_exchange: 0.0
  add_remove_event: 3.0
event:
  add_probability: 0.75
  heights:
    scheme: uniform-mixture
    above_root_rate: 2.0
  partition:
    mode: recombination
"#,
    )
    .unwrap();

    let config = OperatorConfig::from_yaml_path(&path).unwrap();
    assert_eq!(config.retry_budget, 250);
    assert_eq!(config.weights.wide_exchange, 0.0);
    assert_eq!(config.weights.narrow_exchange, 1.0);
    assert_eq!(
        config.event.heights,
        HeightProposal::UniformMixture {
            below_root_probability: 0.95,
            above_root_rate: 2.0,
        }
    );
    assert_eq!(config.event.partition, PartitionScheme::Recombination);
    assert!((config.event.size() - 3f64.ln()).abs() < 1e-12);

    let reparsed = OperatorConfig::from_yaml_str(&config.to_yaml_string().unwrap()).unwrap();
    assert_eq!(reparsed, config);
}

#[test]
fn out_of_range_values_are_config_errors() {
    for yaml in [
        "retry_budget: 0",
        "weights: { dual_swap: -1.0 }",
        "event: { add_probability: 1.0 }",
        "event: { heights: { scheme: exponential, below_root_probability: 0.0 } }",
        "event: { partition: { mode: reassortment, single_site_probability: 1.5 } }",
    ] {
        let err = OperatorConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ArgError::Config(_)), "{yaml}: {err}");
    }
    let malformed = OperatorConfig::from_yaml_str("weights: [1, 2]").unwrap_err();
    assert!(matches!(malformed, ArgError::Serde(_)));
}

#[test]
fn missing_file_reports_the_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    let err = OperatorConfig::from_yaml_path(&path).unwrap_err();
    assert_eq!(err.info().code, "config-read");
    assert!(err.info().context["path"].ends_with("absent.yaml"));
}

#[test]
fn registry_skips_zero_weights_and_keeps_order() {
    let mut config = OperatorConfig::default();
    config.weights.wide_exchange = 0.0;
    config.weights.full_swap = 0.0;
    let operators = build_operators(&config).unwrap();
    let names: Vec<&str> = operators.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "narrow-exchange",
            "bifurcation-swap",
            "reassortment-swap",
            "dual-swap",
            "narrow-swap",
            "add-remove-event",
        ]
    );
    assert_eq!(operators["add-remove-event"].tuning(), Some(0.0));
    assert_eq!(operators["narrow-exchange"].tuning(), None);
}

#[test]
fn tuning_hooks_only_exist_on_the_event_move() {
    let config = OperatorConfig::default();
    let mut operators = build_operators(&config).unwrap();

    let event = operators.get_mut("add-remove-event").unwrap();
    event.set_tuning(1.25).unwrap();
    assert_eq!(event.tuning(), Some(1.25));
    assert!(event.set_tuning(f64::NAN).is_err());

    let swap = operators.get_mut("full-swap").unwrap();
    let err = swap.set_tuning(0.3).unwrap_err();
    assert!(matches!(err, ArgError::Config(_)));
}

#[test]
fn event_operator_corrects_for_the_move_choice() {
    let mut config = OperatorConfig::default();
    config.event.add_probability = 0.999_999;
    let operators = build_operators(&config).unwrap();
    let event = &operators["add-remove-event"];
    let mut graph = balanced_tree(6, 3.0).unwrap();
    let mut rng = RngHandle::from_seed(8);
    let mut added = 0;
    for _ in 0..20 {
        if event.propose(&mut graph, &mut rng).is_ok() {
            added += 1;
        }
    }
    assert!(added > 0);
    assert_eq!(graph.reassortment_count(), added);
}
