use arg_core::{ArgRng, RngHandle};
use arg_graph::{canonical_hash, coalescent_tree, ArgBuilder, ArgGraph};
use arg_ops::{
    build_operators, propose_add_event, ArgOperator, CandidateSelector, EventSettings,
    OperatorConfig, PartitionScheme,
};
use proptest::prelude::*;

fn small_budget() -> OperatorConfig {
    OperatorConfig {
        retry_budget: 200,
        ..OperatorConfig::default()
    }
}

// Runs `steps` proposals from a uniformly chosen operator, checking after each
// call that a commit kept the invariants and a failure left the graph alone.
fn run_chain(graph: &mut ArgGraph, rng: &mut RngHandle, steps: usize) -> Vec<u64> {
    let operators = build_operators(&small_budget()).unwrap();
    let tips = graph.tip_count();
    let mut ratios = Vec::new();
    for _ in 0..steps {
        let (_, operator) = operators
            .get_index(rng.uniform_int(operators.len()))
            .unwrap();
        let before = graph.clone();
        match operator.propose(graph, rng) {
            Ok(report) => {
                graph.validate().unwrap();
                assert_eq!(graph.tip_count(), tips);
                assert_eq!(graph.tip_labels(), before.tip_labels());
                assert!(!report.log_hastings_ratio.is_nan(), "{}", report.description);
                ratios.push(report.log_hastings_ratio.to_bits());
            }
            Err(err) => {
                assert!(err.is_recoverable(), "{} failed: {err}", operator.name());
                assert_eq!(*graph, before);
            }
        }
        assert!(!graph.is_editing());
    }
    ratios
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn operators_preserve_invariants(seed in any::<u64>(), tips in 3usize..9) {
        let mut rng = RngHandle::from_seed(seed);
        let mut graph = coalescent_tree(tips, &mut rng).unwrap();
        run_chain(&mut graph, &mut rng, 60);
        prop_assert_eq!(graph.tip_count(), tips);
    }

    #[test]
    fn identical_seeds_replay_identical_chains(seed in any::<u64>()) {
        let mut setup = RngHandle::from_seed(seed);
        let start = coalescent_tree(6, &mut setup).unwrap();

        let mut first = start.clone();
        let first_ratios = run_chain(&mut first, &mut RngHandle::from_seed(seed ^ 1), 30);
        let mut second = start.clone();
        let second_ratios = run_chain(&mut second, &mut RngHandle::from_seed(seed ^ 1), 30);

        prop_assert_eq!(canonical_hash(&first), canonical_hash(&second));
        prop_assert_eq!(first_ratios, second_ratios);
        prop_assert_eq!(first, second);
    }
}

#[test]
fn added_events_carry_proper_partitions() {
    let mut builder = ArgBuilder::with_partition_count(3);
    let a = builder.tip("a", 0.0);
    let b = builder.tip("b", 0.0);
    let c = builder.tip("c", 0.0);
    let d = builder.tip("d", 0.0);
    let x = builder.bifurcation(1.0, [a, b]);
    let y = builder.bifurcation(1.5, [c, d]);
    builder.bifurcation(2.0, [x, y]);
    let start = builder.build().unwrap();

    let selector = CandidateSelector::default();
    let schemes = [
        PartitionScheme::Reassortment {
            single_site_probability: 0.5,
        },
        PartitionScheme::Recombination,
    ];
    for scheme in schemes {
        let settings = EventSettings {
            partition: scheme,
            ..EventSettings::default()
        };
        let mut rng = RngHandle::from_seed(17);
        let mut graph = start.clone();
        let mut added = 0;
        for _ in 0..40 {
            if propose_add_event(&mut graph, &mut rng, &settings, &selector).is_ok() {
                added += 1;
            }
        }
        assert!(added > 0);
        assert_eq!(graph.reassortment_count(), added);
        for node in graph.nodes_of_kind(arg_core::NodeKind::Reassortment) {
            let partition = graph.partition(node).unwrap().unwrap();
            assert_eq!(partition.len(), 3);
            assert!(partition.is_proper());
            assert!(settings.partition.log_probability(partition).is_finite());
        }
    }
}
