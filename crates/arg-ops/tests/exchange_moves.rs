use arg_core::{ArgError, RngHandle};
use arg_graph::{balanced_tree, coalescent_tree, ArgBuilder, ArgGraph};
use arg_ops::{
    narrow_exchange_candidate, propose_narrow_exchange, propose_wide_exchange, CandidateSelector,
};

// Tip a sits above X, so no pair of branches can trade places.
fn frozen_three_tips() -> ArgGraph {
    let mut builder = ArgBuilder::new();
    let a = builder.tip("a", 1.5);
    let b = builder.tip("b", 0.0);
    let c = builder.tip("c", 0.0);
    let x = builder.bifurcation(1.0, [b, c]);
    builder.bifurcation(2.0, [a, x]);
    builder.build().expect("fixture")
}

#[test]
fn wide_exchange_gives_up_on_a_frozen_tree() {
    let mut graph = frozen_three_tips();
    let before = graph.clone();
    let mut rng = RngHandle::from_seed(5);
    let err = propose_wide_exchange(&mut graph, &mut rng, &CandidateSelector::default())
        .unwrap_err();
    assert!(matches!(err, ArgError::NoValidMove(_)));
    assert_eq!(err.info().code, "retry-budget-exhausted");
    assert_eq!(graph, before);
}

#[test]
fn narrow_exchange_gives_up_on_a_frozen_tree() {
    let mut graph = frozen_three_tips();
    let before = graph.clone();
    let mut rng = RngHandle::from_seed(6);
    let err = propose_narrow_exchange(&mut graph, &mut rng, &CandidateSelector::new(500))
        .unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(graph, before);
}

#[test]
fn wide_exchange_on_four_tips_always_terminates() {
    let mut graph = balanced_tree(4, 2.0).unwrap();
    let mut rng = RngHandle::from_seed(9);
    let selector = CandidateSelector::new(50);
    let mut failures = 0;
    for _ in 0..100 {
        match propose_wide_exchange(&mut graph, &mut rng, &selector) {
            Ok(report) => {
                assert_eq!(report.log_hastings_ratio, 0.0);
                assert_eq!(graph.tip_count(), 4);
                graph.validate().unwrap();
            }
            Err(err) => {
                assert!(matches!(err, ArgError::NoValidMove(_)));
                failures += 1;
            }
        }
    }
    assert!(failures < 100);
}

#[test]
fn accepted_narrow_candidates_respect_heights() {
    let mut rng = RngHandle::from_seed(21);
    let selector = CandidateSelector::default();
    for _ in 0..50 {
        let graph = coalescent_tree(8, &mut rng).unwrap();
        let candidate = narrow_exchange_candidate(&graph, &mut rng, &selector).unwrap();
        assert!(graph.height(candidate.j.child).unwrap() < graph.height(candidate.i_parent).unwrap());
        assert!(graph.height(candidate.i.child).unwrap() < graph.height(candidate.j_parent).unwrap());
        assert_eq!(graph.edge_parent(candidate.i).unwrap(), candidate.i_parent);
        assert_eq!(graph.parents(candidate.i_parent).unwrap(), &[candidate.j_parent]);
    }
}

#[test]
fn narrow_exchange_moves_lineages_between_parents() {
    let mut rng = RngHandle::from_seed(33);
    let mut graph = coalescent_tree(6, &mut rng).unwrap();
    let report = propose_narrow_exchange(&mut graph, &mut rng, &CandidateSelector::default())
        .unwrap();
    let [i, i_parent, j, j_parent] = report.touched[..] else {
        panic!("narrow exchange touches four nodes");
    };
    assert!(graph.children(j_parent).unwrap().contains(&i));
    assert!(graph.children(i_parent).unwrap().contains(&j));
    assert!(report.description.starts_with("narrow-exchange:"));
    graph.validate().unwrap();
}
