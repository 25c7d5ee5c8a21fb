use arg_core::RngHandle;
use arg_graph::{canonical_hash, coalescent_tree, graph_from_bytes, graph_to_bytes, ArgGraph};
use proptest::prelude::*;

fn check_tree(graph: &ArgGraph, tips: usize) {
    graph.validate().unwrap();
    assert_eq!(graph.tip_count(), tips);
    assert_eq!(graph.node_count(), 2 * tips - 1);
    for node in graph.non_root_nodes() {
        for parent in graph.parents(node).unwrap() {
            assert!(graph.height(*parent).unwrap() > graph.height(node).unwrap());
        }
    }
}

proptest! {
    #[test]
    fn coalescent_trees_respect_invariants(seed in any::<u64>(), tips in 2usize..24) {
        let mut rng = RngHandle::from_seed(seed);
        let graph = coalescent_tree(tips, &mut rng).unwrap();
        check_tree(&graph, tips);

        let bytes = graph_to_bytes(&graph).unwrap();
        let restored = graph_from_bytes(&bytes).unwrap();
        prop_assert_eq!(canonical_hash(&graph), canonical_hash(&restored));

        let mut again = RngHandle::from_seed(seed);
        let replay = coalescent_tree(tips, &mut again).unwrap();
        prop_assert_eq!(replay, graph);
    }
}
