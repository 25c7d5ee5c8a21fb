use arg_core::{ArgError, Edge, NodeId};
use arg_graph::{balanced_tree, canonical_hash, ArgGraph, GraphEvent, Partition};

fn four_tips() -> ArgGraph {
    // ((t0,t1)n4,(t2,t3)n5)n6
    balanced_tree(4, 2.0).unwrap()
}

#[test]
fn mutation_outside_edit_is_rejected() {
    let mut graph = four_tips();
    let err = graph.set_height(NodeId::from_raw(4), 0.5).unwrap_err();
    assert_eq!(err.info().code, "edit-not-open");
    assert!(matches!(err, ArgError::Graph(_)));
    assert!(err.info().hint.as_deref().is_some_and(|hint| hint.contains("begin_edit")));
    assert!(!graph.is_editing());
}

#[test]
fn valid_swap_commits_and_notifies() {
    let mut graph = four_tips();
    graph.begin_edit();
    graph
        .swap_edges(Edge::new(NodeId::from_raw(1), 0), Edge::new(NodeId::from_raw(2), 0))
        .unwrap();
    graph.end_edit().unwrap();

    assert_eq!(graph.parent(NodeId::from_raw(1), 0).unwrap(), NodeId::from_raw(5));
    assert_eq!(graph.parent(NodeId::from_raw(2), 0).unwrap(), NodeId::from_raw(4));
    assert_eq!(graph.take_events(), vec![GraphEvent::TopologyChanged]);
    assert!(graph.take_events().is_empty());
}

#[test]
fn invalid_edit_rolls_back_verbatim() {
    let mut graph = four_tips();
    let before = graph.clone();
    graph.begin_edit();
    // Moves the root below its children.
    graph.set_height(graph.root(), 0.1).unwrap();
    let err = graph.end_edit().unwrap_err();

    assert!(matches!(err, ArgError::StructuralIntegrity(_)));
    assert_eq!(err.info().code, "height-order");
    assert!(err.info().context.contains_key("graph"));
    assert!(!err.is_recoverable());
    assert_eq!(graph, before);
    assert!(graph.take_events().is_empty());
}

#[test]
fn abort_restores_snapshot() {
    let mut graph = four_tips();
    let hash = canonical_hash(&graph);
    graph.begin_edit();
    graph.set_height(NodeId::from_raw(4), 0.25).unwrap();
    graph.abort_edit().unwrap();
    assert_eq!(canonical_hash(&graph), hash);
    assert!(graph.end_edit().is_err());
}

#[test]
fn edit_closure_rolls_back_on_error() {
    let mut graph = four_tips();
    let before = graph.clone();
    let result: Result<(), ArgError> = graph.edit(|g| {
        g.set_height(NodeId::from_raw(4), 0.3)?;
        g.replace_child(NodeId::from_raw(4), NodeId::from_raw(3), NodeId::from_raw(2))
    });
    assert_eq!(result.unwrap_err().info().code, "not-a-child");
    assert_eq!(graph, before);
}

#[test]
fn nested_edits_emit_once_at_the_outermost_commit() {
    let mut graph = four_tips();
    graph.begin_edit();
    graph.set_height(NodeId::from_raw(4), 0.75).unwrap();
    graph.begin_edit();
    graph.set_height(NodeId::from_raw(5), 1.25).unwrap();
    graph.end_edit().unwrap();
    assert!(graph.take_events().is_empty());
    graph.end_edit().unwrap();
    assert_eq!(graph.take_events(), vec![GraphEvent::HeightChanged]);
    assert_eq!(graph.height(NodeId::from_raw(5)).unwrap(), 1.25);
}

#[test]
fn inserting_and_deleting_a_node_pair_round_trips() {
    let mut graph = four_tips();
    let original = graph.clone();
    let (t0, n4) = (NodeId::from_raw(0), NodeId::from_raw(4));
    let (t2, n5) = (NodeId::from_raw(2), NodeId::from_raw(5));

    // Bifurcation above t0 and a reassortment above t2 hanging off it.
    graph.begin_edit();
    let b = graph.next_node_id();
    let r = NodeId::from_raw(b.as_raw() + 1);
    assert_eq!(graph.push_bifurcation(0.6, Some(n4), [t0, r]).unwrap(), b);
    assert_eq!(
        graph
            .push_reassortment(0.4, [b, n5], t2, Partition::empty())
            .unwrap(),
        r
    );
    graph.replace_child(n4, t0, b).unwrap();
    graph.set_parent(Edge::new(t0, 0), Some(b)).unwrap();
    graph.replace_child(n5, t2, r).unwrap();
    graph.set_parent(Edge::new(t2, 0), Some(r)).unwrap();
    graph.end_edit().unwrap();
    assert_eq!(graph.node_count(), 9);
    assert_eq!(graph.reassortment_count(), 1);
    assert_eq!(
        graph.take_events(),
        vec![GraphEvent::TopologyChanged, GraphEvent::SizeChanged { delta: 2 }]
    );

    graph.begin_edit();
    assert_eq!(
        graph.delete_nodes(&[b, r]).unwrap_err().info().code,
        "dangling-reference"
    );
    graph.replace_child(n4, b, t0).unwrap();
    graph.set_parent(Edge::new(t0, 0), Some(n4)).unwrap();
    graph.replace_child(n5, r, t2).unwrap();
    graph.set_parent(Edge::new(t2, 0), Some(n5)).unwrap();
    graph.delete_nodes(&[b, r]).unwrap();
    graph.end_edit().unwrap();
    assert_eq!(graph, original);
}

#[test]
fn single_node_insertions_are_rejected_at_commit() {
    let mut graph = four_tips();
    let before = graph.clone();
    let (t0, n4) = (NodeId::from_raw(0), NodeId::from_raw(4));
    graph.begin_edit();
    let b = graph.push_bifurcation(0.5, Some(n4), [t0, t0]).unwrap();
    graph.replace_child(n4, t0, b).unwrap();
    graph.set_parent(Edge::new(t0, 0), Some(b)).unwrap();
    let err = graph.end_edit().unwrap_err();
    assert!(matches!(err, ArgError::StructuralIntegrity(_)));
    assert_eq!(graph, before);
}

#[test]
fn swapping_siblings_is_refused() {
    let mut graph = four_tips();
    graph.begin_edit();
    let err = graph
        .swap_edges(Edge::new(NodeId::from_raw(0), 0), Edge::new(NodeId::from_raw(1), 0))
        .unwrap_err();
    assert_eq!(err.info().code, "shared-parent");
    graph.abort_edit().unwrap();
}
