use arg_core::{ArgRng, RngHandle};
use arg_graph::coalescent_tree;
use arg_ops::{build_operators, narrow_swap_pairs, ArgOperator, OperatorConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_proposals(c: &mut Criterion) {
    let mut setup = RngHandle::from_seed(3);
    let start = coalescent_tree(64, &mut setup).unwrap();
    let operators = build_operators(&OperatorConfig::default()).unwrap();

    for (name, operator) in &operators {
        c.bench_function(&format!("propose_{name}_64"), |b| {
            let mut graph = start.clone();
            let mut rng = RngHandle::from_seed(5);
            b.iter(|| black_box(operator.propose(&mut graph, &mut rng).ok()));
        });
    }

    c.bench_function("mixed_chain_64", |b| {
        let mut graph = start.clone();
        let mut rng = RngHandle::from_seed(7);
        b.iter(|| {
            let (_, operator) = operators
                .get_index(rng.uniform_int(operators.len()))
                .unwrap();
            black_box(operator.propose(&mut graph, &mut rng).ok())
        });
    });

    c.bench_function("narrow_swap_pairs_64", |b| {
        b.iter(|| black_box(narrow_swap_pairs(&start).unwrap()));
    });
}

criterion_group!(benches, bench_proposals);
criterion_main!(benches);
