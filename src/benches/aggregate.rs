use bls_attest::{
    aggregate::{aggregate_public_keys, aggregate_signatures},
    hash::TryAndIncrement,
    keys::PrivateKey,
};
use criterion::{criterion_group, Criterion};
use rand::thread_rng;
use std::hint::black_box;

fn benchmark_aggregate(c: &mut Criterion) {
    let hasher = TryAndIncrement::direct();
    for n in [10, 100, 1000].into_iter() {
        let privates: Vec<_> = (0..n)
            .map(|_| PrivateKey::generate(&mut thread_rng()))
            .collect();
        let publics: Vec<_> = privates.iter().map(|p| p.public_key()).collect();
        let signatures: Vec<_> = privates
            .iter()
            .map(|p| p.sign(b"epoch transition", &[], &hasher).unwrap())
            .collect();
        c.bench_function(&format!("{}/keys={}", module_path!(), n), |b| {
            b.iter(|| {
                black_box(aggregate_public_keys(&publics).unwrap());
            });
        });
        c.bench_function(&format!("{}/sigs={}", module_path!(), n), |b| {
            b.iter(|| {
                black_box(aggregate_signatures(&signatures).unwrap());
            });
        });
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_aggregate
}
