use bls_attest::{
    group::MESSAGE_DST,
    hash::{HashToCurve, TryAndIncrement, TryAndIncrementCip22},
};
use criterion::{criterion_group, Criterion};
use std::hint::black_box;

fn benchmark_hash_to_curve(c: &mut Criterion) {
    let direct = TryAndIncrement::direct();
    let composite = TryAndIncrement::composite();
    let modes: [(&str, &dyn HashToCurve); 3] = [
        ("direct", &direct),
        ("composite", &composite),
        ("cip22", &TryAndIncrementCip22),
    ];
    for (name, hasher) in modes.into_iter() {
        for msg_len in [128, 16384].into_iter() {
            let message = vec![0x5au8; msg_len];
            c.bench_function(
                &format!("{}/mode={} msg_len={}", module_path!(), name, msg_len),
                |b| {
                    b.iter(|| {
                        black_box(hasher.hash(MESSAGE_DST, &message, b"extra").unwrap());
                    });
                },
            );
        }
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_hash_to_curve
}
