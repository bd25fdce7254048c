use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use ark_ff::UniformRand;
use cinch_core::hash::{digest_params, MimcParams};
use cinch_core::pair::{Bls377Bw6, WrapScalar};

type Fq = WrapScalar<Bls377Bw6>;

fn bench_digest(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::seed_from_u64(0);
    let params = digest_params::<Bls377Bw6>();
    // A Groth16 key with one primary input flattens to 18 coordinates.
    let preimage: Vec<Fq> = (0..19).map(|_| Fq::rand(&mut rng)).collect();

    c.bench_function("vk_digest/hash_19_elems", |b| {
        b.iter(|| params.hash(&preimage))
    });
    c.bench_function("vk_digest/derive_params", |b| {
        b.iter(|| MimcParams::<Fq>::derive(17, 93, "cinch.bench-digest"))
    });
}

criterion_group!(benches, bench_digest);
criterion_main!(benches);
