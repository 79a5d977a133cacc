// Chain benchmarks for the star notary.
//
// Covers block digest computation, raw append, the full authenticated
// submission path (Ed25519 verify + seal + index), and the integrity audit
// at various chain lengths.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

use notary_protocol::crypto::keys::NotaryKeypair;
use notary_protocol::crypto::signatures::sign_challenge;
use notary_protocol::{Block, Chain, ChainConfig, Ledger};

fn sample_payload(i: usize) -> serde_json::Value {
    json!({
        "star": {
            "dec": "-26° 29' 24.9",
            "ra": "16h 29m 1.0s",
            "story": format!("observation #{i}"),
        }
    })
}

fn bench_compute_hash(c: &mut Criterion) {
    let block = Block::with_owner(sample_payload(0), "a".repeat(64));

    c.bench_function("block/compute_hash", |b| {
        b.iter(|| block.compute_hash());
    });
}

fn bench_append(c: &mut Criterion) {
    c.bench_function("chain/append", |b| {
        let mut chain = Chain::new(ChainConfig::default());
        chain.initialize();
        let mut i = 0;
        b.iter(|| {
            i += 1;
            chain.append(Block::new(sample_payload(i)))
        });
    });
}

fn bench_submit(c: &mut Criterion) {
    let ledger = Ledger::new(ChainConfig::default());
    let keypair = NotaryKeypair::generate();
    let address = keypair.address();
    let message = ledger.request_ownership_message(&address);
    let signature = sign_challenge(&keypair, &message);

    c.bench_function("ledger/submit", |b| {
        let mut i = 0;
        b.iter(|| {
            i += 1;
            ledger
                .submit(&address, &message, &signature, sample_payload(i))
                .unwrap()
        });
    });
}

fn bench_validate_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain/validate_chain");

    for size in [10, 100, 1_000] {
        let mut chain = Chain::new(ChainConfig::default());
        chain.initialize();
        for i in 0..size {
            chain.append(Block::new(sample_payload(i)));
        }

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &chain, |b, chain| {
            b.iter(|| chain.validate_chain());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compute_hash,
    bench_append,
    bench_submit,
    bench_validate_chain,
);
criterion_main!(benches);
