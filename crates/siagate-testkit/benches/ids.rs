//! ID derivation benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use siagate_core::{
    canonical_transaction_bytes_no_signatures, Currency, FileContractId, Keypair, ProofStatus,
    SiacoinOutputId, Transaction, TransactionBuilder, UnlockConditions, UnlockHash,
};

fn sample(outputs: usize) -> Transaction {
    let keypair = Keypair::from_seed(&[0x42; 32]);
    let uc = UnlockConditions::single_key(keypair.public_key());
    let mut builder = TransactionBuilder::new()
        .siacoin_input(SiacoinOutputId::from_bytes([1; 32]), uc.clone())
        .siacoin_input(SiacoinOutputId::from_bytes([2; 32]), uc);
    for i in 0..outputs {
        builder = builder.siacoin_output(Currency::from(i as u64), UnlockHash::from_bytes([3; 32]));
    }
    builder.sign(&keypair)
}

fn bench_ids(c: &mut Criterion) {
    let small = sample(2);
    let large = sample(64);

    c.bench_function("canonical_no_signatures/2_outputs", |b| {
        b.iter(|| canonical_transaction_bytes_no_signatures(black_box(&small)))
    });
    c.bench_function("transaction_id/2_outputs", |b| {
        b.iter(|| black_box(&small).id())
    });
    c.bench_function("transaction_id/64_outputs", |b| {
        b.iter(|| black_box(&large).id())
    });
    c.bench_function("siacoin_output_ids/64_outputs", |b| {
        b.iter(|| black_box(&large).siacoin_output_ids())
    });

    let fcid = FileContractId::from_bytes([9; 32]);
    c.bench_function("storage_proof_output_id", |b| {
        b.iter(|| fcid.storage_proof_output_id(ProofStatus::Valid, black_box(3)))
    });
}

criterion_group!(benches, bench_ids);
criterion_main!(benches);
