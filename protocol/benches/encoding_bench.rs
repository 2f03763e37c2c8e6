// Encoding & signing benchmarks for algotx.
//
// Covers canonical msgpack encoding and strict decoding of transactions,
// transaction ID computation, single-signature signing, and group ID
// computation at various group sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use algotx_protocol::crypto::Account;
use algotx_protocol::transaction::{
    compute_group_id, decode_signed_transaction, decode_unsigned_transaction,
    encode_unsigned_transaction, sign_transaction, OnApplicationComplete, SuggestedParams, Transaction,
    TransactionBuilder,
};

fn params() -> SuggestedParams {
    SuggestedParams {
        flat_fee: false,
        fee: 0,
        min_fee: 1000,
        first_valid: 51_000_000,
        last_valid: 51_001_000,
        genesis_id: "mainnet-v1.0".into(),
        genesis_hash: [9u8; 32],
    }
}

fn sample_payment(sender: &Account) -> Transaction {
    TransactionBuilder::payment(sender.address(), sender.address(), 1_000_000, &params())
        .note(b"bench".to_vec())
        .build()
        .unwrap()
}

fn sample_app_call(sender: &Account) -> Transaction {
    TransactionBuilder::app_call(sender.address(), 1234, OnApplicationComplete::NoOp, &params())
    .app_args(vec![vec![0xfe, 0x6b, 0xdf, 0x69], 7u64.to_be_bytes().to_vec()])
    .accounts(vec![Account::generate().address()])
    .foreign_assets(vec![31566704])
    .build()
    .unwrap()
}

fn bench_encode(c: &mut Criterion) {
    let account = Account::generate();
    let pay = sample_payment(&account);
    let appl = sample_app_call(&account);

    c.bench_function("encode/payment", |b| {
        b.iter(|| encode_unsigned_transaction(&pay).unwrap());
    });
    c.bench_function("encode/app_call", |b| {
        b.iter(|| encode_unsigned_transaction(&appl).unwrap());
    });
}

fn bench_decode(c: &mut Criterion) {
    let account = Account::generate();
    let unsigned = encode_unsigned_transaction(&sample_app_call(&account)).unwrap();
    let signed = sign_transaction(&sample_payment(&account), &account)
        .unwrap()
        .blob;

    c.bench_function("decode/app_call", |b| {
        b.iter(|| decode_unsigned_transaction(&unsigned).unwrap());
    });
    c.bench_function("decode/signed_payment", |b| {
        b.iter(|| decode_signed_transaction(&signed).unwrap());
    });
}

fn bench_tx_id(c: &mut Criterion) {
    let txn = sample_payment(&Account::generate());

    c.bench_function("txid/payment", |b| {
        b.iter(|| txn.tx_id().unwrap());
    });
}

fn bench_sign(c: &mut Criterion) {
    let account = Account::generate();
    let txn = sample_payment(&account);

    c.bench_function("ed25519/sign_transaction", |b| {
        b.iter(|| sign_transaction(&txn, &account).unwrap());
    });
}

fn bench_group_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("group/compute_id");
    let account = Account::generate();

    for size in [2usize, 8, 16] {
        let txns: Vec<Transaction> = (0..size).map(|_| sample_payment(&account)).collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &txns, |b, txns| {
            b.iter(|| compute_group_id(txns).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_tx_id,
    bench_sign,
    bench_group_id,
);
criterion_main!(benches);
