// Codec benchmarks for the Catena client.
//
// Covers JSON decode through the type registry, binary encode and decode of
// a transfer, aggregates at various sizes, and transaction signing.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};

use catena_protocol::model::{Amount, Hash256, Mosaic, MosaicId, NetworkType};
use catena_protocol::transaction::transfer::{Message, TransferBody};
use catena_protocol::transaction::{
    sign_transaction, AggregateBody, KeyPair, Transaction, TransactionBody, TransactionBuilder,
};

const SIGNER: &str = "321DE652C4D3362FC2DDF7800F6582F4A10CFEA134B81F8AB6E4BE78BBA4D18E";
const RECIPIENT: &str = "9050B9837EFAB4BBE8A4B9BB32D812F9885C00D8FC1650E142";

fn transfer_json() -> Value {
    json!({
        "transaction": {
            "signer": SIGNER,
            "version": 0x9000_3603_u64,
            "type": 16724,
            "maxFee": [20_000, 0],
            "deadline": [3_600_000, 0],
            "recipient": RECIPIENT,
            "message": { "type": 0, "payload": "7061796D656E7420666F7220696E766F6963652034322D41" },
            "mosaics": [
                { "id": [0x5B55_E02E, 0x0B06_6A43], "amount": [1_000_000, 0] },
                { "id": [1, 0], "amount": [25, 0] }
            ]
        },
        "meta": { "height": [1, 0], "index": 0 }
    })
}

fn transfer(keypair: &KeyPair) -> Transaction {
    let body = TransactionBody::Transfer(TransferBody {
        recipient: RECIPIENT.parse().unwrap(),
        mosaics: vec![Mosaic::new(MosaicId::new(1), Amount::new(1_000_000))],
        message: Message::plain("payment for invoice 42-A"),
    });
    TransactionBuilder::new(NetworkType::MIJIN_TEST, keypair.public_key())
        .max_fee(Amount::new(20_000))
        .build(body)
}

fn bench_json_decode(c: &mut Criterion) {
    let value = transfer_json();
    let text = value.to_string();

    c.bench_function("codec/json_decode_value", |b| {
        b.iter(|| Transaction::from_json(&value).unwrap());
    });
    c.bench_function("codec/json_decode_str", |b| {
        b.iter(|| Transaction::from_json_str(&text).unwrap());
    });
}

fn bench_binary(c: &mut Criterion) {
    let tx = Transaction::from_json(&transfer_json()).unwrap();
    let bytes = tx.encode().unwrap();

    c.bench_function("codec/encode_transfer", |b| {
        b.iter(|| tx.encode().unwrap());
    });
    c.bench_function("codec/decode_transfer", |b| {
        b.iter(|| Transaction::from_bytes(&bytes).unwrap());
    });
}

fn bench_aggregate(c: &mut Criterion) {
    let keypair = KeyPair::from_seed(&[1; 32]);
    let mut group = c.benchmark_group("codec/aggregate_round_trip");

    for size in [1, 10, 100] {
        let inner = (0..size).map(|_| transfer(&keypair)).collect();
        let aggregate = TransactionBuilder::new(NetworkType::MIJIN_TEST, keypair.public_key())
            .build(TransactionBody::AggregateCompleted(AggregateBody::new(inner)));

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &aggregate, |b, aggregate| {
            b.iter(|| {
                let bytes = aggregate.encode().unwrap();
                Transaction::from_bytes(&bytes).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_sign(c: &mut Criterion) {
    let keypair = KeyPair::from_seed(&[7; 32]);
    let generation_hash = Hash256::from_bytes([0x42; 32]);

    c.bench_function("codec/sign_transfer", |b| {
        b.iter(|| {
            let mut tx = transfer(&keypair);
            sign_transaction(&mut tx, &keypair, &generation_hash).unwrap()
        });
    });
}

criterion_group!(benches, bench_json_decode, bench_binary, bench_aggregate, bench_sign);
criterion_main!(benches);
