//! Transaction codec end to end: JSON in, canonical binary out, and back.

mod common;

use serde_json::{json, Value};

use catena_protocol::config::{SIGNED_DATA_OFFSET, TRANSACTION_HEADER_SIZE};
use catena_protocol::model::{
    extract_network_type, Amount, Deadline, EntityVersion, Hash256, Mosaic, MosaicId, NetworkType,
    Signature,
};
use catena_protocol::transaction::signing::verify_transaction;
use catena_protocol::transaction::transfer::{Message, TransferBody};
use catena_protocol::transaction::{
    cosign, sign_transaction, transaction_hash, AggregateBody, DecodeError, EntityType, KeyPair, Transaction,
    TransactionBody, TransactionBuilder, TransactionMetadata,
};

use common::{transfer_json, HASH, RECIPIENT, SIGNER};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// Binary decode cannot carry node metadata, so compare without it.
fn without_metadata(mut tx: Transaction) -> Transaction {
    tx.envelope.metadata = None;
    if let Some(aggregate) = tx.body.as_aggregate_mut() {
        for inner in &mut aggregate.transactions {
            inner.envelope.metadata = None;
        }
    }
    tx
}

fn assert_binary_round_trip(tx: &Transaction) {
    let bytes = tx.encode().expect("encode");
    assert_eq!(bytes.len(), tx.size(), "{} size", tx.entity_type());

    let decoded = Transaction::from_bytes(&bytes).expect("decode");
    assert_eq!(decoded, without_metadata(tx.clone()), "{}", tx.entity_type());
    assert_eq!(decoded.encode().expect("re-encode"), bytes);
}

fn envelope(code: u16, body: Value) -> Value {
    let mut transaction = json!({
        "signer": SIGNER,
        "version": 0x9000_3601_u64,
        "type": code,
        "maxFee": [0, 0],
        "deadline": [86_400_000, 0],
    });
    for (key, value) in body.as_object().expect("body object") {
        transaction[key] = value.clone();
    }
    json!({ "transaction": transaction })
}

fn inner(code: u16, body: Value, meta: Option<Value>) -> Value {
    let mut item = envelope(code, body);
    let transaction = item["transaction"].as_object_mut().expect("transaction object");
    transaction.remove("maxFee");
    transaction.remove("deadline");
    if let Some(meta) = meta {
        item["meta"] = meta;
    }
    item
}

fn transfer_body() -> Value {
    json!({
        "recipient": RECIPIENT,
        "message": { "type": 0, "payload": "" },
        "mosaics": [{ "id": [1, 0], "amount": [10, 0] }]
    })
}

// ---------------------------------------------------------------------------
// Transfer
// ---------------------------------------------------------------------------

#[test]
fn transfer_decodes_and_encodes_end_to_end() {
    let tx = Transaction::from_json(&transfer_json()).expect("decode");

    assert_eq!(tx.entity_type(), EntityType::Transfer);
    assert_eq!(tx.entity_type().code(), 16724);
    assert_eq!(tx.envelope.network_type, NetworkType(0x36));
    assert_eq!(tx.envelope.max_fee, Amount::new(100));
    assert_eq!(tx.envelope.deadline, Some(Deadline::from_raw(3_600_000).unwrap()));
    assert!(tx.envelope.signature.is_none());
    assert_eq!(tx.envelope.hash(), Some(HASH.parse::<Hash256>().unwrap()));

    let TransactionBody::Transfer(body) = &tx.body else {
        panic!("expected a transfer, got {:?}", tx.body);
    };
    assert_eq!(body.recipient.to_hex(), RECIPIENT);
    assert_eq!(body.message, Message::plain("hello"));
    assert_eq!(
        body.mosaics,
        vec![Mosaic::new(
            MosaicId::new(0x0B06_6A43_5B55_E02E),
            Amount::new(1_000_000)
        )]
    );

    let bytes = tx.encode().expect("encode");
    assert_eq!(bytes.len(), tx.size());
    assert_eq!(&bytes[..4], &(bytes.len() as u32).to_le_bytes());
    assert_eq!(&bytes[100..104], &0x9000_3605_u32.to_le_bytes());
    assert_eq!(&bytes[104..106], &16724_u16.to_le_bytes());
    assert_eq!(&bytes[106..114], &[100, 0, 0, 0, 0, 0, 0, 0]);

    assert_binary_round_trip(&tx);
}

#[test]
fn network_byte_is_independent_of_other_version_bits() {
    for high in [0_u64, 1, 0xFF, 0xDEAD_BEEF, 0x00FF_FFFF_FFFF] {
        for low in [0_u64, 3, 0xFF] {
            let packed = (high << 16) | (0x36 << 8) | low;
            assert_eq!(extract_network_type(packed), NetworkType(0x36), "{packed:#x}");
        }
    }
}

#[test]
fn unknown_type_is_rejected() {
    let err = Transaction::from_json(&envelope(0x9999, json!({}))).unwrap_err();
    assert_eq!(err, DecodeError::UnrecognizedType(0x9999));
}

#[test]
fn body_errors_do_not_leak_into_other_decodes() {
    let broken = envelope(0x4154, json!({ "recipient": "zz" }));
    assert!(matches!(
        Transaction::from_json(&broken),
        Err(DecodeError::MalformedBody { entity_type: EntityType::Transfer, .. })
    ));
    assert!(Transaction::from_json(&transfer_json()).is_ok());
}

// ---------------------------------------------------------------------------
// Other variants
// ---------------------------------------------------------------------------

#[test]
fn assorted_variants_round_trip_through_binary() {
    let fixtures = [
        envelope(0x4154, transfer_body()),
        envelope(
            0x434E,
            json!({ "aliasAction": 0, "namespaceId": [0xE1, 0x85], "mosaicId": [7, 1] }),
        ),
        envelope(
            0x4148,
            json!({
                "mosaic": { "id": [1, 0], "amount": [10_000_000, 0] },
                "duration": [480, 0],
                "hash": HASH
            }),
        ),
        envelope(
            0x4252,
            json!({
                "hashAlgorithm": 0,
                "secret": HASH,
                "recipient": RECIPIENT,
                "proof": "9A493664"
            }),
        ),
        envelope(
            0x4155,
            json!({
                "minRemovalDelta": -1,
                "minApprovalDelta": 2,
                "modifications": [
                    { "type": 0, "cosignatoryPublicKey": SIGNER },
                    { "type": 1, "cosignatoryPublicKey": HASH }
                ]
            }),
        ),
    ];

    for fixture in &fixtures {
        let tx = Transaction::from_json(fixture).expect("fixture decodes");
        assert_binary_round_trip(&tx);
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

fn aggregate_json() -> Value {
    let inner_meta = json!({ "height": [9, 0], "aggregateHash": HASH, "aggregateId": "M1" });
    let mut aggregate = envelope(
        0x4141,
        json!({
            "transactions": [
                inner(0x4154, transfer_body(), Some(inner_meta)),
                inner(0x424D, json!({ "mosaicId": [1, 0], "direction": 1, "delta": [5, 0] }), None),
            ],
            "cosignatures": [{ "signer": HASH, "signature": "CD".repeat(64) }]
        }),
    );
    aggregate["transaction"]["maxFee"] = json!([7, 0]);
    aggregate["transaction"]["signature"] = json!("AB".repeat(64));
    aggregate["meta"] = json!({ "height": [10, 0], "hash": HASH, "id": "M0" });
    aggregate
}

#[test]
fn aggregate_propagates_envelope_to_inner_transactions() {
    let tx = Transaction::from_json(&aggregate_json()).expect("decode");
    let aggregate = tx.body.as_aggregate().expect("aggregate body");
    assert_eq!(aggregate.transactions.len(), 2);
    assert_eq!(aggregate.cosignatures.len(), 1);

    let signature = Signature::from_bytes([0xAB; 64]);
    for inner in &aggregate.transactions {
        assert_eq!(inner.envelope.deadline, tx.envelope.deadline);
        assert_eq!(inner.envelope.max_fee, Amount::new(7));
        assert_eq!(inner.envelope.signature, Some(signature));
    }

    // Metadata sent with the inner transaction is kept.
    let kept: &TransactionMetadata = aggregate.transactions[0]
        .envelope
        .metadata
        .as_ref()
        .expect("inner metadata");
    assert_eq!(kept.aggregate_id.as_deref(), Some("M1"));

    // Missing metadata is inherited from the aggregate.
    assert_eq!(aggregate.transactions[1].envelope.metadata, tx.envelope.metadata);
}

#[test]
fn aggregate_round_trips_through_binary() {
    let tx = Transaction::from_json(&aggregate_json()).expect("decode");
    assert_binary_round_trip(&tx);
}

#[test]
fn nested_aggregates_fail_integrity() {
    let nested = envelope(
        0x4141,
        json!({ "transactions": [inner(0x4241, json!({ "transactions": [] }), None)] }),
    );
    assert!(matches!(
        Transaction::from_json(&nested),
        Err(DecodeError::AggregateIntegrity { index: 0, .. })
    ));
}

#[test]
fn nested_aggregate_payload_fails_integrity() {
    let keypair = KeyPair::from_seed(&[3; 32]);
    let builder = TransactionBuilder::new(NetworkType::MIJIN_TEST, keypair.public_key());
    let transfer = builder.clone().build(TransactionBody::Transfer(TransferBody {
        recipient: RECIPIENT.parse().unwrap(),
        mosaics: vec![Mosaic::new(MosaicId::new(1), Amount::new(5))],
        message: Message::plain("inner"),
    }));
    let bonded = builder
        .clone()
        .build(TransactionBody::AggregateBonded(AggregateBody::new(Vec::new())));
    let outer = builder.build(TransactionBody::AggregateCompleted(AggregateBody::new(vec![
        transfer, bonded,
    ])));

    // The encoder writes whatever it is given; the decoder must refuse it.
    let bytes = outer.encode().expect("encode");
    assert!(matches!(
        Transaction::from_bytes(&bytes),
        Err(DecodeError::AggregateIntegrity { index: 1, .. })
    ));
}

#[test]
fn broken_inner_transaction_fails_the_whole_aggregate() {
    let broken = envelope(
        0x4241,
        json!({
            "transactions": [
                inner(0x4154, transfer_body(), None),
                inner(0x4154, json!({ "recipient": 5 }), None),
            ]
        }),
    );
    assert!(matches!(
        Transaction::from_json(&broken),
        Err(DecodeError::AggregateIntegrity { index: 1, .. })
    ));
}

// ---------------------------------------------------------------------------
// Building and signing
// ---------------------------------------------------------------------------

#[test]
fn built_transaction_signs_and_verifies() {
    let keypair = KeyPair::from_seed(&[42; 32]);
    let generation_hash: Hash256 = HASH.parse().unwrap();
    let body = TransactionBody::Transfer(TransferBody {
        recipient: RECIPIENT.parse().unwrap(),
        mosaics: vec![Mosaic::new(MosaicId::new(1), Amount::new(5))],
        message: Message::plain("rent"),
    });
    let mut tx = TransactionBuilder::new(NetworkType::MIJIN_TEST, keypair.public_key())
        .max_fee(Amount::new(20_000))
        .build(body);
    assert_eq!(tx.envelope.version, EntityVersion(3));

    let signed = sign_transaction(&mut tx, &keypair, &generation_hash).expect("sign");
    assert!(verify_transaction(&signed.payload, &generation_hash).unwrap());
    assert_eq!(signed.hash, transaction_hash(&signed.payload, &generation_hash).unwrap());
    assert_eq!(tx.encode().unwrap(), signed.payload);
    assert!(signed.payload.len() > TRANSACTION_HEADER_SIZE);

    // Any change to the signed region breaks verification.
    let mut tampered = signed.payload.clone();
    tampered[SIGNED_DATA_OFFSET + 10] ^= 1;
    assert!(!verify_transaction(&tampered, &generation_hash).unwrap());

    let decoded = Transaction::from_bytes(&signed.payload).expect("decode signed");
    assert_eq!(decoded.envelope.signature, tx.envelope.signature);

    let cosignature = cosign(&KeyPair::from_seed(&[7; 32]), &signed.hash);
    assert_ne!(cosignature.signer, keypair.public_key());
}
