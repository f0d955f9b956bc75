//! Event client against an in-memory node.
//!
//! Each test drives both ends: the client under test and the node side of
//! every socket it opens, so subscribe/unsubscribe frames and dispatch can
//! be observed directly.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use catena_protocol::model::Height;
use catena_protocol::transaction::{EntityType, TransactionBody};
use catena_protocol::ws::{
    ClientConfig, ClientError, DispatchError, Event, EventClient, EventKind, UnsubscribePolicy,
};

use common::{address, block_frame, transaction_frame, MemoryConnector, HASH, WAIT};

fn client_with(config: ClientConfig) -> (EventClient, common::Acceptor) {
    let (connector, acceptor) = MemoryConnector::new();
    (EventClient::with_connector(config, connector), acceptor)
}

fn client() -> (EventClient, common::Acceptor) {
    client_with(ClientConfig::new("ws://node.test/ws"))
}

async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("value in time")
        .expect("channel open")
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_handler_sends_exactly_one_subscribe_frame() {
    let (client, mut acceptor) = client();
    let alice = address(1);

    client.on_confirmed_added(alice, |_| true).await.unwrap();
    let mut socket = acceptor.accept().await;
    assert_eq!(
        socket.recv().await,
        json!({ "uid": &socket.uid, "subscribe": format!("confirmedAdded/{}", alice.to_hex()) })
    );

    client.on_confirmed_added(alice, |_| true).await.unwrap();
    client.on_confirmed_added(alice, |_| true).await.unwrap();
    socket.assert_silent().await;
    assert!(client.is_subscribed(EventKind::ConfirmedAdded, Some(alice)));
}

#[tokio::test]
async fn empty_handler_list_subscribes_nothing() {
    let (client, mut acceptor) = client();
    let ids = client
        .subscribe(EventKind::Status, Some(address(1)), Vec::new())
        .await
        .unwrap();
    assert!(ids.is_empty());
    acceptor.assert_no_connection().await;
}

#[tokio::test]
async fn addresses_are_routed_to_their_own_connections() {
    let (client, mut acceptor) = client();

    client.on_block(|_| true).await.unwrap();
    let mut primary = acceptor.accept().await;
    assert_eq!(primary.recv().await["subscribe"], "block");

    // The first address adopts the primary connection.
    client.on_status(address(1), |_| true).await.unwrap();
    assert_eq!(
        primary.recv().await["subscribe"],
        format!("status/{}", address(1).to_hex())
    );
    acceptor.assert_no_connection().await;

    // Every further address gets its own.
    client.on_status(address(2), |_| true).await.unwrap();
    let mut second = acceptor.accept().await;
    assert_eq!(second.recv().await["uid"], second.uid.as_str());
    assert_eq!(client.connection_count().await, 2);

    // And keeps it.
    client.on_cosignature(address(2), |_| true).await.unwrap();
    assert_eq!(
        second.recv().await["subscribe"],
        format!("cosignature/{}", address(2).to_hex())
    );
    primary.assert_silent().await;
}

#[tokio::test]
async fn last_unsubscribe_sends_unsubscribe_frame() {
    let (client, mut acceptor) = client();
    let alice = address(1);

    let first = client.on_unconfirmed_added(alice, |_| true).await.unwrap();
    let second = client.on_unconfirmed_added(alice, |_| true).await.unwrap();
    let mut socket = acceptor.accept().await;
    socket.recv().await;

    client
        .unsubscribe(EventKind::UnconfirmedAdded, Some(alice), &[first])
        .await
        .unwrap();
    socket.assert_silent().await;

    client
        .unsubscribe(EventKind::UnconfirmedAdded, Some(alice), &[second])
        .await
        .unwrap();
    assert_eq!(
        socket.recv().await,
        json!({ "uid": &socket.uid, "unsubscribe": format!("unconfirmedAdded/{}", alice.to_hex()) })
    );
    assert!(!client.is_subscribed(EventKind::UnconfirmedAdded, Some(alice)));

    // A fresh handler starts a new cycle.
    client.on_unconfirmed_added(alice, |_| true).await.unwrap();
    assert!(socket.recv().await.get("subscribe").is_some());
}

#[tokio::test]
async fn never_policy_keeps_node_side_subscription() {
    let mut config = ClientConfig::new("ws://node.test/ws");
    config.unsubscribe_policy = UnsubscribePolicy::Never;
    let (client, mut acceptor) = client_with(config);

    let id = client.on_block(|_| true).await.unwrap();
    let mut socket = acceptor.accept().await;
    socket.recv().await;

    client.unsubscribe(EventKind::Block, None, &[id]).await.unwrap();
    socket.assert_silent().await;
    assert!(!client.is_subscribed(EventKind::Block, None));
}

#[tokio::test]
async fn unsubscribing_an_idle_pair_is_a_state_error() {
    let (client, _acceptor) = client();
    let err = client
        .unsubscribe(EventKind::Status, Some(address(9)), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::SubscriptionState(path) if path.starts_with("status/")));
}

#[tokio::test]
async fn address_is_required_for_account_channels() {
    let (client, _acceptor) = client();
    let err = client
        .subscribe(EventKind::ConfirmedAdded, None, vec![Arc::new(|_: &Event| true)])
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidSubscription(_)));
}

#[tokio::test]
async fn handshake_timeout_fails_the_subscription() {
    let (connector, _acceptor) = MemoryConnector::silent();
    let mut config = ClientConfig::new("ws://node.test/ws");
    config.handshake_timeout = Duration::from_millis(50);
    let client = EventClient::with_connector(config, connector);

    let err = client.on_block(|_| true).await.unwrap_err();
    assert_eq!(err, ClientError::HandshakeTimeout(Duration::from_millis(50)));
    assert!(!client.is_subscribed(EventKind::Block, None));
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transactions_reach_their_handlers() {
    let (client, mut acceptor) = client();
    let alice = address(1);
    let (tx, mut rx) = mpsc::unbounded_channel();

    client
        .on_confirmed_added(alice, move |transaction| {
            tx.send(transaction.clone()).unwrap();
            true
        })
        .await
        .unwrap();
    let mut socket = acceptor.accept().await;
    socket.recv().await;

    socket.send(transaction_frame("confirmedAdded", &alice));
    let transaction = next(&mut rx).await;
    assert_eq!(transaction.entity_type(), EntityType::Transfer);
    assert_eq!(transaction.envelope.network_type.0, 0x36);
    assert!(matches!(transaction.body, TransactionBody::Transfer(_)));

    // Frames for another address on the same socket are not delivered here.
    socket.send(transaction_frame("confirmedAdded", &address(2)));
    assert!(tokio::time::timeout(common::QUIET, rx.recv()).await.is_err());
}

#[tokio::test]
async fn removed_and_cosignature_payloads() {
    let (client, mut acceptor) = client();
    let alice = address(1);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let removed = tx.clone();
    client
        .on_unconfirmed_removed(alice, move |hash| {
            removed.send(format!("removed {hash}")).unwrap();
            true
        })
        .await
        .unwrap();
    client
        .on_cosignature(alice, move |cosignature| {
            tx.send(format!("cosigned {}", cosignature.parent_hash)).unwrap();
            true
        })
        .await
        .unwrap();
    let mut socket = acceptor.accept().await;
    socket.recv().await;
    socket.recv().await;

    socket.send(json!({
        "meta": { "channelName": "unconfirmedRemoved", "address": alice.to_hex(), "hash": HASH }
    }));
    assert_eq!(next(&mut rx).await, format!("removed {HASH}"));

    socket.send(json!({
        "parentHash": HASH,
        "signature": "11".repeat(64),
        "signer": common::SIGNER,
        "meta": { "channelName": "cosignature", "address": alice.to_hex() }
    }));
    assert_eq!(next(&mut rx).await, format!("cosigned {HASH}"));
}

#[tokio::test]
async fn frames_dispatch_in_arrival_order() {
    let mut config = ClientConfig::new("ws://node.test/ws");
    config.max_in_flight_handlers = 1;
    let (client, mut acceptor) = client_with(config);
    let (tx, mut rx) = mpsc::unbounded_channel();

    client
        .on_block(move |block| {
            // Slow the first handler so a reordering would show.
            if block.block.height == Height::new(1) {
                std::thread::sleep(Duration::from_millis(50));
            }
            tx.send(block.block.height.value()).unwrap();
            true
        })
        .await
        .unwrap();
    let mut socket = acceptor.accept().await;
    socket.recv().await;

    for height in 1..=5 {
        socket.send(block_frame(height));
    }
    let mut seen = Vec::new();
    for _ in 0..5 {
        seen.push(next(&mut rx).await);
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn unknown_channel_is_reported_and_loop_continues() {
    let (client, mut acceptor) = client();
    let mut errors = client.errors().unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    client
        .on_block(move |block| {
            tx.send(block.block.height.value()).unwrap();
            true
        })
        .await
        .unwrap();
    let mut socket = acceptor.accept().await;
    socket.recv().await;

    socket.send(json!({ "meta": { "channelName": "gossip" } }));
    socket.send_raw("not json");
    socket.send(block_frame(7));

    assert_eq!(
        next(&mut errors).await,
        DispatchError::ProtocolMismatch("gossip".into())
    );
    assert!(matches!(next(&mut errors).await, DispatchError::MalformedFrame(_)));
    assert_eq!(next(&mut rx).await, 7);
}

#[tokio::test]
async fn handler_returning_false_is_retired() {
    let (client, mut acceptor) = client();
    let (tx, mut rx) = mpsc::unbounded_channel();

    client
        .on_block(move |block| {
            tx.send(block.block.height.value()).unwrap();
            false
        })
        .await
        .unwrap();
    let mut socket = acceptor.accept().await;
    socket.recv().await;

    socket.send(block_frame(1));
    assert_eq!(next(&mut rx).await, 1);
    assert_eq!(
        socket.recv().await,
        json!({ "uid": &socket.uid, "unsubscribe": "block" })
    );
    assert!(!client.is_subscribed(EventKind::Block, None));

    socket.send(block_frame(2));
    assert!(tokio::time::timeout(common::QUIET, rx.recv()).await.is_err());
}

#[tokio::test]
async fn panicking_handler_surfaces_on_error_channel() {
    let (client, mut acceptor) = client();
    let mut errors = client.errors().unwrap();

    let id = client
        .on_block(|_| panic!("handler exploded"))
        .await
        .unwrap();
    let mut socket = acceptor.accept().await;
    socket.recv().await;

    socket.send(block_frame(1));
    match next(&mut errors).await {
        DispatchError::HandlerPanicked { path, handler, message } => {
            assert_eq!(path, "block");
            assert_eq!(handler, id);
            assert_eq!(message, "handler exploded");
        }
        other => panic!("unexpected error {other:?}"),
    }
    // Panics do not retire the handler.
    assert!(client.is_subscribed(EventKind::Block, None));
}

#[tokio::test]
async fn close_tears_everything_down() {
    let (client, mut acceptor) = client();
    client.on_block(|_| true).await.unwrap();
    client.on_status(address(1), |_| true).await.unwrap();
    client.on_status(address(2), |_| true).await.unwrap();
    acceptor.accept().await;
    acceptor.accept().await;

    client.close().await;
    assert_eq!(client.connection_count().await, 0);
    assert!(client.subscriptions().is_empty());
    assert_eq!(
        client.on_block(|_| true).await.unwrap_err(),
        ClientError::ConnectionClosed
    );
}

#[tokio::test]
async fn blocked_handler_does_not_stall_readers() {
    let mut config = ClientConfig::new("ws://node.test/ws");
    config.max_in_flight_handlers = 1;
    let (client, mut acceptor) = client_with(config);
    let mut errors = client.errors().unwrap();
    let (alice, bob) = (address(1), address(2));
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Alice's handler holds the only slot until the gate is dropped.
    let (release, gate) = std::sync::mpsc::channel::<()>();
    let gate = std::sync::Mutex::new(gate);
    let (entered_tx, mut entered) = mpsc::unbounded_channel();
    let seen = tx.clone();
    client
        .on_confirmed_added(alice, move |_| {
            entered_tx.send(()).unwrap();
            let _ = gate.lock().unwrap().recv_timeout(Duration::from_secs(5));
            seen.send("alice").unwrap();
            true
        })
        .await
        .unwrap();
    let mut first = acceptor.accept().await;
    first.recv().await;

    client
        .on_confirmed_added(bob, move |_| {
            tx.send("bob").unwrap();
            true
        })
        .await
        .unwrap();
    let mut second = acceptor.accept().await;
    second.recv().await;

    first.send(transaction_frame("confirmedAdded", &alice));
    next(&mut entered).await;
    first.send(transaction_frame("confirmedAdded", &alice));
    first.send(json!({ "meta": { "channelName": "gossip" } }));
    second.send(transaction_frame("confirmedAdded", &bob));
    second.send(json!({ "meta": { "channelName": "chatter" } }));

    // Both readers keep classifying frames while the handler is stuck.
    let mut reported = Vec::new();
    for _ in 0..2 {
        let error = tokio::time::timeout(Duration::from_millis(500), errors.recv())
            .await
            .expect("reported while the handler is blocked")
            .unwrap();
        reported.push(error);
    }
    reported.sort_by_key(|error| error.to_string());
    assert_eq!(
        reported,
        vec![
            DispatchError::ProtocolMismatch("chatter".into()),
            DispatchError::ProtocolMismatch("gossip".into()),
        ]
    );

    // The bound still holds: bob waits for the slot.
    assert!(tokio::time::timeout(common::QUIET, rx.recv()).await.is_err());

    drop(release);
    let mut delivered = vec![next(&mut rx).await, next(&mut rx).await, next(&mut rx).await];
    delivered.sort_unstable();
    assert_eq!(delivered, ["alice", "alice", "bob"]);
}

#[tokio::test]
async fn connection_closed_by_node_is_not_reused() {
    let (client, mut acceptor) = client();
    let mut errors = client.errors().unwrap();
    let alice = address(1);

    client.on_block(|_| true).await.unwrap();
    client.on_status(alice, |_| true).await.unwrap();
    let mut socket = acceptor.accept().await;
    socket.recv().await;
    socket.recv().await;
    let uid = socket.uid.clone();
    drop(socket);

    assert_eq!(
        next(&mut errors).await,
        DispatchError::Transport {
            uid,
            reason: "closed by node".into()
        }
    );

    // The call that finds the dead socket fails and forgets what it served.
    assert_eq!(
        client.on_status(alice, |_| true).await.unwrap_err(),
        ClientError::ConnectionClosed
    );
    assert!(!client.is_subscribed(EventKind::Status, Some(alice)));
    assert!(!client.is_subscribed(EventKind::Block, None));
    assert_eq!(client.connection_count().await, 0);

    // The next one starts over on a fresh socket.
    client.on_status(alice, |_| true).await.unwrap();
    let mut fresh = acceptor.accept().await;
    assert_ne!(fresh.uid, "conn-1");
    assert_eq!(
        fresh.recv().await["subscribe"],
        format!("status/{}", alice.to_hex())
    );
    assert!(client.is_subscribed(EventKind::Status, Some(alice)));
}
