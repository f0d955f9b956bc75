//! Shared fixtures for the integration tests: an in-memory node that speaks
//! the websocket frame protocol over `futures` channels, plus canned
//! transaction and event JSON.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc as chan;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use catena_protocol::model::Address;
use catena_protocol::ws::{ClientError, Connector, FrameSink, FrameStream};

/// Generous bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(2);

/// How long a test watches for a frame that must not arrive.
pub const QUIET: Duration = Duration::from_millis(150);

// ---------------------------------------------------------------------------
// In-memory transport
// ---------------------------------------------------------------------------

/// Node side of one in-memory socket.
pub struct ServerSocket {
    pub uid: String,
    from_client: chan::UnboundedReceiver<String>,
    to_client: chan::UnboundedSender<Result<String, ClientError>>,
}

impl ServerSocket {
    /// Next control frame the client sent, parsed.
    pub async fn recv(&mut self) -> Value {
        let text = tokio::time::timeout(WAIT, self.from_client.next())
            .await
            .expect("client frame in time")
            .expect("client socket open");
        serde_json::from_str(&text).expect("client frame is JSON")
    }

    /// Asserts the client sends nothing for a short while.
    pub async fn assert_silent(&mut self) {
        if let Ok(Some(frame)) = tokio::time::timeout(QUIET, self.from_client.next()).await {
            panic!("unexpected client frame: {frame}");
        }
    }

    pub fn send(&self, frame: Value) {
        self.to_client
            .unbounded_send(Ok(frame.to_string()))
            .expect("client reader alive");
    }

    pub fn send_raw(&self, text: &str) {
        self.to_client
            .unbounded_send(Ok(text.to_string()))
            .expect("client reader alive");
    }
}

/// Connector that hands every new socket's node side to the test.
pub struct MemoryConnector {
    greet: bool,
    opened: AtomicUsize,
    accepted: mpsc::UnboundedSender<ServerSocket>,
}

/// Receives the node side of sockets as the client opens them.
pub struct Acceptor(mpsc::UnboundedReceiver<ServerSocket>);

impl Acceptor {
    pub async fn accept(&mut self) -> ServerSocket {
        tokio::time::timeout(WAIT, self.0.recv())
            .await
            .expect("connection opened in time")
            .expect("connector alive")
    }

    /// Asserts no further socket is opened for a short while.
    pub async fn assert_no_connection(&mut self) {
        if let Ok(Some(socket)) = tokio::time::timeout(QUIET, self.0.recv()).await {
            panic!("unexpected connection {}", socket.uid);
        }
    }
}

impl MemoryConnector {
    /// A node that greets each socket with `{"uid": "conn-N"}`.
    pub fn new() -> (Arc<Self>, Acceptor) {
        Self::build(true)
    }

    /// A node that accepts sockets but never sends the greeting.
    pub fn silent() -> (Arc<Self>, Acceptor) {
        Self::build(false)
    }

    fn build(greet: bool) -> (Arc<Self>, Acceptor) {
        let (accepted, rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            greet,
            opened: AtomicUsize::new(0),
            accepted,
        });
        (connector, Acceptor(rx))
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, _url: &str) -> Result<(FrameSink, FrameStream), ClientError> {
        let n = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
        let uid = format!("conn-{n}");
        let (client_tx, server_rx) = chan::unbounded::<String>();
        let (server_tx, client_rx) = chan::unbounded::<Result<String, ClientError>>();

        if self.greet {
            server_tx
                .unbounded_send(Ok(json!({ "uid": uid }).to_string()))
                .map_err(|_| ClientError::ConnectionClosed)?;
        }
        self.accepted
            .send(ServerSocket {
                uid,
                from_client: server_rx,
                to_client: server_tx,
            })
            .map_err(|_| ClientError::ConnectionClosed)?;

        let sink = client_tx.sink_map_err(|_| ClientError::ConnectionClosed);
        Ok((Box::pin(sink), Box::pin(client_rx)))
    }
}

// ---------------------------------------------------------------------------
// Canned payloads
// ---------------------------------------------------------------------------

pub const SIGNER: &str = "321DE652C4D3362FC2DDF7800F6582F4A10CFEA134B81F8AB6E4BE78BBA4D18E";
pub const RECIPIENT: &str = "9050B9837EFAB4BBE8A4B9BB32D812F9885C00D8FC1650E142";
pub const HASH: &str = "A7A7AF0B4E2B2BFC6BA8C7D9D1E2C9C7D55A8C9E1B5F8E0C4C2A0E3F6B7D8E9F";

pub fn address(fill: u8) -> Address {
    Address::from_bytes([fill; 25])
}

/// A plain transfer of one mosaic on network 0x36 (version 0x90003605).
pub fn transfer_json() -> Value {
    json!({
        "transaction": {
            "signer": SIGNER,
            "version": 0x9000_3605_u64,
            "type": 16724,
            "maxFee": [100, 0],
            "deadline": [3_600_000, 0],
            "signature": "",
            "recipient": RECIPIENT,
            "message": { "type": 0, "payload": "68656C6C6F" },
            "mosaics": [{ "id": [0x5B55_E02E, 0x0B06_6A43], "amount": [1_000_000, 0] }]
        },
        "meta": {
            "height": [42, 0],
            "hash": HASH,
            "merkleComponentHash": HASH,
            "index": 0,
            "id": "5C7C06FF5CC1FE000176FA12"
        }
    })
}

/// `transfer_json` as it arrives on an address channel.
pub fn transaction_frame(channel: &str, address: &Address) -> Value {
    let mut frame = transfer_json();
    frame["meta"]["channelName"] = json!(channel);
    frame["meta"]["address"] = json!(address.to_hex());
    frame
}

pub fn block_frame(height: u32) -> Value {
    json!({
        "block": {
            "signature": "0".repeat(128),
            "signer": SIGNER,
            "version": 0x9000_3603_u64,
            "type": 33091,
            "height": [height, 0],
            "timestamp": [1_000, 0],
            "difficulty": [276_447_232, 23_283],
            "feeMultiplier": 0,
            "previousBlockHash": HASH,
            "blockTransactionsHash": HASH,
            "blockReceiptsHash": HASH,
            "stateHash": HASH,
            "beneficiary": SIGNER,
            "feeInterest": 1,
            "feeInterestDenominator": 1
        },
        "meta": {
            "hash": HASH,
            "generationHash": HASH,
            "numTransactions": 0,
            "channelName": "block"
        }
    })
}
