//! Event channels, subscription keys, and inbound frame classification.
//!
//! Every inbound frame names its channel in `meta.channelName`. Frames on
//! address channels also carry `meta.address`; block frames carry none. The
//! payload shape depends on the channel:
//!
//! ```text
//! block                                       {"block": {..}, "meta": {..}}
//! confirmedAdded, unconfirmedAdded,
//! partialAdded                                {"transaction": {..}, "meta": {..}}
//! unconfirmedRemoved, partialRemoved          {"meta": {"hash": ..}}
//! status                                      {"hash", "status", "deadline"}
//! cosignature                                 {"parentHash", "signature", "signer"}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::DispatchError;
use crate::model::{
    extract_network_type, extract_version, uint64, Address, Deadline, EntityVersion, Hash256,
    Height, NetworkType, PublicKey, Signature,
};
use crate::transaction::{decode_transaction, Transaction};

/// One push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Block,
    ConfirmedAdded,
    UnconfirmedAdded,
    UnconfirmedRemoved,
    Status,
    PartialAdded,
    PartialRemoved,
    Cosignature,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Block,
        EventKind::ConfirmedAdded,
        EventKind::UnconfirmedAdded,
        EventKind::UnconfirmedRemoved,
        EventKind::Status,
        EventKind::PartialAdded,
        EventKind::PartialRemoved,
        EventKind::Cosignature,
    ];

    /// Channel name as it appears in frames and subscription paths.
    pub fn channel_name(&self) -> &'static str {
        match self {
            EventKind::Block => "block",
            EventKind::ConfirmedAdded => "confirmedAdded",
            EventKind::UnconfirmedAdded => "unconfirmedAdded",
            EventKind::UnconfirmedRemoved => "unconfirmedRemoved",
            EventKind::Status => "status",
            EventKind::PartialAdded => "partialAdded",
            EventKind::PartialRemoved => "partialRemoved",
            EventKind::Cosignature => "cosignature",
        }
    }

    pub fn from_channel_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.channel_name() == name)
    }

    /// Whether subscriptions on this channel are scoped to an address.
    pub fn is_address_scoped(&self) -> bool {
        !matches!(self, EventKind::Block)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.channel_name())
    }
}

/// A (channel, address) pair. Block subscriptions have no address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionKey {
    pub kind: EventKind,
    pub address: Option<Address>,
}

impl SubscriptionKey {
    pub fn block() -> Self {
        Self {
            kind: EventKind::Block,
            address: None,
        }
    }

    pub fn for_address(kind: EventKind, address: Address) -> Self {
        Self {
            kind,
            address: Some(address),
        }
    }

    /// Subscription path sent to the node: `block` or `<channel>/<address>`.
    pub fn path(&self) -> String {
        match self.address {
            Some(address) => format!("{}/{}", self.kind.channel_name(), address.to_hex()),
            None => self.kind.channel_name().to_string(),
        }
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Header of a newly confirmed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    pub signature: Signature,
    pub signer: PublicKey,
    /// Packed network and version, as for transactions.
    pub version: u64,
    #[serde(rename = "type")]
    pub entity_type: u16,
    pub height: Height,
    /// Milliseconds since the network epoch.
    #[serde(with = "uint64::pair")]
    pub timestamp: u64,
    #[serde(with = "uint64::pair")]
    pub difficulty: u64,
    #[serde(default)]
    pub fee_multiplier: u32,
    pub previous_block_hash: Hash256,
    pub block_transactions_hash: Hash256,
    #[serde(default)]
    pub block_receipts_hash: Option<Hash256>,
    #[serde(default)]
    pub state_hash: Option<Hash256>,
    #[serde(default)]
    pub beneficiary: Option<PublicKey>,
    #[serde(default)]
    pub fee_interest: u32,
    #[serde(default)]
    pub fee_interest_denominator: u32,
}

impl BlockInfo {
    pub fn network_type(&self) -> NetworkType {
        extract_network_type(self.version)
    }

    pub fn entity_version(&self) -> EntityVersion {
        extract_version(self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockMeta {
    pub hash: Hash256,
    pub generation_hash: Hash256,
    #[serde(default)]
    pub num_transactions: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEvent {
    pub block: BlockInfo,
    pub meta: BlockMeta,
}

/// A transaction the node rejected, with the reason code text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub hash: Hash256,
    pub status: String,
    #[serde(default)]
    pub deadline: Option<Deadline>,
}

/// A cosignature added to a bonded aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosignatureEvent {
    pub parent_hash: Hash256,
    pub signature: Signature,
    pub signer: PublicKey,
}

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Block(Box<BlockEvent>),
    ConfirmedAdded(Transaction),
    UnconfirmedAdded(Transaction),
    UnconfirmedRemoved(Hash256),
    Status(StatusEvent),
    PartialAdded(Transaction),
    PartialRemoved(Hash256),
    Cosignature(CosignatureEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Block(_) => EventKind::Block,
            Event::ConfirmedAdded(_) => EventKind::ConfirmedAdded,
            Event::UnconfirmedAdded(_) => EventKind::UnconfirmedAdded,
            Event::UnconfirmedRemoved(_) => EventKind::UnconfirmedRemoved,
            Event::Status(_) => EventKind::Status,
            Event::PartialAdded(_) => EventKind::PartialAdded,
            Event::PartialRemoved(_) => EventKind::PartialRemoved,
            Event::Cosignature(_) => EventKind::Cosignature,
        }
    }

    /// The transaction carried by `*Added` events.
    pub fn transaction(&self) -> Option<&Transaction> {
        match self {
            Event::ConfirmedAdded(tx) | Event::UnconfirmedAdded(tx) | Event::PartialAdded(tx) => {
                Some(tx)
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Frame classification
// ---------------------------------------------------------------------------

/// Classifies and decodes one inbound text frame.
pub fn parse_frame(text: &str) -> Result<(SubscriptionKey, Event), DispatchError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DispatchError::MalformedFrame(e.to_string()))?;
    let meta = value
        .get("meta")
        .ok_or_else(|| DispatchError::MalformedFrame("missing `meta`".into()))?;
    let channel = meta
        .get("channelName")
        .and_then(Value::as_str)
        .ok_or_else(|| DispatchError::MalformedFrame("missing `meta.channelName`".into()))?;
    let kind = EventKind::from_channel_name(channel)
        .ok_or_else(|| DispatchError::ProtocolMismatch(channel.to_string()))?;

    let key = if kind.is_address_scoped() {
        let address = meta
            .get("address")
            .and_then(Value::as_str)
            .ok_or_else(|| DispatchError::MalformedFrame(format!("{kind} frame without `meta.address`")))?;
        let address = Address::from_hex(address)
            .map_err(|e| DispatchError::MalformedFrame(format!("meta.address: {e}")))?;
        SubscriptionKey::for_address(kind, address)
    } else {
        SubscriptionKey::block()
    };

    let event = match kind {
        EventKind::Block => Event::Block(Box::new(payload(kind, &value)?)),
        EventKind::ConfirmedAdded => Event::ConfirmedAdded(transaction(kind, &value)?),
        EventKind::UnconfirmedAdded => Event::UnconfirmedAdded(transaction(kind, &value)?),
        EventKind::PartialAdded => Event::PartialAdded(transaction(kind, &value)?),
        EventKind::UnconfirmedRemoved => Event::UnconfirmedRemoved(removed_hash(meta)?),
        EventKind::PartialRemoved => Event::PartialRemoved(removed_hash(meta)?),
        EventKind::Status => Event::Status(payload(kind, &value)?),
        EventKind::Cosignature => Event::Cosignature(payload(kind, &value)?),
    };
    Ok((key, event))
}

fn payload<T: for<'de> Deserialize<'de>>(kind: EventKind, value: &Value) -> Result<T, DispatchError> {
    T::deserialize(value).map_err(|e| DispatchError::MalformedFrame(format!("{kind} payload: {e}")))
}

fn transaction(kind: EventKind, value: &Value) -> Result<Transaction, DispatchError> {
    decode_transaction(value).map_err(|source| DispatchError::Decode {
        channel: kind,
        source,
    })
}

fn removed_hash(meta: &Value) -> Result<Hash256, DispatchError> {
    meta.get("hash")
        .and_then(Value::as_str)
        .ok_or_else(|| DispatchError::MalformedFrame("missing `meta.hash`".into()))
        .and_then(|hash| {
            Hash256::from_hex(hash).map_err(|e| DispatchError::MalformedFrame(format!("meta.hash: {e}")))
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn address() -> Address {
        Address::from_bytes([0x90; 25])
    }

    #[test]
    fn paths() {
        assert_eq!(SubscriptionKey::block().path(), "block");
        assert_eq!(
            SubscriptionKey::for_address(EventKind::Status, address()).path(),
            format!("status/{}", "90".repeat(25))
        );
    }

    #[test]
    fn channel_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_channel_name(kind.channel_name()), Some(kind));
        }
        assert_eq!(EventKind::from_channel_name("blocks"), None);
    }

    #[test]
    fn unknown_channel_is_a_protocol_mismatch() {
        let frame = json!({ "meta": { "channelName": "gossip" } }).to_string();
        assert_eq!(
            parse_frame(&frame).unwrap_err(),
            DispatchError::ProtocolMismatch("gossip".into())
        );
    }

    #[test]
    fn removed_frames_carry_the_hash() {
        let frame = json!({
            "meta": {
                "channelName": "unconfirmedRemoved",
                "address": address().to_hex(),
                "hash": "AB".repeat(32),
            }
        })
        .to_string();
        let (key, event) = parse_frame(&frame).unwrap();
        assert_eq!(key, SubscriptionKey::for_address(EventKind::UnconfirmedRemoved, address()));
        assert_eq!(event, Event::UnconfirmedRemoved(Hash256::from_bytes([0xAB; 32])));
    }

    #[test]
    fn address_channels_need_an_address() {
        let frame = json!({
            "hash": "AB".repeat(32),
            "status": "Failure_Core_Insufficient_Balance",
            "meta": { "channelName": "status" }
        })
        .to_string();
        assert!(matches!(parse_frame(&frame), Err(DispatchError::MalformedFrame(_))));
    }

    #[test]
    fn status_frame() {
        let frame = json!({
            "hash": "AB".repeat(32),
            "status": "Failure_Core_Insufficient_Balance",
            "deadline": [1, 0],
            "meta": { "channelName": "status", "address": address().to_hex() }
        })
        .to_string();
        let (_, event) = parse_frame(&frame).unwrap();
        match event {
            Event::Status(status) => {
                assert_eq!(status.status, "Failure_Core_Insufficient_Balance");
                assert_eq!(status.deadline.map(|d| d.to_raw()), Some(1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn undecodable_transaction_names_the_channel() {
        let frame = json!({
            "transaction": { "type": 0xFFFF, "version": 1, "signer": "00".repeat(32) },
            "meta": { "channelName": "confirmedAdded", "address": address().to_hex() }
        })
        .to_string();
        assert!(matches!(
            parse_frame(&frame),
            Err(DispatchError::Decode {
                channel: EventKind::ConfirmedAdded,
                ..
            })
        ));
    }
}
