//! Error types for the event client.
//!
//! [`ClientError`] is returned to callers of the client API. [`DispatchError`]
//! never is: the reader loop reports it on the client's error channel and
//! keeps going.

use std::time::Duration;

use thiserror::Error;

use super::event::EventKind;
use super::registry::HandlerId;
use crate::transaction::DecodeError;

/// Failures of client operations: connecting, subscribing, unsubscribing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("no uid announced within {0:?}")]
    HandshakeTimeout(Duration),

    #[error("invalid handshake frame: {0}")]
    Handshake(String),

    #[error("connection closed")]
    ConnectionClosed,

    /// Operation on a subscription that has no active handlers.
    #[error("no active handlers for `{0}`")]
    SubscriptionState(String),

    /// Block subscriptions take no address; every other channel needs one.
    #[error("invalid subscription: {0}")]
    InvalidSubscription(String),
}

/// Failures inside the dispatch loop of one connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The frame named a channel this client does not know.
    #[error("unknown channel `{0}`")]
    ProtocolMismatch(String),

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("failed to decode {channel} payload: {source}")]
    Decode {
        channel: EventKind,
        #[source]
        source: DecodeError,
    },

    #[error("handler {handler} for `{path}` panicked: {message}")]
    HandlerPanicked {
        path: String,
        handler: HandlerId,
        message: String,
    },

    #[error("connection {uid}: {reason}")]
    Transport { uid: String, reason: String },
}
