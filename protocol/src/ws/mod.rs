//! # Event subscriptions
//!
//! Websocket client for a node's event channels. An [`EventClient`] owns a
//! [`SubscriptionRegistry`] of handlers keyed by (channel, address) and a
//! [`ConnectionRouter`] that decides which socket carries each address.
//!
//! ## Frame flow
//!
//! ```text
//!  node ──frame──► reader task ──parse_frame──► (SubscriptionKey, Event)
//!                                                       │
//!                                   registry snapshot ◄─┘
//!                                          │
//!                                      job queue
//!                                          │
//!      dispatcher task ◄── semaphore permit┘──► spawn ──► handler (blocking pool)
//!                                                              │
//!                                          returns false ──► retire ──► unsubscribe
//! ```
//!
//! The reader never waits on handlers, and failures on the dispatch path
//! never stop it. They are logged and sent to the channel returned by
//! [`EventClient::errors`].

mod client;
mod config;
mod connection;
mod dispatch;
mod error;
mod event;
mod registry;
mod router;
mod transport;

pub use client::EventClient;
pub use config::{ClientConfig, UnsubscribePolicy};
pub use connection::Connection;
pub use error::{ClientError, DispatchError};
pub use event::{
    parse_frame, BlockEvent, BlockInfo, BlockMeta, CosignatureEvent, Event, EventKind, StatusEvent,
    SubscriptionKey,
};
pub use registry::{Handler, HandlerId, SubscriptionRegistry};
pub use router::ConnectionRouter;
pub use transport::{Connector, FrameSink, FrameStream, WebSocketConnector};
