// Copyright (c) 2026 Catena Contributors. MIT License.
// See LICENSE for details.

//! # Catena Protocol: Client Library
//!
//! Client-side plumbing for Catena nodes: the transaction codec that turns
//! REST/websocket JSON into typed transactions and canonical binary, and the
//! event client that subscribes to a node's websocket channels.
//!
//! ## Architecture
//!
//! - **model**: fixed-size byte types, `u64` newtypes carried as `[lo, hi]`
//!   pairs, network types and deadlines.
//! - **codec**: the `FieldBuffer` and declarative `Schema` that every body
//!   layout goes through, in both directions.
//! - **transaction**: envelope extraction, the type registry, the 37 body
//!   variants, aggregates, building and signing.
//! - **receipt**: block receipts and their binary form.
//! - **ws**: subscriptions, connection routing and event dispatch.
//! - **config**: protocol constants and defaults.
//!
//! ## Example
//!
//! ```
//! use catena_protocol::transaction::Transaction;
//!
//! let json = r#"{
//!   "transaction": {
//!     "signer": "321DE652C4D3362FC2DDF7800F6582F4A10CFEA134B81F8AB6E4BE78BBA4D18E",
//!     "version": 2415932933,
//!     "type": 16724,
//!     "maxFee": [0, 0],
//!     "deadline": [1, 0],
//!     "recipient": "9050B9837EFAB4BBE8A4B9BB32D812F9885C00D8FC1650E142",
//!     "message": { "type": 0, "payload": "" },
//!     "mosaics": []
//!   }
//! }"#;
//! let tx = Transaction::from_json_str(json).unwrap();
//! assert_eq!(tx.envelope.network_type.0, 0x36);
//! assert_eq!(tx.encode().unwrap().len(), tx.size());
//! ```

pub mod codec;
pub mod config;
pub mod model;
pub mod receipt;
pub mod transaction;
pub mod ws;
