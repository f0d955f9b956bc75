//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] collects the envelope fields that every
//! variant shares, then wraps a body in `.build()`. It does not sign; that
//! happens in [`super::signing`], so construction stays testable without
//! key material.

use chrono::{DateTime, Utc};

use super::body::TransactionBody;
use super::envelope::TransactionEnvelope;
use super::Transaction;
use crate::config::DEFAULT_DEADLINE;
use crate::model::{Amount, Deadline, EntityVersion, NetworkType, PublicKey};

/// Fluent builder for unsigned [`Transaction`] values.
///
/// # Usage
///
/// ```rust,no_run
/// use catena_protocol::model::{Address, NetworkType, PublicKey, Amount};
/// use catena_protocol::transaction::{TransactionBuilder, TransactionBody};
/// use catena_protocol::transaction::transfer::{Message, TransferBody};
///
/// let tx = TransactionBuilder::new(NetworkType::MIJIN_TEST, PublicKey::from_bytes([1; 32]))
///     .max_fee(Amount::new(1_000))
///     .build(TransactionBody::Transfer(TransferBody {
///         recipient: Address::from_bytes([0x90; 25]),
///         mosaics: vec![],
///         message: Message::plain("hi"),
///     }));
/// assert!(!tx.envelope.is_signed());
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    network_type: NetworkType,
    signer: PublicKey,
    deadline: Option<Deadline>,
    max_fee: Amount,
    version: Option<EntityVersion>,
}

impl TransactionBuilder {
    /// Starts a builder for `signer` on `network_type`. The deadline
    /// defaults to two hours from the moment `.build()` runs.
    pub fn new(network_type: NetworkType, signer: PublicKey) -> Self {
        Self {
            network_type,
            signer,
            deadline: None,
            max_fee: Amount::default(),
            version: None,
        }
    }

    pub fn deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the deadline from an absolute instant.
    pub fn deadline_at(mut self, instant: DateTime<Utc>) -> Self {
        self.deadline = Some(Deadline::from_datetime(instant));
        self
    }

    pub fn max_fee(mut self, max_fee: Amount) -> Self {
        self.max_fee = max_fee;
        self
    }

    /// Overrides the variant's default entity version.
    pub fn version(mut self, version: EntityVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Wraps `body` in the collected envelope.
    pub fn build(self, body: TransactionBody) -> Transaction {
        let version = self
            .version
            .unwrap_or_else(|| body.entity_type().default_version());
        let mut envelope = TransactionEnvelope::new(self.network_type, version, self.signer);
        envelope.deadline = Some(
            self.deadline
                .unwrap_or_else(|| Deadline::after(DEFAULT_DEADLINE)),
        );
        envelope.max_fee = self.max_fee;
        Transaction::new(envelope, body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
