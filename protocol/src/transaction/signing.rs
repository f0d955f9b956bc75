//! Transaction signing with Ed25519 keypairs.
//!
//! Signing is a separate step from building because the keypair may not be
//! available at construction time (hardware wallet, remote signer). The
//! signed data is the network's generation hash followed by the canonical
//! payload from byte 100 on, which skips the size, signature and signer
//! fields. A transaction hash additionally covers the first half of the
//! signature and the signer key.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use sha3::{Digest, Sha3_256};
use thiserror::Error;

use super::aggregate::Cosignature;
use super::error::EncodeError;
use super::Transaction;
use crate::config::{
    HASH_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH, SIGNED_DATA_OFFSET, TRANSACTION_HEADER_SIZE,
};
use crate::model::{Hash256, PublicKey, Signature};

/// Errors from key handling and signing.
///
/// Messages never carry key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    #[error("invalid secret key: expected 32 hex-encoded bytes")]
    InvalidSecretKey,

    #[error("payload of {0} bytes is shorter than a transaction header")]
    PayloadTooShort(usize),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// An Ed25519 signing keypair.
///
/// Deliberately not `Serialize`: exporting a secret key goes through
/// [`KeyPair::secret_hex`].
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generates a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Loads a keypair from a 64-character hex secret key.
    pub fn from_hex(text: &str) -> Result<Self, SigningError> {
        let bytes = hex::decode(text.trim()).map_err(|_| SigningError::InvalidSecretKey)?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| SigningError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_bytes(self.signing_key.verifying_key().to_bytes())
    }

    pub fn secret_hex(&self) -> String {
        hex::encode_upper(self.signing_key.to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from_bytes(self.signing_key.sign(message).to_bytes())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Checks `signature` over `message` against `public_key`. Keys that are not
/// valid curve points verify nothing.
pub fn verify_signature(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(public_key.as_bytes()) else {
        return false;
    };
    key.verify(message, &DalekSignature::from_bytes(signature.as_bytes()))
        .is_ok()
}

/// A signed transaction ready for announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub payload: Vec<u8>,
    pub hash: Hash256,
}

fn signing_data(generation_hash: &Hash256, payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(HASH_LENGTH + payload.len() - SIGNED_DATA_OFFSET);
    data.extend_from_slice(generation_hash.as_bytes());
    data.extend_from_slice(&payload[SIGNED_DATA_OFFSET..]);
    data
}

/// Signs `tx` in place for the network identified by `generation_hash`.
///
/// The signer becomes the keypair's public key, the signature is attached
/// (and handed down to aggregate inner transactions), and the signed
/// payload is returned with its hash.
pub fn sign_transaction(
    tx: &mut Transaction,
    keypair: &KeyPair,
    generation_hash: &Hash256,
) -> Result<SignedTransaction, SigningError> {
    tx.envelope.signer.public_key = keypair.public_key();
    let mut payload = tx.encode()?;

    let signature = keypair.sign(&signing_data(generation_hash, &payload));
    payload[4..4 + SIGNATURE_LENGTH].copy_from_slice(signature.as_bytes());
    tx.set_signature(signature);

    let hash = transaction_hash(&payload, generation_hash)?;
    Ok(SignedTransaction { payload, hash })
}

/// SHA3-256 of `signature[..32] || signer || generation_hash ||
/// payload[100..]`.
pub fn transaction_hash(payload: &[u8], generation_hash: &Hash256) -> Result<Hash256, SigningError> {
    if payload.len() < TRANSACTION_HEADER_SIZE {
        return Err(SigningError::PayloadTooShort(payload.len()));
    }
    let mut hasher = Sha3_256::new();
    hasher.update(&payload[4..4 + 32]);
    hasher.update(&payload[4 + SIGNATURE_LENGTH..4 + SIGNATURE_LENGTH + PUBLIC_KEY_LENGTH]);
    hasher.update(generation_hash.as_bytes());
    hasher.update(&payload[SIGNED_DATA_OFFSET..]);
    Ok(Hash256::from_bytes(hasher.finalize().into()))
}

/// Checks the signature carried in a signed payload.
pub fn verify_transaction(payload: &[u8], generation_hash: &Hash256) -> Result<bool, SigningError> {
    if payload.len() < TRANSACTION_HEADER_SIZE {
        return Err(SigningError::PayloadTooShort(payload.len()));
    }
    let signature = Signature::from_slice(&payload[4..4 + SIGNATURE_LENGTH])
        .map_err(|_| SigningError::PayloadTooShort(payload.len()))?;
    let signer = PublicKey::from_slice(&payload[4 + SIGNATURE_LENGTH..SIGNED_DATA_OFFSET])
        .map_err(|_| SigningError::PayloadTooShort(payload.len()))?;
    Ok(verify_signature(
        &signer,
        &signing_data(generation_hash, payload),
        &signature,
    ))
}

/// Cosigns the aggregate identified by `transaction_hash`.
pub fn cosign(keypair: &KeyPair, transaction_hash: &Hash256) -> Cosignature {
    Cosignature {
        signer: keypair.public_key(),
        signature: keypair.sign(transaction_hash.as_bytes()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
