//! Type registry: entity type to JSON decoder.
//!
//! The registry is a plain `match` compiled into the binary. It holds no
//! state, so it is safe to call from any number of tasks at once.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::aggregate::decode_aggregate_json;
use super::body::TransactionBody;
use super::entity_type::EntityType;
use super::envelope::{extract_envelope, TransactionEnvelope};
use super::error::DecodeError;
use super::Transaction;

/// Builds one variant from its JSON object and an already extracted
/// envelope.
pub type DecodeFn = fn(&Value, TransactionEnvelope) -> Result<Transaction, DecodeError>;

fn body_from_json<T: DeserializeOwned>(entity_type: EntityType, value: &Value) -> Result<T, DecodeError> {
    T::deserialize(value).map_err(|e| DecodeError::MalformedBody {
        entity_type,
        reason: e.to_string(),
    })
}

/// Returns the decoder for `entity_type`.
pub fn decoder_for(entity_type: EntityType) -> DecodeFn {
    macro_rules! plain {
        ($variant:ident) => {{
            fn decode(value: &Value, envelope: TransactionEnvelope) -> Result<Transaction, DecodeError> {
                let body = body_from_json(EntityType::$variant, value)?;
                Ok(Transaction::new(envelope, TransactionBody::$variant(body)))
            }
            decode as DecodeFn
        }};
    }

    fn aggregate_completed(value: &Value, envelope: TransactionEnvelope) -> Result<Transaction, DecodeError> {
        decode_aggregate_json(EntityType::AggregateCompleted, value, envelope)
    }

    fn aggregate_bonded(value: &Value, envelope: TransactionEnvelope) -> Result<Transaction, DecodeError> {
        decode_aggregate_json(EntityType::AggregateBonded, value, envelope)
    }

    match entity_type {
        EntityType::Transfer => plain!(Transfer),
        EntityType::RegisterNamespace => plain!(RegisterNamespace),
        EntityType::AddressAlias => plain!(AddressAlias),
        EntityType::MosaicAlias => plain!(MosaicAlias),
        EntityType::MosaicDefinition => plain!(MosaicDefinition),
        EntityType::MosaicSupplyChange => plain!(MosaicSupplyChange),
        EntityType::ModifyMosaicLevy => plain!(ModifyMosaicLevy),
        EntityType::RemoveMosaicLevy => plain!(RemoveMosaicLevy),
        EntityType::ModifyMultisigAccount => plain!(ModifyMultisigAccount),
        EntityType::AggregateCompleted => aggregate_completed,
        EntityType::AggregateBonded => aggregate_bonded,
        EntityType::HashLock => plain!(HashLock),
        EntityType::SecretLock => plain!(SecretLock),
        EntityType::SecretProof => plain!(SecretProof),
        EntityType::AccountPropertyAddress => plain!(AccountPropertyAddress),
        EntityType::AccountPropertyMosaic => plain!(AccountPropertyMosaic),
        EntityType::AccountPropertyEntityType => plain!(AccountPropertyEntityType),
        EntityType::AccountLink => plain!(AccountLink),
        EntityType::AccountMetadata => plain!(AccountMetadata),
        EntityType::MosaicMetadata => plain!(MosaicMetadata),
        EntityType::NamespaceMetadata => plain!(NamespaceMetadata),
        EntityType::ModifyContract => plain!(ModifyContract),
        EntityType::ManualCall => plain!(ManualCall),
        EntityType::AddExchangeOffer => plain!(AddExchangeOffer),
        EntityType::ExchangeOffer => plain!(ExchangeOffer),
        EntityType::RemoveExchangeOffer => plain!(RemoveExchangeOffer),
        EntityType::PrepareDrive => plain!(PrepareDrive),
        EntityType::JoinToDrive => plain!(JoinToDrive),
        EntityType::DriveFileSystem => plain!(DriveFileSystem),
        EntityType::FilesDeposit => plain!(FilesDeposit),
        EntityType::EndDrive => plain!(EndDrive),
        EntityType::DriveFilesReward => plain!(DriveFilesReward),
        EntityType::StartDriveVerification => plain!(StartDriveVerification),
        EntityType::CreateLiquidityProvider => plain!(CreateLiquidityProvider),
        EntityType::ManualRateChange => plain!(ManualRateChange),
        EntityType::BlockchainUpgrade => plain!(BlockchainUpgrade),
        EntityType::NetworkConfig => plain!(NetworkConfig),
    }
}

/// Decodes a `{"transaction": {..}, "meta": {..}}` object.
pub fn decode_transaction(value: &Value) -> Result<Transaction, DecodeError> {
    let transaction = value
        .get("transaction")
        .ok_or_else(|| DecodeError::MalformedEnvelope("missing `transaction` object".into()))?;
    let (entity_type, envelope) = extract_envelope(transaction, value.get("meta"))?;
    decoder_for(entity_type)(transaction, envelope)
}

/// Parses `text` as JSON and decodes it with [`decode_transaction`].
pub fn decode_transaction_str(text: &str) -> Result<Transaction, DecodeError> {
    let value: Value = serde_json::from_str(text)?;
    decode_transaction(&value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn every_type_has_a_decoder() {
        for entity_type in EntityType::ALL {
            let _ = decoder_for(*entity_type);
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        let value = json!({
            "transaction": { "type": 0xFFFF, "version": 1, "signer": "00".repeat(32) }
        });
        assert_eq!(
            decode_transaction(&value).unwrap_err(),
            DecodeError::UnrecognizedType(0xFFFF)
        );
    }

    #[test]
    fn missing_transaction_object_is_malformed() {
        assert!(matches!(
            decode_transaction(&json!({ "meta": {} })),
            Err(DecodeError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn body_errors_name_the_variant() {
        let value = json!({
            "transaction": {
                "type": EntityType::HashLock.code(),
                "version": 1,
                "signer": "00".repeat(32),
                "duration": [1, 0]
            }
        });
        match decode_transaction(&value) {
            Err(DecodeError::MalformedBody { entity_type, .. }) => {
                assert_eq!(entity_type, EntityType::HashLock)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn invalid_text_is_a_json_error() {
        assert!(matches!(
            decode_transaction_str("{not json"),
            Err(DecodeError::Json(_))
        ));
    }
}
