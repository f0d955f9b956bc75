//! The closed set of variant payloads.

use super::account::{
    AccountLinkBody, AccountPropertyAddressBody, AccountPropertyEntityTypeBody,
    AccountPropertyMosaicBody,
};
use super::aggregate::AggregateBody;
use super::contract::{ManualCallBody, ModifyContractBody};
use super::entity_type::EntityType;
use super::error::{DecodeError, EncodeError};
use super::exchange::{AddExchangeOfferBody, ExchangeOfferBody, RemoveExchangeOfferBody};
use super::liquidity::{CreateLiquidityProviderBody, ManualRateChangeBody};
use super::lock::{HashLockBody, SecretLockBody, SecretProofBody};
use super::metadata::{AccountMetadataBody, MosaicMetadataBody, NamespaceMetadataBody};
use super::mosaic::{
    ModifyMosaicLevyBody, MosaicDefinitionBody, MosaicSupplyChangeBody, RemoveMosaicLevyBody,
};
use super::multisig::ModifyMultisigAccountBody;
use super::namespace::{AddressAliasBody, MosaicAliasBody, RegisterNamespaceBody};
use super::storage::{
    DriveFileSystemBody, DriveFilesRewardBody, EndDriveBody, FilesDepositBody, JoinToDriveBody,
    PrepareDriveBody, StartDriveVerificationBody,
};
use super::transfer::TransferBody;
use super::upgrade::{BlockchainUpgradeBody, NetworkConfigBody};
use crate::codec::BodyCodec;

/// Declares [`TransactionBody`] with one variant per entity type and the
/// per-variant dispatch of the codec. Variant names match [`EntityType`].
macro_rules! transaction_bodies {
    ($($variant:ident($body:ty),)+) => {
        /// Variant-specific payload of a [`super::Transaction`].
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum TransactionBody {
            $($variant($body),)+
        }

        impl TransactionBody {
            pub fn entity_type(&self) -> EntityType {
                match self {
                    $(Self::$variant(_) => EntityType::$variant,)+
                }
            }

            /// Exact byte length of the encoded body.
            pub fn body_size(&self) -> usize {
                match self {
                    $(Self::$variant(body) => body.body_size(),)+
                }
            }

            pub fn encode_body(&self) -> Result<Vec<u8>, EncodeError> {
                match self {
                    $(Self::$variant(body) => body.encode_body(),)+
                }
            }

            /// Parses the body of a transaction whose header named `entity_type`.
            pub fn decode_body(entity_type: EntityType, bytes: &[u8]) -> Result<Self, DecodeError> {
                match entity_type {
                    $(EntityType::$variant => <$body as BodyCodec>::decode_body(bytes).map(Self::$variant),)+
                }
            }
        }
    };
}

transaction_bodies! {
    Transfer(TransferBody),
    RegisterNamespace(RegisterNamespaceBody),
    AddressAlias(AddressAliasBody),
    MosaicAlias(MosaicAliasBody),
    MosaicDefinition(MosaicDefinitionBody),
    MosaicSupplyChange(MosaicSupplyChangeBody),
    ModifyMosaicLevy(ModifyMosaicLevyBody),
    RemoveMosaicLevy(RemoveMosaicLevyBody),
    ModifyMultisigAccount(ModifyMultisigAccountBody),
    AggregateCompleted(AggregateBody),
    AggregateBonded(AggregateBody),
    HashLock(HashLockBody),
    SecretLock(SecretLockBody),
    SecretProof(SecretProofBody),
    AccountPropertyAddress(AccountPropertyAddressBody),
    AccountPropertyMosaic(AccountPropertyMosaicBody),
    AccountPropertyEntityType(AccountPropertyEntityTypeBody),
    AccountLink(AccountLinkBody),
    AccountMetadata(AccountMetadataBody),
    MosaicMetadata(MosaicMetadataBody),
    NamespaceMetadata(NamespaceMetadataBody),
    ModifyContract(ModifyContractBody),
    ManualCall(ManualCallBody),
    AddExchangeOffer(AddExchangeOfferBody),
    ExchangeOffer(ExchangeOfferBody),
    RemoveExchangeOffer(RemoveExchangeOfferBody),
    PrepareDrive(PrepareDriveBody),
    JoinToDrive(JoinToDriveBody),
    DriveFileSystem(DriveFileSystemBody),
    FilesDeposit(FilesDepositBody),
    EndDrive(EndDriveBody),
    DriveFilesReward(DriveFilesRewardBody),
    StartDriveVerification(StartDriveVerificationBody),
    CreateLiquidityProvider(CreateLiquidityProviderBody),
    ManualRateChange(ManualRateChangeBody),
    BlockchainUpgrade(BlockchainUpgradeBody),
    NetworkConfig(NetworkConfigBody),
}

impl TransactionBody {
    /// The aggregate payload, for either aggregate kind.
    pub fn as_aggregate(&self) -> Option<&AggregateBody> {
        match self {
            Self::AggregateCompleted(body) | Self::AggregateBonded(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_aggregate_mut(&mut self) -> Option<&mut AggregateBody> {
        match self {
            Self::AggregateCompleted(body) | Self::AggregateBonded(body) => Some(body),
            _ => None,
        }
    }
}
