//! Numeric entity-type codes.
//!
//! Every wire transaction names its variant with a 16-bit code. The set is
//! closed: a code outside this enum is an unsupported transaction, never a
//! default.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DecodeError;
use crate::model::EntityVersion;

macro_rules! entity_types {
    ($($(#[$meta:meta])* $variant:ident = $code:literal, version $version:literal;)+) => {
        /// Discriminant of a transaction variant.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "u16", into = "u16")]
        #[repr(u16)]
        pub enum EntityType {
            $($(#[$meta])* $variant = $code,)+
        }

        impl EntityType {
            /// Every supported type, in declaration order.
            pub const ALL: &'static [EntityType] = &[$(EntityType::$variant,)+];

            /// Current body format version for this type.
            pub fn default_version(&self) -> EntityVersion {
                match self {
                    $(EntityType::$variant => EntityVersion($version),)+
                }
            }

            /// Variant name as used in logs.
            pub fn name(&self) -> &'static str {
                match self {
                    $(EntityType::$variant => stringify!($variant),)+
                }
            }
        }

        impl TryFrom<u16> for EntityType {
            type Error = DecodeError;

            fn try_from(code: u16) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok(EntityType::$variant),)+
                    other => Err(DecodeError::UnrecognizedType(other)),
                }
            }
        }
    };
}

entity_types! {
    /// Mosaic and message transfer.
    Transfer = 0x4154, version 3;
    /// Root or sub namespace registration.
    RegisterNamespace = 0x414E, version 2;
    /// Links a namespace to an address.
    AddressAlias = 0x424E, version 1;
    /// Links a namespace to a mosaic.
    MosaicAlias = 0x434E, version 1;
    /// Creates or redefines a mosaic.
    MosaicDefinition = 0x414D, version 3;
    /// Increases or decreases mosaic supply.
    MosaicSupplyChange = 0x424D, version 2;
    /// Sets the levy charged on mosaic transfers.
    ModifyMosaicLevy = 0x434D, version 1;
    /// Clears a mosaic levy.
    RemoveMosaicLevy = 0x444D, version 1;
    /// Adds or removes multisig cosignatories and thresholds.
    ModifyMultisigAccount = 0x4155, version 3;
    /// Aggregate whose cosignatures are all present.
    AggregateCompleted = 0x4141, version 3;
    /// Aggregate that collects cosignatures on the network.
    AggregateBonded = 0x4241, version 3;
    /// Locks funds against a bonded aggregate hash.
    HashLock = 0x4148, version 1;
    /// Locks funds behind a secret.
    SecretLock = 0x4152, version 1;
    /// Reveals the proof of a secret lock.
    SecretProof = 0x4252, version 1;
    /// Allow/block list of addresses.
    AccountPropertyAddress = 0x4150, version 1;
    /// Allow/block list of mosaics.
    AccountPropertyMosaic = 0x4250, version 1;
    /// Allow/block list of transaction types.
    AccountPropertyEntityType = 0x4350, version 1;
    /// Links a remote (delegated harvesting) key.
    AccountLink = 0x414C, version 2;
    /// Metadata attached to an account.
    AccountMetadata = 0x413F, version 1;
    /// Metadata attached to a mosaic.
    MosaicMetadata = 0x423F, version 1;
    /// Metadata attached to a namespace.
    NamespaceMetadata = 0x433F, version 1;
    /// Creates or updates a contract's participants.
    ModifyContract = 0x4157, version 3;
    /// Manually calls a deployed contract function.
    ManualCall = 0x4160, version 1;
    /// Publishes exchange offers.
    AddExchangeOffer = 0x415D, version 4;
    /// Accepts exchange offers.
    ExchangeOffer = 0x425D, version 2;
    /// Withdraws exchange offers.
    RemoveExchangeOffer = 0x435D, version 2;
    /// Creates a storage drive.
    PrepareDrive = 0x415A, version 3;
    /// Joins a replicator to a drive.
    JoinToDrive = 0x425A, version 1;
    /// Applies file system changes to a drive.
    DriveFileSystem = 0x435A, version 1;
    /// Deposits for new files on a drive.
    FilesDeposit = 0x445A, version 1;
    /// Closes a drive.
    EndDrive = 0x455A, version 1;
    /// Rewards replicators for uploads.
    DriveFilesReward = 0x465A, version 1;
    /// Starts a drive verification round.
    StartDriveVerification = 0x475A, version 1;
    /// Creates a liquidity provider for a mosaic.
    CreateLiquidityProvider = 0x4169, version 1;
    /// Manually shifts a liquidity provider's balances.
    ManualRateChange = 0x4269, version 1;
    /// Schedules a blockchain software upgrade.
    BlockchainUpgrade = 0x4158, version 1;
    /// Schedules a network configuration change.
    NetworkConfig = 0x4159, version 1;
}

impl EntityType {
    /// Raw wire code.
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Aggregates carry inner transactions and cannot nest.
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::AggregateCompleted | Self::AggregateBonded)
    }
}

impl From<EntityType> for u16 {
    fn from(entity_type: EntityType) -> Self {
        entity_type.code()
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
