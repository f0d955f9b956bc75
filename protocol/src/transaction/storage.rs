//! Storage drive transactions.

use serde::{Deserialize, Serialize};

use super::common::read_rows;
use super::error::{DecodeError, EncodeError};
use crate::codec::{BodyCodec, FieldBuffer, Length, Schema, SchemaAttribute};
use crate::config::{HASH_LENGTH, PUBLIC_KEY_LENGTH};
use crate::model::{uint64, Amount, BlockDuration, Hash256, PublicKey};

/// Generates a body that is nothing but the drive key.
macro_rules! drive_key_body {
    ($(#[$meta:meta])* $name:ident, $schema:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            pub drive_key: PublicKey,
        }

        static $schema: Schema = Schema {
            fields: &[SchemaAttribute::bytes("driveKey", PUBLIC_KEY_LENGTH)],
        };

        impl BodyCodec for $name {
            fn body_size(&self) -> usize {
                PUBLIC_KEY_LENGTH
            }

            fn schema() -> &'static Schema {
                &$schema
            }

            fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
                fields.put_bytes("driveKey", self.drive_key.as_bytes());
                Ok(())
            }

            fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
                Ok(Self {
                    drive_key: PublicKey::from_bytes(fields.array("driveKey")?),
                })
            }
        }
    };
}

drive_key_body!(
    /// Body of [`super::EntityType::JoinToDrive`].
    JoinToDriveBody,
    JOIN_TO_DRIVE_SCHEMA
);
drive_key_body!(
    /// Body of [`super::EntityType::EndDrive`].
    EndDriveBody,
    END_DRIVE_SCHEMA
);
drive_key_body!(
    /// Body of [`super::EntityType::StartDriveVerification`].
    StartDriveVerificationBody,
    START_DRIVE_VERIFICATION_SCHEMA
);

// ---------------------------------------------------------------------------
// PrepareDrive
// ---------------------------------------------------------------------------

/// Body of [`super::EntityType::PrepareDrive`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareDriveBody {
    pub owner: PublicKey,
    pub duration: BlockDuration,
    pub billing_period: BlockDuration,
    pub billing_price: Amount,
    #[serde(with = "uint64::pair")]
    pub drive_size: u64,
    pub replicas: u16,
    pub min_replicators: u16,
    pub percent_approvers: u8,
}

static PREPARE_DRIVE_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::bytes("owner", PUBLIC_KEY_LENGTH),
        SchemaAttribute::uint64("duration"),
        SchemaAttribute::uint64("billingPeriod"),
        SchemaAttribute::uint64("billingPrice"),
        SchemaAttribute::uint64("driveSize"),
        SchemaAttribute::scalar("replicas", 2),
        SchemaAttribute::scalar("minReplicators", 2),
        SchemaAttribute::scalar("percentApprovers", 1),
    ],
};

impl BodyCodec for PrepareDriveBody {
    fn body_size(&self) -> usize {
        PUBLIC_KEY_LENGTH + 8 * 4 + 2 + 2 + 1
    }

    fn schema() -> &'static Schema {
        &PREPARE_DRIVE_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_bytes("owner", self.owner.as_bytes())
            .put_u64("duration", self.duration.value())
            .put_u64("billingPeriod", self.billing_period.value())
            .put_u64("billingPrice", self.billing_price.value())
            .put_u64("driveSize", self.drive_size)
            .put_u16("replicas", self.replicas)
            .put_u16("minReplicators", self.min_replicators)
            .put_u8("percentApprovers", self.percent_approvers);
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            owner: PublicKey::from_bytes(fields.array("owner")?),
            duration: BlockDuration::new(fields.u64("duration")?),
            billing_period: BlockDuration::new(fields.u64("billingPeriod")?),
            billing_price: Amount::new(fields.u64("billingPrice")?),
            drive_size: fields.u64("driveSize")?,
            replicas: fields.u16("replicas")?,
            min_replicators: fields.u16("minReplicators")?,
            percent_approvers: fields.u8("percentApprovers")?,
        })
    }
}

// ---------------------------------------------------------------------------
// DriveFileSystem
// ---------------------------------------------------------------------------

/// A file added to or removed from a drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAction {
    pub file_hash: Hash256,
    #[serde(with = "uint64::pair")]
    pub file_size: u64,
}

/// Body of [`super::EntityType::DriveFileSystem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFileSystemBody {
    pub drive_key: PublicKey,
    pub root_hash: Hash256,
    pub xor_root_hash: Hash256,
    #[serde(default)]
    pub add_actions: Vec<FileAction>,
    #[serde(default)]
    pub remove_actions: Vec<FileAction>,
}

static FILE_ACTION_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::bytes("fileHash", HASH_LENGTH),
        SchemaAttribute::uint64("fileSize"),
    ],
};

const FILE_ACTION_SIZE: usize = HASH_LENGTH + 8;

static DRIVE_FILE_SYSTEM_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::bytes("driveKey", PUBLIC_KEY_LENGTH),
        SchemaAttribute::bytes("rootHash", HASH_LENGTH),
        SchemaAttribute::bytes("xorRootHash", HASH_LENGTH),
        SchemaAttribute::scalar("addActionsCount", 2),
        SchemaAttribute::scalar("removeActionsCount", 2),
        SchemaAttribute::table_array("addActions", &FILE_ACTION_SCHEMA, Length::Field("addActionsCount")),
        SchemaAttribute::table_array(
            "removeActions",
            &FILE_ACTION_SCHEMA,
            Length::Field("removeActionsCount"),
        ),
    ],
};

fn file_action_fields(action: &FileAction) -> FieldBuffer {
    let mut row = FieldBuffer::new();
    row.put_bytes("fileHash", action.file_hash.as_bytes())
        .put_u64("fileSize", action.file_size);
    row
}

fn read_file_action(row: &FieldBuffer) -> Result<FileAction, DecodeError> {
    Ok(FileAction {
        file_hash: Hash256::from_bytes(row.array("fileHash")?),
        file_size: row.u64("fileSize")?,
    })
}

impl BodyCodec for DriveFileSystemBody {
    fn body_size(&self) -> usize {
        PUBLIC_KEY_LENGTH
            + HASH_LENGTH * 2
            + 2
            + 2
            + FILE_ACTION_SIZE * (self.add_actions.len() + self.remove_actions.len())
    }

    fn schema() -> &'static Schema {
        &DRIVE_FILE_SYSTEM_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_bytes("driveKey", self.drive_key.as_bytes())
            .put_bytes("rootHash", self.root_hash.as_bytes())
            .put_bytes("xorRootHash", self.xor_root_hash.as_bytes())
            .put_count("addActionsCount", 2, self.add_actions.len())?
            .put_count("removeActionsCount", 2, self.remove_actions.len())?
            .put_table_array("addActions", self.add_actions.iter().map(file_action_fields).collect())
            .put_table_array(
                "removeActions",
                self.remove_actions.iter().map(file_action_fields).collect(),
            );
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            drive_key: PublicKey::from_bytes(fields.array("driveKey")?),
            root_hash: Hash256::from_bytes(fields.array("rootHash")?),
            xor_root_hash: Hash256::from_bytes(fields.array("xorRootHash")?),
            add_actions: read_rows(fields, "addActions", read_file_action)?,
            remove_actions: read_rows(fields, "removeActions", read_file_action)?,
        })
    }
}

// ---------------------------------------------------------------------------
// FilesDeposit
// ---------------------------------------------------------------------------

/// A file a deposit is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositFile {
    pub file_hash: Hash256,
}

/// Body of [`super::EntityType::FilesDeposit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesDepositBody {
    pub drive_key: PublicKey,
    #[serde(default)]
    pub files: Vec<DepositFile>,
}

static DEPOSIT_FILE_SCHEMA: Schema = Schema {
    fields: &[SchemaAttribute::bytes("fileHash", HASH_LENGTH)],
};

static FILES_DEPOSIT_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::bytes("driveKey", PUBLIC_KEY_LENGTH),
        SchemaAttribute::scalar("filesCount", 2),
        SchemaAttribute::table_array("files", &DEPOSIT_FILE_SCHEMA, Length::Field("filesCount")),
    ],
};

impl BodyCodec for FilesDepositBody {
    fn body_size(&self) -> usize {
        PUBLIC_KEY_LENGTH + 2 + HASH_LENGTH * self.files.len()
    }

    fn schema() -> &'static Schema {
        &FILES_DEPOSIT_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        let rows = self
            .files
            .iter()
            .map(|file| {
                let mut row = FieldBuffer::new();
                row.put_bytes("fileHash", file.file_hash.as_bytes());
                row
            })
            .collect();
        fields
            .put_bytes("driveKey", self.drive_key.as_bytes())
            .put_count("filesCount", 2, self.files.len())?
            .put_table_array("files", rows);
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            drive_key: PublicKey::from_bytes(fields.array("driveKey")?),
            files: read_rows(fields, "files", |row| {
                Ok(DepositFile {
                    file_hash: Hash256::from_bytes(row.array("fileHash")?),
                })
            })?,
        })
    }
}

// ---------------------------------------------------------------------------
// DriveFilesReward
// ---------------------------------------------------------------------------

/// Bytes a replicator uploaded during the rewarded period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadInfo {
    pub participant: PublicKey,
    #[serde(with = "uint64::pair")]
    pub uploaded: u64,
}

/// Body of [`super::EntityType::DriveFilesReward`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFilesRewardBody {
    #[serde(default)]
    pub upload_infos: Vec<UploadInfo>,
}

static UPLOAD_INFO_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::bytes("participant", PUBLIC_KEY_LENGTH),
        SchemaAttribute::uint64("uploaded"),
    ],
};

static DRIVE_FILES_REWARD_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("uploadInfosCount", 2),
        SchemaAttribute::table_array("uploadInfos", &UPLOAD_INFO_SCHEMA, Length::Field("uploadInfosCount")),
    ],
};

impl BodyCodec for DriveFilesRewardBody {
    fn body_size(&self) -> usize {
        2 + (PUBLIC_KEY_LENGTH + 8) * self.upload_infos.len()
    }

    fn schema() -> &'static Schema {
        &DRIVE_FILES_REWARD_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        let rows = self
            .upload_infos
            .iter()
            .map(|info| {
                let mut row = FieldBuffer::new();
                row.put_bytes("participant", info.participant.as_bytes())
                    .put_u64("uploaded", info.uploaded);
                row
            })
            .collect();
        fields
            .put_count("uploadInfosCount", 2, self.upload_infos.len())?
            .put_table_array("uploadInfos", rows);
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            upload_infos: read_rows(fields, "uploadInfos", |row| {
                Ok(UploadInfo {
                    participant: PublicKey::from_bytes(row.array("participant")?),
                    uploaded: row.u64("uploaded")?,
                })
            })?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> PublicKey {
        PublicKey::from_bytes([byte; 32])
    }

    #[test]
    fn prepare_drive_is_fixed_width() {
        let body = PrepareDriveBody {
            owner: key(1),
            duration: BlockDuration::new(100),
            billing_period: BlockDuration::new(10),
            billing_price: Amount::new(5),
            drive_size: 1 << 40,
            replicas: 3,
            min_replicators: 2,
            percent_approvers: 66,
        };
        assert_eq!(PREPARE_DRIVE_SCHEMA.fixed_size(), Some(body.body_size()));
        let bytes = body.encode_body().unwrap();
        assert_eq!(PrepareDriveBody::decode_body(&bytes).unwrap(), body);
    }

    #[test]
    fn file_system_actions_round_trip() {
        let body = DriveFileSystemBody {
            drive_key: key(2),
            root_hash: Hash256::from_bytes([3; 32]),
            xor_root_hash: Hash256::from_bytes([4; 32]),
            add_actions: vec![FileAction {
                file_hash: Hash256::from_bytes([5; 32]),
                file_size: 1024,
            }],
            remove_actions: vec![],
        };
        let bytes = body.encode_body().unwrap();
        assert_eq!(bytes.len(), body.body_size());
        assert_eq!(DriveFileSystemBody::decode_body(&bytes).unwrap(), body);
    }

    #[test]
    fn drive_key_bodies() {
        let body = EndDriveBody { drive_key: key(9) };
        let bytes = body.encode_body().unwrap();
        assert_eq!(bytes, vec![9; 32]);
        assert_eq!(EndDriveBody::decode_body(&bytes).unwrap(), body);
        assert!(JoinToDriveBody::decode_body(&bytes[..31]).is_err());
    }

    #[test]
    fn deposit_and_reward_json() {
        let json = format!(
            r#"{{"driveKey":"{}","files":[{{"fileHash":"{}"}}]}}"#,
            "01".repeat(32),
            "02".repeat(32)
        );
        let deposit: FilesDepositBody = serde_json::from_str(&json).unwrap();
        assert_eq!(deposit.encode_body().unwrap().len(), 66);

        let json = format!(
            r#"{{"uploadInfos":[{{"participant":"{}","uploaded":[10,0]}}]}}"#,
            "03".repeat(32)
        );
        let reward: DriveFilesRewardBody = serde_json::from_str(&json).unwrap();
        assert_eq!(reward.upload_infos[0].uploaded, 10);
        assert_eq!(
            DriveFilesRewardBody::decode_body(&reward.encode_body().unwrap()).unwrap(),
            reward
        );
    }
}
