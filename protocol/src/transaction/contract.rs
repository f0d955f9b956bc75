//! Contract participant changes and manual contract calls.

use serde::{Deserialize, Serialize};

use super::common::{
    key_modification_fields, mosaic_fields, read_key_modification, read_mosaic, read_rows,
    read_utf8, KeyModification, KEY_MODIFICATION_SCHEMA, KEY_MODIFICATION_SIZE, MOSAIC_SCHEMA,
    MOSAIC_SIZE,
};
use super::error::{DecodeError, EncodeError};
use crate::codec::{BodyCodec, FieldBuffer, Length, Schema, SchemaAttribute};
use crate::config::{HASH_LENGTH, PUBLIC_KEY_LENGTH};
use crate::model::{hex_bytes, uint64, Amount, Hash256, Mosaic, PublicKey};

// ---------------------------------------------------------------------------
// ModifyContract
// ---------------------------------------------------------------------------

/// Body of [`super::EntityType::ModifyContract`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyContractBody {
    #[serde(with = "uint64::signed_pair")]
    pub duration_delta: i64,
    pub hash: Hash256,
    #[serde(default)]
    pub customers: Vec<KeyModification>,
    #[serde(default)]
    pub executors: Vec<KeyModification>,
    #[serde(default)]
    pub verifiers: Vec<KeyModification>,
}

static MODIFY_CONTRACT_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::uint64("durationDelta"),
        SchemaAttribute::bytes("hash", HASH_LENGTH),
        SchemaAttribute::scalar("numCustomers", 1),
        SchemaAttribute::scalar("numExecutors", 1),
        SchemaAttribute::scalar("numVerifiers", 1),
        SchemaAttribute::table_array("customers", &KEY_MODIFICATION_SCHEMA, Length::Field("numCustomers")),
        SchemaAttribute::table_array("executors", &KEY_MODIFICATION_SCHEMA, Length::Field("numExecutors")),
        SchemaAttribute::table_array("verifiers", &KEY_MODIFICATION_SCHEMA, Length::Field("numVerifiers")),
    ],
};

impl BodyCodec for ModifyContractBody {
    fn body_size(&self) -> usize {
        let rows = self.customers.len() + self.executors.len() + self.verifiers.len();
        8 + HASH_LENGTH + 3 + KEY_MODIFICATION_SIZE * rows
    }

    fn schema() -> &'static Schema {
        &MODIFY_CONTRACT_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        let rows = |set: &[KeyModification]| -> Vec<FieldBuffer> {
            set.iter().map(key_modification_fields).collect()
        };
        fields
            .put_u64("durationDelta", self.duration_delta as u64)
            .put_bytes("hash", self.hash.as_bytes())
            .put_count("numCustomers", 1, self.customers.len())?
            .put_count("numExecutors", 1, self.executors.len())?
            .put_count("numVerifiers", 1, self.verifiers.len())?
            .put_table_array("customers", rows(&self.customers))
            .put_table_array("executors", rows(&self.executors))
            .put_table_array("verifiers", rows(&self.verifiers));
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            duration_delta: fields.u64("durationDelta")? as i64,
            hash: Hash256::from_bytes(fields.array("hash")?),
            customers: read_rows(fields, "customers", read_key_modification)?,
            executors: read_rows(fields, "executors", read_key_modification)?,
            verifiers: read_rows(fields, "verifiers", read_key_modification)?,
        })
    }
}

// ---------------------------------------------------------------------------
// ManualCall
// ---------------------------------------------------------------------------

/// Body of [`super::EntityType::ManualCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualCallBody {
    pub contract_key: PublicKey,
    pub file_name: String,
    pub function_name: String,
    #[serde(with = "hex_bytes", default, alias = "arguments")]
    pub actual_arguments: Vec<u8>,
    pub execution_call_payment: Amount,
    pub download_call_payment: Amount,
    #[serde(default)]
    pub service_payments: Vec<Mosaic>,
}

static MANUAL_CALL_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::bytes("contractKey", PUBLIC_KEY_LENGTH),
        SchemaAttribute::scalar("fileNameSize", 2),
        SchemaAttribute::scalar("functionNameSize", 2),
        SchemaAttribute::scalar("argumentsSize", 2),
        SchemaAttribute::uint64("executionCallPayment"),
        SchemaAttribute::uint64("downloadCallPayment"),
        SchemaAttribute::scalar("servicePaymentsCount", 1),
        SchemaAttribute::array("fileName", 1, Length::Field("fileNameSize")),
        SchemaAttribute::array("functionName", 1, Length::Field("functionNameSize")),
        SchemaAttribute::array("arguments", 1, Length::Field("argumentsSize")),
        SchemaAttribute::table_array("servicePayments", &MOSAIC_SCHEMA, Length::Field("servicePaymentsCount")),
    ],
};

impl BodyCodec for ManualCallBody {
    fn body_size(&self) -> usize {
        PUBLIC_KEY_LENGTH
            + 2 * 3
            + 8 * 2
            + 1
            + self.file_name.len()
            + self.function_name.len()
            + self.actual_arguments.len()
            + MOSAIC_SIZE * self.service_payments.len()
    }

    fn schema() -> &'static Schema {
        &MANUAL_CALL_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_bytes("contractKey", self.contract_key.as_bytes())
            .put_count("fileNameSize", 2, self.file_name.len())?
            .put_count("functionNameSize", 2, self.function_name.len())?
            .put_count("argumentsSize", 2, self.actual_arguments.len())?
            .put_u64("executionCallPayment", self.execution_call_payment.value())
            .put_u64("downloadCallPayment", self.download_call_payment.value())
            .put_count("servicePaymentsCount", 1, self.service_payments.len())?
            .put_bytes("fileName", self.file_name.as_bytes())
            .put_bytes("functionName", self.function_name.as_bytes())
            .put_bytes("arguments", &self.actual_arguments)
            .put_table_array(
                "servicePayments",
                self.service_payments.iter().map(mosaic_fields).collect(),
            );
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            contract_key: PublicKey::from_bytes(fields.array("contractKey")?),
            file_name: read_utf8(fields, "fileName")?,
            function_name: read_utf8(fields, "functionName")?,
            actual_arguments: fields.bytes("arguments")?.to_vec(),
            execution_call_payment: Amount::new(fields.u64("executionCallPayment")?),
            download_call_payment: Amount::new(fields.u64("downloadCallPayment")?),
            service_payments: read_rows(fields, "servicePayments", read_mosaic)?,
        })
    }
}
