//! Liquidity provider transactions.

use serde::{Deserialize, Serialize};

use super::error::{DecodeError, EncodeError};
use crate::codec::{BodyCodec, FieldBuffer, Schema, SchemaAttribute};
use crate::config::PUBLIC_KEY_LENGTH;
use crate::model::{Amount, MosaicId, PublicKey};

/// Body of [`super::EntityType::CreateLiquidityProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLiquidityProviderBody {
    pub provider_mosaic_id: MosaicId,
    pub currency_deposit: Amount,
    pub initial_mosaics_minting: Amount,
    pub slashing_period: u32,
    pub window_size: u16,
    pub slashing_account: PublicKey,
    pub alpha: u32,
    pub beta: u32,
}

static CREATE_LIQUIDITY_PROVIDER_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::uint64("providerMosaicId"),
        SchemaAttribute::uint64("currencyDeposit"),
        SchemaAttribute::uint64("initialMosaicsMinting"),
        SchemaAttribute::scalar("slashingPeriod", 4),
        SchemaAttribute::scalar("windowSize", 2),
        SchemaAttribute::bytes("slashingAccount", PUBLIC_KEY_LENGTH),
        SchemaAttribute::scalar("alpha", 4),
        SchemaAttribute::scalar("beta", 4),
    ],
};

impl BodyCodec for CreateLiquidityProviderBody {
    fn body_size(&self) -> usize {
        8 * 3 + 4 + 2 + PUBLIC_KEY_LENGTH + 4 + 4
    }

    fn schema() -> &'static Schema {
        &CREATE_LIQUIDITY_PROVIDER_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_u64("providerMosaicId", self.provider_mosaic_id.value())
            .put_u64("currencyDeposit", self.currency_deposit.value())
            .put_u64("initialMosaicsMinting", self.initial_mosaics_minting.value())
            .put_u32("slashingPeriod", self.slashing_period)
            .put_u16("windowSize", self.window_size)
            .put_bytes("slashingAccount", self.slashing_account.as_bytes())
            .put_u32("alpha", self.alpha)
            .put_u32("beta", self.beta);
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            provider_mosaic_id: MosaicId::new(fields.u64("providerMosaicId")?),
            currency_deposit: Amount::new(fields.u64("currencyDeposit")?),
            initial_mosaics_minting: Amount::new(fields.u64("initialMosaicsMinting")?),
            slashing_period: fields.u32("slashingPeriod")?,
            window_size: fields.u16("windowSize")?,
            slashing_account: PublicKey::from_bytes(fields.array("slashingAccount")?),
            alpha: fields.u32("alpha")?,
            beta: fields.u32("beta")?,
        })
    }
}

/// Body of [`super::EntityType::ManualRateChange`]: moves a provider's
/// currency and mosaic balances up or down by the given amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualRateChangeBody {
    pub provider_mosaic_id: MosaicId,
    pub currency_balance_increase: bool,
    pub currency_balance_change: Amount,
    pub mosaic_balance_increase: bool,
    pub mosaic_balance_change: Amount,
}

static MANUAL_RATE_CHANGE_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::uint64("providerMosaicId"),
        SchemaAttribute::scalar("currencyBalanceIncrease", 1),
        SchemaAttribute::uint64("currencyBalanceChange"),
        SchemaAttribute::scalar("mosaicBalanceIncrease", 1),
        SchemaAttribute::uint64("mosaicBalanceChange"),
    ],
};

fn read_flag(fields: &FieldBuffer, name: &'static str) -> Result<bool, DecodeError> {
    match fields.u8(name)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(DecodeError::InvalidValue {
            field: name,
            reason: format!("expected 0 or 1, got {other}"),
        }),
    }
}

impl BodyCodec for ManualRateChangeBody {
    fn body_size(&self) -> usize {
        8 + 1 + 8 + 1 + 8
    }

    fn schema() -> &'static Schema {
        &MANUAL_RATE_CHANGE_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        fields
            .put_u64("providerMosaicId", self.provider_mosaic_id.value())
            .put_u8("currencyBalanceIncrease", u8::from(self.currency_balance_increase))
            .put_u64("currencyBalanceChange", self.currency_balance_change.value())
            .put_u8("mosaicBalanceIncrease", u8::from(self.mosaic_balance_increase))
            .put_u64("mosaicBalanceChange", self.mosaic_balance_change.value());
        Ok(())
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            provider_mosaic_id: MosaicId::new(fields.u64("providerMosaicId")?),
            currency_balance_increase: read_flag(fields, "currencyBalanceIncrease")?,
            currency_balance_change: Amount::new(fields.u64("currencyBalanceChange")?),
            mosaic_balance_increase: read_flag(fields, "mosaicBalanceIncrease")?,
            mosaic_balance_change: Amount::new(fields.u64("mosaicBalanceChange")?),
        })
    }
}
