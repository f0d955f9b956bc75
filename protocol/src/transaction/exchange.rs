//! Exchange offers: publishing, accepting and withdrawing.

use serde::{Deserialize, Serialize};

use super::common::{read_rows, wire_enum};
use super::error::{DecodeError, EncodeError};
use crate::codec::{BodyCodec, FieldBuffer, Length, Schema, SchemaAttribute};
use crate::config::PUBLIC_KEY_LENGTH;
use crate::model::{Amount, BlockDuration, MosaicId, PublicKey};

wire_enum! {
    pub enum OfferType: u8, "offer type" {
        Sell = 0,
        Buy = 1,
    }
}

/// A new offer to sell or buy `mosaic_amount` of a mosaic for `cost`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOffer {
    pub mosaic_id: MosaicId,
    pub mosaic_amount: Amount,
    pub cost: Amount,
    #[serde(rename = "type")]
    pub offer_type: OfferType,
    pub duration: BlockDuration,
}

/// Acceptance of (part of) another account's offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedOffer {
    pub mosaic_id: MosaicId,
    pub mosaic_amount: Amount,
    pub cost: Amount,
    #[serde(rename = "type")]
    pub offer_type: OfferType,
    pub owner: PublicKey,
}

/// Withdrawal of one of the signer's offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRemoval {
    pub mosaic_id: MosaicId,
    #[serde(alias = "type")]
    pub offer_type: OfferType,
}

/// Body of [`super::EntityType::AddExchangeOffer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddExchangeOfferBody {
    pub offers: Vec<NewOffer>,
}

/// Body of [`super::EntityType::ExchangeOffer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeOfferBody {
    pub offers: Vec<MatchedOffer>,
}

/// Body of [`super::EntityType::RemoveExchangeOffer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveExchangeOfferBody {
    pub offers: Vec<OfferRemoval>,
}

static NEW_OFFER_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::uint64("mosaicId"),
        SchemaAttribute::uint64("mosaicAmount"),
        SchemaAttribute::uint64("cost"),
        SchemaAttribute::scalar("type", 1),
        SchemaAttribute::uint64("duration"),
    ],
};

static MATCHED_OFFER_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::uint64("mosaicId"),
        SchemaAttribute::uint64("mosaicAmount"),
        SchemaAttribute::uint64("cost"),
        SchemaAttribute::scalar("type", 1),
        SchemaAttribute::bytes("owner", PUBLIC_KEY_LENGTH),
    ],
};

static OFFER_REMOVAL_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::uint64("mosaicId"),
        SchemaAttribute::scalar("offerType", 1),
    ],
};

static ADD_EXCHANGE_OFFER_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("offersCount", 1),
        SchemaAttribute::table_array("offers", &NEW_OFFER_SCHEMA, Length::Field("offersCount")),
    ],
};

static EXCHANGE_OFFER_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("offersCount", 1),
        SchemaAttribute::table_array("offers", &MATCHED_OFFER_SCHEMA, Length::Field("offersCount")),
    ],
};

static REMOVE_EXCHANGE_OFFER_SCHEMA: Schema = Schema {
    fields: &[
        SchemaAttribute::scalar("offersCount", 1),
        SchemaAttribute::table_array("offers", &OFFER_REMOVAL_SCHEMA, Length::Field("offersCount")),
    ],
};

fn put_offers(fields: &mut FieldBuffer, rows: Vec<FieldBuffer>) -> Result<(), EncodeError> {
    fields
        .put_count("offersCount", 1, rows.len())?
        .put_table_array("offers", rows);
    Ok(())
}

impl BodyCodec for AddExchangeOfferBody {
    fn body_size(&self) -> usize {
        1 + 33 * self.offers.len()
    }

    fn schema() -> &'static Schema {
        &ADD_EXCHANGE_OFFER_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        let rows = self
            .offers
            .iter()
            .map(|offer| {
                let mut row = FieldBuffer::new();
                row.put_u64("mosaicId", offer.mosaic_id.value())
                    .put_u64("mosaicAmount", offer.mosaic_amount.value())
                    .put_u64("cost", offer.cost.value())
                    .put_u8("type", offer.offer_type.to_raw())
                    .put_u64("duration", offer.duration.value());
                row
            })
            .collect();
        put_offers(fields, rows)
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            offers: read_rows(fields, "offers", |row| {
                Ok(NewOffer {
                    mosaic_id: MosaicId::new(row.u64("mosaicId")?),
                    mosaic_amount: Amount::new(row.u64("mosaicAmount")?),
                    cost: Amount::new(row.u64("cost")?),
                    offer_type: OfferType::try_from(row.u8("type")?)?,
                    duration: BlockDuration::new(row.u64("duration")?),
                })
            })?,
        })
    }
}

impl BodyCodec for ExchangeOfferBody {
    fn body_size(&self) -> usize {
        1 + (25 + PUBLIC_KEY_LENGTH) * self.offers.len()
    }

    fn schema() -> &'static Schema {
        &EXCHANGE_OFFER_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        let rows = self
            .offers
            .iter()
            .map(|offer| {
                let mut row = FieldBuffer::new();
                row.put_u64("mosaicId", offer.mosaic_id.value())
                    .put_u64("mosaicAmount", offer.mosaic_amount.value())
                    .put_u64("cost", offer.cost.value())
                    .put_u8("type", offer.offer_type.to_raw())
                    .put_bytes("owner", offer.owner.as_bytes());
                row
            })
            .collect();
        put_offers(fields, rows)
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            offers: read_rows(fields, "offers", |row| {
                Ok(MatchedOffer {
                    mosaic_id: MosaicId::new(row.u64("mosaicId")?),
                    mosaic_amount: Amount::new(row.u64("mosaicAmount")?),
                    cost: Amount::new(row.u64("cost")?),
                    offer_type: OfferType::try_from(row.u8("type")?)?,
                    owner: PublicKey::from_bytes(row.array("owner")?),
                })
            })?,
        })
    }
}

impl BodyCodec for RemoveExchangeOfferBody {
    fn body_size(&self) -> usize {
        1 + 9 * self.offers.len()
    }

    fn schema() -> &'static Schema {
        &REMOVE_EXCHANGE_OFFER_SCHEMA
    }

    fn write_fields(&self, fields: &mut FieldBuffer) -> Result<(), EncodeError> {
        let rows = self
            .offers
            .iter()
            .map(|offer| {
                let mut row = FieldBuffer::new();
                row.put_u64("mosaicId", offer.mosaic_id.value())
                    .put_u8("offerType", offer.offer_type.to_raw());
                row
            })
            .collect();
        put_offers(fields, rows)
    }

    fn read_fields(fields: &FieldBuffer) -> Result<Self, DecodeError> {
        Ok(Self {
            offers: read_rows(fields, "offers", |row| {
                Ok(OfferRemoval {
                    mosaic_id: MosaicId::new(row.u64("mosaicId")?),
                    offer_type: OfferType::try_from(row.u8("offerType")?)?,
                })
            })?,
        })
    }
}
