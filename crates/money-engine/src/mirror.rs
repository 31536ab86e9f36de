//! Outbound Mirror (spec §4.3): a single unique index on `idempotency_key`,
//! written insert-or-ignore after a processor call succeeds. Turns "external
//! side-effect" from at-most-once into effectively exactly-once across
//! crashes — the Execute phase checks this before ever calling the
//! processor again.

use serde::{Deserialize, Serialize};

use money_core::MoneyError;
use money_store::codec::{get_typed, put_typed};

use crate::processor::ProcessorEffect;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MirrorRow {
    pub idempotency_key: String,
    pub payment_intent_id: Option<String>,
    pub charge_id: Option<String>,
    pub transfer_id: Option<String>,
    pub recorded_at: i64,
}

impl MirrorRow {
    pub fn as_effect(&self) -> ProcessorEffect {
        ProcessorEffect {
            payment_intent_id: self.payment_intent_id.clone(),
            charge_id: self.charge_id.clone(),
            transfer_id: self.transfer_id.clone(),
        }
    }
}

pub struct OutboundMirror {
    rows: sled::Tree,
}

impl OutboundMirror {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            rows: money_store::db::open_tree(db, "outbound_mirror")?,
        })
    }

    pub fn get(&self, idempotency_key: &str) -> Result<Option<MirrorRow>, MoneyError> {
        get_typed(&self.rows, idempotency_key.as_bytes())
    }

    /// Every recorded mirror row, for sweepers that need to correlate a
    /// processor-side reference (payment intent / charge / transfer id)
    /// back to the idempotency key it was recorded under.
    pub fn all(&self) -> Result<Vec<MirrorRow>, MoneyError> {
        money_store::codec::iter_typed(&self.rows)
    }

    /// Insert-or-ignore: if a row already exists under this key (a prior
    /// attempt already recorded the processor's response), the existing row
    /// wins and `effect` is discarded rather than overwriting it.
    pub fn record(
        &self,
        idempotency_key: &str,
        effect: &ProcessorEffect,
        now: i64,
    ) -> Result<MirrorRow, MoneyError> {
        if let Some(existing) = self.get(idempotency_key)? {
            return Ok(existing);
        }
        let row = MirrorRow {
            idempotency_key: idempotency_key.to_string(),
            payment_intent_id: effect.payment_intent_id.clone(),
            charge_id: effect.charge_id.clone(),
            transfer_id: effect.transfer_id.clone(),
            recorded_at: now,
        };
        put_typed(&self.rows, idempotency_key.as_bytes(), &row)?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_is_insert_or_ignore() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let mirror = OutboundMirror::open(&db).unwrap();
        let first = mirror
            .record(
                "evt_1",
                &ProcessorEffect {
                    payment_intent_id: Some("pi_1".into()),
                    charge_id: None,
                    transfer_id: None,
                },
                1000,
            )
            .unwrap();
        let second = mirror
            .record(
                "evt_1",
                &ProcessorEffect {
                    payment_intent_id: Some("pi_2_should_be_ignored".into()),
                    charge_id: None,
                    transfer_id: None,
                },
                2000,
            )
            .unwrap();
        assert_eq!(first.payment_intent_id, second.payment_intent_id);
        assert_eq!(second.payment_intent_id.as_deref(), Some("pi_1"));
    }

    #[test]
    fn missing_key_reads_as_none() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let mirror = OutboundMirror::open(&db).unwrap();
        assert!(mirror.get("nope").unwrap().is_none());
    }
}
