//! Processor event storage (spec §4.4, §6): "persists to a `processor_events`
//! table keyed by the processor's event id, then atomically claims and
//! dispatches." The atomic claim SQL pattern
//! (`UPDATE ... WHERE claimed_at IS NULL AND processed_at IS NULL RETURNING
//! ...`) becomes a single-tree `sled` transaction, same idiom as
//! `money-ledger::transactions::LedgerStore::commit_transaction`.

use sled::transaction::{ConflictableTransactionError, TransactionError};

use money_core::MoneyError;
use money_store::codec::{decode, encode, get_typed};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum DispatchResult {
    Success,
    Skipped,
    Failed(String),
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ProcessorEventRow {
    pub event_id: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub claimed_at: Option<i64>,
    pub processed_at: Option<i64>,
    pub result: Option<DispatchResult>,
    pub received_at: i64,
}

pub struct ProcessorEventStore {
    rows: sled::Tree,
}

impl ProcessorEventStore {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            rows: money_store::db::open_tree(db, "processor_events")?,
        })
    }

    pub fn get(&self, event_id: &str) -> Result<Option<ProcessorEventRow>, MoneyError> {
        get_typed(&self.rows, event_id.as_bytes())
    }

    /// Insert-or-ignore: the first delivery of a given processor event id
    /// wins; replays see the row already on file (spec §8 property 6).
    pub fn ingest(
        &self,
        event_id: &str,
        event_type: &str,
        payload: serde_json::Value,
        now: i64,
    ) -> Result<ProcessorEventRow, MoneyError> {
        let result: Result<ProcessorEventRow, TransactionError<MoneyError>> =
            self.rows.transaction(|tx_rows| {
                if let Some(bytes) = tx_rows.get(event_id.as_bytes())? {
                    let existing: ProcessorEventRow = decode(&bytes)
                        .map_err(ConflictableTransactionError::Abort)?;
                    return Ok(existing);
                }
                let row = ProcessorEventRow {
                    event_id: event_id.to_string(),
                    event_type: event_type.to_string(),
                    payload: payload.clone(),
                    claimed_at: None,
                    processed_at: None,
                    result: None,
                    received_at: now,
                };
                let bytes = encode(&row).map_err(ConflictableTransactionError::Abort)?;
                tx_rows.insert(event_id.as_bytes(), bytes)?;
                Ok(row)
            });
        result.map_err(|e| match e {
            TransactionError::Abort(inner) => inner,
            TransactionError::Storage(e) => MoneyError::Storage(e.to_string()),
        })
    }

    /// `WHERE claimed_at IS NULL AND processed_at IS NULL` — `None` means
    /// zero rows matched, i.e. already claimed by another worker.
    pub fn claim(&self, event_id: &str, now: i64) -> Result<Option<ProcessorEventRow>, MoneyError> {
        let result: Result<Option<ProcessorEventRow>, TransactionError<MoneyError>> =
            self.rows.transaction(|tx_rows| {
                let Some(bytes) = tx_rows.get(event_id.as_bytes())? else {
                    return Ok(None);
                };
                let existing: ProcessorEventRow =
                    decode(&bytes).map_err(ConflictableTransactionError::Abort)?;
                if existing.claimed_at.is_some() || existing.processed_at.is_some() {
                    return Ok(None);
                }
                let mut updated = existing;
                updated.claimed_at = Some(now);
                let encoded = encode(&updated).map_err(ConflictableTransactionError::Abort)?;
                tx_rows.insert(event_id.as_bytes(), encoded)?;
                Ok(Some(updated))
            });
        result.map_err(|e| match e {
            TransactionError::Abort(inner) => inner,
            TransactionError::Storage(e) => MoneyError::Storage(e.to_string()),
        })
    }

    /// All rows received at or after `since` (Reality-mirror Backfill's
    /// lookback window, spec §4.5).
    pub fn recent_since(&self, since: i64) -> Result<Vec<ProcessorEventRow>, MoneyError> {
        let all: Vec<ProcessorEventRow> = money_store::codec::iter_typed(&self.rows)?;
        Ok(all.into_iter().filter(|row| row.received_at >= since).collect())
    }

    pub fn mark_processed(&self, event_id: &str, result: DispatchResult, now: i64) -> Result<(), MoneyError> {
        let updated: Result<ProcessorEventRow, TransactionError<MoneyError>> =
            self.rows.transaction(|tx_rows| {
                let bytes = tx_rows.get(event_id.as_bytes())?.ok_or_else(|| {
                    ConflictableTransactionError::Abort(MoneyError::Other(format!(
                        "no processor event {event_id}"
                    )))
                })?;
                let mut row: ProcessorEventRow =
                    decode(&bytes).map_err(ConflictableTransactionError::Abort)?;
                row.processed_at = Some(now);
                row.result = Some(result.clone());
                let encoded = encode(&row).map_err(ConflictableTransactionError::Abort)?;
                tx_rows.insert(event_id.as_bytes(), encoded)?;
                Ok(row)
            });
        updated
            .map(|_| ())
            .map_err(|e| match e {
                TransactionError::Abort(inner) => inner,
                TransactionError::Storage(e) => MoneyError::Storage(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_on_the_same_event_is_a_no_op() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let store = ProcessorEventStore::open(&db).unwrap();
        store
            .ingest("evt_1", "payment_intent.succeeded", serde_json::json!({}), 1000)
            .unwrap();
        let first = store.claim("evt_1", 1000).unwrap();
        assert!(first.is_some());
        let second = store.claim("evt_1", 1001).unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn ingest_is_insert_or_ignore() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let store = ProcessorEventStore::open(&db).unwrap();
        let first = store
            .ingest("evt_1", "payment_intent.succeeded", serde_json::json!({"a": 1}), 1000)
            .unwrap();
        let second = store
            .ingest("evt_1", "payment_intent.succeeded", serde_json::json!({"a": 2}), 2000)
            .unwrap();
        assert_eq!(first.received_at, second.received_at);
    }
}
