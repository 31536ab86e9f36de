//! Persistent state database backed by sled (pure-Rust, no C dependencies),
//! following `chronx_state::db::StateDb`'s shape: one named `Tree` per
//! entity family on a shared `sled::Db`.
//!
//! Named trees owned directly by `Store`:
//!   tasks                — TaskId bytes      → bincode(Task)
//!   money_locks          — TaskId bytes      → bincode(MoneyStateLock)
//!   leases               — resource_id utf8  → bincode(Lease)
//!   idempotency_records  — key utf8          → bincode(IdempotencyRecord)
//!   meta                 — utf8 key bytes    → raw bytes
//!
//! Every sibling crate (`money-ledger`, `money-proof`, `money-outbox`, ...)
//! opens its own additional named trees off the same underlying `sled::Db`
//! via [`Store::db`], rather than this crate owning every entity — that
//! keeps each domain crate's storage shape next to the types it defines.

use std::path::Path;

use money_core::dispute::Dispute;
use money_core::escrow::MoneyStateLock;
use money_core::idempotency::IdempotencyRecord;
use money_core::ids::TaskId;
use money_core::lease::Lease;
use money_core::task::Task;
use money_core::MoneyError;

use crate::codec::{get_typed, put_typed};

pub struct Store {
    db: sled::Db,
    tasks: sled::Tree,
    money_locks: sled::Tree,
    disputes: sled::Tree,
    leases: sled::Tree,
    idempotency_records: sled::Tree,
    meta: sled::Tree,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MoneyError> {
        let db = sled::open(path).map_err(|e| MoneyError::Storage(e.to_string()))?;
        Self::from_db(db)
    }

    /// In-memory, ephemeral store for tests — grounded in the teacher's
    /// `temp_db` test helper, but using sled's own temporary-mode config
    /// instead of a scratch directory under `/tmp` so test runs never leave
    /// files behind.
    pub fn open_temporary() -> Result<Self, MoneyError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| MoneyError::Storage(e.to_string()))?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, MoneyError> {
        let tasks = open_tree(&db, "tasks")?;
        let money_locks = open_tree(&db, "money_locks")?;
        let disputes = open_tree(&db, "disputes")?;
        let leases = open_tree(&db, "leases")?;
        let idempotency_records = open_tree(&db, "idempotency_records")?;
        let meta = open_tree(&db, "meta")?;
        Ok(Self {
            db,
            tasks,
            money_locks,
            disputes,
            leases,
            idempotency_records,
            meta,
        })
    }

    /// Exposes the underlying `sled::Db` so sibling crates can open their
    /// own named trees on it (cheap to clone; sled wraps an `Arc` inside).
    pub fn db(&self) -> sled::Db {
        self.db.clone()
    }

    pub fn flush(&self) -> Result<(), MoneyError> {
        self.db
            .flush()
            .map_err(|e| MoneyError::Storage(e.to_string()))?;
        Ok(())
    }

    // ── Tasks ────────────────────────────────────────────────────────────

    pub fn get_task(&self, id: TaskId) -> Result<Option<Task>, MoneyError> {
        get_typed(&self.tasks, id.as_uuid().as_bytes())
    }

    pub fn put_task(&self, task: &Task) -> Result<(), MoneyError> {
        put_typed(&self.tasks, task.id.as_uuid().as_bytes(), task)
    }

    // ── MoneyStateLock ───────────────────────────────────────────────────

    pub fn get_money_lock(&self, task_id: TaskId) -> Result<Option<MoneyStateLock>, MoneyError> {
        get_typed(&self.money_locks, task_id.as_uuid().as_bytes())
    }

    pub fn put_money_lock(&self, lock: &MoneyStateLock) -> Result<(), MoneyError> {
        put_typed(&self.money_locks, lock.task_id.as_uuid().as_bytes(), lock)
    }

    /// Raw access for the Money Engine's commit phase, which updates the
    /// lock inside a larger atomic multi-tree `sled` transaction rather
    /// than through this non-transactional accessor.
    pub fn money_locks_tree(&self) -> &sled::Tree {
        &self.money_locks
    }

    // ── Disputes ─────────────────────────────────────────────────────────

    pub fn get_dispute(&self, task_id: TaskId) -> Result<Option<Dispute>, MoneyError> {
        get_typed(&self.disputes, task_id.as_uuid().as_bytes())
    }

    pub fn put_dispute(&self, dispute: &Dispute) -> Result<(), MoneyError> {
        put_typed(&self.disputes, dispute.task_id.as_uuid().as_bytes(), dispute)
    }

    pub fn has_active_dispute(&self, task_id: TaskId) -> Result<bool, MoneyError> {
        Ok(self
            .get_dispute(task_id)?
            .map(|d| d.state != money_core::dispute::DisputeState::Resolved)
            .unwrap_or(false))
    }

    // ── Leases ───────────────────────────────────────────────────────────

    pub fn get_lease(&self, resource_id: &str) -> Result<Option<Lease>, MoneyError> {
        get_typed(&self.leases, resource_id.as_bytes())
    }

    pub fn put_lease(&self, lease: &Lease) -> Result<(), MoneyError> {
        put_typed(&self.leases, lease.resource_id.as_bytes(), lease)
    }

    pub fn remove_lease(&self, resource_id: &str) -> Result<(), MoneyError> {
        self.leases
            .remove(resource_id.as_bytes())
            .map_err(|e| MoneyError::Storage(e.to_string()))?;
        Ok(())
    }

    // ── Idempotency records ──────────────────────────────────────────────

    pub fn get_idempotency_record(
        &self,
        key: &str,
    ) -> Result<Option<IdempotencyRecord>, MoneyError> {
        get_typed(&self.idempotency_records, key.as_bytes())
    }

    pub fn put_idempotency_record(&self, record: &IdempotencyRecord) -> Result<(), MoneyError> {
        put_typed(&self.idempotency_records, record.key.as_bytes(), record)
    }

    // ── Meta ─────────────────────────────────────────────────────────────

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), MoneyError> {
        self.meta
            .insert(key.as_bytes(), value)
            .map_err(|e| MoneyError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, MoneyError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(|e| MoneyError::Storage(e.to_string()))
    }
}

/// Opens a named tree, wrapping the sled error the way every tree open in
/// `chronx_state::db::StateDb::open` does.
pub fn open_tree(db: &sled::Db, name: &str) -> Result<sled::Tree, MoneyError> {
    db.open_tree(name)
        .map_err(|e| MoneyError::Storage(e.to_string()))
}
