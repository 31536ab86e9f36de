//! Three-phase ledger API (spec §4.2): `prepare_transaction`,
//! `commit_transaction`, `fail_transaction`. Balances are updated only on
//! commit; a failed transaction never touches balances.

use sled::transaction::{ConflictableTransactionError, TransactionError};

use money_core::ids::{LedgerAccountId, LedgerTransactionId};
use money_core::ledger::{Direction, LedgerEntry, LedgerTransaction, LedgerTxStatus};
use money_core::escrow::MoneyEventType;
use money_core::money::Money;
use money_core::MoneyError;
use money_store::codec::{decode, encode, get_typed, put_typed};

pub struct LedgerStore {
    transactions: sled::Tree,
    by_idempotency_key: sled::Tree,
    balances: sled::Tree,
}

/// External processor references discovered during Execute, written back
/// into the ledger transaction at Commit time.
#[derive(Clone, Debug, Default)]
pub struct ExternalRefs {
    pub payment_intent_id: Option<String>,
    pub charge_id: Option<String>,
    pub transfer_id: Option<String>,
}

impl LedgerStore {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            transactions: money_store::db::open_tree(db, "ledger_transactions")?,
            by_idempotency_key: money_store::db::open_tree(
                db,
                "ledger_transactions_by_idempotency_key",
            )?,
            balances: money_store::db::open_tree(db, "ledger_balances")?,
        })
    }

    pub fn get(&self, id: LedgerTransactionId) -> Result<Option<LedgerTransaction>, MoneyError> {
        get_typed(&self.transactions, id.as_uuid().as_bytes())
    }

    pub fn get_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<LedgerTransaction>, MoneyError> {
        match self
            .by_idempotency_key
            .get(key.as_bytes())
            .map_err(|e| MoneyError::Storage(e.to_string()))?
        {
            Some(id_bytes) => {
                let id = LedgerTransactionId::parse(
                    std::str::from_utf8(&id_bytes).unwrap_or_default(),
                )
                .map_err(|e| MoneyError::Storage(e.to_string()))?;
                self.get(id)
            }
            None => Ok(None),
        }
    }

    /// Insert a new `pending` transaction. Rejects a duplicate
    /// `idempotency_key` (spec §3 invariant, HX304) — the caller (Money
    /// Engine) is expected to have already checked
    /// `MoneyEvent(processed)` for the externally-supplied event id; this
    /// uniqueness check is the ledger's own, independent safety net.
    pub fn prepare_transaction(
        &self,
        tx_type: MoneyEventType,
        idempotency_key: String,
        entries: Vec<LedgerEntry>,
        created_at: i64,
    ) -> Result<LedgerTransaction, MoneyError> {
        if self.get_by_idempotency_key(&idempotency_key)?.is_some() {
            return Err(MoneyError::DuplicateLedgerIdempotencyKey(idempotency_key));
        }

        let tx = LedgerTransaction {
            id: LedgerTransactionId::new(),
            tx_type,
            idempotency_key: idempotency_key.clone(),
            status: LedgerTxStatus::Pending,
            entries,
            payment_intent_id: None,
            charge_id: None,
            transfer_id: None,
            created_at,
            fail_reason: None,
        };

        if !tx.is_balanced() {
            let debits: i64 = sum_by_direction(&tx.entries, Direction::Debit);
            let credits: i64 = sum_by_direction(&tx.entries, Direction::Credit);
            return Err(MoneyError::LedgerUnbalanced { debits, credits });
        }

        put_typed(&self.transactions, tx.id.as_uuid().as_bytes(), &tx)?;
        self.by_idempotency_key
            .insert(idempotency_key.as_bytes(), tx.id.to_string().as_bytes())
            .map_err(|e| MoneyError::Storage(e.to_string()))?;
        Ok(tx)
    }

    /// Commit a pending transaction atomically: flip status to `committed`,
    /// stamp external refs, and apply every entry to its account's running
    /// balance — all within one `sled` multi-tree transaction, satisfying
    /// spec §4.1's "single DB transaction" Commit-phase requirement.
    pub fn commit_transaction(
        &self,
        id: LedgerTransactionId,
        refs: ExternalRefs,
    ) -> Result<LedgerTransaction, MoneyError> {
        let key = id.as_uuid().as_bytes().to_vec();

        let result: Result<LedgerTransaction, TransactionError<MoneyError>> =
            (&self.transactions, &self.balances).transaction(|(tx_tree, bal_tree)| {
                let bytes = tx_tree.get(&key)?.ok_or_else(|| {
                    ConflictableTransactionError::Abort(MoneyError::LedgerTransactionNotPending(
                        id.to_string(),
                    ))
                })?;
                let mut tx: LedgerTransaction = decode(&bytes).map_err(|e| {
                    ConflictableTransactionError::Abort(MoneyError::Storage(e.to_string()))
                })?;

                if tx.status != LedgerTxStatus::Pending && tx.status != LedgerTxStatus::Executing {
                    return Err(ConflictableTransactionError::Abort(
                        MoneyError::LedgerTransactionNotPending(id.to_string()),
                    ));
                }

                tx.status = LedgerTxStatus::Committed;
                tx.payment_intent_id = refs.payment_intent_id.clone();
                tx.charge_id = refs.charge_id.clone();
                tx.transfer_id = refs.transfer_id.clone();

                for entry in &tx.entries {
                    let acc_key = entry.account_id.as_uuid().as_bytes().to_vec();
                    let current = match bal_tree.get(&acc_key)? {
                        Some(b) => i64::from_be_bytes(b.as_ref().try_into().unwrap_or([0; 8])),
                        None => 0,
                    };
                    let signed = match entry.direction {
                        Direction::Debit => entry.amount.cents(),
                        Direction::Credit => -entry.amount.cents(),
                    };
                    bal_tree.insert(acc_key, &(current + signed).to_be_bytes())?;
                }

                let encoded = encode(&tx).map_err(ConflictableTransactionError::Abort)?;
                tx_tree.insert(key.clone(), encoded)?;
                Ok(tx)
            });

        result.map_err(|e| match e {
            TransactionError::Abort(inner) => inner,
            TransactionError::Storage(e) => MoneyError::Storage(e.to_string()),
        })
    }

    /// Mark a prepared transaction `failed`. Balances are never touched —
    /// this is the compensation path when Execute or Commit fails after
    /// Prepare succeeded (spec §4.1 "Compensation").
    pub fn fail_transaction(
        &self,
        id: LedgerTransactionId,
        reason: String,
    ) -> Result<LedgerTransaction, MoneyError> {
        let mut tx = self
            .get(id)?
            .ok_or_else(|| MoneyError::LedgerTransactionNotPending(id.to_string()))?;
        if tx.status == LedgerTxStatus::Committed {
            return Err(MoneyError::LedgerTransactionImmutable);
        }
        tx.status = LedgerTxStatus::Failed;
        tx.fail_reason = Some(reason);
        put_typed(&self.transactions, id.as_uuid().as_bytes(), &tx)?;
        Ok(tx)
    }

    /// All transactions currently `pending` (spec §4.5: both sweepers scan
    /// this set, one filtering by age without a mirror row, the other by
    /// presence of one). Small enough in practice to scan in full rather
    /// than maintaining a secondary by-status index.
    pub fn pending(&self) -> Result<Vec<LedgerTransaction>, MoneyError> {
        let all: Vec<LedgerTransaction> = money_store::codec::iter_typed(&self.transactions)?;
        Ok(all.into_iter().filter(|tx| tx.status == LedgerTxStatus::Pending).collect())
    }

    /// Raw signed running sum in cents: Σdebits − Σcredits over every
    /// committed entry for `account_id`. Positive for a net-debit position,
    /// negative for a net-credit position. `money-ledger::balance` turns
    /// this into a spec §3 balance, which flips sign for liability account
    /// types.
    pub fn raw_signed_balance_cents(&self, account_id: LedgerAccountId) -> Result<i64, MoneyError> {
        let acc_key = account_id.as_uuid().as_bytes();
        let raw = match self
            .balances
            .get(acc_key)
            .map_err(|e| MoneyError::Storage(e.to_string()))?
        {
            Some(b) => i64::from_be_bytes(b.as_ref().try_into().unwrap_or([0; 8])),
            None => 0,
        };
        Ok(raw)
    }
}

fn sum_by_direction(entries: &[LedgerEntry], direction: Direction) -> i64 {
    entries
        .iter()
        .filter(|e| e.direction == direction)
        .map(|e| e.amount.cents())
        .sum()
}
