//! LedgerAccount storage (spec §3, §4.2). "Accounts are created on first
//! use for a given (owner, type) pair."

use money_core::ids::{LedgerAccountId, UserId};
use money_core::ledger::{LedgerAccount, LedgerAccountType};
use money_core::MoneyError;
use money_store::codec::{get_typed, put_typed};

pub struct AccountsStore {
    accounts: sled::Tree,
    by_owner_type: sled::Tree,
}

impl AccountsStore {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            accounts: money_store::db::open_tree(db, "ledger_accounts")?,
            by_owner_type: money_store::db::open_tree(db, "ledger_accounts_by_owner_type")?,
        })
    }

    fn index_key(owner_id: Option<UserId>, account_type: LedgerAccountType) -> Vec<u8> {
        let mut key = match owner_id {
            Some(id) => id.as_uuid().as_bytes().to_vec(),
            None => vec![0u8; 16],
        };
        key.push(account_type as u8);
        key
    }

    pub fn get(&self, id: LedgerAccountId) -> Result<Option<LedgerAccount>, MoneyError> {
        get_typed(&self.accounts, id.as_uuid().as_bytes())
    }

    /// Returns the existing account for `(owner_id, account_type)`, creating
    /// one if this is the first use (spec §3).
    pub fn get_or_create(
        &self,
        owner_id: Option<UserId>,
        account_type: LedgerAccountType,
    ) -> Result<LedgerAccount, MoneyError> {
        let idx_key = Self::index_key(owner_id, account_type);
        if let Some(bytes) = self
            .by_owner_type
            .get(&idx_key)
            .map_err(|e| MoneyError::Storage(e.to_string()))?
        {
            let id = LedgerAccountId::parse(std::str::from_utf8(&bytes).unwrap_or_default())
                .map_err(|e| MoneyError::Storage(e.to_string()))?;
            if let Some(acc) = self.get(id)? {
                return Ok(acc);
            }
        }

        let account = LedgerAccount {
            id: LedgerAccountId::new(),
            owner_id,
            account_type,
        };
        put_typed(&self.accounts, account.id.as_uuid().as_bytes(), &account)?;
        self.by_owner_type
            .insert(idx_key, account.id.to_string().as_bytes())
            .map_err(|e| MoneyError::Storage(e.to_string()))?;
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent_for_same_owner_and_type() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let store = AccountsStore::open(&db).unwrap();
        let owner = UserId::new();
        let a1 = store
            .get_or_create(Some(owner), LedgerAccountType::UserReceivable)
            .unwrap();
        let a2 = store
            .get_or_create(Some(owner), LedgerAccountType::UserReceivable)
            .unwrap();
        assert_eq!(a1.id, a2.id);
    }

    #[test]
    fn different_types_for_same_owner_are_distinct_accounts() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let store = AccountsStore::open(&db).unwrap();
        let owner = UserId::new();
        let a1 = store
            .get_or_create(Some(owner), LedgerAccountType::UserReceivable)
            .unwrap();
        let a2 = store
            .get_or_create(Some(owner), LedgerAccountType::UserPayable)
            .unwrap();
        assert_ne!(a1.id, a2.id);
    }

    #[test]
    fn platform_accounts_share_no_owner() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let store = AccountsStore::open(&db).unwrap();
        let a1 = store
            .get_or_create(None, LedgerAccountType::PlatformRevenue)
            .unwrap();
        let a2 = store
            .get_or_create(None, LedgerAccountType::PlatformRevenue)
            .unwrap();
        assert_eq!(a1.id, a2.id);
    }
}
