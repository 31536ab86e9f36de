//! Suppression list (`do_not_email`, verified opt-out) re-checked at claim
//! time (spec §4.8) so a send already queued before a user opts out never
//! goes out.

use money_core::MoneyError;

pub struct SuppressionList {
    email: sled::Tree,
    sms: sled::Tree,
}

impl SuppressionList {
    pub fn open(db: &sled::Db) -> Result<Self, MoneyError> {
        Ok(Self {
            email: money_store::db::open_tree(db, "suppressed_emails")?,
            sms: money_store::db::open_tree(db, "suppressed_sms")?,
        })
    }

    pub fn suppress_email(&self, address: &str) -> Result<(), MoneyError> {
        self.email
            .insert(address.as_bytes(), &[1u8])
            .map_err(|e| MoneyError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn is_email_suppressed(&self, address: &str) -> Result<bool, MoneyError> {
        Ok(self
            .email
            .contains_key(address.as_bytes())
            .map_err(|e| MoneyError::Storage(e.to_string()))?)
    }

    pub fn suppress_sms(&self, number: &str) -> Result<(), MoneyError> {
        self.sms
            .insert(number.as_bytes(), &[1u8])
            .map_err(|e| MoneyError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn is_sms_suppressed(&self, number: &str) -> Result<bool, MoneyError> {
        Ok(self
            .sms
            .contains_key(number.as_bytes())
            .map_err(|e| MoneyError::Storage(e.to_string()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppressed_address_is_reported() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let list = SuppressionList::open(&db).unwrap();
        assert!(!list.is_email_suppressed("a@b.com").unwrap());
        list.suppress_email("a@b.com").unwrap();
        assert!(list.is_email_suppressed("a@b.com").unwrap());
    }
}
