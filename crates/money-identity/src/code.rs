//! Code generation and bcrypt hashing (spec §4.10: "bcrypt-hashed codes").
//! The raw code only ever exists in memory long enough to hash it and hand
//! it to the send-intent queue; nothing persists it.

use money_core::constants::{BCRYPT_COST, VERIFICATION_CODE_LENGTH};
use money_core::MoneyError;
use rand::Rng;

pub fn generate_code() -> String {
    let max: u32 = 10u32.pow(VERIFICATION_CODE_LENGTH as u32);
    let value = rand::thread_rng().gen_range(0..max);
    format!("{value:0width$}", width = VERIFICATION_CODE_LENGTH)
}

pub fn hash_code(code: &str) -> Result<String, MoneyError> {
    bcrypt::hash(code, BCRYPT_COST).map_err(|e| MoneyError::Storage(e.to_string()))
}

pub fn verify_code(code: &str, hash: &str) -> Result<bool, MoneyError> {
    bcrypt::verify(code, hash).map_err(|e| MoneyError::Storage(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_has_the_configured_length() {
        let code = generate_code();
        assert_eq!(code.len(), VERIFICATION_CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn hash_round_trips_through_verify() {
        let code = "042517";
        let hash = hash_code(code).unwrap();
        assert!(verify_code(code, &hash).unwrap());
        assert!(!verify_code("000000", &hash).unwrap());
    }
}
