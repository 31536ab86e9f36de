//! Thin bincode (de)serialization helpers shared by every tree accessor in
//! this crate and by the per-domain stores built on top of it, mirroring
//! the repeated `bincode::serialize(...).map_err(...)` shape of
//! `chronx_state::db::StateDb`.

use money_core::MoneyError;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, MoneyError> {
    bincode::serialize(value).map_err(|e| MoneyError::Storage(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, MoneyError> {
    bincode::deserialize(bytes).map_err(|e| MoneyError::Storage(e.to_string()))
}

pub fn get_typed<T: DeserializeOwned>(
    tree: &sled::Tree,
    key: impl AsRef<[u8]>,
) -> Result<Option<T>, MoneyError> {
    match tree
        .get(key)
        .map_err(|e| MoneyError::Storage(e.to_string()))?
    {
        Some(bytes) => Ok(Some(decode(&bytes)?)),
        None => Ok(None),
    }
}

pub fn put_typed<T: Serialize>(
    tree: &sled::Tree,
    key: impl AsRef<[u8]>,
    value: &T,
) -> Result<(), MoneyError> {
    let bytes = encode(value)?;
    tree.insert(key, bytes)
        .map_err(|e| MoneyError::Storage(e.to_string()))?;
    Ok(())
}

pub fn iter_typed<T: DeserializeOwned>(tree: &sled::Tree) -> Result<Vec<T>, MoneyError> {
    let mut out = Vec::new();
    for item in tree.iter() {
        let (_, bytes) = item.map_err(|e| MoneyError::Storage(e.to_string()))?;
        out.push(decode(&bytes)?);
    }
    Ok(out)
}

/// Allocate a sequential u64 id from a counter stored in `tree` under
/// `counter_key`. Mirrors `StateDb::next_schema_id`'s meta-tree counter.
pub fn next_id(tree: &sled::Tree, counter_key: &str) -> Result<u64, MoneyError> {
    let current = match tree
        .get(counter_key)
        .map_err(|e| MoneyError::Storage(e.to_string()))?
    {
        Some(bytes) => {
            let mut arr = [0u8; 8];
            arr.copy_from_slice(&bytes[..8]);
            u64::from_be_bytes(arr)
        }
        None => 1,
    };
    tree.insert(counter_key, &(current + 1).to_be_bytes())
        .map_err(|e| MoneyError::Storage(e.to_string()))?;
    Ok(current)
}
