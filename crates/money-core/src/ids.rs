//! Newtype identifiers for every entity in the kernel.
//!
//! Mirrors the teacher's `AccountId`/`TxId` pattern: a thin wrapper over
//! `uuid::Uuid` with its own `Display`/`Debug` and hex helpers, so ids from
//! different entity families can never be swapped by the type checker.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

uuid_id!(TaskId);
uuid_id!(UserId);
uuid_id!(EscrowId);
uuid_id!(LedgerAccountId);
uuid_id!(LedgerTransactionId);
uuid_id!(OutboxEventId);
uuid_id!(EmailOutboxId);
uuid_id!(SmsOutboxId);
uuid_id!(VerificationId);
uuid_id!(ProofRequestId);
uuid_id!(ProofSubmissionId);
uuid_id!(ExternalEventId);

/// A content hash, e.g. of a proof submission's file bytes. Wraps a BLAKE3
/// digest the same way `chronx_core::types::EvidenceHash` wraps one, with
/// hex encode/decode rather than base58 (no wallet-facing display need here).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileHash(pub [u8; 32]);

impl FileHash {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; 32];
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileHash({})", self.to_hex())
    }
}

/// A canonical idempotency key as supplied by a caller or an upstream event.
/// Kept as a plain `String` newtype (not hashed) since callers need exact
/// round-tripping for idempotency replay (§8 property 5).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(pub String);

impl IdempotencyKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdempotencyKey({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_roundtrip_through_display_and_parse() {
        let id = TaskId::new();
        let s = id.to_string();
        let parsed = TaskId::parse(&s).expect("valid uuid text");
        assert_eq!(id, parsed);
    }

    #[test]
    fn file_hash_hex_roundtrips() {
        let h = FileHash::of_bytes(b"hello world");
        let hex = h.to_hex();
        let back = FileHash::from_hex(&hex).expect("valid hex");
        assert_eq!(h, back);
    }

    #[test]
    fn distinct_entities_never_share_a_type() {
        // Compile-time guarantee: this would not compile if TaskId and
        // EscrowId were the same type and we tried to misuse one for the
        // other. Presence of this test documents the intent.
        let t = TaskId::new();
        let e = EscrowId::new();
        assert_ne!(t.to_string(), e.to_string());
    }
}
