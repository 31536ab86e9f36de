//! Distributed Lease Lock types (spec §2 component table; §3, §5). The
//! acquire/release implementation lives in `money-store`; this is the
//! shared shape.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lease {
    pub resource_id: String,
    pub lease_id: String,
    pub holder: String,
    pub acquired_at: i64,
    pub ttl_secs: u64,
}

impl Lease {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.acquired_at + self.ttl_secs as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lease_expires_after_ttl() {
        let l = Lease {
            resource_id: "task:1".into(),
            lease_id: "abc".into(),
            holder: "worker-1".into(),
            acquired_at: 1000,
            ttl_secs: 30,
        };
        assert!(!l.is_expired(1029));
        assert!(l.is_expired(1030));
    }
}
