//! Distributed Lease Lock (spec §2 component 2; SPEC_FULL.md §2
//! supplemental spec). Advisory locks on resources (`task:<id>`,
//! `user:<id>`) by lease id, auto-released by TTL. Grounded in the
//! `RecoveryQuery<'a> { db: &'a StateDb }` read-side wrapper pattern of
//! `chronx_recovery::query`, adapted here to a mutating acquire/release API.

use money_core::ids::UserId;
use money_core::lease::Lease;
use money_core::{Clock, MoneyError};

use crate::db::Store;

pub struct LeaseManager<'a> {
    store: &'a Store,
}

/// RAII-style guard. Dropping it does not release the lease automatically
/// — callers must call [`LeaseGuard::release`] explicitly once the saga's
/// suspension points are past, matching spec §5's batch-lease-serialises-
/// retries model rather than a scope-based lock.
pub struct LeaseGuard {
    pub resource_id: String,
    pub lease_id: String,
}

impl<'a> LeaseManager<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn acquire(
        &self,
        resource_id: &str,
        holder: &str,
        ttl_secs: u64,
        clock: &dyn Clock,
    ) -> Result<LeaseGuard, MoneyError> {
        let now = clock.now_unix();
        if let Some(existing) = self.store.get_lease(resource_id)? {
            if !existing.is_expired(now) && existing.holder != holder {
                return Err(MoneyError::LeaseHeld {
                    resource_id: resource_id.to_string(),
                });
            }
        }
        let lease_id = uuid::Uuid::new_v4().to_string();
        let lease = Lease {
            resource_id: resource_id.to_string(),
            lease_id: lease_id.clone(),
            holder: holder.to_string(),
            acquired_at: now,
            ttl_secs,
        };
        self.store.put_lease(&lease)?;
        Ok(LeaseGuard {
            resource_id: resource_id.to_string(),
            lease_id,
        })
    }

    pub fn release(&self, guard: &LeaseGuard) -> Result<(), MoneyError> {
        if let Some(existing) = self.store.get_lease(&guard.resource_id)? {
            if existing.lease_id == guard.lease_id {
                self.store.remove_lease(&guard.resource_id)?;
            }
        }
        Ok(())
    }

    /// Acquire the batch of resource leases the Money Engine needs before
    /// Prepare: `{task:<id>, user:<poster>, user:<hustler>}` (spec §5).
    /// Acquired in a fixed, sorted order to avoid lock-order deadlocks
    /// between concurrent callers contending on overlapping resource sets.
    pub fn acquire_task_batch(
        &self,
        task_id: money_core::ids::TaskId,
        poster: UserId,
        hustler: Option<UserId>,
        holder: &str,
        ttl_secs: u64,
        clock: &dyn Clock,
    ) -> Result<Vec<LeaseGuard>, MoneyError> {
        let mut resources = vec![
            format!("task:{task_id}"),
            format!("user:{poster}"),
        ];
        if let Some(h) = hustler {
            resources.push(format!("user:{h}"));
        }
        resources.sort();

        let mut guards = Vec::with_capacity(resources.len());
        for resource in resources {
            match self.acquire(&resource, holder, ttl_secs, clock) {
                Ok(guard) => guards.push(guard),
                Err(e) => {
                    // Roll back any leases already acquired in this batch
                    // before propagating, so a partial failure never leaves
                    // orphaned advisory locks.
                    for g in &guards {
                        let _ = self.release(g);
                    }
                    return Err(e);
                }
            }
        }
        Ok(guards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use money_core::ids::TaskId;
    use money_core::SystemClock;

    #[test]
    fn second_holder_is_rejected_while_lease_is_live() {
        let store = Store::open_temporary().unwrap();
        let mgr = LeaseManager::new(&store);
        let clock = SystemClock;
        let g1 = mgr.acquire("task:1", "worker-a", 30, &clock).unwrap();
        let err = mgr.acquire("task:1", "worker-b", 30, &clock).unwrap_err();
        assert!(matches!(err, MoneyError::LeaseHeld { .. }));
        mgr.release(&g1).unwrap();
        assert!(mgr.acquire("task:1", "worker-b", 30, &clock).is_ok());
    }

    #[test]
    fn batch_acquire_rolls_back_on_partial_failure() {
        let store = Store::open_temporary().unwrap();
        let mgr = LeaseManager::new(&store);
        let clock = SystemClock;
        let task = TaskId::new();
        let poster = UserId::new();
        // Pre-seed a conflicting lease on the user resource so the batch
        // partially fails.
        let _ = mgr.acquire(&format!("user:{poster}"), "other-worker", 30, &clock);
        let err = mgr
            .acquire_task_batch(task, poster, None, "worker-a", 30, &clock)
            .unwrap_err();
        assert!(matches!(err, MoneyError::LeaseHeld { .. }));
        // The task: lease acquired before the failing user: lease must have
        // been rolled back.
        assert!(store.get_lease(&format!("task:{task}")).unwrap().is_none());
    }
}
