//! `Clock` is passed explicitly everywhere "now" matters, per spec §9's
//! "Global mutable state ... pass context (DB handle, clock, logger,
//! config) explicitly." This is the one piece of ambient state callers
//! must thread through rather than reach for `SystemTime::now()` directly,
//! so tests can drive time deterministically.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn now_unix(&self) -> i64 {
        self.now().timestamp()
    }
}

#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that can be advanced under test control. Used by saga and
/// sweeper tests that need to simulate TTL expiry or temporal-guard
/// violations without sleeping.
pub struct FixedClock {
    inner: std::sync::Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(t: DateTime<Utc>) -> Self {
        Self {
            inner: std::sync::Mutex::new(t),
        }
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut guard = self.inner.lock().expect("clock mutex poisoned");
        *guard += duration;
    }

    pub fn set(&self, t: DateTime<Utc>) {
        let mut guard = self.inner.lock().expect("clock mutex poisoned");
        *guard = t;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.inner.lock().expect("clock mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_on_demand() {
        let c = FixedClock::at(DateTime::<Utc>::from_timestamp(0, 0).unwrap());
        let t0 = c.now();
        c.advance(chrono::Duration::seconds(10));
        let t1 = c.now();
        assert_eq!((t1 - t0).num_seconds(), 10);
    }
}
