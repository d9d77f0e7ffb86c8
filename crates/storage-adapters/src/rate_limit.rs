//! In-process post throttle.
//!
//! One ledger entry per key holding the millisecond timestamp of its last
//! accepted post. The check-and-update runs inside a single `DashMap` entry
//! guard, so two requests with the same key cannot both pass; unrelated
//! keys only contend when they share a shard, and only for that one
//! operation. Entries live as long as the process.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::RateLimiter;

#[derive(Debug)]
pub struct InMemoryRateLimiter {
    min_interval_ms: i64,
    ledger: DashMap<String, i64>,
}

impl InMemoryRateLimiter {
    pub fn new(min_interval_ms: i64) -> Self {
        Self {
            min_interval_ms,
            ledger: DashMap::new(),
        }
    }

    /// Number of keys ever seen.
    pub fn tracked_keys(&self) -> usize {
        self.ledger.len()
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn allow(&self, key: &str, now_ms: i64) -> bool {
        match self.ledger.entry(key.to_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(now_ms);
                true
            }
            Entry::Occupied(mut slot) => {
                if now_ms - *slot.get() >= self.min_interval_ms {
                    slot.insert(now_ms);
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn one_post_per_second_per_key() {
        let limiter = InMemoryRateLimiter::new(1000);
        let t = 1_700_000_000_000;

        assert!(limiter.allow("seed", t));
        assert!(!limiter.allow("seed", t + 500));
        assert!(limiter.allow("seed", t + 1000));
    }

    #[test]
    fn rejection_does_not_move_the_window() {
        let limiter = InMemoryRateLimiter::new(1000);
        assert!(limiter.allow("seed", 0));
        assert!(!limiter.allow("seed", 999));
        assert!(limiter.allow("seed", 1000));
        assert!(!limiter.allow("seed", 1999));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = InMemoryRateLimiter::new(1000);
        assert!(limiter.allow("a", 0));
        assert!(limiter.allow("b", 1));
        assert!(!limiter.allow("a", 2));
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn concurrent_same_key_admits_exactly_one() {
        let limiter = Arc::new(InMemoryRateLimiter::new(1000));
        let admitted = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let admitted = Arc::clone(&admitted);
                std::thread::spawn(move || {
                    if limiter.allow("shared", 42) {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 1);
    }
}
