//! Per-client request limiting.
//!
//! Fixed window with timestamp pruning: each client keeps the instants of
//! its accepted requests inside the current window. A request is admitted
//! while fewer than `max_requests` remain after pruning.
//!
//! The history lives in a [`DashMap`]; [`RateLimiter::check`] holds the
//! entry's shard lock across prune, compare, and push, so two concurrent
//! requests from one client cannot both pass on a stale count.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Default window length.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Shared request budget keyed by client identity.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum accepted requests per window. `None` disables limiting.
    max_requests: Option<u32>,
    window: Duration,
    history: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    /// Limit each client to `max_requests` per minute; `0` disables.
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, WINDOW)
    }

    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: (max_requests > 0).then_some(max_requests),
            window,
            history: DashMap::new(),
        }
    }

    /// Record a request for `client` and report whether it is allowed.
    /// Rejected requests are not recorded.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> bool {
        let Some(max) = self.max_requests else {
            return true;
        };

        let mut entry = self.history.entry(client.to_string()).or_default();
        prune(&mut entry, now, self.window);
        if entry.len() >= max as usize {
            return false;
        }
        entry.push_back(now);
        true
    }

    /// Drop expired timestamps and forget clients with no history left.
    /// Returns the number of clients evicted.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    fn evict_idle_at(&self, now: Instant) -> usize {
        let before = self.history.len();
        self.history.retain(|_, history| {
            prune(history, now, self.window);
            !history.is_empty()
        });
        before.saturating_sub(self.history.len())
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.history.len()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_enabled(&self) -> bool {
        self.max_requests.is_some()
    }
}

fn prune(history: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = history.front() {
        if now.saturating_duration_since(*oldest) >= window {
            history.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_allows_budget_then_rejects() {
        let limiter = RateLimiter::per_minute(3);
        assert!(limiter.check("a"));
        assert!(limiter.check("a"));
        assert!(limiter.check("a"));
        assert!(!limiter.check("a"));
        // other clients have their own budget
        assert!(limiter.check("b"));
    }

    #[test]
    fn test_window_expiry_restores_budget() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.check_at("a", start));
        assert!(!limiter.check_at("a", start + Duration::from_secs(59)));
        assert!(limiter.check_at("a", start + Duration::from_secs(60)));
    }

    #[test]
    fn test_rejected_requests_are_not_recorded() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.check_at("a", start));
        for offset in 1..10 {
            assert!(!limiter.check_at("a", start + Duration::from_secs(offset)));
        }
        assert!(limiter.check_at("a", start + Duration::from_secs(61)));
    }

    #[test]
    fn test_zero_disables_limiting() {
        let limiter = RateLimiter::per_minute(0);
        assert!(!limiter.is_enabled());
        for _ in 0..100 {
            assert!(limiter.check("a"));
        }
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_evict_idle_drops_empty_histories() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();
        limiter.check_at("old", start);
        limiter.check_at("fresh", start + Duration::from_secs(50));
        assert_eq!(limiter.tracked_clients(), 2);

        let evicted = limiter.evict_idle_at(start + Duration::from_secs(70));
        assert_eq!(evicted, 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_concurrent_checks_never_exceed_budget() {
        let limiter = Arc::new(RateLimiter::per_minute(10));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || (0..10).filter(|_| limiter.check("shared")).count())
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 10);
    }
}
