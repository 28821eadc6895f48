//! Sliding-window request limiter keyed by client identity.
//!
//! The ledger is the only state shared across concurrent requests. A single
//! mutex over the whole map serializes the check-and-append for every key, so
//! two concurrent requests from the same client can never both observe a free
//! slot. The lock is never held across an await point.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::LimitsConfig;

pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    gc_threshold: usize,
    clients: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: usize, gc_threshold: usize) -> Self {
        Self {
            window,
            max_requests,
            gc_threshold,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_limits(limits: &LimitsConfig) -> Self {
        Self::new(
            Duration::from_millis(limits.rate_window_ms),
            limits.rate_max_requests,
            limits.rate_gc_threshold,
        )
    }

    /// Returns true when the client is admitted. A rejected attempt still
    /// prunes the client's stale timestamps but does not consume quota.
    pub fn admit(&self, client_id: &str) -> bool {
        self.admit_at(client_id, Instant::now())
    }

    fn admit_at(&self, client_id: &str, now: Instant) -> bool {
        let mut clients = self
            .clients
            .lock()
            .expect("rate limit ledger lock poisoned");

        if clients.len() > self.gc_threshold {
            let before = clients.len();
            clients.retain(|_, stamps| {
                stamps
                    .iter()
                    .any(|t| now.saturating_duration_since(*t) < self.window)
            });
            tracing::debug!(
                dropped = before - clients.len(),
                tracked = clients.len(),
                "rate limit ledger garbage collected"
            );
        }

        let stamps = clients.entry(client_id.to_string()).or_default();
        stamps.retain(|t| now.saturating_duration_since(*t) < self.window);

        if stamps.len() < self.max_requests {
            stamps.push(now);
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.clients
            .lock()
            .expect("rate limit ledger lock poisoned")
            .len()
    }
}
