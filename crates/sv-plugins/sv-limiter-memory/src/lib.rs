//! # sv-limiter-memory
//!
//! Fixed-window request throttle held entirely in process memory.
//! Counters live in a concurrent map keyed by (packed address, route group);
//! each key gets `permits` requests per window, excess is rejected, never
//! queued. The clock is injected so tests can step time explicitly.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sv_core::traits::{Clock, Decision, RateGate};

/// Wall clock used outside of tests.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Window {
    started: Instant,
    used: u32,
}

pub struct MemoryRateGate {
    permits: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    buckets: DashMap<(Vec<u8>, String), Window>,
}

impl MemoryRateGate {
    pub fn new(permits: u32, window: Duration) -> Self {
        Self::with_clock(permits, window, Arc::new(SystemClock))
    }

    pub fn with_clock(permits: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            permits,
            window,
            clock,
            buckets: DashMap::new(),
        }
    }
}

impl RateGate for MemoryRateGate {
    fn check(&self, packed_addr: &[u8], group: &str) -> Decision {
        let now = self.clock.now();
        let key = (packed_addr.to_vec(), group.to_string());
        let mut bucket = self.buckets.entry(key).or_insert(Window {
            started: now,
            used: 0,
        });

        // stale window: start a fresh one
        if now.duration_since(bucket.started) >= self.window {
            bucket.started = now;
            bucket.used = 0;
        }

        if bucket.used < self.permits {
            bucket.used += 1;
            Decision::Allowed {
                remaining: self.permits - bucket.used,
            }
        } else {
            let elapsed = now.duration_since(bucket.started);
            Decision::Limited {
                retry_after: self.window.saturating_sub(elapsed),
            }
        }
    }
}
