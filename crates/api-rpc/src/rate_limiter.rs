//! Rate Limiter (Token Bucket Algorithm)
//!
//! Guards the mutating RPC methods. Lock-free: the bucket lives in one
//! `AtomicU64` updated with a CAS loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Fixed-point scale: one token = 1000 milli-tokens
const MILLI: u64 = 1000;

/// Burst and refill settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub burst: u32,
    pub rate_per_sec: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst: 200,
            rate_per_sec: 100,
        }
    }
}

/// Token bucket
///
/// Packed state: upper 32 bits hold milli-tokens, lower 32 bits hold the
/// last refill time in ms since creation. Refilling in milli-tokens keeps
/// fractional progress between closely spaced calls.
pub struct RateLimiter {
    packed: AtomicU64,
    created: Instant,
    capacity_milli: u64,
    rate_per_sec: u64,
}

impl RateLimiter {
    /// `RateLimiter::new(200, 100)` allows bursts of 200 and 100 requests/sec sustained
    pub fn new(burst: u32, rate_per_sec: u32) -> Self {
        let capacity_milli = burst as u64 * MILLI;
        Self {
            packed: AtomicU64::new(capacity_milli << 32),
            created: Instant::now(),
            capacity_milli,
            rate_per_sec: rate_per_sec as u64,
        }
    }

    pub fn from_config(config: RateLimitConfig) -> Self {
        Self::new(config.burst, config.rate_per_sec)
    }

    fn elapsed_ms(&self) -> u64 {
        (self.created.elapsed().as_millis() as u64) & 0xFFFF_FFFF
    }

    /// Take one token. Returns false when the bucket is empty.
    pub fn check(&self) -> bool {
        loop {
            let packed = self.packed.load(Ordering::Acquire);
            let milli = packed >> 32;
            let last_ms = packed & 0xFFFF_FFFF;

            let now_ms = self.elapsed_ms();
            // rate tokens/sec == rate milli-tokens/ms
            let refill = now_ms.saturating_sub(last_ms) * self.rate_per_sec;
            let available = (milli + refill).min(self.capacity_milli);

            let (remaining, allowed) = if available >= MILLI {
                (available - MILLI, true)
            } else {
                (available, false)
            };

            let next = (remaining << 32) | now_ms;
            if self
                .packed
                .compare_exchange(packed, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return allowed;
            }
        }
    }

    /// Whole tokens currently in the bucket (without refill)
    pub fn remaining(&self) -> u64 {
        (self.packed.load(Ordering::Acquire) >> 32) / MILLI
    }
}
