//! Time utilities for permcalc.
//!
//! All timestamps are Unix epoch microseconds (u64).

use std::sync::atomic::{AtomicU64, Ordering};

/// Return the current time as microseconds since Unix epoch.
///
/// A clock set before the epoch reads as zero rather than panicking.
pub fn now_micros() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Convert microseconds to an RFC 3339 string.
pub fn micros_to_rfc3339(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    let nsecs = ((micros % 1_000_000) * 1000) as u32;
    let dt = chrono::DateTime::from_timestamp(secs, nsecs).unwrap_or(chrono::DateTime::UNIX_EPOCH);
    dt.to_rfc3339()
}

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync {
    /// Current time in microseconds since the Unix epoch.
    fn now(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        now_micros()
    }
}

/// Manually driven clock, for deterministic expiry.
#[derive(Debug, Default)]
pub struct FixedClock {
    micros: AtomicU64,
}

impl FixedClock {
    pub fn new(micros: u64) -> Self {
        Self {
            micros: AtomicU64::new(micros),
        }
    }

    pub fn set(&self, micros: u64) {
        self.micros.store(micros, Ordering::SeqCst);
    }

    pub fn advance(&self, micros: u64) {
        self.micros.fetch_add(micros, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.micros.load(Ordering::SeqCst)
    }
}
