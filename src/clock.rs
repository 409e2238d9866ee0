//! Monotonic nanosecond clock.
//!
//! All timestamps in the engine come from a single process-wide monotonic
//! epoch (the first call), so latency deltas never go backwards and never
//! involve wall-clock adjustments.

use std::sync::OnceLock;
use std::time::Instant;

use crate::types::Timestamp;

fn epoch() -> Instant {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    *EPOCH.get_or_init(Instant::now)
}

/// Current monotonic time in nanoseconds since the process epoch.
#[inline]
pub fn monotonic_ns() -> Timestamp {
    epoch().elapsed().as_nanos() as Timestamp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_never_decreases() {
        let mut last = monotonic_ns();
        for _ in 0..1_000 {
            let now = monotonic_ns();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn test_monotonic_advances() {
        let start = monotonic_ns();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(monotonic_ns() - start >= 2_000_000);
    }
}
