//! Tokio-based clock implementation.

use async_trait::async_trait;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::traits::Clock;

/// Production clock: Tokio sleeps, the monotonic clock for timeouts and the
/// system clock for on-chain timestamps.
///
/// ```rust
/// use ntt_rs::providers::TokioClock;
/// use ntt_rs::traits::Clock;
///
/// let clock = TokioClock::new();
/// assert!(clock.unix_time() > 1_600_000_000);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl TokioClock {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_time(&self) -> u64 {
        // A clock set before the epoch reads as zero.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default()
    }
}
