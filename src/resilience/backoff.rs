//! Retry delays for provider fetches.

use std::time::Duration;
use rand::Rng;
use crate::config::BackoffConfig;

/// Floor for every delay, so a failing provider is never polled in a hot loop.
pub const MIN_DELAY_MS: u64 = 1;

/// Delay policy between consecutive failed fetches.
///
/// When `base == max` the delay is fixed; otherwise it doubles per attempt
/// with jitter, capped at `max`. Zero delays are raised to [`MIN_DELAY_MS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
}

impl Backoff {
    pub fn fixed(delay: Duration) -> Self {
        let ms = to_ms(delay);
        Self::from_millis(ms, ms)
    }

    pub fn exponential(base: Duration, max: Duration) -> Self {
        Self::from_millis(to_ms(base), to_ms(max))
    }

    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::from_millis(config.base_delay_ms, config.max_delay_ms)
    }

    fn from_millis(base_ms: u64, max_ms: u64) -> Self {
        let base_ms = base_ms.max(MIN_DELAY_MS);
        Self {
            base_ms,
            max_ms: max_ms.max(base_ms),
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        if self.max_ms <= self.base_ms {
            return Duration::from_millis(self.base_ms);
        }
        calculate_backoff(attempt.max(1), self.base_ms, self.max_ms)
    }
}

fn to_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Default for Backoff {
    fn default() -> Self {
        Self::fixed(Duration::from_millis(100))
    }
}

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let b1 = calculate_backoff(1, 100, 2000);
        assert!(b1.as_millis() >= 100);

        let b2 = calculate_backoff(2, 100, 2000);
        assert!(b2.as_millis() >= 200);

        let max = calculate_backoff(10, 100, 1000);
        assert!(max.as_millis() >= 1000);
    }

    #[test]
    fn test_default_is_fixed_100ms() {
        let backoff = Backoff::default();
        for attempt in 1..10 {
            assert_eq!(backoff.delay(attempt), Duration::from_millis(100));
        }
    }

    #[test]
    fn test_exponential_grows_and_caps() {
        let backoff = Backoff::exponential(Duration::from_millis(50), Duration::from_millis(400));

        assert!(backoff.delay(1) >= Duration::from_millis(50));
        assert!(backoff.delay(3) >= Duration::from_millis(200));
        // cap plus at most 10% jitter
        assert!(backoff.delay(20) < Duration::from_millis(441));
    }

    #[test]
    fn test_from_config_clamps_max_below_base() {
        let config = BackoffConfig {
            base_delay_ms: 300,
            max_delay_ms: 10,
        };
        assert_eq!(Backoff::from_config(&config).delay(5), Duration::from_millis(300));
    }

    #[test]
    fn test_zero_delay_is_raised_to_floor() {
        let floor = Duration::from_millis(MIN_DELAY_MS);

        assert_eq!(Backoff::fixed(Duration::ZERO).delay(1), floor);
        assert_eq!(Backoff::fixed(Duration::from_micros(300)).delay(3), floor);
        assert!(Backoff::exponential(Duration::ZERO, Duration::from_millis(8)).delay(1) >= floor);

        let config = BackoffConfig {
            base_delay_ms: 0,
            max_delay_ms: 0,
        };
        assert_eq!(Backoff::from_config(&config).delay(2), floor);
    }
}
