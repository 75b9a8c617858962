//! Connection retry policy.

use std::time::Duration;

/// Default connection attempt budget per connect episode.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff base delay.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(250);

/// Bounded exponential backoff for connection attempts.
///
/// A deterministic function of the attempt number alone, with no hidden
/// state: attempts `1..=max_attempts` get exponentially increasing
/// delays, anything past the budget yields `None` (give up). Consulted
/// only around the transport connect call; command writes are never
/// retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with a custom attempt budget and base delay.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Returns the attempt budget.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay to wait before the given attempt (1-based), or
    /// `None` once the attempt budget is spent.
    ///
    /// The delay doubles per attempt: base, 2×base, 4×base, ...
    #[must_use]
    pub const fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        Some(self.base_delay.saturating_mul(factor))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_delay(1), Some(Duration::from_millis(250)));
        assert_eq!(policy.next_delay(2), Some(Duration::from_millis(500)));
        assert_eq!(policy.next_delay(3), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_gives_up_past_budget() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_delay(4), None);
        assert_eq!(policy.next_delay(5), None);
        assert_eq!(policy.next_delay(u32::MAX), None);
    }

    #[test]
    fn test_attempt_zero_is_invalid() {
        assert_eq!(RetryPolicy::default().next_delay(0), None);
    }

    #[test]
    fn test_delays_increase() {
        let policy = RetryPolicy::new(6, Duration::from_millis(10));
        let mut previous = Duration::ZERO;
        for attempt in 1..=6 {
            let delay = policy.next_delay(attempt).unwrap();
            assert!(delay > previous, "attempt {attempt} did not back off");
            previous = delay;
        }
        assert_eq!(policy.next_delay(7), None);
    }

    #[test]
    fn test_custom_policy() {
        let policy = RetryPolicy::new(1, Duration::from_secs(2));
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.next_delay(1), Some(Duration::from_secs(2)));
        assert_eq!(policy.next_delay(2), None);
    }

    #[test]
    fn test_deterministic() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_delay(2), policy.next_delay(2));
    }
}
