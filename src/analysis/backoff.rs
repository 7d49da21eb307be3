//! Backoff policy for the retry loop
//!
//! Delay depends on why the attempt failed. Rate-limit errors should not
//! be retried against the same model slowly, so they get a short delay
//! that grows exponentially only across consecutive rate-limit failures.
//! Parse failures are usually model-output noise correctable by a quick
//! retry. Anything else gets conservative growth to avoid hammering a
//! possibly-degraded provider.

use crate::config::BackoffConfig;
use std::time::Duration;

/// The retry delay table, resolved from configuration
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    rate_limit_base: Duration,
    rate_limit_cap: Duration,
    parse_retry: Duration,
    transient_base: Duration,
    transient_cap: Duration,
}

impl BackoffPolicy {
    /// Delay after a rate-limit failure: exponential over the number of
    /// consecutive rate-limit failures this request, capped
    pub fn rate_limit_delay(&self, consecutive_rate_limits: u32) -> Duration {
        let exponent = consecutive_rate_limits.saturating_sub(1).min(16);
        let delay = self
            .rate_limit_base
            .saturating_mul(1u32.checked_shl(exponent).unwrap_or(u32::MAX));
        delay.min(self.rate_limit_cap)
    }

    /// Fixed short delay after a parse or schema failure
    pub fn parse_delay(&self) -> Duration {
        self.parse_retry
    }

    /// Delay after any other transient failure: linear in the attempt
    /// number, capped
    pub fn transient_delay(&self, attempt: usize) -> Duration {
        let factor = u32::try_from(attempt).unwrap_or(u32::MAX);
        self.transient_base
            .saturating_mul(factor)
            .min(self.transient_cap)
    }
}

impl From<&BackoffConfig> for BackoffPolicy {
    fn from(config: &BackoffConfig) -> Self {
        Self {
            rate_limit_base: Duration::from_millis(config.rate_limit_base_ms),
            rate_limit_cap: Duration::from_millis(config.rate_limit_cap_ms),
            parse_retry: Duration::from_millis(config.parse_retry_ms),
            transient_base: Duration::from_millis(config.transient_base_ms),
            transient_cap: Duration::from_millis(config.transient_cap_ms),
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(&BackoffConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_delay_doubles_up_to_cap() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.rate_limit_delay(1), Duration::from_millis(2000));
        assert_eq!(policy.rate_limit_delay(2), Duration::from_millis(4000));
        assert_eq!(policy.rate_limit_delay(3), Duration::from_millis(8000));
        // 16s would exceed the 15s cap
        assert_eq!(policy.rate_limit_delay(4), Duration::from_millis(15000));
        assert_eq!(policy.rate_limit_delay(10), Duration::from_millis(15000));
    }

    #[test]
    fn test_parse_delay_is_fixed() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.parse_delay(), Duration::from_millis(300));
        assert_eq!(policy.parse_delay(), Duration::from_millis(300));
    }

    #[test]
    fn test_transient_delay_grows_linearly_to_cap() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.transient_delay(1), Duration::from_millis(1000));
        assert_eq!(policy.transient_delay(2), Duration::from_millis(2000));
        assert_eq!(policy.transient_delay(5), Duration::from_millis(5000));
        assert_eq!(policy.transient_delay(9), Duration::from_millis(5000));
    }

    #[test]
    fn test_huge_consecutive_count_does_not_overflow() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.rate_limit_delay(u32::MAX), Duration::from_millis(15000));
    }
}
