//! Pacing between submissions.

use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Delays and concurrency bound applied by the transfer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    /// Upper bound of the random wait before a distribution starts.
    pub jitter_max: Duration,
    /// Pause after each confirmed distribution transfer.
    pub inter_tx_delay: Duration,
    /// Maximum tasks in flight per fan-out.
    pub max_in_flight: usize,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self {
            jitter_max: Duration::from_millis(2000),
            inter_tx_delay: Duration::from_millis(2000),
            max_in_flight: 8,
        }
    }
}

impl PacingPolicy {
    /// No delays, default concurrency.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            jitter_max: Duration::ZERO,
            inter_tx_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Random duration in `[0, jitter_max]`.
    #[must_use]
    pub fn jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.jitter_max.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..=max_ms))
    }

    /// Sleeps for a random jitter.
    pub async fn wait_jitter(&self) {
        let delay = self.jitter();
        debug!(delay_ms = delay.as_millis() as u64, "Waiting before start");
        tokio::time::sleep(delay).await;
    }

    /// Sleeps for the inter-transaction delay.
    pub async fn wait_between_transactions(&self) {
        if !self.inter_tx_delay.is_zero() {
            tokio::time::sleep(self.inter_tx_delay).await;
        }
    }

    /// Concurrency bound, never below one.
    #[must_use]
    pub fn permits(&self) -> usize {
        self.max_in_flight.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_within_bound() {
        let pacing = PacingPolicy::default();
        for _ in 0..200 {
            assert!(pacing.jitter() <= Duration::from_millis(2000));
        }
        assert_eq!(PacingPolicy::immediate().jitter(), Duration::ZERO);
    }

    #[test]
    fn test_permits_never_zero() {
        let pacing = PacingPolicy {
            max_in_flight: 0,
            ..PacingPolicy::default()
        };
        assert_eq!(pacing.permits(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_jitter_advances_clock_within_bound() {
        let pacing = PacingPolicy::default();
        let start = tokio::time::Instant::now();
        pacing.wait_jitter().await;
        assert!(start.elapsed() <= Duration::from_millis(2000));
    }
}
