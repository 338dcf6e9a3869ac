//! Reconnect backoff policy.

use std::time::Duration;

use super::DEFAULT_RECONNECT_DELAY;

// ============================================================================
// ReconnectPolicy
// ============================================================================

/// Delay between a connection close and the next reconnect attempt.
///
/// The delay for the `n`-th consecutive close (counting from zero) is
/// `initial * multiplier^n`, capped at `max`. A successful open resets the
/// count. The default is a flat delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay after the first close.
    pub initial: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Growth factor per consecutive close (1 = flat).
    pub multiplier: u32,
}

impl ReconnectPolicy {
    /// Flat delay, identical after every close.
    #[inline]
    #[must_use]
    pub const fn fixed(delay: Duration) -> Self {
        Self {
            initial: delay,
            max: delay,
            multiplier: 1,
        }
    }

    /// Doubling delay starting at `initial`, capped at `max`.
    #[inline]
    #[must_use]
    pub const fn exponential(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            multiplier: 2,
        }
    }

    /// Returns the delay before reconnect number `attempt` (zero-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1).saturating_pow(attempt);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}

// ============================================================================
// Tests
// ============================================================================
