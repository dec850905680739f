//! Exponential-backoff policy for realtime reconnects.
//!
//! The k-th attempt after a connection loss waits
//! `initial_delay * multiplier^(k-1)`, clamped to `max_delay`. After
//! `max_attempts` consecutive failures [`Backoff::next`] returns `None`
//! and the client gives up. A successful handshake resets the count.

use std::time::Duration;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
    /// Attempts allowed after a loss before giving up.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            max_attempts: 5,
        }
    }
}

/// Delay before the `attempt`-th reconnect (1-based).
pub fn delay_for_attempt(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
    let ms = config.initial_delay.as_millis() as f64 * config.multiplier.powi(exponent);
    if !ms.is_finite() || ms >= config.max_delay.as_millis() as f64 {
        return config.max_delay;
    }
    Duration::from_millis(ms as u64)
}

/// Attempt counter for one client.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: ReconnectConfig,
    attempts: u32,
}

impl Backoff {
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    /// Claim the next attempt, returning its number and delay, or `None`
    /// once `max_attempts` have been used.
    pub fn next(&mut self) -> Option<(u32, Duration)> {
        if self.attempts >= self.config.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some((self.attempts, delay_for_attempt(self.attempts, &self.config)))
    }

    /// Forget previous failures after a successful connection.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
