//! Retry policy with exponential backoff
//!
//! Decides whether a classified failure is worth another attempt and
//! computes the backoff delay. Delay growth is exponential, capped at
//! `max_delay_ms`, and jittered with a uniform factor in [0, 1] so that
//! many concurrent calls do not retry in lockstep.

use crate::recovery::types::{ErrorPattern, ErrorType};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum invocation attempts per call (first attempt included)
    pub max_attempts: u32,

    /// Base delay in milliseconds
    pub base_delay_ms: u64,

    /// Exponential growth factor per attempt
    pub exponential_base: f64,

    /// Delay cap in milliseconds
    pub max_delay_ms: u64,

    /// Randomize delays to avoid thundering-herd retries
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            exponential_base: 2.0,
            max_delay_ms: 16_000,
            jitter: true,
        }
    }
}

/// Retry decision and backoff calculator
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a policy from configuration
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Whether another attempt should be made
    ///
    /// `attempt_number` counts completed attempts; once it reaches
    /// `max_attempts` the answer is always no.
    pub fn should_retry(&self, pattern: &ErrorPattern, attempt_number: u32) -> bool {
        pattern.can_retry && attempt_number < self.config.max_attempts
    }

    /// Backoff delay before the next attempt
    ///
    /// `min(base_delay * exponential_base^attempt_number, max_delay)`,
    /// scaled by a uniform random factor in [0, 1] when jitter is on.
    /// Rate-limit failures keep the full delay: the point there is to
    /// respect the upstream's pacing, not to decorrelate retries.
    pub fn calculate_delay(&self, attempt_number: u32, pattern: &ErrorPattern) -> Duration {
        let exponential =
            self.config.base_delay_ms as f64 * self.config.exponential_base.powi(attempt_number as i32);
        let capped = exponential.min(self.config.max_delay_ms as f64);

        let final_ms = if self.config.jitter && pattern.error_type != ErrorType::RateLimit {
            capped * rand::random::<f64>()
        } else {
            capped
        };

        Duration::from_millis(final_ms as u64)
    }

    /// Upper bound on total backoff sleep across a full retry cycle
    pub fn max_total_delay(&self) -> Duration {
        let mut total = 0.0_f64;
        for attempt in 0..self.config.max_attempts {
            let exponential =
                self.config.base_delay_ms as f64 * self.config.exponential_base.powi(attempt as i32);
            total += exponential.min(self.config.max_delay_ms as f64);
        }
        Duration::from_millis(total as u64)
    }

    /// Maximum invocation attempts
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
