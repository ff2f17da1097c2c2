//! Retry policy and the retry state machine.
//!
//! # Design Decisions
//! - Delay growth comes from `backoff.rs`; a multiplier of 1.0 keeps a
//!   fixed interval
//! - Both ceilings are optional; with neither set the loop never gives up
//! - The deadline check happens before sleeping: if the next attempt would
//!   start past the deadline, we give up now instead of sleeping first

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::ReadinessConfig;
use crate::resilience::backoff::calculate_backoff;

/// How long to wait between attempts and when to stop.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
    pub jitter_ratio: f64,
    pub max_attempts: Option<u32>,
    pub timeout: Option<Duration>,
}

impl RetryPolicy {
    /// Fixed interval, no ceiling.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            multiplier: 1.0,
            max_interval: interval,
            jitter_ratio: 0.0,
            max_attempts: None,
            timeout: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_backoff(mut self, multiplier: f64, max_interval: Duration) -> Self {
        self.multiplier = multiplier;
        self.max_interval = max_interval;
        self
    }

    /// Delay after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        calculate_backoff(
            attempt,
            self.interval.as_millis() as u64,
            self.multiplier,
            self.max_interval.as_millis() as u64,
            self.jitter_ratio,
        )
    }
}

impl From<&ReadinessConfig> for RetryPolicy {
    fn from(config: &ReadinessConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            multiplier: config.multiplier,
            max_interval: Duration::from_millis(config.max_interval_ms),
            jitter_ratio: config.jitter_ratio,
            max_attempts: config.max_attempts,
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Why the retry loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiveUpReason {
    MaxAttempts(u32),
    Timeout(Duration),
}

impl fmt::Display for GiveUpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GiveUpReason::MaxAttempts(max) => write!(f, "reached max attempts ({})", max),
            GiveUpReason::Timeout(timeout) => write!(f, "timed out after {:?}", timeout),
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp(GiveUpReason),
}

/// Tracks failed attempts against a [`RetryPolicy`].
#[derive(Debug)]
pub struct RetryState {
    policy: RetryPolicy,
    failures: u32,
    started: Instant,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            failures: 0,
            started: Instant::now(),
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Record a failed attempt and decide whether to try again.
    pub fn record_failure(&mut self) -> RetryDecision {
        self.failures = self.failures.saturating_add(1);

        if let Some(max) = self.policy.max_attempts {
            if self.failures >= max {
                return RetryDecision::GiveUp(GiveUpReason::MaxAttempts(max));
            }
        }

        let delay = self.policy.delay_for(self.failures);
        if let Some(timeout) = self.policy.timeout {
            if self.elapsed() + delay > timeout {
                return RetryDecision::GiveUp(GiveUpReason::Timeout(timeout));
            }
        }

        RetryDecision::RetryAfter(delay)
    }
}
