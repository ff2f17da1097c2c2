//! The readiness attempt loop.

use std::time::Duration;

use tokio::time::{self, Instant};

use crate::config::{ConnectionTarget, ReadinessConfig};
use crate::error::BootError;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::readiness::{Probe, ProbeAttempt, ProbeError, ProbeOutcome, ReadinessReport};
use crate::resilience::{RetryDecision, RetryPolicy, RetryState};

/// Blocks until the datastore accepts a connection.
pub struct ReadinessProber {
    probe: Box<dyn Probe>,
    policy: RetryPolicy,
    connect_timeout: Duration,
}

impl ReadinessProber {
    pub fn new(probe: Box<dyn Probe>, policy: RetryPolicy, connect_timeout: Duration) -> Self {
        Self {
            probe,
            policy,
            connect_timeout,
        }
    }

    pub fn from_config(probe: Box<dyn Probe>, config: &ReadinessConfig) -> Self {
        Self::new(
            probe,
            RetryPolicy::from(config),
            Duration::from_secs(config.connect_timeout_secs),
        )
    }

    /// Probe until one attempt succeeds, the policy gives up, or the boot is cancelled.
    pub async fn wait_until_ready(
        &self,
        target: &ConnectionTarget,
        shutdown: &mut ShutdownSignal,
    ) -> Result<ReadinessReport, BootError> {
        let mut retry = RetryState::new(self.policy.clone());
        let mut report = ReadinessReport::default();

        tracing::info!(
            datastore = %target,
            probe = self.probe.name(),
            interval_ms = self.policy.interval.as_millis() as u64,
            max_attempts = ?self.policy.max_attempts,
            timeout = ?self.policy.timeout,
            "Waiting for datastore"
        );

        loop {
            let attempt = report.attempts.len() as u32 + 1;
            let at = Instant::now();

            let result = tokio::select! {
                biased;
                reason = shutdown.cancelled() => return Err(BootError::Cancelled(reason)),
                result = time::timeout(self.connect_timeout, self.probe.check(target)) => {
                    result.unwrap_or(Err(ProbeError::Timeout(self.connect_timeout)))
                }
            };

            let err = match result {
                Ok(()) => {
                    report.attempts.push(ProbeAttempt {
                        attempt,
                        at,
                        outcome: ProbeOutcome::Success,
                    });
                    tracing::info!(
                        attempt,
                        elapsed_ms = retry.elapsed().as_millis() as u64,
                        "Datastore is accepting connections"
                    );
                    return Ok(report);
                }
                Err(err) => err,
            };

            let cause = err.to_string();
            report.attempts.push(ProbeAttempt {
                attempt,
                at,
                outcome: ProbeOutcome::Failure(cause.clone()),
            });

            match retry.record_failure() {
                RetryDecision::RetryAfter(delay) => {
                    tracing::warn!(
                        attempt,
                        error = %cause,
                        retry_in_ms = delay.as_millis() as u64,
                        "Datastore not ready, retrying"
                    );
                    tokio::select! {
                        biased;
                        reason = shutdown.cancelled() => return Err(BootError::Cancelled(reason)),
                        _ = time::sleep(delay) => {}
                    }
                }
                RetryDecision::GiveUp(reason) => {
                    tracing::error!(attempt, error = %cause, reason = %reason, "Giving up on datastore");
                    return Err(BootError::ReadinessExhausted {
                        attempts: attempt,
                        elapsed: retry.elapsed(),
                        last_error: cause,
                    });
                }
            }
        }
    }
}
