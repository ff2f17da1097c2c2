//! Datastore readiness probing.
//!
//! # Data Flow
//! ```text
//! ConnectionTarget
//!     → prober.rs (attempt loop, driven by resilience::RetryState)
//!         → Probe::check (postgres.rs: real handshake | tcp.rs: raw connect)
//!         → ProbeAttempt recorded, logged
//!     → ReadinessReport on first success
//! ```
//!
//! # Design Decisions
//! - Each attempt opens a fresh connection and closes it at once
//! - Every attempt has its own deadline (connect timeout)
//! - Attempts are never issued faster than the retry interval

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::{ConnectionTarget, ProbeMode};

pub mod postgres;
pub mod prober;
pub mod tcp;

pub use postgres::PostgresProbe;
pub use prober::ReadinessProber;
pub use tcp::TcpProbe;

/// Why a single probe attempt failed.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("datastore refused connection: {0}")]
    Driver(#[from] sqlx::Error),

    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),
}

/// One way of checking that the datastore accepts connections.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Open a connection to `target` and close it again.
    async fn check(&self, target: &ConnectionTarget) -> Result<(), ProbeError>;
}

/// Build the probe for a configured mode.
pub fn probe_for(mode: ProbeMode) -> Box<dyn Probe> {
    match mode {
        ProbeMode::Postgres => Box::new(PostgresProbe::new()),
        ProbeMode::Tcp => Box::new(TcpProbe),
    }
}

/// Result of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success,
    Failure(String),
}

/// One entry of the probing history.
#[derive(Debug, Clone)]
pub struct ProbeAttempt {
    /// 1-based attempt number.
    pub attempt: u32,
    /// When the attempt started.
    pub at: Instant,
    pub outcome: ProbeOutcome,
}

/// Attempts made until the datastore answered.
#[derive(Debug, Clone, Default)]
pub struct ReadinessReport {
    pub attempts: Vec<ProbeAttempt>,
}

impl ReadinessReport {
    pub fn total(&self) -> usize {
        self.attempts.len()
    }

    pub fn failures(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.outcome, ProbeOutcome::Failure(_)))
            .count()
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.attempts.last(), Some(ProbeAttempt { outcome: ProbeOutcome::Success, .. }))
    }

    /// Time between the first and last attempt.
    pub fn elapsed(&self) -> Duration {
        match (self.attempts.first(), self.attempts.last()) {
            (Some(first), Some(last)) => last.at.duration_since(first.at),
            _ => Duration::ZERO,
        }
    }
}
