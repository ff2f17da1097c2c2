//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Readiness probe fails:
//!     → retries.rs (record failure, check max attempts / deadline)
//!     → backoff.rs (delay for this attempt: fixed or exponential, capped, jittered)
//!     → prober sleeps, or gives up with ReadinessExhausted
//! ```
//!
//! # Design Decisions
//! - Only the readiness phase retries; migrations never do
//! - Default policy is a fixed 2s interval with no ceiling

pub mod backoff;
pub mod retries;

pub use retries::{GiveUpReason, RetryDecision, RetryPolicy, RetryState};
