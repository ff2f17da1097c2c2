//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Check alembic.ini → Probe datastore → Migrate → Seed → HandoffPlan
//!
//! Shutdown (shutdown.rs):
//!     Trigger → every phase waiting on a ShutdownSignal aborts → exit 130
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Strictly ordered startup: no phase begins before the previous one succeeded
//! - Cancellation is observed between attempts and while children run

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{BootPhase, BootReport, BootSequence};
