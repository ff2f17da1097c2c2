//! bootgate: database-gated service boot.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │                            BOOTGATE                              │
//!   │                                                                  │
//!   │  ┌───────────┐   ┌───────────┐   ┌──────────┐   ┌────────────┐   │
//!   │  │ readiness │──▶│ migration │──▶│   seed   │──▶│  handoff   │───┼──▶ server
//!   │  │  prober   │   │  runner   │   │ (advisory│   │exec/superv.│   │   process
//!   │  └─────┬─────┘   └─────┬─────┘   └────┬─────┘   └────────────┘   │
//!   │        │ retry         │ fatal        │ swallowed                │
//!   │        ▼               ▼              ▼                          │
//!   │  ┌────────────────────────────────────────────────────────────┐  │
//!   │  │                  Cross-Cutting Concerns                    │  │
//!   │  │  config (file/env/.env)   resilience (backoff/retry)       │  │
//!   │  │  lifecycle (phases, cancellation, signals)   observability │  │
//!   │  └────────────────────────────────────────────────────────────┘  │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Phases never overlap: each one gates entry into the next.

// Boot phases
pub mod handoff;
pub mod process;
pub mod readiness;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::{BootConfig, ConnectionTarget};
pub use error::{BootError, ErrorClass};
pub use lifecycle::{BootPhase, BootSequence, Shutdown};
