//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every phase emits:
//!     → tracing events (phase, outcome, attempt, class)
//!     → logging.rs (subscriber: env filter + pretty or JSON formatter)
//!     → stderr
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Logs go to stderr so the server owns stdout after handoff
//! - One boot span carries a boot ID through all phases

pub mod logging;

pub use logging::{boot_span, init_logging};
