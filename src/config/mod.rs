//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! bootgate.toml (optional)
//!     → loader.rs (parse & deserialize, defaults for every section)
//!     → CLI overrides (log format, handoff mode, server command)
//!     → validation.rs (semantic checks, all errors at once)
//!     → BootConfig (validated, immutable)
//!
//! .env (optional) → process environment
//!     → env.rs (DB_* → PG* → config file → default)
//!     → ConnectionTarget (immutable for the boot)
//! ```
//!
//! # Design Decisions
//! - Resolution happens once, before the first phase runs
//! - Unusable variables produce a single fatal error listing all of them
//! - The credential never appears in logs or rendered output

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::{ConnectionTarget, ResolvedTarget, ValueSource};
pub use loader::{load_env_file, load_or_default, ConfigError};
pub use schema::{
    BootConfig, DatabaseConfig, EnvConfig, HandoffMode, LogFormat, MigrationConfig, ObservabilityConfig,
    ProbeMode, ReadinessConfig, SeedConfig, ServerConfig,
};
pub use validation::{validate_config, ValidationError};
