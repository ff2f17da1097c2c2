//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a boot.
//! All types derive Serde traits for deserialization from config files, and
//! every section defaults so that an absent file is a valid configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

/// Root configuration for the boot sequence.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BootConfig {
    /// File-level connection values, below the environment in precedence.
    pub database: DatabaseConfig,

    /// Readiness probe and retry policy.
    pub readiness: ReadinessConfig,

    /// Migration engine invocation.
    pub migrations: MigrationConfig,

    /// Optional seed step.
    pub seed: SeedConfig,

    /// Server command and handoff mode.
    pub server: ServerConfig,

    /// Environment loading and export.
    pub env: EnvConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Connection values from the config file.
///
/// Each field is optional; unset fields fall through to the engine default.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub name: Option<String>,
    pub user: Option<String>,
    #[serde(serialize_with = "redact_secret")]
    pub password: Option<String>,
}

/// How the readiness probe connects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    /// Full PostgreSQL handshake with the resolved credentials.
    #[default]
    Postgres,
    /// Plain TCP connect to host:port.
    Tcp,
}

impl fmt::Display for ProbeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeMode::Postgres => f.write_str("postgres"),
            ProbeMode::Tcp => f.write_str("tcp"),
        }
    }
}

/// Readiness probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Probe style.
    pub mode: ProbeMode,

    /// Delay after the first failed attempt, in milliseconds.
    pub interval_ms: u64,

    /// Growth factor applied per failed attempt (1.0 = fixed interval).
    pub multiplier: f64,

    /// Upper bound on the delay between attempts, in milliseconds.
    pub max_interval_ms: u64,

    /// Random extra delay as a fraction of the computed delay (0.0 - 1.0).
    pub jitter_ratio: f64,

    /// Give up after this many failed attempts. Unbounded when unset.
    pub max_attempts: Option<u32>,

    /// Give up once this much time has passed. Unbounded when unset.
    pub timeout_secs: Option<u64>,

    /// Deadline for a single connection attempt, in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            mode: ProbeMode::Postgres,
            interval_ms: 2_000,
            multiplier: 1.0,
            max_interval_ms: 30_000,
            jitter_ratio: 0.0,
            max_attempts: None,
            timeout_secs: None,
            connect_timeout_secs: 5,
        }
    }
}

/// Migration engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Descriptor that must exist before anything else runs.
    pub config_path: PathBuf,

    /// "Upgrade to latest" command line.
    pub command: Vec<String>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("alembic.ini"),
            command: vec!["alembic".into(), "upgrade".into(), "head".into()],
        }
    }
}

/// Seed step configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SeedConfig {
    pub enabled: bool,

    /// Script to run when present.
    pub script_path: PathBuf,

    /// Program (and leading args) the script is passed to.
    pub interpreter: Vec<String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            script_path: PathBuf::from("seed.py"),
            interpreter: vec!["python".into()],
        }
    }
}

/// How control passes to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandoffMode {
    /// Replace the process image.
    Exec,
    /// Spawn a child, relay signals, exit with its status.
    Supervise,
}

impl Default for HandoffMode {
    fn default() -> Self {
        if cfg!(unix) {
            HandoffMode::Exec
        } else {
            HandoffMode::Supervise
        }
    }
}

impl fmt::Display for HandoffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandoffMode::Exec => f.write_str("exec"),
            HandoffMode::Supervise => f.write_str("supervise"),
        }
    }
}

impl FromStr for HandoffMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exec" => Ok(HandoffMode::Exec),
            "supervise" => Ok(HandoffMode::Supervise),
            other => Err(format!("unknown handoff mode '{}' (expected exec or supervise)", other)),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server command line. Overridden by trailing CLI arguments.
    pub command: Vec<String>,

    pub mode: HandoffMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: vec![
                "uvicorn".into(),
                "main:app".into(),
                "--host".into(),
                "0.0.0.0".into(),
                "--port".into(),
                "8000".into(),
            ],
            mode: HandoffMode::default(),
        }
    }
}

/// Environment loading and export.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Explicit dotenv file. When unset, `.env` is loaded if it exists.
    pub file: Option<PathBuf>,

    /// Export the resolved target to child processes as DB_* and PG* variables.
    pub export: bool,

    /// When set, also export DATABASE_URL with this scheme (e.g. `postgresql+asyncpg`).
    pub database_url_scheme: Option<String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            file: None,
            export: true,
            database_url_scheme: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected pretty or json)", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

pub(crate) fn redact_secret<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(_) => serializer.serialize_some("********"),
        None => serializer.serialize_none(),
    }
}
