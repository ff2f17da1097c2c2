//! Boot error taxonomy.
//!
//! Every fatal outcome of the boot sequence is a [`BootError`]. Each error
//! carries an [`ErrorClass`] and maps to the process exit code the operator
//! (or the container runtime) observes.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::process::ExitOutcome;

/// Exit code for precondition and configuration failures.
pub const EXIT_PRECONDITION: u8 = 1;

/// Exit code used when a command could not be spawned and the OS gave no errno.
pub const EXIT_NOT_LAUNCHED: u8 = 127;

/// Exit code for a boot cancelled by a termination signal.
pub const EXIT_CANCELLED: u8 = 130;

/// How an error affects the boot sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retried by the readiness prober, never escalated on its own.
    Transient,
    /// Detected before any phase does real work.
    FatalPrecondition,
    /// A phase ran and failed.
    FatalOperation,
    /// Logged and swallowed.
    Advisory,
    /// The server could not be started.
    FatalHandoff,
}

impl ErrorClass {
    /// Whether this class stops the boot sequence.
    pub fn is_fatal(self) -> bool {
        !matches!(self, ErrorClass::Transient | ErrorClass::Advisory)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Transient => "transient",
            ErrorClass::FatalPrecondition => "fatal_precondition",
            ErrorClass::FatalOperation => "fatal_operation",
            ErrorClass::Advisory => "advisory",
            ErrorClass::FatalHandoff => "fatal_handoff",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal boot errors.
#[derive(Debug, Error)]
pub enum BootError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("migration config descriptor not found at {}", .0.display())]
    MissingMigrationConfig(PathBuf),

    #[error("datastore not ready after {attempts} attempts in {elapsed:?}: {last_error}")]
    ReadinessExhausted {
        attempts: u32,
        elapsed: Duration,
        last_error: String,
    },

    #[error("migration command `{program}` could not be run: {source}")]
    MigrationSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("migrations failed with {0}")]
    MigrationFailed(ExitOutcome),

    #[error("server command `{program}` could not be launched: {source}")]
    HandoffFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("boot cancelled by {0}")]
    Cancelled(&'static str),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("failed to render configuration: {0}")]
    Render(#[from] serde_json::Error),
}

impl BootError {
    pub fn class(&self) -> ErrorClass {
        match self {
            BootError::Config(_)
            | BootError::MissingMigrationConfig(_)
            | BootError::Runtime(_)
            | BootError::Render(_) => ErrorClass::FatalPrecondition,
            BootError::ReadinessExhausted { .. }
            | BootError::MigrationSpawn { .. }
            | BootError::MigrationFailed(_)
            | BootError::Cancelled(_) => ErrorClass::FatalOperation,
            BootError::HandoffFailed { .. } => ErrorClass::FatalHandoff,
        }
    }

    /// Process exit code for this error. Never zero.
    pub fn exit_code(&self) -> u8 {
        match self {
            BootError::Config(_)
            | BootError::MissingMigrationConfig(_)
            | BootError::ReadinessExhausted { .. }
            | BootError::Runtime(_)
            | BootError::Render(_) => EXIT_PRECONDITION,
            BootError::MigrationSpawn { .. } => EXIT_NOT_LAUNCHED,
            BootError::MigrationFailed(outcome) => match outcome.exit_code() {
                0 => EXIT_PRECONDITION,
                code => code,
            },
            BootError::HandoffFailed { source, .. } => source
                .raw_os_error()
                .and_then(|errno| u8::try_from(errno).ok())
                .filter(|code| *code != 0)
                .unwrap_or(EXIT_NOT_LAUNCHED),
            BootError::Cancelled(_) => EXIT_CANCELLED,
        }
    }
}
