//! External command execution for the migration and seed phases.
//!
//! # Data Flow
//! ```text
//! MigrationConfig / SeedConfig + exported env
//!     → CommandSpec
//!     → ProcessLauncher::run (spawn, wait, cancellable)
//!     → ExitOutcome
//!     → migration.rs (fatal unless success) | seed.rs (advisory)
//! ```

use std::fmt;
use std::io;
use std::process::ExitStatus;

use async_trait::async_trait;
use thiserror::Error;

use crate::lifecycle::shutdown::ShutdownSignal;

pub mod migration;
pub mod seed;

pub use migration::MigrationRunner;
pub use seed::{SeedOutcome, SeedRunner};

/// How a finished child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Exited(i32),
    Signaled(i32),
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        matches!(self, ExitOutcome::Exited(0))
    }

    /// Exit code a shell would report for this outcome.
    ///
    /// A failure never maps to 0, even when the low byte of its code is 0.
    pub fn exit_code(&self) -> u8 {
        match *self {
            ExitOutcome::Exited(0) => 0,
            ExitOutcome::Exited(code) => match (code & 0xff) as u8 {
                0 => 1,
                low => low,
            },
            ExitOutcome::Signaled(signal) => 128u8.saturating_add((signal & 0x7f) as u8),
        }
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitOutcome::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::Signaled(signal);
            }
        }
        ExitOutcome::Exited(1)
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Exited(code) => write!(f, "exit code {}", code),
            ExitOutcome::Signaled(signal) => write!(f, "signal {}", signal),
        }
    }
}

/// A command line plus the variables added to its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Split an argv vector into program and arguments. `None` when empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            env: Vec::new(),
        })
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn envs(mut self, env: &[(String, String)]) -> Self {
        self.env.extend_from_slice(env);
        self
    }

    /// Command line for logs. Environment values are left out.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_tokio(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args).envs(self.env.iter().map(|(k, v)| (k, v)));
        command
    }

    pub fn to_std(&self) -> std::process::Command {
        let mut command = std::process::Command::new(&self.program);
        command.args(&self.args).envs(self.env.iter().map(|(k, v)| (k, v)));
        command
    }
}

/// Why a command did not produce an [`ExitOutcome`].
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("cancelled by {0}")]
    Cancelled(&'static str),
}

/// Runs a command to completion.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn run(&self, command: &CommandSpec, shutdown: &mut ShutdownSignal) -> Result<ExitOutcome, LaunchError>;
}

/// Launches real child processes. Output is inherited from bootgate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

#[async_trait]
impl ProcessLauncher for SystemLauncher {
    async fn run(&self, command: &CommandSpec, shutdown: &mut ShutdownSignal) -> Result<ExitOutcome, LaunchError> {
        let mut child = command
            .to_tokio()
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        tracing::debug!(pid = ?child.id(), command = %command.command_line(), "Child process started");

        let finished = tokio::select! {
            biased;
            reason = shutdown.cancelled() => Err(reason),
            status = child.wait() => Ok(status),
        };

        match finished {
            Ok(status) => status.map(ExitOutcome::from).map_err(|source| LaunchError::Wait {
                program: command.program.clone(),
                source,
            }),
            Err(reason) => {
                if let Err(e) = child.start_kill() {
                    tracing::warn!(error = %e, "Failed to kill child process");
                }
                let _ = child.wait().await;
                Err(LaunchError::Cancelled(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_shell_conventions() {
        assert!(ExitOutcome::Exited(0).success());
        assert!(!ExitOutcome::Exited(2).success());
        assert!(!ExitOutcome::Signaled(15).success());
        assert_eq!(ExitOutcome::Exited(2).exit_code(), 2);
        assert_eq!(ExitOutcome::Exited(0).exit_code(), 0);
        assert_eq!(ExitOutcome::Exited(256).exit_code(), 1);
        assert_eq!(ExitOutcome::Exited(-256).exit_code(), 1);
        assert_eq!(ExitOutcome::Exited(257).exit_code(), 1);
        assert_eq!(ExitOutcome::Signaled(15).exit_code(), 143);
    }

    #[test]
    fn argv_split() {
        let argv = vec!["alembic".to_string(), "upgrade".to_string(), "head".to_string()];
        let spec = CommandSpec::from_argv(&argv).unwrap();
        assert_eq!(spec.program, "alembic");
        assert_eq!(spec.args, vec!["upgrade", "head"]);
        assert_eq!(spec.command_line(), "alembic upgrade head");
        assert!(CommandSpec::from_argv(&[]).is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_launcher_reports_exit_code() {
        let spec = CommandSpec::new("sh").arg("-c").arg("exit 3");
        let outcome = SystemLauncher.run(&spec, &mut ShutdownSignal::never()).await.unwrap();
        assert_eq!(outcome, ExitOutcome::Exited(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_launcher_passes_environment() {
        let spec = CommandSpec::new("sh")
            .arg("-c")
            .arg("test \"$DB_HOST\" = db")
            .envs(&[("DB_HOST".to_string(), "db".to_string())]);
        let outcome = SystemLauncher.run(&spec, &mut ShutdownSignal::never()).await.unwrap();
        assert!(outcome.success());
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let spec = CommandSpec::new("bootgate-definitely-not-installed");
        let err = SystemLauncher.run(&spec, &mut ShutdownSignal::never()).await.unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cancellation_kills_the_child() {
        use crate::lifecycle::shutdown::Shutdown;

        let shutdown = Shutdown::new();
        let mut signal = shutdown.subscribe();
        shutdown.trigger("SIGTERM");

        let spec = CommandSpec::new("sleep").arg("30");
        let err = SystemLauncher.run(&spec, &mut signal).await.unwrap_err();
        assert!(matches!(err, LaunchError::Cancelled("SIGTERM")));
    }
}
