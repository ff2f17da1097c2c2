//! Best-effort seed phase.
//!
//! A missing script is not an error and a failing script does not stop the
//! boot. Only cancellation escapes this phase.

use std::fmt;
use std::path::PathBuf;

use crate::config::SeedConfig;
use crate::error::{BootError, ErrorClass};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::process::{CommandSpec, LaunchError, ProcessLauncher};

/// What happened in the seed phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Seeding turned off by configuration or flag.
    Disabled,
    /// No script at the configured path.
    Skipped,
    Completed,
    /// Script ran (or tried to) and failed; boot continues.
    Failed { cause: String },
}

impl SeedOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedOutcome::Disabled => "disabled",
            SeedOutcome::Skipped => "skipped",
            SeedOutcome::Completed => "completed",
            SeedOutcome::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for SeedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct SeedRunner {
    enabled: bool,
    script_path: PathBuf,
    command: Option<CommandSpec>,
}

impl SeedRunner {
    pub fn new(config: &SeedConfig, env: &[(String, String)]) -> Self {
        let command = CommandSpec::from_argv(&config.interpreter)
            .map(|spec| spec.arg(config.script_path.to_string_lossy()).envs(env));
        Self {
            enabled: config.enabled && command.is_some(),
            script_path: config.script_path.clone(),
            command,
        }
    }

    /// Run the seed script if present. Never fails except on cancellation.
    pub async fn run(
        &self,
        launcher: &dyn ProcessLauncher,
        shutdown: &mut ShutdownSignal,
    ) -> Result<SeedOutcome, BootError> {
        let command = match (&self.command, self.enabled) {
            (Some(command), true) => command,
            _ => {
                tracing::info!(phase = "seeding", outcome = "disabled", "Seed step disabled");
                return Ok(SeedOutcome::Disabled);
            }
        };

        if !self.script_path.is_file() {
            tracing::info!(
                phase = "seeding",
                outcome = "skipped",
                path = %self.script_path.display(),
                "No seed script, skipping"
            );
            return Ok(SeedOutcome::Skipped);
        }

        tracing::info!(command = %command.command_line(), "Running seed script");

        let cause = match launcher.run(command, shutdown).await {
            Ok(outcome) if outcome.success() => {
                tracing::info!(phase = "seeding", outcome = "completed", "Seed script finished");
                return Ok(SeedOutcome::Completed);
            }
            Ok(outcome) => format!("seed script ended with {}", outcome),
            Err(LaunchError::Cancelled(reason)) => return Err(BootError::Cancelled(reason)),
            Err(err) => err.to_string(),
        };

        tracing::warn!(
            phase = "seeding",
            outcome = "failed",
            class = %ErrorClass::Advisory,
            cause = %cause,
            "Seed step failed, continuing boot"
        );
        Ok(SeedOutcome::Failed { cause })
    }
}
