//! Schema migration phase.
//!
//! Runs the engine's "upgrade to latest" command exactly once. The engine
//! skips already-applied revisions, so running this on every boot is safe.
//! Any failure is fatal and never retried: schema conflicts and lock
//! contention need an operator, not another attempt.

use std::path::PathBuf;

use crate::config::MigrationConfig;
use crate::error::BootError;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::process::{CommandSpec, LaunchError, ProcessLauncher};

pub struct MigrationRunner {
    config_path: PathBuf,
    command: CommandSpec,
}

impl MigrationRunner {
    /// Returns `None` when the configured command is empty.
    pub fn new(config: &MigrationConfig, env: &[(String, String)]) -> Option<Self> {
        let command = CommandSpec::from_argv(&config.command)?.envs(env);
        Some(Self {
            config_path: config.config_path.clone(),
            command,
        })
    }

    /// The migration descriptor must exist before any phase starts.
    pub fn check_precondition(&self) -> Result<(), BootError> {
        if self.config_path.is_file() {
            Ok(())
        } else {
            Err(BootError::MissingMigrationConfig(self.config_path.clone()))
        }
    }

    /// Apply pending migrations.
    pub async fn run(&self, launcher: &dyn ProcessLauncher, shutdown: &mut ShutdownSignal) -> Result<(), BootError> {
        tracing::info!(
            command = %self.command.command_line(),
            config = %self.config_path.display(),
            "Applying migrations"
        );

        match launcher.run(&self.command, shutdown).await {
            Ok(outcome) if outcome.success() => {
                tracing::info!("Migrations applied");
                Ok(())
            }
            Ok(outcome) => Err(BootError::MigrationFailed(outcome)),
            Err(LaunchError::Spawn { program, source }) | Err(LaunchError::Wait { program, source }) => {
                Err(BootError::MigrationSpawn { program, source })
            }
            Err(LaunchError::Cancelled(reason)) => Err(BootError::Cancelled(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ExitOutcome;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedLauncher {
        outcome: ExitOutcome,
        seen: Mutex<Vec<CommandSpec>>,
    }

    #[async_trait]
    impl ProcessLauncher for FixedLauncher {
        async fn run(&self, command: &CommandSpec, _shutdown: &mut ShutdownSignal) -> Result<ExitOutcome, LaunchError> {
            self.seen.lock().unwrap().push(command.clone());
            Ok(self.outcome)
        }
    }

    fn runner(config_path: PathBuf) -> MigrationRunner {
        let config = MigrationConfig {
            config_path,
            ..Default::default()
        };
        MigrationRunner::new(&config, &[("DB_HOST".into(), "db".into())]).unwrap()
    }

    #[test]
    fn missing_descriptor_fails_precondition() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path().join("alembic.ini"));
        let err = runner.check_precondition().unwrap_err();
        assert!(matches!(err, BootError::MissingMigrationConfig(_)));
    }

    #[test]
    fn present_descriptor_passes_precondition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alembic.ini");
        std::fs::write(&path, "[alembic]\n").unwrap();
        assert!(runner(path).check_precondition().is_ok());
    }

    #[test]
    fn empty_command_is_rejected() {
        let config = MigrationConfig {
            command: Vec::new(),
            ..Default::default()
        };
        assert!(MigrationRunner::new(&config, &[]).is_none());
    }

    #[tokio::test]
    async fn success_runs_command_once_with_env() {
        let launcher = FixedLauncher {
            outcome: ExitOutcome::Exited(0),
            seen: Mutex::new(Vec::new()),
        };
        runner(PathBuf::from("alembic.ini"))
            .run(&launcher, &mut ShutdownSignal::never())
            .await
            .unwrap();

        let seen = launcher.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].command_line(), "alembic upgrade head");
        assert!(seen[0].env.contains(&("DB_HOST".to_string(), "db".to_string())));
    }

    #[tokio::test]
    async fn non_zero_exit_is_fatal() {
        let launcher = FixedLauncher {
            outcome: ExitOutcome::Exited(4),
            seen: Mutex::new(Vec::new()),
        };
        let err = runner(PathBuf::from("alembic.ini"))
            .run(&launcher, &mut ShutdownSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, BootError::MigrationFailed(ExitOutcome::Exited(4))));
        assert_eq!(err.exit_code(), 4);
        assert_eq!(launcher.seen.lock().unwrap().len(), 1);
    }
}
