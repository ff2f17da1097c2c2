//! Boot orchestration.
//!
//! # Responsibilities
//! - Check the migration descriptor before touching the datastore
//! - Gate each phase on the previous one: probe → migrate → seed
//! - Produce the [`HandoffPlan`] the caller executes last
//!
//! # Design Decisions
//! - Fail fast: precondition and migration errors are fatal
//! - Seeding is advisory; its failure is logged and boot continues
//! - Phases run one at a time, never concurrently

use std::fmt;
use std::sync::Arc;

use crate::config::{BootConfig, ConfigError, ConnectionTarget, HandoffMode, ValidationError};
use crate::error::BootError;
use crate::handoff::HandoffPlan;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::process::{CommandSpec, MigrationRunner, ProcessLauncher, SeedOutcome, SeedRunner};
use crate::readiness::{Probe, ReadinessProber, ReadinessReport};

/// Boot state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootPhase {
    Probing,
    Migrating,
    Seeding,
    HandedOff,
    Aborted,
}

impl BootPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            BootPhase::Probing => "probing",
            BootPhase::Migrating => "migrating",
            BootPhase::Seeding => "seeding",
            BootPhase::HandedOff => "handed_off",
            BootPhase::Aborted => "aborted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BootPhase::HandedOff | BootPhase::Aborted)
    }
}

impl fmt::Display for BootPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a successful boot learned, plus what to hand off to.
#[derive(Debug)]
pub struct BootReport {
    pub readiness: ReadinessReport,
    pub seed: SeedOutcome,
    pub plan: HandoffPlan,
}

/// The ordered boot phases for one target.
pub struct BootSequence {
    target: ConnectionTarget,
    prober: ReadinessProber,
    migrations: MigrationRunner,
    seed: SeedRunner,
    server: CommandSpec,
    mode: HandoffMode,
    launcher: Arc<dyn ProcessLauncher>,
}

impl BootSequence {
    /// Assemble the phases from a validated configuration.
    pub fn new(
        config: &BootConfig,
        target: ConnectionTarget,
        probe: Box<dyn Probe>,
        launcher: Arc<dyn ProcessLauncher>,
    ) -> Result<Self, BootError> {
        let env = target.export_vars(&config.env)?;

        let migrations = MigrationRunner::new(&config.migrations, &env)
            .ok_or_else(|| missing_command("migrations.command"))?;
        let server = CommandSpec::from_argv(&config.server.command)
            .ok_or_else(|| missing_command("server.command"))?
            .envs(&env);
        let seed = SeedRunner::new(&config.seed, &env);

        Ok(Self {
            prober: ReadinessProber::from_config(probe, &config.readiness),
            target,
            migrations,
            seed,
            server,
            mode: config.server.mode,
            launcher,
        })
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    /// Run probe, migrations and seed. Returns the plan for the final handoff.
    pub async fn run(&self, mut shutdown: ShutdownSignal) -> Result<BootReport, BootError> {
        let readiness = self.run_until_migrated(&mut shutdown).await?;

        enter(BootPhase::Seeding);
        let seed = self.seed.run(self.launcher.as_ref(), &mut shutdown).await?;

        // A signal that arrived after the seed child exited still stops the handoff.
        if let Some(reason) = shutdown.reason() {
            return Err(BootError::Cancelled(reason));
        }

        Ok(BootReport {
            readiness,
            seed,
            plan: HandoffPlan {
                command: self.server.clone(),
                mode: self.mode,
            },
        })
    }

    /// Precondition check, readiness probe and migrations only.
    pub async fn run_until_migrated(&self, shutdown: &mut ShutdownSignal) -> Result<ReadinessReport, BootError> {
        self.migrations.check_precondition()?;

        let readiness = self.wait_until_ready(shutdown).await?;

        enter(BootPhase::Migrating);
        self.migrations.run(self.launcher.as_ref(), shutdown).await?;

        Ok(readiness)
    }

    /// Readiness probe only.
    pub async fn wait_until_ready(&self, shutdown: &mut ShutdownSignal) -> Result<ReadinessReport, BootError> {
        enter(BootPhase::Probing);
        self.prober.wait_until_ready(&self.target, shutdown).await
    }
}

fn enter(phase: BootPhase) {
    tracing::info!(phase = %phase, "Entering boot phase");
}

fn missing_command(field: &'static str) -> BootError {
    BootError::Config(ConfigError::Validation(vec![ValidationError {
        field,
        message: "must name a program".to_string(),
    }]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_phases() {
        assert!(BootPhase::HandedOff.is_terminal());
        assert!(BootPhase::Aborted.is_terminal());
        assert!(!BootPhase::Probing.is_terminal());
        assert!(!BootPhase::Migrating.is_terminal());
        assert!(!BootPhase::Seeding.is_terminal());
        assert_eq!(BootPhase::HandedOff.to_string(), "handed_off");
    }
}
