//! Shared fixtures for boot sequence integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bootgate::config::{BootConfig, ConnectionTarget};
use bootgate::lifecycle::{Shutdown, ShutdownSignal};
use bootgate::process::{CommandSpec, ExitOutcome, LaunchError, ProcessLauncher};
use bootgate::readiness::{Probe, ProbeError};
use tempfile::TempDir;
use tokio::time::Instant;

/// Refuses connections until a fixed instant has passed.
pub struct ScriptedProbe {
    ready_at: Option<Instant>,
    calls: Arc<AtomicU32>,
}

impl ScriptedProbe {
    /// Unreachable for `outage`, reachable afterwards.
    pub fn unreachable_for(outage: Duration) -> (Box<dyn Probe>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let probe = ScriptedProbe {
            ready_at: Some(Instant::now() + outage),
            calls: calls.clone(),
        };
        (Box::new(probe), calls)
    }

    /// Never reachable.
    pub fn down() -> (Box<dyn Probe>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let probe = ScriptedProbe {
            ready_at: None,
            calls: calls.clone(),
        };
        (Box::new(probe), calls)
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn check(&self, _target: &ConnectionTarget) -> Result<(), ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.ready_at {
            Some(ready_at) if Instant::now() >= ready_at => Ok(()),
            _ => Err(std::io::Error::from(std::io::ErrorKind::ConnectionRefused).into()),
        }
    }
}

/// Records every command and answers from a per-program table.
pub struct RecordingLauncher {
    outcomes: Vec<(&'static str, ExitOutcome)>,
    runs: Mutex<Vec<CommandSpec>>,
    /// Triggered while the named program runs, as if a signal arrived then.
    cancel_during: Option<(&'static str, Arc<Shutdown>)>,
}

impl RecordingLauncher {
    /// Every program exits 0.
    pub fn succeeding() -> Arc<Self> {
        Self::with_outcomes(Vec::new())
    }

    /// Programs named in `outcomes` end that way; others exit 0.
    pub fn with_outcomes(outcomes: Vec<(&'static str, ExitOutcome)>) -> Arc<Self> {
        Arc::new(Self {
            outcomes,
            runs: Mutex::new(Vec::new()),
            cancel_during: None,
        })
    }

    /// Every program exits 0, but `shutdown` fires while `program` runs.
    pub fn cancelling_during(program: &'static str, shutdown: Arc<Shutdown>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Vec::new(),
            runs: Mutex::new(Vec::new()),
            cancel_during: Some((program, shutdown)),
        })
    }

    pub fn runs(&self) -> Vec<CommandSpec> {
        self.runs.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.runs().into_iter().map(|spec| spec.program).collect()
    }
}

#[async_trait]
impl ProcessLauncher for RecordingLauncher {
    async fn run(&self, command: &CommandSpec, _shutdown: &mut ShutdownSignal) -> Result<ExitOutcome, LaunchError> {
        self.runs.lock().unwrap().push(command.clone());
        if let Some((program, shutdown)) = &self.cancel_during {
            if *program == command.program {
                shutdown.trigger("SIGTERM");
            }
        }
        let outcome = self
            .outcomes
            .iter()
            .find(|(program, _)| *program == command.program)
            .map(|(_, outcome)| *outcome)
            .unwrap_or(ExitOutcome::Exited(0));
        Ok(outcome)
    }
}

/// A service directory with an `alembic.ini` and, optionally, a seed script.
pub struct ServiceDir {
    dir: TempDir,
}

impl ServiceDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("alembic.ini"), "[alembic]\nscript_location = migrations\n").unwrap();
        Self { dir }
    }

    pub fn without_migration_config() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn with_seed(self) -> Self {
        std::fs::write(self.dir.path().join("seed.py"), "print('seeded')\n").unwrap();
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Default configuration pointed at this directory.
    pub fn config(&self) -> BootConfig {
        let mut config = BootConfig::default();
        config.migrations.config_path = self.file("alembic.ini");
        config.seed.script_path = self.file("seed.py");
        config
    }
}

pub fn target() -> ConnectionTarget {
    ConnectionTarget::new("db", 5432, "splitbill", "postgres", Some("hunter2".to_string()))
}
