//! bootgate entrypoint.
//!
//! Resolves configuration, runs the boot phases on a single-threaded
//! runtime, then drops that runtime and hands the process to the server.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::Instrument;

use bootgate::config::{
    load_env_file, load_or_default, validate_config, BootConfig, ConfigError, ConnectionTarget, HandoffMode,
    LogFormat,
};
use bootgate::error::BootError;
use bootgate::handoff::hand_off;
use bootgate::lifecycle::{signals, BootPhase, BootSequence, Shutdown};
use bootgate::observability::{boot_span, init_logging};
use bootgate::process::SystemLauncher;
use bootgate::readiness::probe_for;

#[derive(Parser)]
#[command(name = "bootgate")]
#[command(about = "Wait for the database, migrate, seed, then start the server", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "BOOTGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Dotenv file loaded before resolving the database target
    #[arg(long, global = true, env = "BOOTGATE_ENV_FILE")]
    env_file: Option<PathBuf>,

    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe, migrate, seed, then hand off to the server
    Run(RunArgs),
    /// Wait until the database accepts connections
    Wait,
    /// Wait for the database and apply migrations
    Migrate,
    /// Print the resolved configuration as JSON
    ShowConfig,
}

#[derive(Args)]
struct RunArgs {
    /// Skip the seed step
    #[arg(long)]
    skip_seed: bool,

    /// How to start the server
    #[arg(long)]
    mode: Option<HandoffMode>,

    /// Server command, replacing the configured one
    #[arg(last = true)]
    server: Vec<String>,
}

impl Cli {
    /// Command-line flags win over the config file.
    fn apply_overrides(&self, config: &mut BootConfig) {
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Commands::Run(args) = &self.command {
            args.apply(config);
        }
    }
}

impl RunArgs {
    fn apply(&self, config: &mut BootConfig) {
        if self.skip_seed {
            config.seed.enabled = false;
        }
        if let Some(mode) = self.mode {
            config.server.mode = mode;
        }
        if !self.server.is_empty() {
            config.server.command = self.server.clone();
        }
    }
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Run(_) => "run",
            Commands::Wait => "wait",
            Commands::Migrate => "migrate",
            Commands::ShowConfig => "show-config",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match prepare(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("bootgate: {}", err);
            return ExitCode::from(BootError::from(err).exit_code());
        }
    };

    if let Err(err) = init_logging(&config.observability) {
        eprintln!("bootgate: failed to initialize logging: {}", err);
    }

    match execute(cli.command, config) {
        Ok(code) => code,
        Err(err) => fail(err),
    }
}

/// Load, override and validate configuration, then load the env file.
fn prepare(cli: &Cli) -> Result<BootConfig, ConfigError> {
    let mut config = load_or_default(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    let env_file = cli.env_file.clone().or_else(|| config.env.file.clone());
    load_env_file(env_file.as_deref())?;

    Ok(config)
}

fn execute(command: Commands, config: BootConfig) -> Result<ExitCode, BootError> {
    let resolved = ConnectionTarget::from_process_env(&config.database)?;
    for (field, source) in &resolved.sources {
        tracing::debug!(field, source = %source, "Resolved connection field");
    }
    let target = resolved.target;

    if let Commands::ShowConfig = command {
        let rendered = render_config(&config, &target)?;
        println!("{}", serde_json::to_string_pretty(&rendered)?);
        return Ok(ExitCode::SUCCESS);
    }

    let sequence = BootSequence::new(
        &config,
        target,
        probe_for(config.readiness.mode),
        Arc::new(SystemLauncher),
    )?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(BootError::Runtime)?;

    let span = boot_span(command.name());
    let plan = runtime.block_on(
        async {
            let shutdown = Arc::new(Shutdown::new());
            let listener = signals::spawn_signal_listener(shutdown.clone());
            let mut signal = shutdown.subscribe();
            let last_call = shutdown.subscribe();

            tracing::info!(datastore = %sequence.target(), "bootgate starting");

            let result = match command {
                Commands::Wait => sequence.wait_until_ready(&mut signal).await.map(|_| None),
                Commands::Migrate => sequence.run_until_migrated(&mut signal).await.map(|_| None),
                _ => sequence.run(signal).await.map(|report| Some(report.plan)),
            };

            // Give the listener one turn to pick up a signal that raced the last phase.
            tokio::task::yield_now().await;
            listener.abort();
            match (result, last_call.reason()) {
                (Ok(Some(_)), Some(reason)) => Err(BootError::Cancelled(reason)),
                (result, _) => result,
            }
        }
        .instrument(span.clone()),
    )?;

    // No boot task may outlive the handoff.
    drop(runtime);

    let Some(plan) = plan else {
        tracing::info!(parent: &span, "Boot phases complete");
        return Ok(ExitCode::SUCCESS);
    };

    let outcome = span.in_scope(|| hand_off(plan))?;
    Ok(ExitCode::from(outcome.exit_code()))
}

/// Resolved configuration and target, credential masked.
fn render_config(config: &BootConfig, target: &ConnectionTarget) -> Result<serde_json::Value, BootError> {
    let mut rendered = serde_json::json!({ "config": config, "target": target });
    if let Some(scheme) = &config.env.database_url_scheme {
        rendered["database_url"] = serde_json::Value::String(target.redacted_url(scheme)?);
    }
    Ok(rendered)
}

fn fail(err: BootError) -> ExitCode {
    tracing::error!(
        phase = %BootPhase::Aborted,
        class = %err.class(),
        error = %err,
        "Boot aborted"
    );
    ExitCode::from(err.exit_code())
}
