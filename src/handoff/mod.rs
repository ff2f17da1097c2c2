//! Transfer of control to the server process.
//!
//! # Modes
//! ```text
//! exec:      bootgate ──execvp──▶ server        (same PID, signals go straight to the server)
//! supervise: bootgate ──spawn───▶ server child  (signals relayed, bootgate exits with child status)
//! ```
//!
//! # Design Decisions
//! - Handoff is terminal: exec never returns on success
//! - The boot runtime is dropped before exec so no boot task outlives the handoff
//! - Supervise is the fallback where process replacement does not exist

use crate::config::HandoffMode;
use crate::error::BootError;
use crate::lifecycle::BootPhase;
use crate::process::{CommandSpec, ExitOutcome};

#[cfg(unix)]
pub mod exec;
pub mod supervise;

/// The server command as decided by the boot sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffPlan {
    pub command: CommandSpec,
    pub mode: HandoffMode,
}

/// Hand control to the server.
///
/// In exec mode this only returns on failure. In supervise mode it returns
/// the server's outcome once it exits.
pub fn hand_off(plan: HandoffPlan) -> Result<ExitOutcome, BootError> {
    tracing::info!(
        phase = %BootPhase::HandedOff,
        mode = %plan.mode,
        command = %plan.command.command_line(),
        "Handing off to server"
    );

    match plan.mode {
        HandoffMode::Exec => exec_or_fallback(&plan.command),
        HandoffMode::Supervise => supervise_blocking(&plan.command),
    }
}

#[cfg(unix)]
fn exec_or_fallback(command: &CommandSpec) -> Result<ExitOutcome, BootError> {
    Err(exec::replace_process(command))
}

#[cfg(not(unix))]
fn exec_or_fallback(command: &CommandSpec) -> Result<ExitOutcome, BootError> {
    tracing::warn!("Process replacement is not available on this platform, supervising instead");
    supervise_blocking(command)
}

fn supervise_blocking(command: &CommandSpec) -> Result<ExitOutcome, BootError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(BootError::Runtime)?;
    runtime.block_on(supervise::supervise(command))
}
