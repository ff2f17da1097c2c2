//! Process-image replacement.

use std::os::unix::process::CommandExt;

use nix::sys::signal::{signal, SigHandler, Signal};

use crate::error::BootError;
use crate::process::CommandSpec;

/// Signals the boot listener catches. They must terminate us again once
/// nothing is left to observe them.
const BOOT_SIGNALS: [Signal; 2] = [Signal::SIGTERM, Signal::SIGINT];

/// Replace the current process with `command`.
///
/// Returns only if the exec failed; on success the server owns this PID.
pub fn replace_process(command: &CommandSpec) -> BootError {
    restore_default_dispositions();
    let source = command.to_std().exec();
    BootError::HandoffFailed {
        program: command.program.clone(),
        source,
    }
}

fn restore_default_dispositions() {
    for sig in BOOT_SIGNALS {
        // SAFETY: SIG_DFL installs no handler code, and no boot task runs
        // concurrently once the runtime is gone.
        if let Err(errno) = unsafe { signal(sig, SigHandler::SigDfl) } {
            tracing::warn!(signal = sig.as_str(), error = %errno, "Failed to restore default signal disposition");
        }
    }
}
