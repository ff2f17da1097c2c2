//! OS signal handling during boot.
//!
//! SIGTERM/SIGINT received while probing, migrating or seeding trigger
//! [`Shutdown`], which aborts the boot. Once the server has been handed
//! off, signals belong to the server and this listener is gone.

use std::io;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

/// Wait for SIGTERM or SIGINT. Returns the signal name.
#[cfg(unix)]
pub async fn wait_for_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}

/// Wait for Ctrl+C (non-Unix).
#[cfg(not(unix))]
pub async fn wait_for_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("CTRL_C")
}

/// Spawn a task that triggers `shutdown` on the first termination signal.
pub fn spawn_signal_listener(shutdown: Arc<Shutdown>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(name) => {
                tracing::warn!(signal = name, "Termination signal received during boot");
                shutdown.trigger(name);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot register signal handlers; boot is not cancellable");
            }
        }
    })
}
