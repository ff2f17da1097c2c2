//! Signal-relaying supervisor.
//!
//! Spawns the server as a child, forwards termination and reload signals to
//! it, and reports its exit status. bootgate adds no policy of its own: it
//! never restarts the server and exits when the server exits.

use crate::error::BootError;
use crate::process::{CommandSpec, ExitOutcome};

/// Run `command` as a supervised child until it exits.
pub async fn supervise(command: &CommandSpec) -> Result<ExitOutcome, BootError> {
    let mut child = command.to_tokio().spawn().map_err(|source| BootError::HandoffFailed {
        program: command.program.clone(),
        source,
    })?;

    let pid = child.id();
    tracing::info!(pid = ?pid, "Server started under supervision");

    let status = relay_until_exit(&mut child, pid).await.map_err(|source| BootError::HandoffFailed {
        program: command.program.clone(),
        source,
    })?;

    let outcome = ExitOutcome::from(status);
    tracing::info!(outcome = %outcome, "Server exited");
    Ok(outcome)
}

#[cfg(unix)]
async fn relay_until_exit(
    child: &mut tokio::process::Child,
    pid: Option<u32>,
) -> std::io::Result<std::process::ExitStatus> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigquit = signal(SignalKind::quit())?;

    loop {
        let forward = tokio::select! {
            status = child.wait() => return status,
            _ = sigterm.recv() => Signal::SIGTERM,
            _ = sigint.recv() => Signal::SIGINT,
            _ = sighup.recv() => Signal::SIGHUP,
            _ = sigquit.recv() => Signal::SIGQUIT,
        };

        let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
            continue;
        };
        match kill(Pid::from_raw(pid), forward) {
            Ok(()) => tracing::info!(signal = forward.as_str(), pid, "Relayed signal to server"),
            Err(errno) => tracing::warn!(signal = forward.as_str(), pid, error = %errno, "Failed to relay signal"),
        }
    }
}

#[cfg(not(unix))]
async fn relay_until_exit(
    child: &mut tokio::process::Child,
    _pid: Option<u32>,
) -> std::io::Result<std::process::ExitStatus> {
    tokio::select! {
        status = child.wait() => return status,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received, stopping server");
        }
    }
    child.start_kill()?;
    child.wait().await
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exits_with_child_status() {
        let command = CommandSpec::new("sh").arg("-c").arg("exit 7");
        let outcome = supervise(&command).await.unwrap();
        assert_eq!(outcome, ExitOutcome::Exited(7));
        assert_eq!(outcome.exit_code(), 7);
    }

    #[tokio::test]
    async fn child_killed_by_signal() {
        let command = CommandSpec::new("sh").arg("-c").arg("kill -TERM $$");
        let outcome = supervise(&command).await.unwrap();
        assert_eq!(outcome, ExitOutcome::Signaled(15));
        assert_eq!(outcome.exit_code(), 143);
    }

    #[tokio::test]
    async fn hangup_is_relayed_to_the_server() {
        use nix::sys::signal::{raise, Signal};
        use std::time::Duration;

        let command = CommandSpec::new("sh")
            .arg("-c")
            .arg("trap 'exit 42' HUP; while :; do sleep 0.05; done");
        let server = tokio::spawn(async move { supervise(&command).await });

        // Let the child install its trap and the relay register its handlers.
        tokio::time::sleep(Duration::from_millis(300)).await;
        raise(Signal::SIGHUP).unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(10), server)
            .await
            .expect("server did not exit after SIGHUP")
            .unwrap()
            .unwrap();
        assert_eq!(outcome, ExitOutcome::Exited(42));
    }

    #[tokio::test]
    async fn unlaunchable_server_is_fatal() {
        let command = CommandSpec::new("bootgate-definitely-not-installed");
        let err = supervise(&command).await.unwrap_err();
        assert!(matches!(err, BootError::HandoffFailed { .. }));
    }
}
