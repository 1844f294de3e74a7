//! # OS termination signals.
//!
//! [`shutdown_signal`] completes when the process receives a termination signal
//! and reports which one, for the shutdown log line.
//!
//! **Unix:** `SIGINT`, `SIGTERM`, `SIGQUIT`.
//! **Other platforms:** Ctrl-C only.

use crate::error::RuntimeError;

/// Waits for a termination signal; fails only if a handler cannot be installed.
#[cfg(unix)]
pub(crate) async fn shutdown_signal() -> Result<&'static str, RuntimeError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt()).map_err(RuntimeError::Signal)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(RuntimeError::Signal)?;
    let mut sigquit = signal(SignalKind::quit()).map_err(RuntimeError::Signal)?;

    let name = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Waits for a termination signal; fails only if a handler cannot be installed.
#[cfg(not(unix))]
pub(crate) async fn shutdown_signal() -> Result<&'static str, RuntimeError> {
    tokio::signal::ctrl_c().await.map_err(RuntimeError::Signal)?;
    Ok("ctrl-c")
}
