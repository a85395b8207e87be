use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[cfg(unix)]
use signal::unix::{signal, SignalKind};

/// Signal types that can stop a migration run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGTERM - Docker/Kubernetes graceful shutdown
    Terminate,
    /// SIGINT - Ctrl+C interactive shutdown
    Interrupt,
    /// SIGQUIT - Quit signal
    Quit,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
            ShutdownSignal::Interrupt => write!(f, "SIGINT"),
            ShutdownSignal::Quit => write!(f, "SIGQUIT"),
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<ShutdownSignal> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigquit = signal(SignalKind::quit())?;

    Ok(tokio::select! {
        _ = sigterm.recv() => ShutdownSignal::Terminate,
        _ = sigint.recv() => ShutdownSignal::Interrupt,
        _ = sigquit.recv() => ShutdownSignal::Quit,
    })
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<ShutdownSignal> {
    signal::ctrl_c().await?;
    Ok(ShutdownSignal::Interrupt)
}

/// Set `abort_flag` on the first shutdown signal.
///
/// The changeset in flight stops before its next document; the lock is still released.
pub fn abort_on_signal(abort_flag: Arc<AtomicBool>) -> JoinHandle<Option<ShutdownSignal>> {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(signal) => {
                warn!("🛑 Received {}, stopping after the current document", signal);
                abort_flag.store(true, Ordering::Relaxed);
                Some(signal)
            }
            Err(err) => {
                error!(error = %err, "Failed to install signal handlers, the run cannot be interrupted cleanly");
                None
            }
        }
    })
}

/// Stop listening once the run is over.
pub fn disarm(handle: JoinHandle<Option<ShutdownSignal>>) {
    if !handle.is_finished() {
        handle.abort();
        info!("Signal handler stopped");
    }
}
