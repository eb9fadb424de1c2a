//! Process signal handling: cancellation of a running dump and the
//! `--hold-open` lifecycle.

use tokio_util::sync::CancellationToken;

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
///
/// If a handler cannot be installed this future never resolves for that
/// signal; the other one still works.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("received shutdown signal");
}

/// Cancellation token tripped by the first shutdown signal.
#[must_use]
pub fn cancel_on_shutdown() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        child.cancel();
    });
    token
}

/// Keep the process resident until it is asked to stop.
///
/// For deployments that must not let the container exit once the dump is
/// reported (e.g. a worker pod whose restart policy would re-run the dump).
pub async fn hold_open(token: &CancellationToken) {
    tracing::info!("holding process open until terminated");
    token.cancelled().await;
}
