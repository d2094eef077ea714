use std::future::Future;

use console::Term;

/// Exit code for a run cancelled with Ctrl+C.
pub(crate) const INTERRUPTED_EXIT_CODE: u8 = 130;

/// Wait for Ctrl+C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

/// Drive `work` to completion unless Ctrl+C arrives first.
///
/// Returns `None` on interruption. `work` is dropped at its current await point,
/// which also cancels a pending rate-limit wait.
pub(crate) async fn run_until_interrupted<F: Future>(work: F) -> Option<F::Output> {
    run_until(work, ctrl_c()).await
}

async fn run_until<F: Future, S: Future<Output = ()>>(work: F, signal: S) -> Option<F::Output> {
    tokio::select! {
        output = work => Some(output),
        () = signal => {
            if Term::stderr().is_term() {
                eprintln!("\n\nInterrupted, stopping sync.");
            } else {
                tracing::warn!("Interrupted, stopping sync");
            }
            None
        }
    }
}
