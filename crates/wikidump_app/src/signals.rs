use engine_logging::{engine_info, engine_warn};
use tokio::runtime::Handle;
use tokio::signal;
use wikidump_engine::Cancellation;

/// Turns Ctrl+C or SIGTERM into a cancellation request. The run then
/// finishes its current batch and saves a terminated checkpoint. A second
/// signal exits immediately.
pub fn install(handle: &Handle, cancel: Cancellation) {
    handle.spawn(async move {
        let reason = wait_for_signal().await;
        engine_info!("Received {}, finishing the current batch", reason);
        cancel.request(reason);

        let again = wait_for_signal().await;
        engine_warn!("Received {} again, exiting without saving", again);
        std::process::exit(1);
    });
}

async fn wait_for_signal() -> &'static str {
    tokio::select! {
        _ = signal::ctrl_c() => "SIGINT",
        _ = wait_for_sigterm() => "SIGTERM",
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            engine_warn!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
