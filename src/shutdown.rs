use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Exit status used when a second Ctrl+C aborts the probe.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Token cancelled on the first Ctrl+C, so the probe closes the socket and the
/// console stops prompting.
///
/// A second Ctrl+C exits at once with [`FORCED_EXIT_CODE`], for when the close
/// handshake or a pending reply never completes.
pub fn setup_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Error setting up signal handler: {}", err);
            return;
        }
        info!("Received SIGINT (Ctrl+C), closing the chat connection...");
        token_clone.cancel();

        if signal::ctrl_c().await.is_ok() {
            warn!("Second Ctrl+C, exiting without waiting for the close handshake");
            std::process::exit(FORCED_EXIT_CODE);
        }
    });

    token
}
