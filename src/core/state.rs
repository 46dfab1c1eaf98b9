//! Shutdown coordination.
//!
//! `SHUTDOWN` is the only flag; the registered server and actor channel are
//! the handles Ctrl+C uses to wind a long-running command down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for actor system
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// - Nothing registered (one-shot `build`/`clean`): exit immediately
/// - Actors and/or server registered: notify actors, unblock the server
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        let actors = SHUTDOWN_TX.get();
        if let Some(tx) = actors {
            let _ = tx.send(());
        }

        match SERVER.get() {
            Some(server) => {
                crate::log!("serve"; "shutting down...");
                server.unblock();
            }
            None if actors.is_some() => crate::log!("watch"; "shutting down..."),
            None => std::process::exit(130),
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server so Ctrl+C can unblock its accept loop.
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

/// Register the actor system's shutdown channel.
pub fn register_actors(shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Check if shutdown has been requested.
///
/// Relaxed ordering: worst case a worker finishes one more item.
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
