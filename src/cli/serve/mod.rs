//! Asset server with live reload support.

mod content;
mod lifecycle;
mod path;
mod response;

use crate::{config::ProjectConfig, debug, log};
use anyhow::{Context, Result};
use crossbeam::channel;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use tiny_http::{Request, Server};

/// WebSocket port the live-reload listener actually bound.
///
/// Starts as the configured port; the coordinator updates it after binding,
/// which may land on a later port when the configured one is taken.
static ACTUAL_WS_PORT: AtomicU16 = AtomicU16::new(0);

/// Update the actual WebSocket port (called by the coordinator after binding).
pub fn set_actual_ws_port(port: u16) {
    ACTUAL_WS_PORT.store(port, Ordering::Relaxed);
}

fn get_actual_ws_port() -> u16 {
    ACTUAL_WS_PORT.load(Ordering::Relaxed)
}

/// Serve `serve.root` until Ctrl+C.
///
/// With `watch`, the actor system runs alongside on its own thread and
/// HTML responses carry the live-reload client.
pub fn serve(config: Arc<ProjectConfig>, watch: bool) -> Result<()> {
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    crate::core::register_server(Arc::clone(&server));

    log!("serve"; "http://{} ({})", addr, config.root_relative(&config.serve.root).display());

    let actor_handle = if watch {
        set_actual_ws_port(config.serve.livereload_port);
        let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
        crate::core::register_actors(shutdown_tx);
        debug!("reload"; "ws://{}:{}", config.serve.interface, config.serve.livereload_port);
        Some(super::watch::spawn_watch(
            Arc::clone(&config),
            Some(config.serve.livereload_port),
            shutdown_rx,
        ))
    } else {
        log!("serve"; "live reload is off (run `default` to watch and reload)");
        None
    };

    let result = run_request_loop(&server, &config, watch);
    lifecycle::wait_for_shutdown(actor_handle);
    result
}

fn run_request_loop(server: &Server, config: &Arc<ProjectConfig>, live_reload: bool) -> Result<()> {
    // Handle requests concurrently on a small pool
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let config = Arc::clone(config);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &config, live_reload) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request.
fn handle_request(request: Request, config: &ProjectConfig, live_reload: bool) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    if live_reload && request.url() == crate::embed::serve::LIVERELOAD_PATH {
        return response::respond_livereload_js(request, get_actual_ws_port());
    }

    let root = &config.serve.root;
    match path::resolve_path(request.url(), root) {
        Some(path) => response::respond_file(request, &path, live_reload),
        None => response::respond_not_found(request, root, live_reload),
    }
}
