//! Watch mode: the actor system on its own tokio runtime.

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::actor::Coordinator;
use crate::config::ProjectConfig;
use crate::log;

/// Watch until Ctrl+C, without a live-reload listener.
pub fn watch(config: Arc<ProjectConfig>) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    crate::core::register_actors(shutdown_tx);
    run_actor_system(config, None, shutdown_rx)
}

/// Run the actor system on a background thread (used next to the server).
pub fn spawn_watch(
    config: Arc<ProjectConfig>,
    ws_port: Option<u16>,
    shutdown_rx: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        if let Err(e) = run_actor_system(config, ws_port, shutdown_rx) {
            log!("watch"; "error: {:#}", e);
        }
    })
}

fn run_actor_system(
    config: Arc<ProjectConfig>,
    ws_port: Option<u16>,
    shutdown_rx: Receiver<()>,
) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(async {
        let mut coordinator = Coordinator::with_config(config).with_shutdown_signal(shutdown_rx);
        if let Some(port) = ws_port {
            coordinator = coordinator.with_ws_port(port);
        }
        coordinator.run().await
    })
}
