//! Actor Coordinator - wires up the watch system
//!
//! - Creates communication channels
//! - Starts the live-reload listener when a port is given
//! - Runs the actors until shutdown

mod runtime;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::{FsActor, WatchBindings};
use super::messages::{FsMsg, TaskMsg, WsMsg};
use super::task::TaskActor;
use super::ws::WsActor;
use crate::config::ProjectConfig;
use crate::log;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: Arc<ProjectConfig>,
    ws_port: Option<u16>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn with_config(config: Arc<ProjectConfig>) -> Self {
        Self {
            config,
            ws_port: None,
            shutdown_rx: None,
        }
    }

    /// Serve live reload on this port (or the next free one).
    pub fn with_ws_port(mut self, port: u16) -> Self {
        self.ws_port = Some(port);
        self
    }

    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system.
    pub async fn run(mut self) -> Result<()> {
        let (task_tx, task_rx) = mpsc::channel::<TaskMsg>(CHANNEL_BUFFER);
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);
        let (fs_tx, fs_rx) = mpsc::channel::<FsMsg>(CHANNEL_BUFFER);

        if let Some(port) = self.ws_port {
            let interface = self.config.serve.interface;
            match crate::reload::server::start_ws_server(interface, port, ws_tx.clone()) {
                Ok(actual_port) => crate::cli::serve::set_actual_ws_port(actual_port),
                Err(e) => log!("reload"; "live reload disabled: {:#}", e),
            }
        }

        let kinds = self.config.build.selected_tasks();
        let bindings = WatchBindings::new(&self.config, &kinds).context("invalid watch pattern")?;
        let fs_actor = FsActor::new(
            bindings,
            self.config.get_root().to_path_buf(),
            Duration::from_millis(self.config.watch.debounce_ms),
            task_tx.clone(),
            fs_rx,
        )
        .context("failed to start file watcher")?;

        let task_actor = TaskActor::new(
            task_rx,
            task_tx.clone(),
            ws_tx.clone(),
            fs_tx,
            Arc::clone(&self.config),
        );
        let ws_actor = WsActor::new(ws_rx, self.config.serve.notify_ms);

        let names: Vec<_> = kinds.iter().map(|k| k.name()).collect();
        log!("watch"; "watching {}", names.join(", "));

        let shutdown_rx = self.shutdown_rx.take();
        runtime::run_actors(fs_actor, task_actor, ws_actor, task_tx, ws_tx, shutdown_rx).await;

        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
