//! WebSocket Actor
//!
//! Owns every live-reload client and broadcasts task outcomes to them. The
//! last task failure is kept and replayed to clients that connect while it
//! is unresolved (a page reloaded during a failure still shows it).
//!
//! ```text
//! TaskActor --[Reload/Css/Error/ClearError]--> WsActor --broadcast--> Clients
//! ```

mod client_io;
mod delivery;

use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;

use super::messages::WsMsg;
use crate::reload::message::HotReloadMessage;

/// The failure currently shown to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingError {
    task: String,
    error: String,
}

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    rx: mpsc::Receiver<WsMsg>,
    /// Connected clients (shared with the reader thread)
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
    pending_error: Option<PendingError>,
    /// How long the in-page failure notice stays up
    notify_ms: u64,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>, notify_ms: u64) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            pending_error: None,
            notify_ms,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let clients_for_reader = Arc::clone(&self.clients);
        std::thread::spawn(move || {
            Self::client_reader_loop(clients_for_reader);
        });

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Reload { reason } => {
                    crate::debug!("ws"; "sending reload: {}", reason);
                    self.broadcast(&HotReloadMessage::reload(reason));
                }

                WsMsg::Css { paths } => {
                    crate::debug!("ws"; "injecting {}", paths.join(", "));
                    self.broadcast(&HotReloadMessage::css(paths));
                }

                WsMsg::Error { task, error } => {
                    self.broadcast(&HotReloadMessage::error(&task, &error, self.notify_ms));
                    self.pending_error = Some(PendingError { task, error });
                }

                WsMsg::ClearError => {
                    self.pending_error = None;
                    self.broadcast(&HotReloadMessage::ClearError);
                }

                WsMsg::AddClient(stream) => self.add_client(stream),

                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    for mut client in self.clients.lock().drain(..) {
                        let _ = client.close(None);
                    }
                    break;
                }
            }
        }
    }

    /// Messages a newly connected client receives.
    fn greeting(&self) -> Vec<HotReloadMessage> {
        let mut messages = vec![HotReloadMessage::connected()];
        if let Some(pending) = &self.pending_error {
            messages.push(HotReloadMessage::error(
                &pending.task,
                &pending.error,
                self.notify_ms,
            ));
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_replays_pending_error() {
        let (_tx, rx) = mpsc::channel(1);
        let mut actor = WsActor::new(rx, 3000);
        assert_eq!(actor.greeting(), vec![HotReloadMessage::connected()]);

        actor.pending_error = Some(PendingError {
            task: "style".into(),
            error: "css/main.scss: expected \";\"".into(),
        });
        let greeting = actor.greeting();
        assert_eq!(greeting.len(), 2);
        assert_eq!(
            greeting[1],
            HotReloadMessage::error("style", "css/main.scss: expected \";\"", 3000)
        );
    }
}
