use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::WsActor;

impl WsActor {
    /// Handshake and register a new client
    pub(super) fn add_client(&self, stream: TcpStream) {
        // Blocking during handshake, non-blocking for polled reads after
        let mut ws = match tungstenite::accept(stream) {
            Ok(ws) => ws,
            Err(e) => {
                crate::log!("ws"; "handshake failed: {}", e);
                return;
            }
        };
        let _ = ws.get_ref().set_nonblocking(true);

        for msg in self.greeting() {
            if let Err(e) = ws.send(Message::Text(msg.to_json().into())) {
                crate::debug!("ws"; "client dropped during greeting: {}", e);
                return;
            }
        }

        let mut clients = self.clients.lock();
        clients.push(ws);
        crate::debug!("ws"; "client connected (total: {})", clients.len());
    }

    /// Poll clients for close frames and dead sockets until shutdown.
    ///
    /// Clients never send anything kiln acts on; reading keeps tungstenite
    /// answering pings and notices disconnects between broadcasts.
    pub(super) fn client_reader_loop(clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>) {
        while !crate::core::is_shutdown() {
            std::thread::sleep(Duration::from_millis(100));

            let mut clients = clients.lock();
            clients.retain_mut(|ws| match ws.read() {
                Ok(Message::Close(_)) => false,
                Ok(_) => true,
                Err(tungstenite::Error::Io(ref e))
                    if e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    true
                }
                Err(_) => false,
            });
        }
    }
}
