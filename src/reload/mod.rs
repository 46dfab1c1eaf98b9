//! Live reload for the asset server.
//!
//! ```text
//! TaskActor --WsMsg--> WsActor --HotReloadMessage--> Browser
//! ```
//!
//! - `message` - JSON messages understood by the injected client
//! - `server` - WebSocket listener handing clients to the WsActor

pub mod message;
pub mod server;
