//! Process-wide state shared by the command layer and the actor system.

mod state;

pub use state::{is_shutdown, register_actors, register_server, setup_shutdown_handler};
