//! Actor system for watch mode
//!
//! ```text
//! FsActor --> TaskActor --> WsActor
//! (watch)     (run queue)   (broadcast)
//!    ^            |
//!    +--inputs----+
//! ```
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher, per-task debouncing
//! - `task` - Run queue of depth one per task, blocking-pool runs
//! - `ws` - WebSocket broadcast
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod task;
pub mod ws;

pub use coordinator::Coordinator;
