//! Actor Message Definitions
//!
//! ```text
//! FsActor --Run--> TaskActor --Reload/Css/Error--> WsActor
//!    ^               ^    |
//!    |               +----+ Finished (from the blocking pool)
//!    +----Inputs-----+
//! ```

use std::net::TcpStream;
use std::path::PathBuf;

use crate::task::TaskKind;
use crate::task::runner::TaskRun;

/// Messages to the TaskActor
#[derive(Debug)]
pub enum TaskMsg {
    /// Sources bound to `kind` changed
    Run {
        kind: TaskKind,
        changed: Vec<PathBuf>,
    },
    /// A run finished on the blocking pool
    Finished(TaskRun),
    Shutdown,
}

/// Messages to the FsActor
#[derive(Debug)]
pub enum FsMsg {
    /// Files `kind` read on its last run; changes to them re-run it
    Inputs { kind: TaskKind, files: Vec<PathBuf> },
}

/// Messages to the WsActor
#[derive(Debug)]
pub enum WsMsg {
    /// Reload every page
    Reload { reason: String },
    /// Swap stylesheets served under these URL paths
    Css { paths: Vec<String> },
    /// Task failure (notice shown in the page, no reload)
    Error { task: String, error: String },
    /// Hide the failure notice
    ClearError,
    AddClient(TcpStream),
    Shutdown,
}
