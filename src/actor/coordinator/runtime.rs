use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::fs::FsActor;
use crate::actor::messages::{TaskMsg, WsMsg};
use crate::actor::task::TaskActor;
use crate::actor::ws::WsActor;

/// Time the task and ws actors get to wind down after shutdown.
const GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Run all actors concurrently until shutdown (or until one of them stops).
pub(super) async fn run_actors(
    fs: FsActor,
    task: TaskActor,
    ws: WsActor,
    task_tx: mpsc::Sender<TaskMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
) {
    let mut fs_handle = tokio::spawn(async move { fs.run().await });
    let mut task_handle = tokio::spawn(async move { task.run().await });
    let mut ws_handle = tokio::spawn(async move { ws.run().await });

    let shutdown = async {
        match shutdown_rx {
            Some(rx) => loop {
                if rx.try_recv().is_ok() {
                    crate::debug!("actor"; "shutdown signal received");
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            },
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = shutdown => {}
        _ = &mut fs_handle => {}
        _ = &mut task_handle => {}
        _ = &mut ws_handle => {}
    }

    fs_handle.abort();
    let _ = task_tx.send(TaskMsg::Shutdown).await;
    let _ = ws_tx.send(WsMsg::Shutdown).await;

    let _ = tokio::time::timeout(GRACE_PERIOD, async {
        let _ = task_handle.await;
        let _ = ws_handle.await;
    })
    .await;
}
