use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::fs::FsActor;
use crate::actor::messages::{CoordinatorMsg, HostMsg, PreprocessMsg, SandboxMsg, WorkerMsg};
use crate::actor::preprocess::PreprocessActor;
use crate::actor::sandbox::SandboxActor;
use crate::actor::worker::WorkerActor;
use crate::actor::workspace::WorkspaceActor;
use crate::actor::ws::WsActor;
use crate::sandbox::ProcessEvaluator;

/// Time granted to the sandbox to finish its current run.
const SANDBOX_GRACE: Duration = Duration::from_millis(500);

pub(super) struct Actors {
    pub fs: FsActor,
    pub workspace: WorkspaceActor,
    pub worker: WorkerActor,
    pub sandbox: SandboxActor<ProcessEvaluator>,
    pub preprocess: Option<PreprocessActor>,
    pub ws: WsActor,
}

pub(super) struct Senders {
    pub coordinator: mpsc::Sender<CoordinatorMsg>,
    pub worker: mpsc::Sender<WorkerMsg>,
    pub sandbox: mpsc::Sender<SandboxMsg>,
    pub preprocess: Option<mpsc::Sender<PreprocessMsg>>,
    pub host: mpsc::Sender<HostMsg>,
}

/// Run all actors concurrently, then stop them in dependency order.
pub(super) async fn run_actors(
    actors: Actors,
    senders: Senders,
    shutdown_rx: Option<Receiver<()>>,
) {
    let Actors {
        fs,
        workspace,
        worker,
        sandbox,
        preprocess,
        ws,
    } = actors;

    let sandbox_handle = tokio::spawn(sandbox.run());
    let worker_handle = tokio::spawn(worker.run());
    let ws_handle = tokio::spawn(ws.run());
    let preprocess_handle = preprocess.map(|p| tokio::spawn(p.run()));
    let fs_handle = tokio::spawn(fs.run());
    let mut workspace_handle = tokio::spawn(workspace.run());

    if let Some(rx) = shutdown_rx {
        loop {
            if rx.try_recv().is_ok() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            if workspace_handle.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    } else {
        let _ = (&mut workspace_handle).await;
    }

    // Inputs first so nothing new reaches the workspace
    fs_handle.abort();
    let _ = senders.coordinator.send(CoordinatorMsg::Shutdown).await;
    let _ = workspace_handle.await;

    let _ = senders.worker.send(WorkerMsg::Shutdown).await;
    if let Some(tx) = &senders.preprocess {
        let _ = tx.send(PreprocessMsg::Shutdown).await;
    }
    let _ = senders.host.send(HostMsg::Shutdown).await;
    let _ = senders.sandbox.send(SandboxMsg::Shutdown).await;

    let _ = worker_handle.await;
    let _ = ws_handle.await;
    if let Some(handle) = preprocess_handle {
        let _ = handle.await;
    }
    let _ = tokio::time::timeout(SANDBOX_GRACE, sandbox_handle).await;
}
