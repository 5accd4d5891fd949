//! Compile Worker Actor
//!
//! Each submission is transpiled on the blocking pool, so the workspace
//! never waits on it. Replies carry the submission's `seq` and may arrive
//! out of order; the workspace drops stale ones.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::messages::{CoordinatorMsg, WorkerMsg};
use crate::debug;
use crate::worker::{CompileError, Transpiler, WorkerReply, compile};

pub struct WorkerActor {
    rx: mpsc::Receiver<WorkerMsg>,
    reply_tx: mpsc::Sender<CoordinatorMsg>,
    transpiler: Arc<dyn Transpiler>,
}

impl WorkerActor {
    pub fn new(
        rx: mpsc::Receiver<WorkerMsg>,
        reply_tx: mpsc::Sender<CoordinatorMsg>,
        transpiler: Arc<dyn Transpiler>,
    ) -> Self {
        Self {
            rx,
            reply_tx,
            transpiler,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                WorkerMsg::Compile { seq, source } => {
                    let transpiler = Arc::clone(&self.transpiler);
                    let reply_tx = self.reply_tx.clone();
                    tokio::spawn(async move {
                        let reply = tokio::task::spawn_blocking(move || {
                            compile(transpiler.as_ref(), &source)
                        })
                        .await
                        .unwrap_or_else(|e| WorkerReply::Error {
                            error: CompileError::new(format!("Internal compiler error: {e}"), None),
                        });
                        debug!("worker"; "compiled #{}", seq);
                        let _ = reply_tx.send(CoordinatorMsg::Compiled { seq, reply }).await;
                    });
                }
                WorkerMsg::Shutdown => {
                    debug!("worker"; "shutting down");
                    break;
                }
            }
        }
    }
}
