//! Workspace Actor
//!
//! Drives [`Workspace`] from the actor inbox: edits restart the debounce,
//! replies from the worker/sandbox/preprocessor go straight to the state
//! machine, and the resulting effects are dispatched to the other actors.

#[cfg(test)]
mod tests;

use std::time::Duration;

use tokio::sync::mpsc;

use super::debouncer::Debouncer;
use super::messages::{CoordinatorMsg, HostMsg, PreprocessMsg, SandboxMsg, WorkerMsg};
use crate::protocol::HostMessage;
use crate::workspace::{Effect, Workspace};
use crate::{debug, log, logger};

/// Outbound channels of the workspace actor.
#[derive(Clone)]
pub struct Outboxes {
    pub worker: mpsc::Sender<WorkerMsg>,
    pub sandbox: mpsc::Sender<SandboxMsg>,
    pub preprocess: Option<mpsc::Sender<PreprocessMsg>>,
    pub host: mpsc::Sender<HostMsg>,
}

pub struct WorkspaceActor {
    rx: mpsc::Receiver<CoordinatorMsg>,
    workspace: Workspace,
    out: Outboxes,
    debouncer: Debouncer,
}

impl WorkspaceActor {
    pub fn new(
        rx: mpsc::Receiver<CoordinatorMsg>,
        workspace: Workspace,
        out: Outboxes,
        debounce: Duration,
    ) -> Self {
        Self {
            rx,
            workspace,
            out,
            debouncer: Debouncer::new(debounce),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let effects = self.workspace.start();
        if self.dispatch(effects).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                biased;
                msg = self.rx.recv() => {
                    let Some(msg) = msg else { break };
                    if matches!(msg, CoordinatorMsg::Shutdown) {
                        debug!("workspace"; "shutting down");
                        break;
                    }
                    let effects = self.handle(msg);
                    if self.dispatch(effects).await.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.debouncer.sleep_duration()), if self.debouncer.is_pending() => {
                    if self.debouncer.take_if_ready() {
                        let effects = self.workspace.debounce_fired();
                        if self.dispatch(effects).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    }

    fn handle(&mut self, msg: CoordinatorMsg) -> Vec<Effect> {
        let ws = &mut self.workspace;
        match msg {
            CoordinatorMsg::EditSection { name, content } => {
                match ws.edit_section(&name, content) {
                    Ok(()) => self.debouncer.touch(),
                    Err(e) => log!("workspace"; "{}", e),
                }
                Vec::new()
            }
            CoordinatorMsg::Edit { content } => {
                match ws.edit_selected(content) {
                    Ok(()) => self.debouncer.touch(),
                    Err(e) => log!("workspace"; "{}", e),
                }
                Vec::new()
            }
            CoordinatorMsg::ReplaceDocument(model) => {
                debug!("workspace"; "document replaced ({} sections)", model.len());
                ws.replace_document(model);
                self.debouncer.touch();
                Vec::new()
            }
            CoordinatorMsg::Select(index) => {
                if let Err(e) = ws.select_section(index) {
                    log!("workspace"; "{}", e);
                }
                Vec::new()
            }
            CoordinatorMsg::Cursor { pos, selection } => {
                ws.set_cursor(pos, selection);
                Vec::new()
            }
            CoordinatorMsg::Move { index, direction } => {
                if ws.move_section(index, direction) {
                    self.debouncer.touch();
                }
                Vec::new()
            }
            CoordinatorMsg::Details(show) => ws.toggle_details(show),
            CoordinatorMsg::Compiled { seq, reply } => ws.on_compiled(seq, reply),
            CoordinatorMsg::RunStarted => ws.on_run_started(),
            CoordinatorMsg::Sandbox(event) => ws.on_sandbox_event(event),
            CoordinatorMsg::Preprocessed(message) => ws.on_preprocessed(message),
            CoordinatorMsg::Shutdown => Vec::new(),
        }
    }

    /// Carry out effects in order.
    ///
    /// Returns `Err(())` once a required actor has shut down.
    async fn dispatch(&self, effects: Vec<Effect>) -> Result<(), ()> {
        for effect in effects {
            match effect {
                Effect::Compile { seq, source } => {
                    debug!("workspace"; "compile #{} ({} bytes)", seq, source.len());
                    self.out
                        .worker
                        .send(WorkerMsg::Compile { seq, source })
                        .await
                        .map_err(|_| ())?;
                }
                Effect::Run(code) => {
                    self.out
                        .sandbox
                        .send(SandboxMsg::Run(code))
                        .await
                        .map_err(|_| ())?;
                }
                Effect::Preprocess(request) => match &self.out.preprocess {
                    Some(tx) => tx
                        .send(PreprocessMsg::Request(request))
                        .await
                        .map_err(|_| ())?,
                    None => log!("workspace"; "preprocessing requested but no preprocessor is running"),
                },
                Effect::Post(message) => {
                    if let HostMessage::Status { .. } = &message {
                        show_status(&self.workspace);
                    }
                    // Host clients are optional; a closed broadcaster is not fatal.
                    let _ = self.out.host.send(HostMsg::Post(message)).await;
                }
            }
        }
        Ok(())
    }
}

/// Terminal rendering of the displayed error.
pub fn show_status(workspace: &Workspace) {
    let Some(error) = workspace.displayed_error() else {
        logger::status_success("No Errors");
        return;
    };

    let mut detail = error
        .location()
        .map(|l| format!("at {l}"))
        .unwrap_or_default();
    if workspace.show_details() {
        if !detail.is_empty() {
            detail.push('\n');
        }
        detail.push_str(&error.description);
    }
    logger::status_error(&error.summary, &detail);
}
