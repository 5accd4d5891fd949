//! Sandbox Actor
//!
//! Owns the [`Sandbox`] on a blocking thread: evaluation is synchronous and
//! not reentrant, so runs are strictly sequential. Events and the run-start
//! hook flow back to the workspace over the same channel, preserving order.

use tokio::sync::mpsc;

use super::messages::{CoordinatorMsg, SandboxMsg};
use crate::debug;
use crate::resolver::ModuleResolver;
use crate::sandbox::{Evaluator, Sandbox, SandboxEvent, SandboxHooks, Transport};

/// Delivers sandbox events to the workspace inbox.
pub struct ChannelTransport {
    tx: mpsc::Sender<CoordinatorMsg>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::Sender<CoordinatorMsg>) -> Self {
        Self { tx }
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, event: SandboxEvent) {
        if self.tx.blocking_send(CoordinatorMsg::Sandbox(event)).is_err() {
            debug!("sandbox"; "workspace gone, dropping event");
        }
    }
}

pub struct SandboxActor<E: Evaluator> {
    rx: mpsc::Receiver<SandboxMsg>,
    sandbox: Sandbox<E>,
}

impl<E: Evaluator + 'static> SandboxActor<E> {
    pub fn new(
        rx: mpsc::Receiver<SandboxMsg>,
        coordinator_tx: mpsc::Sender<CoordinatorMsg>,
        id: &str,
        app_name: &str,
        resolver: ModuleResolver,
        evaluator: E,
    ) -> Self {
        let run_tx = coordinator_tx.clone();
        let hooks = SandboxHooks::default()
            .on_run(move || {
                let _ = run_tx.blocking_send(CoordinatorMsg::RunStarted);
            })
            .on_error(|fault| debug!("sandbox"; "run failed: {}: {}", fault.name, fault.message));
        let sandbox = Sandbox::new(
            id,
            app_name,
            resolver,
            evaluator,
            Box::new(ChannelTransport::new(coordinator_tx)),
        )
        .with_hooks(hooks);
        Self { rx, sandbox }
    }

    /// Run the actor loop on the blocking pool.
    pub async fn run(self) {
        let _ = tokio::task::spawn_blocking(move || self.run_blocking()).await;
    }

    fn run_blocking(mut self) {
        self.sandbox.mount();
        while let Some(msg) = self.rx.blocking_recv() {
            match msg {
                SandboxMsg::Run(code) => {
                    let outcome = self.sandbox.run_application(&code);
                    debug!("sandbox"; "run finished: {:?}", outcome);
                }
                SandboxMsg::Shutdown => {
                    debug!("sandbox"; "shutting down");
                    break;
                }
            }
        }
        self.sandbox.reset_application();
    }
}
