//! Actor Coordinator - Wires up the Playground Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Builds the injected dependencies (transpiler, evaluator, resolver)
//! - Wires up actors
//! - Runs them concurrently
//!
//! Behavior lives in `workspace`/`sandbox`; nothing here keeps state.

mod runtime;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::FsActor;
use super::messages::{CoordinatorMsg, HostMsg, PreprocessMsg, SandboxMsg, WorkerMsg};
use super::preprocess::PreprocessActor;
use super::sandbox::SandboxActor;
use super::worker::WorkerActor;
use super::workspace::{Outboxes, WorkspaceActor};
use super::ws::{WsActor, server};
use crate::config::PlayConfig;
use crate::document::parse_document;
use crate::resolver::{ModuleResolver, VendorRegistry};
use crate::sandbox::ProcessEvaluator;
use crate::worker::transpiler_for;
use crate::workspace::Workspace;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: Arc<PlayConfig>,
    document: PathBuf,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    /// Create for the document at `document`.
    pub fn with_config(config: Arc<PlayConfig>, document: PathBuf) -> Self {
        Self {
            config,
            document,
            shutdown_rx: None,
        }
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run the actor system until shutdown.
    pub async fn run(mut self) -> Result<()> {
        let config = Arc::clone(&self.config);
        let raw = std::fs::read_to_string(&self.document)
            .with_context(|| format!("Failed to read {}", self.document.display()))?;
        let model = parse_document(&raw, config.workspace.split);
        crate::debug!("actor"; "{} section(s) loaded", model.len());

        let (coord_tx, coord_rx) = mpsc::channel::<CoordinatorMsg>(CHANNEL_BUFFER);
        let (worker_tx, worker_rx) = mpsc::channel::<WorkerMsg>(CHANNEL_BUFFER);
        let (sandbox_tx, sandbox_rx) = mpsc::channel::<SandboxMsg>(CHANNEL_BUFFER);
        let (host_tx, host_rx) = mpsc::channel::<HostMsg>(CHANNEL_BUFFER);

        if config.serve.is_enabled() {
            match server::start(config.serve.interface, config.serve.port, host_tx.clone()) {
                Ok(port) => {
                    crate::log!("watch"; "host link on ws://{}:{}", config.serve.interface, port);
                }
                Err(e) => crate::log!("actor"; "websocket server failed: {}", e),
            }
        }

        let fs_actor = FsActor::new(
            self.document.clone(),
            config.workspace.split,
            model.clone(),
            coord_tx.clone(),
        )
        .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;

        let vendors = VendorRegistry::from_components(&config.vendor.components);
        let resolver = ModuleResolver::new(config.sandbox.asset_root.clone(), vendors.clone());
        let evaluator = ProcessEvaluator::new(config.sandbox.engine.clone())
            .with_cwd(config.root.clone())
            .with_timeout(config.sandbox.run_timeout());
        let sandbox_actor = SandboxActor::new(
            sandbox_rx,
            coord_tx.clone(),
            &config.sandbox.id,
            &config.sandbox.app_name,
            resolver,
            evaluator,
        );

        let worker_actor = WorkerActor::new(
            worker_rx,
            coord_tx.clone(),
            transpiler_for(&config.compiler.command),
        );

        let (preprocess_tx, preprocess_actor) = if config.workspace.preprocess {
            let (tx, rx) = mpsc::channel::<PreprocessMsg>(CHANNEL_BUFFER);
            let actor = PreprocessActor::new(
                rx,
                coord_tx.clone(),
                config.workspace.preprocess_command.clone(),
            );
            (Some(tx), Some(actor))
        } else {
            (None, None)
        };

        let ws_actor = WsActor::new(host_rx, coord_tx.clone(), vendors);

        let workspace = Workspace::new(model, config.sandbox.id.clone())
            .with_preprocess(config.workspace.preprocess);
        let outboxes = Outboxes {
            worker: worker_tx.clone(),
            sandbox: sandbox_tx.clone(),
            preprocess: preprocess_tx.clone(),
            host: host_tx.clone(),
        };
        let workspace_actor = WorkspaceActor::new(
            coord_rx,
            workspace,
            outboxes,
            Duration::from_millis(config.workspace.debounce_ms),
        );

        crate::debug!("actor"; "start");
        runtime::run_actors(
            runtime::Actors {
                fs: fs_actor,
                workspace: workspace_actor,
                worker: worker_actor,
                sandbox: sandbox_actor,
                preprocess: preprocess_actor,
                ws: ws_actor,
            },
            runtime::Senders {
                coordinator: coord_tx,
                worker: worker_tx,
                sandbox: sandbox_tx,
                preprocess: preprocess_tx,
                host: host_tx,
            },
            self.shutdown_rx.take(),
        )
        .await;

        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
