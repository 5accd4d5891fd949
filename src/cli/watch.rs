//! `liveplay watch`: the actor system on a dedicated tokio runtime.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::actor::Coordinator;
use crate::config::PlayConfig;
use crate::{core, log, logger};

/// Blocking tasks (a sandbox run in flight) get this long after shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

pub fn watch_document(config: PlayConfig, file: &Path) -> Result<()> {
    let shutdown_rx = core::setup_shutdown_handler()?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    log!("watch"; "watching {}", file.display());
    let coordinator = Coordinator::with_config(Arc::new(config), file.to_path_buf())
        .with_shutdown_signal(shutdown_rx);
    let result = rt.block_on(coordinator.run());

    logger::status_detach();
    rt.shutdown_timeout(SHUTDOWN_TIMEOUT);
    result
}
