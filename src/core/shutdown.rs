//! Ctrl+C handling for watch mode.
//!
//! The handler only signals a channel; the actor runtime polls the
//! receiver and shuts actors down in order.

use anyhow::Result;
use crossbeam::channel::{Receiver, bounded};

/// Install the Ctrl+C handler. Call once, right before the actor system starts.
///
/// A second Ctrl+C while shutdown is in progress exits immediately.
pub fn setup_shutdown_handler() -> Result<Receiver<()>> {
    let (tx, rx) = bounded(1);
    ctrlc::set_handler(move || {
        if tx.try_send(()).is_err() {
            std::process::exit(130);
        }
        crate::log!("watch"; "shutting down...");
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))?;
    Ok(rx)
}
