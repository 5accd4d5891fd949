//! Preprocessor Actor
//!
//! Bridges the workspace to an external preprocessing command. Each request
//! is written to the command's stdin as JSON; its stdout must hold one reply
//! message. Requests are handled one at a time, so replies keep their order.
//! A failed request is logged and never answered.

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use super::messages::{CoordinatorMsg, PreprocessMsg};
use crate::protocol::PreprocessMessage;
use crate::utils::exec::{Cmd, FilterRule};
use crate::{debug, log};

pub struct PreprocessActor {
    rx: mpsc::Receiver<PreprocessMsg>,
    reply_tx: mpsc::Sender<CoordinatorMsg>,
    command: Vec<String>,
}

impl PreprocessActor {
    pub fn new(
        rx: mpsc::Receiver<PreprocessMsg>,
        reply_tx: mpsc::Sender<CoordinatorMsg>,
        command: Vec<String>,
    ) -> Self {
        Self {
            rx,
            reply_tx,
            command,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            let request = match msg {
                PreprocessMsg::Request(request) => request,
                PreprocessMsg::Shutdown => {
                    debug!("preprocess"; "shutting down");
                    break;
                }
            };

            let command = self.command.clone();
            let result = tokio::task::spawn_blocking(move || preprocess(&command, &request)).await;
            match result {
                Ok(Ok(reply)) => {
                    if self
                        .reply_tx
                        .send(CoordinatorMsg::Preprocessed(reply))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Ok(Err(e)) => log!("preprocess"; "{:#}", e),
                Err(e) => log!("preprocess"; "task failed: {}", e),
            }
        }
    }
}

/// Package runner chatter on stderr.
static RUNNER_NOISE: FilterRule = FilterRule::new(&["npm WARN", "npm notice", "npx: installed"]);

/// Run the preprocessing command for one request.
pub fn preprocess(command: &[String], request: &PreprocessMessage) -> Result<PreprocessMessage> {
    let output = Cmd::from_slice(command)
        .stdin(request.to_json())
        .filter(&RUNNER_NOISE)
        .run()?;
    serde_json::from_slice(&output.stdout).with_context(|| {
        format!(
            "`{}` did not reply with a preprocessor message",
            command.join(" ")
        )
    })
}
