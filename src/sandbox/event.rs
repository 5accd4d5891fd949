//! Outbound sandbox events and the transport that carries them.
//!
//! ```text
//! { "id": "player", "type": "ready" }
//! { "id": "player", "type": "warning", "payload": "Warning: ..." }
//! { "id": "player", "type": "error",   "payload": "TypeError: x (3)" }
//! { "id": "player", "type": "success", "payload": "<compiled code>" }
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SandboxEventKind {
    Ready,
    Error { payload: String },
    Warning { payload: String },
    Success { payload: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxEvent {
    pub id: String,
    #[serde(flatten)]
    pub kind: SandboxEventKind,
}

impl SandboxEvent {
    pub fn ready(id: &str) -> Self {
        Self::new(id, SandboxEventKind::Ready)
    }

    pub fn error(id: &str, payload: impl Into<String>) -> Self {
        Self::new(
            id,
            SandboxEventKind::Error {
                payload: payload.into(),
            },
        )
    }

    pub fn warning(id: &str, payload: impl Into<String>) -> Self {
        Self::new(
            id,
            SandboxEventKind::Warning {
                payload: payload.into(),
            },
        )
    }

    pub fn success(id: &str, payload: impl Into<String>) -> Self {
        Self::new(
            id,
            SandboxEventKind::Success {
                payload: payload.into(),
            },
        )
    }

    fn new(id: &str, kind: SandboxEventKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }
}

/// Fire-and-forget delivery of sandbox events to the coordinator.
pub trait Transport: Send {
    fn send(&mut self, event: SandboxEvent);
}

/// Collecting transport, used by one-shot runs and tests.
impl Transport for Vec<SandboxEvent> {
    fn send(&mut self, event: SandboxEvent) {
        self.push(event);
    }
}
