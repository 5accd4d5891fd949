//! Wire messages exchanged with the outside world.
//!
//! - [`PreprocessMessage`]: coordinator ↔ external preprocessor
//! - [`HostMessage`]: coordinator → host clients (WebSocket)
//! - [`ClientMessage`]: host clients → coordinator
//!
//! Every message is a JSON object tagged by `type`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::diagnostics::ErrorDetails;
use crate::document::Direction;

// =============================================================================
// Preprocessor
// =============================================================================

/// Which displayed error a preprocessed error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorComponent {
    CompilerError,
    RuntimeError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PreprocessMessage {
    /// Request: rewrite the concatenated document before compiling.
    CodePreprocess { code: String },
    /// Reply: code to submit to the compiler.
    CodePreprocessed { code: String },
    /// Request: rewrite a classified error before display.
    ErrorPreprocess {
        error: ErrorDetails,
        component: ErrorComponent,
    },
    /// Reply: error to display under `component`.
    ErrorPreprocessed {
        error: ErrorDetails,
        component: ErrorComponent,
    },
}

impl PreprocessMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

// =============================================================================
// Host
// =============================================================================

/// Cursor position inside the selected section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPos {
    pub line: u32,
    pub ch: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HostMessage {
    /// Sent once to every new client.
    Connected { version: String },
    /// A run succeeded after an edit.
    CodeChange {
        sections: Map<String, Value>,
        code: String,
        compiled: String,
    },
    /// Displayed error state.
    Status {
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<ErrorDetails>,
        #[serde(rename = "showDetails")]
        show_details: bool,
    },
}

impl HostMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

// =============================================================================
// Client
// =============================================================================

/// Commands a host client may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// Replace the selected section's content.
    Edit { content: String },
    Select { index: usize },
    Cursor {
        #[serde(default)]
        pos: Option<CursorPos>,
        #[serde(default)]
        selection: Option<String>,
    },
    Move { index: usize, direction: Direction },
    Details { show: bool },
    /// Register (or with `value: null`, clear) a vendor binding.
    Vendor {
        name: String,
        #[serde(default)]
        value: Option<Value>,
    },
}

impl ClientMessage {
    pub fn from_json(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::classify;

    #[test]
    fn test_preprocess_tags() {
        let json = PreprocessMessage::CodePreprocess { code: "x".into() }.to_json();
        assert_eq!(json, r#"{"type":"codepreprocess","code":"x"}"#);

        let msg: PreprocessMessage = serde_json::from_str(
            r#"{"type":"errorpreprocessed","component":"runtimeError","error":{"message":"m","summary":"m","description":"m","lineNumber":null,"section":null}}"#,
        )
        .unwrap();
        assert!(matches!(
            msg,
            PreprocessMessage::ErrorPreprocessed {
                component: ErrorComponent::RuntimeError,
                ..
            }
        ));
    }

    #[test]
    fn test_error_preprocess_shape() {
        let msg = PreprocessMessage::ErrorPreprocess {
            error: classify("Error: boom (3)"),
            component: ErrorComponent::CompilerError,
        };
        let value: Value = serde_json::from_str(&msg.to_json()).unwrap();
        assert_eq!(value["type"], "errorpreprocess");
        assert_eq!(value["component"], "compilerError");
        assert_eq!(value["error"]["lineNumber"], 3);
    }

    #[test]
    fn test_codechange_shape() {
        let mut sections = Map::new();
        sections.insert("b".into(), Value::from("2"));
        sections.insert("a".into(), Value::from("1"));
        let msg = HostMessage::CodeChange {
            sections,
            code: "2\n1\n".into(),
            compiled: "compiled".into(),
        };
        assert_eq!(
            msg.to_json(),
            r#"{"type":"codechange","sections":{"b":"2","a":"1"},"code":"2\n1\n","compiled":"compiled"}"#
        );
    }

    #[test]
    fn test_status_without_error() {
        let msg = HostMessage::Status {
            error: None,
            show_details: false,
        };
        assert_eq!(msg.to_json(), r#"{"type":"status","showDetails":false}"#);
    }

    #[test]
    fn test_client_messages() {
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"select","index":2}"#),
            Some(ClientMessage::Select { index: 2 })
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"move","index":1,"direction":"left"}"#),
            Some(ClientMessage::Move {
                index: 1,
                direction: Direction::Left
            })
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"type":"cursor","pos":{"line":3,"ch":1}}"#),
            Some(ClientMessage::Cursor {
                pos: Some(CursorPos { line: 3, ch: 1 }),
                selection: None
            })
        );
        assert_eq!(ClientMessage::from_json(r#"{"type":"page"}"#), None);
    }
}
