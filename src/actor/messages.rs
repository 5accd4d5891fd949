//! Actor Message Definitions
//!
//! ```text
//! FsActor/WsActor --edit--> WorkspaceActor --Compile--> WorkerActor --Compiled--> WorkspaceActor
//! WorkspaceActor --Run--> SandboxActor --Sandbox/RunStarted--> WorkspaceActor
//! WorkspaceActor --Post--> WsActor
//! ```

use std::net::TcpStream;

use crate::document::{Direction, SectionModel};
use crate::protocol::{CursorPos, HostMessage, PreprocessMessage};
use crate::sandbox::SandboxEvent;
use crate::worker::WorkerReply;

// =============================================================================
// WorkspaceActor Messages
// =============================================================================

/// Messages to the workspace coordinator
#[derive(Debug)]
pub enum CoordinatorMsg {
    /// One section changed on disk
    EditSection { name: String, content: String },
    /// The selected section was edited by a host client
    Edit { content: String },
    /// Section set or order changed on disk
    ReplaceDocument(SectionModel),
    /// Select the section that receives `Edit`
    Select(usize),
    /// Cursor and selection inside the selected section
    Cursor {
        pos: Option<CursorPos>,
        selection: Option<String>,
    },
    /// Swap a section with its neighbor
    Move { index: usize, direction: Direction },
    /// Expand or collapse the error description
    Details(bool),
    /// Compile worker reply for submission `seq`
    Compiled { seq: u64, reply: WorkerReply },
    /// The sandbox began a run
    RunStarted,
    /// Outbound sandbox event
    Sandbox(SandboxEvent),
    /// Preprocessor reply
    Preprocessed(PreprocessMessage),
    /// Shutdown
    Shutdown,
}

// =============================================================================
// WorkerActor Messages
// =============================================================================

/// Messages to the compile worker
#[derive(Debug)]
pub enum WorkerMsg {
    Compile { seq: u64, source: String },
    Shutdown,
}

// =============================================================================
// SandboxActor Messages
// =============================================================================

/// Messages to the sandbox
#[derive(Debug)]
pub enum SandboxMsg {
    /// Compiled unit to run
    Run(String),
    Shutdown,
}

// =============================================================================
// PreprocessActor Messages
// =============================================================================

/// Messages to the preprocessor bridge
#[derive(Debug)]
pub enum PreprocessMsg {
    Request(PreprocessMessage),
    Shutdown,
}

// =============================================================================
// WsActor Messages
// =============================================================================

/// Messages to the host broadcaster
pub enum HostMsg {
    /// Broadcast to every client
    Post(HostMessage),
    /// Add client
    AddClient(TcpStream),
    /// Shutdown
    Shutdown,
}
