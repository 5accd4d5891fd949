//! Actor System for Watch Mode
//!
//! Message-passing concurrency around the workspace coordinator:
//!
//! ```text
//!                       ┌──▶ WorkerActor ─────┐  (transpile, spawn_blocking)
//! FsActor ──edits──▶ WorkspaceActor ◀─────────┤
//! WsActor ──client──▶   │  ├──▶ SandboxActor ─┘  (evaluate, blocking thread)
//!    ▲                  │  └──▶ PreprocessActor  (optional detour)
//!    └──codechange/status┘
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `debouncer` - Pure deadline tracking shared by the fs and workspace actors
//! - `workspace` - Coordinator state machine driver with the edit debounce
//! - `worker` - Compile worker bridge
//! - `sandbox` - Execution sandbox on a blocking thread
//! - `preprocess` - External preprocessor bridge
//! - `fs` - Document file watcher
//! - `ws` - WebSocket broadcast to host clients
//! - `coordinator` - Wires up and runs actors

mod debouncer;

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod preprocess;
pub mod sandbox;
pub mod worker;
pub mod workspace;
pub mod ws;

pub use coordinator::Coordinator;
