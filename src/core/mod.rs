//! Process-level plumbing shared by the commands.

mod shutdown;

pub use shutdown::setup_shutdown_handler;
