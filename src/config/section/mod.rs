//! Configuration section definitions.
//!
//! Each module corresponds to a section in `liveplay.toml`:
//!
//! | Module      | TOML Section   | Purpose                                 |
//! |-------------|----------------|-----------------------------------------|
//! | `workspace` | `[workspace]`  | Document split, debounce, preprocessing |
//! | `compiler`  | `[compiler]`   | Transpiler selection                    |
//! | `sandbox`   | `[sandbox]`    | Engine command, app name, asset root    |
//! | `vendor`    | `[vendor]`     | Pre-registered vendor components        |
//! | `serve`     | `[serve]`      | WebSocket host link                     |

mod compiler;
mod sandbox;
mod serve;
mod vendor;
mod workspace;

pub use compiler::CompilerConfig;
pub use sandbox::SandboxConfig;
pub use serve::ServeConfig;
pub use vendor::VendorConfig;
pub use workspace::WorkspaceConfig;

use super::types::{ConfigDiagnostics, FieldPath};

/// Check that the program of a command line can be found.
pub(super) fn check_command(command: &[String], field: FieldPath, diag: &mut ConfigDiagnostics) {
    let Some(program) = command.first() else {
        diag.error(field, "command must not be empty");
        return;
    };
    if which::which(program).is_err() {
        diag.error_with_hint(
            field,
            format!("`{program}` not found"),
            "install it or put it on PATH",
        );
    }
}
