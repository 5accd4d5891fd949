//! `liveplay init`: starter document and config.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::config::PlayConfig;
use crate::document::sample::sample_json;
use crate::log;

const DEFAULT_DOCUMENT: &str = "playground.json";

/// Commented `liveplay.toml` holding the defaults.
fn config_template() -> String {
    format!(
        r#"# liveplay configuration (v{version})

[workspace]
split = true              # Document is a JSON object of sections
debounce_ms = 250         # Quiet period before an edit is compiled
preprocess = false        # Route code and errors through preprocess_command
# preprocess_command = ["node", "preprocess.js"]

[compiler]
command = []              # Empty uses the built-in transpiler

[sandbox]
id = "liveplay"
asset_root = ""           # Prefix for `./` asset requires
engine = ["node", "-"]    # Reads the wrapped unit on stdin
app_name = "App"
timeout_ms = 5000         # Kill a run after this long, 0 waits forever

[vendor.components]
# Maps = {{ apiKey = "demo" }}

[serve]
interface = "127.0.0.1"
port = 5277               # 0 disables the host link
"#,
        version = env!("CARGO_PKG_VERSION")
    )
}

/// Write the sample document (never overwriting) and, if absent, the config.
pub fn init_playground(config: &PlayConfig, file: Option<&Path>) -> Result<()> {
    let document = file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENT));
    let document = config.root_join(document);

    if document.exists() {
        bail!(
            "'{}' already exists.\nChoose a different file name or remove the existing file.",
            document.display()
        );
    }
    if let Some(parent) = document.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&document, sample_json())
        .with_context(|| format!("Failed to write {}", document.display()))?;
    log!("init"; "created {}", document.display());

    if config.config_path.exists() {
        log!("init"; "keeping existing {}", config.config_path.display());
    } else {
        fs::write(&config.config_path, config_template())
            .with_context(|| format!("Failed to write {}", config.config_path.display()))?;
        log!("init"; "created {}", config.config_path.display());
    }
    Ok(())
}
