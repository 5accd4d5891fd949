//! `[vendor]` section configuration.
//!
//! Components registered before the first run. Values are arbitrary TOML
//! and reach the sandbox as JSON.
//!
//! ```toml
//! [vendor.components]
//! Maps = { apiKey = "demo" }
//! Charts = {}
//! ```

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    pub components: FxHashMap<String, Value>,
}
