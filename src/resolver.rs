//! Module resolution for sandboxed code.
//!
//! `require(name)` inside the sandbox resolves, in order, to:
//!
//! | name                          | binding                              |
//! |-------------------------------|--------------------------------------|
//! | `react-native`                | UI runtime (`Binding::Runtime`)      |
//! | `react`                       | base component library               |
//! | `react-addons-update`         | in-place state-update helper         |
//! | `./…` or `../…`               | asset reference `{ uri }`            |
//! | registered vendor name        | vendor value (or `{}` when unset)    |
//! | anything else                 | `{}`                                 |
//!
//! Resolution is pure string composition; the only shared state read is the
//! vendor registry snapshot at call time.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;

/// Built-in libraries the sandbox provides without any import path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuntimeLibrary {
    #[serde(rename = "react-native")]
    UiRuntime,
    #[serde(rename = "react")]
    Components,
    #[serde(rename = "react-addons-update")]
    Update,
}

impl RuntimeLibrary {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "react-native" => Some(Self::UiRuntime),
            "react" => Some(Self::Components),
            "react-addons-update" => Some(Self::Update),
            _ => None,
        }
    }
}

/// What a `require(name)` call evaluates to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Binding {
    Runtime { library: RuntimeLibrary },
    Asset { uri: String },
    Vendor { value: Value },
    Empty,
}

// ============================================================================
// Vendor registry
// ============================================================================

/// Dynamically registered vendor bindings.
///
/// Cloning yields another handle to the same registry. A name registered
/// with `None` is known but has no value yet; it resolves to `{}`.
#[derive(Debug, Clone, Default)]
pub struct VendorRegistry {
    inner: Arc<RwLock<FxHashMap<String, Option<Value>>>>,
}

impl VendorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_components(components: &FxHashMap<String, Value>) -> Self {
        let registry = Self::new();
        for (name, value) in components {
            registry.register(name, Some(value.clone()));
        }
        registry
    }

    pub fn register(&self, name: impl Into<String>, value: Option<Value>) {
        self.inner.write().insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Look up a vendor name: `None` when unregistered.
    fn lookup(&self, name: &str) -> Option<Option<Value>> {
        self.inner.read().get(name).cloned()
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Resolver bound to one asset root and one vendor registry.
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    asset_root: String,
    vendors: VendorRegistry,
}

impl ModuleResolver {
    pub fn new(asset_root: impl Into<String>, vendors: VendorRegistry) -> Self {
        Self {
            asset_root: asset_root.into(),
            vendors,
        }
    }

    pub fn resolve(&self, name: &str) -> Binding {
        resolve(&self.asset_root, name, &self.vendors)
    }
}

/// Resolve `name` against an asset root and the current vendor snapshot.
pub fn resolve(asset_root: &str, name: &str, vendors: &VendorRegistry) -> Binding {
    if let Some(library) = RuntimeLibrary::from_name(name) {
        return Binding::Runtime { library };
    }

    if is_relative(name) {
        // `./` names the root itself; `../` segments are kept for the host to resolve.
        let path = name.strip_prefix("./").unwrap_or(name);
        return Binding::Asset {
            uri: format!("{}{}", with_trailing_slash(asset_root), path),
        };
    }

    match vendors.lookup(name) {
        Some(Some(value)) => Binding::Vendor { value },
        Some(None) | None => Binding::Empty,
    }
}

fn is_relative(name: &str) -> bool {
    name.starts_with("./") || name.starts_with("../")
}

fn with_trailing_slash(root: &str) -> String {
    if root.ends_with('/') {
        root.to_string()
    } else {
        format!("{root}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_runtime_bindings() {
        let vendors = VendorRegistry::new();
        assert_eq!(
            resolve("", "react-native", &vendors),
            Binding::Runtime {
                library: RuntimeLibrary::UiRuntime
            }
        );
        assert_eq!(
            resolve("", "react", &vendors),
            Binding::Runtime {
                library: RuntimeLibrary::Components
            }
        );
        assert_eq!(
            resolve("", "react-addons-update", &vendors),
            Binding::Runtime {
                library: RuntimeLibrary::Update
            }
        );
    }

    #[test]
    fn test_asset_with_trailing_slash() {
        let vendors = VendorRegistry::new();
        assert_eq!(
            resolve("/pkg/", "./img.png", &vendors),
            Binding::Asset {
                uri: "/pkg/img.png".into()
            }
        );
    }

    #[test]
    fn test_asset_root_normalized() {
        let vendors = VendorRegistry::new();
        assert_eq!(
            resolve("/pkg", "./img.png", &vendors),
            Binding::Asset {
                uri: "/pkg/img.png".into()
            }
        );
        assert_eq!(
            resolve("", "../up.png", &vendors),
            Binding::Asset {
                uri: "/../up.png".into()
            }
        );
    }

    #[test]
    fn test_dot_without_slash_is_not_asset() {
        let vendors = VendorRegistry::new();
        assert_eq!(resolve("/pkg", ".hidden", &vendors), Binding::Empty);
    }

    #[test]
    fn test_vendor_lookup() {
        let vendors = VendorRegistry::new();
        vendors.register("charts", Some(json!({ "Bar": "component" })));
        vendors.register("pending", None);

        assert_eq!(
            resolve("", "charts", &vendors),
            Binding::Vendor {
                value: json!({ "Bar": "component" })
            }
        );
        assert_eq!(resolve("", "pending", &vendors), Binding::Empty);
        assert_eq!(resolve("", "missing", &vendors), Binding::Empty);
    }

    #[test]
    fn test_registry_snapshot_read_at_call_time() {
        let vendors = VendorRegistry::new();
        let resolver = ModuleResolver::new("/assets", vendors.clone());
        assert_eq!(resolver.resolve("maps"), Binding::Empty);

        vendors.register("maps", Some(json!(1)));
        assert_eq!(
            resolver.resolve("maps"),
            Binding::Vendor { value: json!(1) }
        );

        vendors.register("maps", None);
        assert_eq!(resolver.resolve("maps"), Binding::Empty);
    }

    #[test]
    fn test_binding_json_shape() {
        let json = serde_json::to_value(Binding::Asset {
            uri: "/a/b.png".into(),
        })
        .unwrap();
        assert_eq!(json, json!({ "kind": "asset", "uri": "/a/b.png" }));

        let json = serde_json::to_value(Binding::Runtime {
            library: RuntimeLibrary::UiRuntime,
        })
        .unwrap();
        assert_eq!(json, json!({ "kind": "runtime", "library": "react-native" }));
    }
}
