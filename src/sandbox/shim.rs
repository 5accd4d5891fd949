//! Wrapping compiled code into a self-contained unit.
//!
//! The unit is `PROLOGUE + code + EPILOGUE`. The prologue defines the
//! host runtime (module table, console capture, component shim and the
//! app registry redirect) and has a fixed line count, so a line reported
//! by the engine maps back to user code by subtracting [`prologue_lines`].
//! Substituted values are single-line JSON and never shift it.
//!
//! Records are written to stdout as `\u{1}<kind> <json>` lines:
//! `log`, `mount`, `fault` and `uncaught`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::resolver::{Binding, ModuleResolver};

const BINDINGS_SLOT: &str = "__LIVEPLAY_BINDINGS__";
const APP_SLOT: &str = "__LIVEPLAY_APP__";

const PROLOGUE: &str = r#"var __liveplay = (function (bindings, appName) {
  var apps = {};
  var emit = function (kind, value) {
    process.stdout.write("\u0001" + kind + " " + JSON.stringify(value) + "\n");
  };
  var describe = function (e) {
    var err = e instanceof Error ? e : new Error(String(e));
    return { name: err.name, message: err.message, line: err.line, lineNumber: err.lineNumber, stack: err.stack };
  };
  var format = function (args) {
    return Array.prototype.map.call(args, function (a) {
      return typeof a === "string" ? a : JSON.stringify(a);
    }).join(" ");
  };
  ["log", "info", "warn", "error"].forEach(function (level) {
    console[level] = function () { emit("log", { level: level, message: format(arguments) }); };
  });
  process.on("uncaughtException", function (e) { emit("uncaught", describe(e)); });
  var createElement = function (type, props) {
    return { type: type, props: props || {}, children: Array.prototype.slice.call(arguments, 2) };
  };
  function Component(props) { this.props = props || {}; this.state = {}; }
  Component.prototype.setState = function (s) { this.state = Object.assign({}, this.state, s); };
  var update = function (target, op) {
    if (Object.prototype.hasOwnProperty.call(op, "$set")) return op.$set;
    if (op.$apply) return op.$apply(target);
    var next = Array.isArray(target) ? target.slice() : Object.assign({}, target);
    if (op.$push) return next.concat(op.$push);
    if (op.$unshift) return op.$unshift.concat(next);
    if (op.$splice) { op.$splice.forEach(function (a) { next.splice.apply(next, a); }); return next; }
    if (op.$merge) return Object.assign(next, op.$merge);
    Object.keys(op).forEach(function (k) { next[k] = update(next[k], op[k]); });
    return next;
  };
  var AppRegistry = {
    registerComponent: function (name, factory) { apps[appName] = factory; return appName; }
  };
  var runtime = {
    "react-native": {
      AppRegistry: AppRegistry, StyleSheet: { create: function (s) { return s; } },
      View: "View", Text: "Text", Image: "Image", ScrollView: "ScrollView", TouchableOpacity: "TouchableOpacity"
    },
    "react": { Component: Component, PureComponent: Component, createElement: createElement, Fragment: "Fragment" },
    "react-addons-update": update
  };
  var render = function (node) {
    if (node === null || node === undefined || typeof node === "boolean") return null;
    if (typeof node !== "object") return String(node);
    if (Array.isArray(node)) return node.map(render);
    if (typeof node.type === "function") {
      var props = Object.assign({}, node.props, { children: node.children });
      var proto = node.type.prototype;
      return render(proto && typeof proto.render === "function" ? new node.type(props).render() : node.type(props));
    }
    return { type: node.type, props: node.props, children: node.children.map(render) };
  };
  return {
    require: function (name) {
      var b = bindings[name];
      if (!b) return {};
      if (b.kind === "runtime") return runtime[b.library];
      if (b.kind === "asset") return { uri: b.uri };
      if (b.kind === "vendor") return b.value;
      return {};
    },
    boot: function () {
      var factory = apps[appName];
      if (!factory) throw new Error("Application " + appName + " has not been registered");
      emit("mount", { app: appName, tree: render(createElement(factory(), {})) });
    },
    fault: function (e) { emit("fault", describe(e)); }
  };
})(__LIVEPLAY_BINDINGS__, __LIVEPLAY_APP__);
try {
(function (module, exports, require) {
"#;

const EPILOGUE: &str = r#"
})({ exports: {} }, {}, __liveplay.require);
__liveplay.boot();
} catch (e) {
  __liveplay.fault(e);
}
"#;

/// `require("name")` / `require('name')` with a literal argument.
static REQUIRE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\brequire\(\s*(?:"([^"]+)"|'([^']+)')\s*\)"#).unwrap()
});

/// Names always present in the module table.
const RUNTIME_NAMES: [&str; 3] = ["react-native", "react", "react-addons-update"];

/// A unit ready for evaluation.
#[derive(Debug, Clone)]
pub struct WrappedUnit {
    /// Full wrapped source.
    pub source: String,
    /// The user code inside the wrapper.
    pub code: String,
    pub app_name: String,
    pub prologue_lines: u32,
    /// Module table in first-reference order.
    pub bindings: Vec<(String, Binding)>,
}

/// Lines preceding the first line of user code.
pub fn prologue_lines() -> u32 {
    PROLOGUE.matches('\n').count() as u32
}

/// Literal module names passed to `require`, deduplicated in order.
pub fn required_names(code: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in REQUIRE_CALL.captures_iter(code) {
        let Some(name) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        if !names.iter().any(|n| n == name.as_str()) {
            names.push(name.as_str().to_string());
        }
    }
    names
}

pub fn wrap(code: &str, app_name: &str, resolver: &ModuleResolver) -> WrappedUnit {
    let mut bindings: Vec<(String, Binding)> = Vec::new();
    let referenced = required_names(code);
    let names = RUNTIME_NAMES
        .iter()
        .map(|n| n.to_string())
        .chain(referenced)
        .collect::<Vec<_>>();
    for name in names {
        if !bindings.iter().any(|(n, _)| *n == name) {
            let binding = resolver.resolve(&name);
            bindings.push((name, binding));
        }
    }

    let table: Map<String, Value> = bindings
        .iter()
        .map(|(name, binding)| {
            let value = serde_json::to_value(binding).unwrap_or(Value::Null);
            (name.clone(), value)
        })
        .collect();
    let table = serde_json::to_string(&table).unwrap_or_else(|_| "{}".to_string());
    let app = serde_json::to_string(app_name).unwrap_or_else(|_| "\"App\"".to_string());

    let mut source = PROLOGUE.replace(BINDINGS_SLOT, &table).replace(APP_SLOT, &app);
    source.push_str(code);
    source.push_str(EPILOGUE);

    WrappedUnit {
        source,
        code: code.to_string(),
        app_name: app_name.to_string(),
        prologue_lines: prologue_lines(),
        bindings,
    }
}
