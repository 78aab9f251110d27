//! Bundle code generation
//!
//! The packer turns an analyzed module graph into one self-contained script:
//! the runtime loader from [`runtime`], a table from canonical key to module
//! initializer from [`module_registry`], and a call that loads the entry.
//! Module bodies are emitted as literal functions, so nothing is evaluated
//! from strings at runtime.

mod module_registry;
mod runtime;

use std::fmt::Write;

use log::debug;

use crate::types::{ModuleKey, ModuleRecord};

/// Render the bundle for `modules`, starting execution at `entry`.
///
/// Modules appear in the table in iteration order; execution order is decided
/// by the loader at runtime.
pub fn pack<'a>(
    modules: impl IntoIterator<Item = &'a ModuleRecord>,
    entry: &ModuleKey,
    loader_symbol: &str,
) -> String {
    let modules: Vec<&ModuleRecord> = modules.into_iter().collect();
    debug!(
        "Packing {} module(s) with entry {entry} and loader {loader_symbol}",
        modules.len()
    );

    let mut bundle = runtime::render_prelude(loader_symbol);
    bundle.push_str(&runtime::render_entry_call(
        loader_symbol,
        &js_string_literal(entry.as_str()),
    ));
    bundle.push_str(&module_registry::render_module_table(modules, loader_symbol));
    bundle.push_str(");\n");
    bundle
}

/// Quote `value` as a double-quoted JavaScript string literal
pub(crate) fn js_string_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    for c in value.chars() {
        match c {
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            '\u{2028}' | '\u{2029}' => {
                let _ = write!(literal, "\\u{:04x}", u32::from(c));
            }
            c if c.is_control() => {
                let _ = write!(literal, "\\u{:04x}", u32::from(c));
            }
            c => literal.push(c),
        }
    }
    literal.push('"');
    literal
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(key: &str, source: &str, dependencies: &[&str]) -> ModuleRecord {
        ModuleRecord {
            key: ModuleKey::from_relative(key),
            source: source.to_owned(),
            dependencies: dependencies
                .iter()
                .map(|dep| ModuleKey::from_relative(dep))
                .collect(),
        }
    }

    #[test]
    fn test_pack_layout() {
        let modules = vec![
            record(
                "src/index.js",
                "const a = _require_(\"./src/a.js\");\nconsole.log(a);\n",
                &["src/a.js"],
            ),
            record("src/a.js", "module.exports = 42;\n", &[]),
        ];
        let bundle = pack(&modules, &modules[0].key, "_require_");

        insta::assert_snapshot!(bundle.trim_end(), @r#"
;(function (__cjspack_modules__) {
  var __cjspack_cache__ = {};
  function _require_(__cjspack_key__) {
    if (Object.prototype.hasOwnProperty.call(__cjspack_cache__, __cjspack_key__)) {
      return __cjspack_cache__[__cjspack_key__].exports;
    }
    if (!Object.prototype.hasOwnProperty.call(__cjspack_modules__, __cjspack_key__)) {
      throw new Error("Cannot find module '" + __cjspack_key__ + "'");
    }
    var module = (__cjspack_cache__[__cjspack_key__] = { exports: {} });
    __cjspack_modules__[__cjspack_key__](module, module.exports, _require_);
    return module.exports;
  }
  return _require_("./src/index.js");
})({
  "./src/index.js": function (module, exports, _require_) {
const a = _require_("./src/a.js");
console.log(a);
  },
  "./src/a.js": function (module, exports, _require_) {
module.exports = 42;
  }
});
"#);
    }

    #[test]
    fn test_cache_entry_created_before_initializer_runs() {
        let modules = vec![record("a.js", "", &[])];
        let bundle = pack(&modules, &modules[0].key, "_require_");

        let cache_insert = bundle
            .find("(__cjspack_cache__[__cjspack_key__] = { exports: {} })")
            .expect("cache insert");
        let initializer_call = bundle
            .find("__cjspack_modules__[__cjspack_key__](module")
            .expect("initializer call");
        assert!(cache_insert < initializer_call);
    }

    #[test]
    fn test_loader_symbol_is_threaded_through() {
        let modules = vec![record("main.js", "__load(\"./dep.js\");\n", &["dep.js"])];
        let bundle = pack(&modules, &modules[0].key, "__load");

        assert!(bundle.contains("function __load(__cjspack_key__)"));
        assert!(bundle.contains("function (module, exports, __load)"));
        assert!(bundle.contains("module.exports, __load);"));
        assert!(bundle.contains("return __load(\"./main.js\");"));
        assert!(!bundle.contains("_require_"));
    }

    #[test]
    fn test_pack_is_deterministic() {
        let modules = vec![
            record("index.js", "_require_(\"./b.js\");\n", &["b.js"]),
            record("b.js", "exports.b = true;\n", &[]),
        ];
        assert_eq!(
            pack(&modules, &modules[0].key, "_require_"),
            pack(&modules, &modules[0].key, "_require_")
        );
    }

    #[test]
    fn test_js_string_literal_escapes() {
        assert_eq!(js_string_literal("./a.js"), "\"./a.js\"");
        assert_eq!(js_string_literal("./say \"hi\".js"), "\"./say \\\"hi\\\".js\"");
        assert_eq!(js_string_literal("a\\b"), "\"a\\\\b\"");
        assert_eq!(js_string_literal("line\u{2028}sep"), "\"line\\u2028sep\"");
        assert_eq!(js_string_literal("bell\u{7}"), "\"bell\\u0007\"");
    }
}
