//! The module runtime shipped at the top of every bundle
//!
//! The loader keeps a cache keyed by canonical module key. The cache entry is
//! created *before* the module initializer runs, so a circular `require`
//! gets back the partially filled `exports` instead of recursing forever.

/// Name of the table parameter inside the runtime closure
pub(super) const MODULES_PARAM: &str = "__cjspack_modules__";
/// Name of the cache object inside the runtime closure
pub(super) const CACHE_VAR: &str = "__cjspack_cache__";
/// Name of the key parameter of the loader function
pub(super) const KEY_PARAM: &str = "__cjspack_key__";

/// Opening of the runtime closure, up to and including the loader definition
pub(super) fn render_prelude(loader: &str) -> String {
    format!(
        r#";(function ({MODULES_PARAM}) {{
  var {CACHE_VAR} = {{}};
  function {loader}({KEY_PARAM}) {{
    if (Object.prototype.hasOwnProperty.call({CACHE_VAR}, {KEY_PARAM})) {{
      return {CACHE_VAR}[{KEY_PARAM}].exports;
    }}
    if (!Object.prototype.hasOwnProperty.call({MODULES_PARAM}, {KEY_PARAM})) {{
      throw new Error("Cannot find module '" + {KEY_PARAM} + "'");
    }}
    var module = ({CACHE_VAR}[{KEY_PARAM}] = {{ exports: {{}} }});
    {MODULES_PARAM}[{KEY_PARAM}](module, module.exports, {loader});
    return module.exports;
  }}
"#
    )
}

/// Entry invocation and the close of the runtime closure; the module table
/// follows as the closure's argument
pub(super) fn render_entry_call(loader: &str, entry_literal: &str) -> String {
    format!("  return {loader}({entry_literal});\n}})(")
}
