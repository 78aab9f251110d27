//! Module table generation
//!
//! Each module becomes one property of an object literal: the canonical key
//! maps to a function whose body is the module's rewritten source. The
//! function receives exactly `module`, `exports` and the loader.

use crate::types::ModuleRecord;

use super::js_string_literal;

/// Render the `{ "<key>": function (module, exports, <loader>) { ... }, ... }` table
pub(super) fn render_module_table<'a>(
    modules: impl IntoIterator<Item = &'a ModuleRecord>,
    loader: &str,
) -> String {
    let entries: Vec<String> = modules
        .into_iter()
        .map(|record| render_module_entry(record, loader))
        .collect();

    if entries.is_empty() {
        return "{}".to_owned();
    }
    format!("{{\n{}\n}}", entries.join(",\n"))
}

fn render_module_entry(record: &ModuleRecord, loader: &str) -> String {
    // Bodies are inserted verbatim; re-indenting would change template literals
    let body = record.source.trim_end_matches(['\n', '\r']);
    format!(
        "  {}: function (module, exports, {loader}) {{\n{body}\n  }}",
        js_string_literal(record.key.as_str())
    )
}
