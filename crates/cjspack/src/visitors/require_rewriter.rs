//! Rewrites `require("specifier")` calls into loader calls on canonical keys.

use std::path::Path;

use log::trace;
use swc_core::{
    common::{SourceMap, Span},
    ecma::{
        ast::{CallExpr, Callee, Expr, ExprOrSpread, Lit, Script},
        visit::{VisitMut, VisitMutWith},
    },
};

use crate::{
    code_generator::js_string_literal, config::REQUIRE_IDENT, error::BundleError,
    resolver::ModuleResolver, types::ModuleKey,
};

/// Rewrite every `require` call of a parsed module.
///
/// Takes the script by value and hands back the rewritten copy together with
/// the keys it now depends on, in source order (duplicates kept).
pub fn rewrite_requires(
    mut script: Script,
    mut rewriter: RequireRewriter<'_>,
) -> Result<(Script, Vec<ModuleKey>), BundleError> {
    script.visit_mut_with(&mut rewriter);
    match rewriter.error {
        Some(err) => Err(err),
        None => Ok((script, rewriter.dependencies)),
    }
}

/// Visitor state for a single module
pub struct RequireRewriter<'a> {
    resolver: &'a ModuleResolver,
    /// Module being rewritten, for error reporting
    module: &'a ModuleKey,
    /// Directory that relative specifiers start from
    base_dir: &'a Path,
    loader_symbol: &'a str,
    source_map: &'a SourceMap,
    dependencies: Vec<ModuleKey>,
    /// First failure; the walk stops rewriting once set
    error: Option<BundleError>,
}

impl std::fmt::Debug for RequireRewriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequireRewriter")
            .field("module", &self.module)
            .field("base_dir", &self.base_dir)
            .field("loader_symbol", &self.loader_symbol)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

impl<'a> RequireRewriter<'a> {
    pub fn new(
        resolver: &'a ModuleResolver,
        module: &'a ModuleKey,
        base_dir: &'a Path,
        loader_symbol: &'a str,
        source_map: &'a SourceMap,
    ) -> Self {
        Self {
            resolver,
            module,
            base_dir,
            loader_symbol,
            source_map,
            dependencies: Vec::new(),
            error: None,
        }
    }

    fn rewrite_call(&mut self, call: &mut CallExpr) -> Result<(), BundleError> {
        let literal = match call.args.first_mut() {
            Some(ExprOrSpread { spread: None, expr }) => match &mut **expr {
                Expr::Lit(Lit::Str(literal)) => literal,
                _ => {
                    return Err(self.unsupported(call.span, "argument must be a string literal"));
                }
            },
            Some(ExprOrSpread { spread: Some(_), .. }) => {
                return Err(self.unsupported(call.span, "spread argument is not supported"));
            }
            None => return Err(self.unsupported(call.span, "missing module specifier")),
        };

        let key = self.resolver.resolve(self.base_dir, &literal.value)?;
        trace!("{}: require('{}') -> {key}", self.module, &*literal.value);
        literal.value = key.as_str().into();
        literal.raw = Some(js_string_literal(key.as_str()).into());

        if let Callee::Expr(callee) = &mut call.callee
            && let Expr::Ident(ident) = &mut **callee
        {
            ident.sym = self.loader_symbol.into();
        }
        self.dependencies.push(key);
        Ok(())
    }

    fn unsupported(&self, span: Span, message: &str) -> BundleError {
        BundleError::UnsupportedSyntax {
            module: self.module.clone(),
            line: self.source_map.lookup_char_pos(span.lo).line,
            message: message.to_owned(),
        }
    }
}

impl VisitMut for RequireRewriter<'_> {
    fn visit_mut_call_expr(&mut self, call: &mut CallExpr) {
        if self.error.is_some() {
            return;
        }
        // Pre-order, so nested requires are recorded after the enclosing one
        if is_require_call(call) {
            if let Err(err) = self.rewrite_call(call) {
                self.error = Some(err);
                return;
            }
        }
        call.visit_mut_children_with(self);
    }
}

fn is_require_call(call: &CallExpr) -> bool {
    match &call.callee {
        Callee::Expr(callee) => {
            matches!(&**callee, Expr::Ident(ident) if &*ident.sym == REQUIRE_IDENT)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use swc_core::common::sync::Lrc;
    use tempfile::TempDir;

    use super::*;
    use crate::{
        analyzer::{emit_script, parse_script},
        config::Config,
    };

    struct Fixture {
        _temp_dir: TempDir,
        resolver: ModuleResolver,
    }

    impl Fixture {
        fn new() -> Self {
            let temp_dir = TempDir::new().expect("temp dir");
            let config = Config {
                root: temp_dir.path().to_path_buf(),
                ..Default::default()
            };
            let resolver = ModuleResolver::new(&config).expect("resolver");
            Self {
                _temp_dir: temp_dir,
                resolver,
            }
        }

        fn rewrite(&self, key: &str, source: &str) -> Result<(String, Vec<String>), BundleError> {
            let key = self.resolver.resolve_path(Path::new(key))?;
            let cm: Lrc<SourceMap> = Lrc::new(SourceMap::default());
            let script = parse_script(&cm, &key, source.to_owned(), None)?;
            let base_dir = self.resolver.key_dir(&key);
            let rewriter = RequireRewriter::new(&self.resolver, &key, &base_dir, "_require_", &cm);
            let (script, dependencies) = rewrite_requires(script, rewriter)?;
            let code = emit_script(&cm, &key, &script, None)?;
            Ok((
                code,
                dependencies.iter().map(ToString::to_string).collect(),
            ))
        }
    }

    #[test]
    fn test_rewrites_callee_and_specifier() -> Result<(), BundleError> {
        let fixture = Fixture::new();
        let (code, deps) = fixture.rewrite(
            "src/index.js",
            "const a = require('./a');\nconst b = require(\"../lib/b.js\");\n",
        )?;

        assert_eq!(deps, vec!["./src/a.js", "./lib/b.js"]);
        assert!(code.contains(r#"_require_("./src/a.js")"#), "{code}");
        assert!(code.contains(r#"_require_("./lib/b.js")"#), "{code}");
        assert!(!code.contains("require("), "{code}");
        Ok(())
    }

    #[test]
    fn test_duplicates_and_order_are_kept() -> Result<(), BundleError> {
        let fixture = Fixture::new();
        let (_, deps) = fixture.rewrite(
            "main.js",
            "require('./b');\nfunction later() { return require('./a'); }\nrequire('./b.js');\n",
        )?;

        assert_eq!(deps, vec!["./b.js", "./a.js", "./b.js"]);
        Ok(())
    }

    #[test]
    fn test_nested_require_calls() -> Result<(), BundleError> {
        let fixture = Fixture::new();
        let (code, deps) = fixture.rewrite(
            "main.js",
            "const x = require('./outer').wrap(require('./inner'));\n",
        )?;

        assert_eq!(deps, vec!["./outer.js", "./inner.js"]);
        assert!(!code.contains("require("), "{code}");
        Ok(())
    }

    #[test]
    fn test_other_calls_are_untouched() -> Result<(), BundleError> {
        let fixture = Fixture::new();
        let (code, deps) = fixture.rewrite(
            "main.js",
            "loader.require('./x');\nconsole.log('./y');\n",
        )?;

        assert!(deps.is_empty());
        assert!(code.contains("loader.require("), "{code}");
        Ok(())
    }

    #[test]
    fn test_non_literal_argument_is_rejected() {
        let fixture = Fixture::new();
        let err = fixture
            .rewrite("main.js", "const name = './a';\n\nrequire(name);\n")
            .expect_err("computed specifier");

        match err {
            BundleError::UnsupportedSyntax { module, line, .. } => {
                assert_eq!(module.as_str(), "./main.js");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_argument_is_rejected() {
        let fixture = Fixture::new();
        let err = fixture
            .rewrite("main.js", "require();\n")
            .expect_err("no specifier");
        assert!(err.is_syntax_error());
    }

    #[test]
    fn test_specifier_outside_root_is_rejected() {
        let fixture = Fixture::new();
        let err = fixture
            .rewrite("main.js", "require('../../escape');\n")
            .expect_err("outside root");
        assert!(matches!(err, BundleError::Resolution { .. }));
    }
}
