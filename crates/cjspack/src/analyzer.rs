//! Module analysis: read one module, rewrite its `require` calls and collect
//! the canonical keys it depends on.

use std::{fs, path::Path};

use log::debug;
use swc_core::{
    common::{
        FileName, SourceMap, Spanned,
        comments::{Comments, SingleThreadedComments},
        sync::Lrc,
    },
    ecma::{
        ast::{EsVersion, Script},
        codegen::{Config as CodegenConfig, Emitter, text_writer::JsWriter},
        parser::{Syntax, error::Error as ParseError, parse_file_as_script},
    },
};

use crate::{
    config::Config,
    error::BundleError,
    resolver::ModuleResolver,
    types::{ModuleKey, ModuleRecord},
    visitors::{RequireRewriter, rewrite_requires},
};

/// Produces a [`ModuleRecord`] for each module file
#[derive(Debug, Clone)]
pub struct ModuleAnalyzer {
    resolver: ModuleResolver,
    loader_symbol: String,
    preserve_comments: bool,
}

impl ModuleAnalyzer {
    pub fn new(config: &Config) -> Result<Self, BundleError> {
        Ok(Self {
            resolver: ModuleResolver::new(config)?,
            loader_symbol: config.loader_symbol.clone(),
            preserve_comments: config.preserve_comments,
        })
    }

    pub fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }

    /// Analyze the module at `file_path` (absolute, or relative to the project root)
    pub fn analyze(&self, file_path: &Path) -> Result<ModuleRecord, BundleError> {
        let key = self.resolver.resolve_path(file_path)?;
        self.analyze_key(&key)
    }

    /// Analyze the module identified by an already canonical key
    pub fn analyze_key(&self, key: &ModuleKey) -> Result<ModuleRecord, BundleError> {
        let path = self.resolver.key_to_path(key);
        let source = fs::read_to_string(&path).map_err(|source| BundleError::Read {
            path: path.clone(),
            source,
        })?;
        debug!("Analyzing {key} ({} bytes)", source.len());
        self.analyze_source(key, source)
    }

    /// Analyze module source that has already been read
    pub fn analyze_source(
        &self,
        key: &ModuleKey,
        source: String,
    ) -> Result<ModuleRecord, BundleError> {
        let cm: Lrc<SourceMap> = Lrc::new(SourceMap::default());
        let comments = SingleThreadedComments::default();
        let comment_store: &dyn Comments = &comments;
        let comments = self.preserve_comments.then_some(comment_store);

        let mut script = parse_script(&cm, key, source, comments)?;
        // A hashbang is only valid on the first line of a file, never inside the module table
        if script.shebang.take().is_some() {
            debug!("{key}: dropping hashbang line");
        }
        let base_dir = self.resolver.key_dir(key);
        let rewriter =
            RequireRewriter::new(&self.resolver, key, &base_dir, &self.loader_symbol, &cm);
        let (script, dependencies) = rewrite_requires(script, rewriter)?;
        let source = emit_script(&cm, key, &script, comments)?;

        debug!("{key} depends on {} module(s)", dependencies.len());
        Ok(ModuleRecord {
            key: key.clone(),
            source,
            dependencies,
        })
    }
}

/// Parse module source as a classic (non-ESM) script.
///
/// Errors the parser recovered from still fail the module.
pub(crate) fn parse_script(
    cm: &Lrc<SourceMap>,
    key: &ModuleKey,
    source: String,
    comments: Option<&dyn Comments>,
) -> Result<Script, BundleError> {
    let file = cm.new_source_file(FileName::Custom(key.to_string()).into(), source);
    let mut recovered = Vec::new();
    let script = parse_file_as_script(
        &file,
        Syntax::Es(Default::default()),
        EsVersion::EsNext,
        comments,
        &mut recovered,
    )
    .map_err(|err| parse_error(cm, key, &err))?;

    match recovered.first() {
        Some(err) => Err(parse_error(cm, key, err)),
        None => Ok(script),
    }
}

/// Print a script back to JavaScript source
pub(crate) fn emit_script(
    cm: &Lrc<SourceMap>,
    key: &ModuleKey,
    script: &Script,
    comments: Option<&dyn Comments>,
) -> Result<String, BundleError> {
    let mut buf = Vec::new();
    {
        let mut emitter = Emitter {
            cfg: CodegenConfig::default(),
            cm: cm.clone(),
            comments,
            wr: JsWriter::new(cm.clone(), "\n", &mut buf, None),
        };
        emitter
            .emit_script(script)
            .map_err(|err| BundleError::Codegen {
                module: key.clone(),
                message: err.to_string(),
            })?;
    }
    String::from_utf8(buf).map_err(|err| BundleError::Codegen {
        module: key.clone(),
        message: err.to_string(),
    })
}

fn parse_error(cm: &SourceMap, key: &ModuleKey, err: &ParseError) -> BundleError {
    let loc = cm.lookup_char_pos(err.span().lo);
    BundleError::Parse {
        module: key.clone(),
        line: loc.line,
        column: loc.col_display + 1,
        message: err.kind().msg().into_owned(),
    }
}
