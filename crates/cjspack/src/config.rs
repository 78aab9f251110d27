//! Layered configuration
//!
//! Values are applied lowest to highest precedence: built-in defaults, the
//! user config file, the project config file (or an explicit `--config`
//! path), `CJSPACK_*` environment variables, and finally CLI arguments which
//! the binary writes straight into the resulting [`Config`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use serde::Deserialize;

use crate::dirs;

/// Identifier that module sources use to load dependencies
pub const REQUIRE_IDENT: &str = "require";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Project root; every module key is relative to it
    pub root: PathBuf,
    /// Entry module used when none is given on the command line
    pub entry: PathBuf,
    /// Bundle path used when none is given on the command line
    pub output: PathBuf,
    /// Extension appended to specifiers that have none, without the dot
    pub extension: String,
    /// Identifier that replaces `require` inside bundled modules
    pub loader_symbol: String,
    /// Keep comments in emitted module bodies
    pub preserve_comments: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            entry: PathBuf::from("./src/index.js"),
            output: PathBuf::from("./dist/index.js"),
            extension: "js".to_owned(),
            loader_symbol: "_require_".to_owned(),
            preserve_comments: true,
        }
    }
}

/// On-disk shape of `cjspack.toml`; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigFile {
    root: Option<PathBuf>,
    entry: Option<PathBuf>,
    output: Option<PathBuf>,
    extension: Option<String>,
    loader_symbol: Option<String>,
    preserve_comments: Option<bool>,
}

impl Config {
    /// Load configuration from the user config, then either `config_path` or
    /// `./cjspack.toml`, then the environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let user_file = dirs::user_config_file();
        let project_file = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(dirs::CONFIG_FILE_NAME));

        let mut config = Self::default();
        if let Some(user_file) = user_file.filter(|path| path.is_file()) {
            config.merge_file(&user_file)?;
        }
        if config_path.is_some() || project_file.is_file() {
            config.merge_file(&project_file)?;
        }
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay the keys present in a TOML file onto this config
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        self.merge_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(())
    }

    /// Overlay the keys present in a TOML document onto this config
    pub fn merge_str(&mut self, text: &str) -> Result<()> {
        let file: ConfigFile = toml::from_str(text)?;
        if let Some(root) = file.root {
            self.root = root;
        }
        if let Some(entry) = file.entry {
            self.entry = entry;
        }
        if let Some(output) = file.output {
            self.output = output;
        }
        if let Some(extension) = file.extension {
            self.extension = extension;
        }
        if let Some(loader_symbol) = file.loader_symbol {
            self.loader_symbol = loader_symbol;
        }
        if let Some(preserve_comments) = file.preserve_comments {
            self.preserve_comments = preserve_comments;
        }
        Ok(())
    }

    /// Apply `CJSPACK_*` overrides, reading variables through `lookup`
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(extension) = lookup("CJSPACK_EXTENSION") {
            self.extension = extension;
        }
        if let Some(loader_symbol) = lookup("CJSPACK_LOADER_SYMBOL") {
            self.loader_symbol = loader_symbol;
        }
        if let Some(value) = lookup("CJSPACK_PRESERVE_COMMENTS") {
            self.preserve_comments = parse_bool(&value)
                .ok_or_else(|| anyhow!("CJSPACK_PRESERVE_COMMENTS must be a boolean, got '{value}'"))?;
        }
        Ok(())
    }

    /// Normalize and check values that the pipeline relies on
    pub fn validate(&mut self) -> Result<()> {
        if let Some(stripped) = self.extension.strip_prefix('.') {
            self.extension = stripped.to_owned();
        }
        if self.extension.is_empty() {
            bail!("extension must not be empty");
        }
        if !is_js_identifier(&self.loader_symbol) {
            bail!(
                "loader-symbol '{}' is not a valid JavaScript identifier",
                self.loader_symbol
            );
        }
        if matches!(
            self.loader_symbol.as_str(),
            REQUIRE_IDENT | "module" | "exports"
        ) {
            bail!(
                "loader-symbol '{}' would clash with a module binding",
                self.loader_symbol
            );
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// ASCII-only identifier check; the loader symbol is emitted verbatim
fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
