//! Error type shared by every stage of the bundling pipeline

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::types::ModuleKey;

/// Every way a bundle build can fail.
///
/// None of these are recovered from: the first error aborts the build before
/// anything is written.
#[derive(Debug, Error)]
pub enum BundleError {
    /// A module file is missing or unreadable
    #[error("failed to read module {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The module source is not valid JavaScript
    #[error("failed to parse {module} at {line}:{column}: {message}")]
    Parse {
        module: ModuleKey,
        line: usize,
        column: usize,
        message: String,
    },

    /// A `require` call the bundler cannot statically follow
    #[error("unsupported require in {module} at line {line}: {message}")]
    UnsupportedSyntax {
        module: ModuleKey,
        line: usize,
        message: String,
    },

    /// A specifier that has no canonical key under the project root
    #[error("cannot resolve '{specifier}' from {}: {reason}", base.display())]
    Resolution {
        specifier: String,
        base: PathBuf,
        reason: String,
    },

    /// The rewritten module could not be turned back into source text
    #[error("failed to generate code for {module}: {message}")]
    Codegen { module: ModuleKey, message: String },

    /// The bundle could not be written
    #[error("failed to write bundle to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BundleError {
    /// Whether this error comes from the source text itself rather than the filesystem
    pub fn is_syntax_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::UnsupportedSyntax { .. })
    }
}
