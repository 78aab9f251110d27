use std::path::{Component, Path, PathBuf};

use cow_utils::CowUtils;
use log::trace;

use crate::{config::Config, error::BundleError, types::ModuleKey};

/// Turns file references into canonical module keys and back.
///
/// Resolution is purely lexical, like `path.resolve` in Node: `.` and `..`
/// are collapsed without touching the filesystem, so a key can be computed
/// for a file before anyone checks that it exists.
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    /// Absolute, normalized project root
    root: PathBuf,
    /// Default extension without the leading dot
    extension: String,
}

impl ModuleResolver {
    pub fn new(config: &Config) -> Result<Self, BundleError> {
        let root = std::path::absolute(&config.root).map_err(|err| BundleError::Resolution {
            specifier: config.root.display().to_string(),
            base: PathBuf::new(),
            reason: format!("cannot make project root absolute: {err}"),
        })?;
        Ok(Self {
            root: normalize_path(&root),
            extension: config.extension.clone(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `specifier` against `base_dir` into a canonical key.
    ///
    /// A relative `base_dir` is taken relative to the project root.
    pub fn resolve(&self, base_dir: &Path, specifier: &str) -> Result<ModuleKey, BundleError> {
        let target = if Path::new(specifier).extension().is_some() {
            PathBuf::from(specifier)
        } else {
            PathBuf::from(format!("{specifier}.{}", self.extension))
        };

        let absolute = normalize_path(&self.root.join(base_dir).join(target));
        let relative = absolute
            .strip_prefix(&self.root)
            .map_err(|_| self.resolution_error(base_dir, specifier, "outside of the project root"))?;
        let relative = relative
            .to_str()
            .ok_or_else(|| self.resolution_error(base_dir, specifier, "path is not valid UTF-8"))?;
        if relative.is_empty() {
            return Err(self.resolution_error(base_dir, specifier, "resolves to the project root"));
        }

        let key = ModuleKey::from_relative(&relative.cow_replace('\\', "/"));
        trace!("Resolved '{specifier}' from {} to {key}", base_dir.display());
        Ok(key)
    }

    /// Resolve a path given on the command line or found in the module graph.
    pub fn resolve_path(&self, path: &Path) -> Result<ModuleKey, BundleError> {
        let specifier = path.to_str().ok_or_else(|| BundleError::Resolution {
            specifier: path.display().to_string(),
            base: self.root.clone(),
            reason: "path is not valid UTF-8".to_owned(),
        })?;
        self.resolve(&self.root, specifier)
    }

    /// Filesystem location of the module identified by `key`
    pub fn key_to_path(&self, key: &ModuleKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Directory that the module's own specifiers are resolved against
    pub fn key_dir(&self, key: &ModuleKey) -> PathBuf {
        let path = self.key_to_path(key);
        path.parent().map_or_else(|| self.root.clone(), Path::to_path_buf)
    }

    fn resolution_error(&self, base_dir: &Path, specifier: &str, reason: &str) -> BundleError {
        BundleError::Resolution {
            specifier: specifier.to_owned(),
            base: self.root.join(base_dir),
            reason: reason.to_owned(),
        }
    }
}

/// Collapse `.` and `..` components without consulting the filesystem.
///
/// `..` at the filesystem root stays at the root.
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() && !normalized.has_root() {
                    normalized.push(component.as_os_str());
                }
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}
