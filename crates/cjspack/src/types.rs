//! Shared type definitions for the cjspack crate
//!
//! This module contains common types that are used across multiple components
//! of the bundler, ensuring consistency and avoiding circular dependencies.

use std::{borrow::Borrow, fmt, hash::BuildHasherDefault};

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;

/// Type alias for FxHasher-based IndexMap
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Type alias for FxHasher-based IndexSet
pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

/// Canonical identity of a module inside a bundle.
///
/// A key is the module's path relative to the project root, with forward
/// slashes, an explicit extension and a leading `./`, e.g. `./src/util/math.js`.
/// The runtime loader uses it both as the module table key and as the cache
/// key, so every reference to the same file must produce the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleKey(String);

impl ModuleKey {
    /// Prefix marking a key as root-relative
    pub const PREFIX: &'static str = "./";

    /// Build a key from a root-relative path that already uses `/` separators.
    pub(crate) fn from_relative(relative: &str) -> Self {
        Self(format!("{}{relative}", Self::PREFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key without its `./` prefix, i.e. the plain root-relative path
    pub fn relative_path(&self) -> &str {
        self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModuleKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModuleKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Everything the analyzer learned about one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    /// Canonical key of this module
    pub key: ModuleKey,
    /// Module source after `require` calls were rewritten to the loader
    pub source: String,
    /// Keys of required modules in source order, duplicates included
    pub dependencies: Vec<ModuleKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_relative_path() {
        let key = ModuleKey::from_relative("src/a.js");
        assert_eq!(key.as_str(), "./src/a.js");
        assert_eq!(key.relative_path(), "src/a.js");
        assert_eq!(key.to_string(), "./src/a.js");
    }

    #[test]
    fn test_key_lookup_by_str() {
        let mut keys: FxIndexSet<ModuleKey> = FxIndexSet::default();
        keys.insert(ModuleKey::from_relative("lib/b.js"));
        assert!(keys.contains("./lib/b.js"));
        assert!(!keys.contains("lib/b.js"));
    }
}
