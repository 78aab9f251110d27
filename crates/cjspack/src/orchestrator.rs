use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use tempfile::NamedTempFile;

use crate::{
    code_generator::pack,
    config::Config,
    error::BundleError,
    graph_builder::{DependencyGraph, GraphBuilder},
};

/// Drives a whole build: graph discovery, packing and writing the bundle
#[derive(Debug, Clone)]
pub struct BundleOrchestrator {
    config: Config,
}

impl BundleOrchestrator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Discover the module graph starting at `entry`
    pub fn build_graph(&self, entry: &Path) -> Result<DependencyGraph> {
        let builder = GraphBuilder::new(&self.config)?;
        let graph = builder.build(entry).with_context(|| {
            format!("Failed to build dependency graph from {}", entry.display())
        })?;

        for group in graph.circular_groups() {
            let chain: Vec<&str> = group.iter().map(AsRef::as_ref).collect();
            warn!(
                "Circular require between {}; modules in the cycle may observe partially \
                 initialized exports",
                chain.join(" -> ")
            );
        }
        Ok(graph)
    }

    /// Build the bundle for `entry` without writing it anywhere
    pub fn bundle_to_string(&self, entry: &Path) -> Result<String> {
        let graph = self.build_graph(entry)?;
        Ok(pack(
            graph.modules(),
            graph.entry(),
            &self.config.loader_symbol,
        ))
    }

    /// Build the bundle for `entry` and replace `output` with it.
    ///
    /// The output is only touched once the whole bundle has been generated.
    pub fn bundle(&self, entry: &Path, output: &Path) -> Result<()> {
        info!("Bundling {} into {}", entry.display(), output.display());
        let bundle = self.bundle_to_string(entry)?;
        write_bundle(output, &bundle)?;
        info!("Wrote {} bytes to {}", bundle.len(), output.display());
        Ok(())
    }
}

/// Write through a temporary file in the target directory, then rename over
/// `output`, so readers never observe a half-written bundle.
fn write_bundle(output: &Path, contents: &str) -> Result<(), BundleError> {
    let write_error = |source| BundleError::Write {
        path: output.to_path_buf(),
        source,
    };

    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(write_error)?;

    let mut file = NamedTempFile::new_in(&parent).map_err(write_error)?;
    debug!("Staging bundle in {}", file.path().display());
    file.write_all(contents.as_bytes()).map_err(write_error)?;
    file.as_file()
        .set_permissions(output_permissions(output, file.as_file())?)
        .map_err(write_error)?;
    file.persist(output).map_err(|err| write_error(err.error))?;
    Ok(())
}

/// Permissions for the replaced output: the existing file's, otherwise the
/// usual mode for a newly created file rather than the staging file's 0600.
fn output_permissions(output: &Path, staged: &fs::File) -> Result<fs::Permissions, BundleError> {
    if let Ok(metadata) = fs::metadata(output) {
        return Ok(metadata.permissions());
    }
    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut permissions = staged
        .metadata()
        .map_err(|source| BundleError::Write {
            path: output.to_path_buf(),
            source,
        })?
        .permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(DEFAULT_OUTPUT_MODE);
    }
    Ok(permissions)
}

#[cfg(unix)]
const DEFAULT_OUTPUT_MODE: u32 = 0o644;
