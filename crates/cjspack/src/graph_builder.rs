//! Graph builder that discovers every module reachable from the entry
//! This module bridges the per-file analyzer and the packer
use std::path::Path;

use log::{debug, info};
use petgraph::{
    algo::{is_cyclic_directed, tarjan_scc},
    graph::{DiGraph, NodeIndex},
};

use crate::{
    analyzer::ModuleAnalyzer,
    config::Config,
    error::BundleError,
    types::{FxIndexMap, ModuleKey, ModuleRecord},
};

/// All modules of one bundle, keyed by canonical key in discovery order
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    entry: ModuleKey,
    modules: FxIndexMap<ModuleKey, ModuleRecord>,
}

impl DependencyGraph {
    pub fn entry(&self) -> &ModuleKey {
        &self.entry
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ModuleRecord> {
        self.modules.get(key)
    }

    /// Records in discovery order; the entry comes first
    pub fn modules(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ModuleKey> {
        self.modules.keys()
    }

    /// Whether any chain of `require` calls leads back to where it started
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.to_petgraph())
    }

    /// Groups of modules that require each other, directly or transitively
    ///
    /// Each group lists its keys in discovery order. Single modules only
    /// appear when they require themselves.
    pub fn circular_groups(&self) -> Vec<Vec<ModuleKey>> {
        let graph = self.to_petgraph();
        let mut groups: Vec<Vec<ModuleKey>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&node| graph.contains_edge(node, node))
            })
            .map(|mut component| {
                component.sort_unstable();
                component
                    .into_iter()
                    .map(|node| graph[node].clone())
                    .collect()
            })
            .collect();
        groups.sort_by_key(|group| group.first().and_then(|key| self.modules.get_index_of(key)));
        groups
    }

    fn to_petgraph(&self) -> DiGraph<ModuleKey, ()> {
        let mut graph = DiGraph::with_capacity(self.modules.len(), 0);
        for key in self.modules.keys() {
            graph.add_node(key.clone());
        }
        for (index, record) in self.modules.values().enumerate() {
            for dependency in &record.dependencies {
                if let Some(target) = self.modules.get_index_of(dependency) {
                    graph.update_edge(NodeIndex::new(index), NodeIndex::new(target), ());
                }
            }
        }
        graph
    }
}

/// Builds a [`DependencyGraph`] by breadth-first discovery from an entry module
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    analyzer: ModuleAnalyzer,
}

impl GraphBuilder {
    pub fn new(config: &Config) -> Result<Self, BundleError> {
        Ok(Self {
            analyzer: ModuleAnalyzer::new(config)?,
        })
    }

    pub fn analyzer(&self) -> &ModuleAnalyzer {
        &self.analyzer
    }

    /// Analyze `entry` and every module reachable from it, each exactly once
    pub fn build(&self, entry: &Path) -> Result<DependencyGraph, BundleError> {
        let entry_record = self.analyzer.analyze(entry)?;
        let entry_key = entry_record.key.clone();
        debug!("Building dependency graph from {entry_key}");

        let mut modules = FxIndexMap::default();
        modules.insert(entry_key.clone(), entry_record);

        // The map doubles as the work queue: records are visited in insertion
        // order and a key is inserted the moment it is first scheduled.
        let mut cursor = 0;
        while cursor < modules.len() {
            let pending: Vec<ModuleKey> = modules[cursor].dependencies.clone();
            for key in pending {
                if modules.contains_key(&key) {
                    continue;
                }
                let record = self.analyzer.analyze_key(&key)?;
                modules.insert(key, record);
            }
            cursor += 1;
        }

        info!(
            "Discovered {} module(s) reachable from {entry_key}",
            modules.len()
        );
        Ok(DependencyGraph {
            entry: entry_key,
            modules,
        })
    }
}
