//! cjspack bundles a graph of CommonJS modules into one self-contained script.
//!
//! The pipeline is [`graph_builder::GraphBuilder`] (which runs the
//! [`analyzer::ModuleAnalyzer`] on every reachable module) followed by
//! [`code_generator::pack`]. [`orchestrator::BundleOrchestrator`] wires the
//! two together and writes the result.

pub mod analyzer;
pub mod code_generator;
pub mod config;
pub mod dirs;
pub mod error;
pub mod graph_builder;
pub mod orchestrator;
pub mod resolver;
pub mod types;
pub mod visitors;

pub use error::BundleError;
pub use types::{ModuleKey, ModuleRecord};
