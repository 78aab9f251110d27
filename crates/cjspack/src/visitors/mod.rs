//! AST visitor implementations for cjspack
//!
//! Visitors walk swc's JavaScript AST to find and rewrite the calls that
//! introduce dependencies between modules.

mod require_rewriter;

pub use require_rewriter::{RequireRewriter, rewrite_requires};
