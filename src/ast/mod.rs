//! AST module
//!
//! Re-exports the AST node types.

pub mod types;

pub use types::*;
