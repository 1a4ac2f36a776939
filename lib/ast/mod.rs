//! The typed AST consumed by code generation.
//!
//! Nodes are immutable and shared through `NodeRef`. The transpiler reuses
//! one node instance for every occurrence of a shared bitvector
//! sub-expression, so `RC::ptr_eq` on two nodes produced by one
//! transpilation is meaningful.

mod node;
mod simplify;

pub use self::node::*;
pub use self::simplify::simplify;
