//! Bitvector expression algebra and typed AST transpiler.
//!
//! This crate sits between a symbolic execution engine and a code
//! generator. The engine hands us bitvector expressions built over named
//! symbolic arrays, and we hand back a typed AST where every leaf is a
//! declared program variable or a field of a structured packet chunk.
//!
//! The pieces, leaves first:
//!
//! * [`expr`] holds the bitvector expression arena.
//! * [`executor`] concretely evaluates ground expressions.
//! * [`solver`] is the equivalence/evaluation oracle interface.
//! * [`analysis`] classifies expressions and retrieves their symbols.
//! * [`transformation`] rewrites expressions (extract simplification,
//! renaming, byte swapping, constant folding).
//! * [`types`] and [`ast`] describe the typed output.
//! * [`transpiler`] converts expressions into typed AST, and diffs
//! struct/array typed values.

pub mod analysis;
pub mod ast;
pub mod executor;
pub mod expr;
pub mod names;
pub mod options;
pub mod solver;
#[cfg(test)]
mod tests;
pub mod transformation;
pub mod transpiler;
pub mod types;

#[cfg(not(feature = "thread_safe"))]
use std::rc::Rc;
#[cfg(feature = "thread_safe")]
use std::sync::Arc;

#[cfg(not(feature = "thread_safe"))]
pub type RC<T> = Rc<T>;
#[cfg(feature = "thread_safe")]
pub type RC<T> = Arc<T>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),
    #[error("Expression {0} references more than one symbol, or none")]
    AmbiguousSymbols(String),
    #[error("Extract of {width} bits at offset {offset} straddles a concat boundary")]
    ExtractStraddlesConcat { offset: usize, width: usize },
    #[error("Invalid expression reference {0}")]
    InvalidExprRef(usize),
    #[error("Expression {0} is not constant")]
    NotConstant(String),
    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Sort error, invalid bitness between expressions")]
    Sort,
    #[error("Solver error: {0}")]
    Solver(String),
    #[error("Read of symbolic byte {index} of {array}")]
    SymbolicRead { array: String, index: String },
    #[error("Width of {0} bits exceeds 64 bits")]
    TooWide(usize),
    #[error("Offset {0} is not byte aligned")]
    Unaligned(usize),
    #[error("Symbol {name} could not be resolved, context: {context}")]
    UnresolvedSymbol { name: String, context: String },
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("{0}")]
    Custom(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Error {
        Error::Custom(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
