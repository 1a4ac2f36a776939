//! Classification of bitvector expressions and retrieval of their symbols.
//!
//! Every other part of this crate queries these. Nothing here rewrites an
//! expression; the only side effects are oracle queries, and the constants
//! `is_constant` adds to the pool to pose them.

mod classify;
mod symbols;

pub use self::classify::*;
pub use self::symbols::*;
