//! Rewriting passes over bitvector expressions.
//!
//! Passes never mutate existing nodes. They add rewritten nodes to the pool
//! and return new handles, or the original handle when nothing changed.

mod endian;
mod fold;
mod rename;
mod rewrite;
mod simplify_extract;

pub use self::endian::{swap_endianness, EndiannessSwapper};
pub use self::fold::fold_constants;
pub use self::rename::{rename, Renamer};
pub use self::rewrite::{rewrite, RewriteCache};
pub use self::simplify_extract::simplify_extract;
