//! Conversion of bitvector expressions into typed AST.
//!
//! Reads of named roots resolve through a `SymbolTable`, and reads of the
//! packet symbol resolve through a `ChunkTable` to reads of the declared
//! header variables. `diff` walks struct and array layouts to find which
//! parts of a value changed between two states.

mod context;
mod diff;
#[cfg(test)]
mod test;
#[allow(clippy::module_inception)]
mod transpiler;

pub use self::context::{ChunkTable, Environment, SymbolTable};
pub use self::diff::{diff, Assignment, Location, Step};
pub use self::transpiler::{transpile, Transpiler};
