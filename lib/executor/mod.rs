//! Concrete execution over bitvector expressions.
//!
//! An expression is ground when every `Read` it contains hits an array with
//! constant contents at a constant index. Ground expressions evaluate to a
//! single `Constant`.

mod eval;

pub use self::eval::eval;
