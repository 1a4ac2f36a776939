//! Bitvector expressions, as produced by symbolic execution.
//!
//! # An Introduction
//!
//! A bitvector expression is a fixed-width symbolic value built from
//! constants, one-byte reads of named symbolic arrays, and bit/arithmetic
//! operators. Symbolic execution shares sub-expressions freely, so the
//! expressions here form a directed acyclic graph.
//!
//! All nodes live in an `ExprPool`, and are referred to through `ExprRef`
//! handles. A handle is an identity: every rewriting pass in this crate keys
//! its memoization on handles, so a shared sub-expression is visited once
//! and rewritten to one shared replacement.
//!
//! ## Components
//!
//! * `Constant`: a value of arbitrary width.
//! * `Array`: a named root symbol, optionally with constant contents.
//! * `Expr`: the node kinds, `Constant`, `Read`, `Concat`, `Extract`,
//! `ZExt`, `SExt`, `Not`, `Binary`, `Compare` and `Select`.
//! * `ExprPool`: the arena, with width-checked constructors.
//!
//! It is an error to create an expression which operates over expressions of
//! differing bitness. This is checked when nodes are added to the pool, and a
//! `Sort` error is emitted on violation.

mod array;
mod constant;
mod expression;
mod pool;

pub use self::array::*;
pub use self::constant::*;
pub use self::expression::*;
pub use self::pool::*;

