//! The arena which owns every expression node and root array.

use crate::expr::*;
use crate::Error;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
struct Node {
    expr: Expr,
    width: usize,
}

/// An arena of bitvector expressions.
///
/// Nodes are never removed or mutated once added, so an `ExprRef` stays
/// valid for the lifetime of the pool. Rewriting passes add new nodes and
/// return new handles.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ExprPool {
    nodes: Vec<Node>,
    arrays: Vec<Array>,
}

impl ExprPool {
    pub fn new() -> ExprPool {
        ExprPool::default()
    }

    /// The number of nodes held in this pool.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the node behind a handle.
    ///
    /// Handles are only ever created by this pool, so this indexes directly.
    pub fn get(&self, expr: ExprRef) -> &Expr {
        &self.nodes[expr.index()].expr
    }

    /// Get the bit width of an expression.
    pub fn width(&self, expr: ExprRef) -> usize {
        self.nodes[expr.index()].width
    }

    pub fn array(&self, array: ArrayRef) -> &Array {
        &self.arrays[array.index()]
    }

    /// Add a root array to this pool.
    pub fn add_array(&mut self, array: Array) -> ArrayRef {
        self.arrays.push(array);
        ArrayRef((self.arrays.len() - 1) as u32)
    }

    fn push(&mut self, expr: Expr, width: usize) -> ExprRef {
        self.nodes.push(Node { expr, width });
        ExprRef((self.nodes.len() - 1) as u32)
    }

    /// Add an already-built node, checking it against the widths of its
    /// children.
    ///
    /// This is how rewriting passes rebuild a node after replacing its
    /// children.
    pub fn add(&mut self, expr: Expr, width: usize) -> Result<ExprRef, Error> {
        let expected = match expr {
            Expr::Constant(ref c) => c.bits(),
            Expr::Read { index, .. } => {
                self.check(index)?;
                8
            }
            Expr::Concat(lhs, rhs) => self.width(self.check(lhs)?) + self.width(self.check(rhs)?),
            Expr::Extract {
                expr: inner,
                offset,
                width,
            } => {
                if offset + width > self.width(self.check(inner)?) || width == 0 {
                    return Err(Error::Sort);
                }
                width
            }
            Expr::ZExt(inner) | Expr::SExt(inner) => {
                if self.width(self.check(inner)?) > width {
                    return Err(Error::Sort);
                }
                width
            }
            Expr::Not(inner) => self.width(self.check(inner)?),
            Expr::Binary(_, lhs, rhs) => {
                self.ensure_sort(lhs, rhs)?;
                self.width(lhs)
            }
            Expr::Compare(_, lhs, rhs) => {
                self.ensure_sort(lhs, rhs)?;
                1
            }
            Expr::Select { cond, then, else_ } => {
                if self.width(self.check(cond)?) != 1 {
                    return Err(Error::Sort);
                }
                self.ensure_sort(then, else_)?;
                self.width(then)
            }
        };
        if expected != width {
            return Err(Error::Sort);
        }
        Ok(self.push(expr, width))
    }

    fn check(&self, expr: ExprRef) -> Result<ExprRef, Error> {
        if expr.index() < self.nodes.len() {
            Ok(expr)
        } else {
            Err(Error::InvalidExprRef(expr.index()))
        }
    }

    /// Ensures the bits of both lhs and rhs are the same.
    fn ensure_sort(&self, lhs: ExprRef, rhs: ExprRef) -> Result<(), Error> {
        if self.width(self.check(lhs)?) != self.width(self.check(rhs)?) {
            Err(Error::Sort)
        } else {
            Ok(())
        }
    }

    /// Create a constant expression.
    pub fn constant(&mut self, value: u64, bits: usize) -> ExprRef {
        self.push(Expr::Constant(Constant::new(value, bits)), bits)
    }

    /// Create a constant expression from an existing `Constant`.
    pub fn constant_expr(&mut self, constant: Constant) -> ExprRef {
        let bits = constant.bits();
        self.push(Expr::Constant(constant), bits)
    }

    /// Create a one-byte read of `array` at `index`.
    pub fn read(&mut self, array: ArrayRef, index: ExprRef) -> Result<ExprRef, Error> {
        if array.index() >= self.arrays.len() {
            return Err(Error::Custom(format!("Invalid array reference {}", array.index())));
        }
        self.add(Expr::Read { array, index }, 8)
    }

    /// Create a one-byte read of `array` at a constant 32-bit index.
    pub fn read_at(&mut self, array: ArrayRef, index: u64) -> Result<ExprRef, Error> {
        let index = self.constant(index, 32);
        self.read(array, index)
    }

    /// Create a little-endian read of `bytes` bytes of `array` starting at
    /// `index`, as a right-nested concat with the highest byte leftmost.
    pub fn read_lsb(&mut self, array: ArrayRef, index: u64, bytes: usize) -> Result<ExprRef, Error> {
        if bytes == 0 {
            return Err(Error::Sort);
        }
        let mut result = self.read_at(array, index)?;
        for i in 1..bytes {
            let byte = self.read_at(array, index + i as u64)?;
            result = self.concat(byte, result)?;
        }
        Ok(result)
    }

    /// Create a concatenation, `lhs` becoming the high bits.
    pub fn concat(&mut self, lhs: ExprRef, rhs: ExprRef) -> Result<ExprRef, Error> {
        let width = self.width(self.check(lhs)?) + self.width(self.check(rhs)?);
        self.add(Expr::Concat(lhs, rhs), width)
    }

    /// Create an extraction of `width` bits starting at bit `offset`.
    pub fn extract(&mut self, expr: ExprRef, offset: usize, width: usize) -> Result<ExprRef, Error> {
        self.add(Expr::Extract { expr, offset, width }, width)
    }

    /// Create a zero-extension of `expr` to `width` bits.
    pub fn zext(&mut self, expr: ExprRef, width: usize) -> Result<ExprRef, Error> {
        self.add(Expr::ZExt(expr), width)
    }

    /// Create a sign-extension of `expr` to `width` bits.
    pub fn sext(&mut self, expr: ExprRef, width: usize) -> Result<ExprRef, Error> {
        self.add(Expr::SExt(expr), width)
    }

    pub fn not(&mut self, expr: ExprRef) -> Result<ExprRef, Error> {
        let width = self.width(self.check(expr)?);
        self.add(Expr::Not(expr), width)
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprRef, rhs: ExprRef) -> Result<ExprRef, Error> {
        let width = self.width(self.check(lhs)?);
        self.add(Expr::Binary(op, lhs, rhs), width)
    }

    pub fn compare(&mut self, op: CompareOp, lhs: ExprRef, rhs: ExprRef) -> Result<ExprRef, Error> {
        self.add(Expr::Compare(op, lhs, rhs), 1)
    }

    /// Create an if-then-else expression.
    pub fn select(&mut self, cond: ExprRef, then: ExprRef, else_: ExprRef) -> Result<ExprRef, Error> {
        let width = self.width(self.check(then)?);
        self.add(Expr::Select { cond, then, else_ }, width)
    }

    /// The root array of a `Read` node.
    pub fn read_array(&self, expr: ExprRef) -> Option<&Array> {
        match *self.get(expr) {
            Expr::Read { array, .. } => Some(self.array(array)),
            _ => None,
        }
    }

    /// The index of a `Read` node, if the index is a constant.
    pub fn read_constant_index(&self, expr: ExprRef) -> Option<u64> {
        match *self.get(expr) {
            Expr::Read { index, .. } => self.get(index).constant().and_then(|c| c.value_u64()),
            _ => None,
        }
    }

    /// Returns true if both expressions have the same structure.
    ///
    /// Roots are compared by name, size and constant contents rather than
    /// by handle.
    pub fn structurally_equal(&self, lhs: ExprRef, rhs: ExprRef) -> bool {
        let mut visited = FxHashSet::default();
        self.structurally_equal_(lhs, rhs, &mut visited)
    }

    fn structurally_equal_(
        &self,
        lhs: ExprRef,
        rhs: ExprRef,
        visited: &mut FxHashSet<(ExprRef, ExprRef)>,
    ) -> bool {
        if lhs == rhs || visited.contains(&(lhs, rhs)) {
            return true;
        }
        if self.width(lhs) != self.width(rhs) {
            return false;
        }
        let equal = match (self.get(lhs), self.get(rhs)) {
            (Expr::Constant(l), Expr::Constant(r)) => l == r,
            (
                Expr::Read {
                    array: la,
                    index: li,
                },
                Expr::Read {
                    array: ra,
                    index: ri,
                },
            ) => self.array(*la) == self.array(*ra) && self.structurally_equal_(*li, *ri, visited),
            (
                Expr::Extract {
                    expr: le,
                    offset: lo,
                    ..
                },
                Expr::Extract {
                    expr: re,
                    offset: ro,
                    ..
                },
            ) => lo == ro && self.structurally_equal_(*le, *re, visited),
            (Expr::Binary(lop, _, _), Expr::Binary(rop, _, _)) if lop != rop => false,
            (Expr::Compare(lop, _, _), Expr::Compare(rop, _, _)) if lop != rop => false,
            (l, r) => {
                std::mem::discriminant(l) == std::mem::discriminant(r)
                    && l
                        .children()
                        .into_iter()
                        .zip(r.children())
                        .all(|(lc, rc)| self.structurally_equal_(lc, rc, visited))
            }
        };
        if equal {
            visited.insert((lhs, rhs));
        }
        equal
    }

    /// A displayable view of an expression.
    pub fn display(&self, expr: ExprRef) -> ExprDisplay<'_> {
        ExprDisplay { pool: self, expr }
    }
}

/// Renders an expression in a KLEE-like prefix form.
pub struct ExprDisplay<'p> {
    pool: &'p ExprPool,
    expr: ExprRef,
}

impl<'p> fmt::Display for ExprDisplay<'p> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let pool = self.pool;
        let width = pool.width(self.expr);
        let sub = |expr: ExprRef| ExprDisplay { pool, expr };
        match *pool.get(self.expr) {
            Expr::Constant(ref c) => write!(f, "{}", c),
            Expr::Read { array, index } => {
                write!(f, "(Read w8 {} {})", sub(index), pool.array(array).name())
            }
            Expr::Extract {
                expr,
                offset,
                width,
            } => write!(f, "(Extract w{} {} {})", width, offset, sub(expr)),
            Expr::Select { cond, then, else_ } => write!(
                f,
                "(Select w{} {} {} {})",
                width,
                sub(cond),
                sub(then),
                sub(else_)
            ),
            ref expr => {
                write!(f, "({} w{}", expr.mnemonic(), width)?;
                for child in expr.children() {
                    write!(f, " {}", sub(child))?;
                }
                write!(f, ")")
            }
        }
    }
}
