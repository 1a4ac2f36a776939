//! Rendering of bitvector expressions as SMT-LIB2.
//!
//! Every node becomes one `define-fun`, so shared sub-expressions are
//! rendered once no matter how often they are referenced.

use crate::expr::{Array, BinaryOp, CompareOp, Expr, ExprPool, ExprRef};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

/// Width of the index sort of every declared array.
pub const INDEX_BITS: usize = 32;

/// The SMT-LIB2 name of a node's definition.
pub fn node_name(expr: ExprRef) -> String {
    format!("e{}", expr.index())
}

/// The SMT-LIB2 name of a root array.
pub fn array_name(array: &Array) -> String {
    format!("|{}|", array.name())
}

fn index_to_smtlib2(pool: &ExprPool, index: ExprRef) -> String {
    let bits = pool.width(index);
    let name = node_name(index);
    if bits < INDEX_BITS {
        format!("((_ zero_extend {}) {})", INDEX_BITS - bits, name)
    } else if bits > INDEX_BITS {
        format!("((_ extract {} 0) {})", INDEX_BITS - 1, name)
    } else {
        name
    }
}

/// Render the body of a single node, referring to its children by name.
pub fn expr_to_smtlib2(pool: &ExprPool, expr: ExprRef) -> String {
    let width = pool.width(expr);
    match *pool.get(expr) {
        Expr::Constant(ref c) => format!("(_ bv{} {})", c.value(), c.bits()),
        Expr::Read { array, index } => format!(
            "(select {} {})",
            array_name(pool.array(array)),
            index_to_smtlib2(pool, index)
        ),
        Expr::Concat(lhs, rhs) => format!("(concat {} {})", node_name(lhs), node_name(rhs)),
        Expr::Extract {
            expr: inner,
            offset,
            width,
        } => format!(
            "((_ extract {} {}) {})",
            offset + width - 1,
            offset,
            node_name(inner)
        ),
        Expr::ZExt(inner) => format!(
            "((_ zero_extend {}) {})",
            width - pool.width(inner),
            node_name(inner)
        ),
        Expr::SExt(inner) => format!(
            "((_ sign_extend {}) {})",
            width - pool.width(inner),
            node_name(inner)
        ),
        Expr::Not(inner) => format!("(bvnot {})", node_name(inner)),
        Expr::Binary(op, lhs, rhs) => {
            let op = match op {
                BinaryOp::Add => "bvadd",
                BinaryOp::Sub => "bvsub",
                BinaryOp::Mul => "bvmul",
                BinaryOp::UDiv => "bvudiv",
                BinaryOp::SDiv => "bvsdiv",
                BinaryOp::URem => "bvurem",
                BinaryOp::SRem => "bvsrem",
                BinaryOp::And => "bvand",
                BinaryOp::Or => "bvor",
                BinaryOp::Xor => "bvxor",
                BinaryOp::Shl => "bvshl",
                BinaryOp::LShr => "bvlshr",
                BinaryOp::AShr => "bvashr",
            };
            format!("({} {} {})", op, node_name(lhs), node_name(rhs))
        }
        Expr::Compare(op, lhs, rhs) => {
            let op = match op {
                CompareOp::Eq => "=",
                CompareOp::Ne => "distinct",
                CompareOp::Ult => "bvult",
                CompareOp::Ule => "bvule",
                CompareOp::Ugt => "bvugt",
                CompareOp::Uge => "bvuge",
                CompareOp::Slt => "bvslt",
                CompareOp::Sle => "bvsle",
                CompareOp::Sgt => "bvsgt",
                CompareOp::Sge => "bvsge",
            };
            format!(
                "(ite ({} {} {}) #b1 #b0)",
                op,
                node_name(lhs),
                node_name(rhs)
            )
        }
        Expr::Select { cond, then, else_ } => format!(
            "(ite (= {} #b1) {} {})",
            node_name(cond),
            node_name(then),
            node_name(else_)
        ),
    }
}

fn collect(
    pool: &ExprPool,
    expr: ExprRef,
    visited: &mut FxHashSet<ExprRef>,
    order: &mut Vec<ExprRef>,
) {
    if !visited.insert(expr) {
        return;
    }
    for child in pool.get(expr).children() {
        collect(pool, child, visited, order);
    }
    order.push(expr);
}

/// Declarations for every array and node reachable from `roots`, in
/// dependency order.
pub fn declarations(pool: &ExprPool, roots: &[ExprRef]) -> Vec<String> {
    let mut visited = FxHashSet::default();
    let mut order = Vec::new();
    for root in roots {
        collect(pool, *root, &mut visited, &mut order);
    }

    let mut arrays: BTreeMap<String, &Array> = BTreeMap::new();
    for expr in &order {
        if let Expr::Read { array, .. } = *pool.get(*expr) {
            let array = pool.array(array);
            arrays.entry(array.name().to_string()).or_insert(array);
        }
    }

    let mut lines = Vec::new();
    for array in arrays.values() {
        lines.push(format!(
            "(declare-fun {} () (Array (_ BitVec {}) (_ BitVec 8)))",
            array_name(array),
            INDEX_BITS
        ));
        if let Some(values) = array.constant_values() {
            for (i, value) in values.iter().enumerate() {
                lines.push(format!(
                    "(assert (= (select {} (_ bv{} {})) (_ bv{} 8)))",
                    array_name(array),
                    i,
                    INDEX_BITS,
                    value
                ));
            }
        }
    }

    for expr in order {
        lines.push(format!(
            "(define-fun {} () (_ BitVec {}) {})",
            node_name(expr),
            pool.width(expr),
            expr_to_smtlib2(pool, expr)
        ));
    }

    lines
}
