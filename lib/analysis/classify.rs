//! Predicates over bitvector expressions.
//!
//! A negative answer from any of these predicates means "not detected",
//! never "proven otherwise". Callers branch on the answer.

use crate::analysis::get_symbols;
use crate::expr::{BinaryOp, Constant, Expr, ExprPool, ExprRef};
use crate::solver::{ConstraintSet, Oracle};
use crate::{Error, RC};
use rustc_hash::FxHashMap;

/// Returns true if `expr` is syntactically boolean valued.
pub fn is_bool(pool: &ExprPool, expr: ExprRef) -> bool {
    let mut cache = FxHashMap::default();
    is_bool_(pool, expr, &mut cache)
}

fn is_bool_(pool: &ExprPool, expr: ExprRef, cache: &mut FxHashMap<ExprRef, bool>) -> bool {
    if let Some(&answer) = cache.get(&expr) {
        return answer;
    }
    let answer = if pool.width(expr) == 1 {
        true
    } else {
        match *pool.get(expr) {
            Expr::ZExt(inner) | Expr::SExt(inner) | Expr::Not(inner) => {
                is_bool_(pool, inner, cache)
            }
            Expr::Compare(_, _, _) => true,
            Expr::Binary(BinaryOp::And, lhs, rhs)
            | Expr::Binary(BinaryOp::Or, lhs, rhs)
            | Expr::Binary(BinaryOp::Xor, lhs, rhs) => {
                is_bool_(pool, lhs, cache) && is_bool_(pool, rhs, cache)
            }
            _ => false,
        }
    };
    cache.insert(expr, answer);
    answer
}

/// The constant value of `expr`, if the oracle proves it always takes one
/// value.
pub fn constant_value(
    pool: &mut ExprPool,
    oracle: &dyn Oracle,
    constraints: &ConstraintSet,
    expr: ExprRef,
) -> Result<Option<Constant>, Error> {
    if let Expr::Constant(ref constant) = *pool.get(expr) {
        return Ok(Some(constant.clone()));
    }
    let value = match oracle.evaluate(pool, constraints, expr)? {
        Some(value) => value,
        None => return Ok(None),
    };
    let candidate = pool.constant_expr(value.clone());
    if oracle.always_equal(pool, constraints, expr, candidate)? {
        Ok(Some(value))
    } else {
        Ok(None)
    }
}

/// Returns true if `expr` is a constant, or always equals the value the
/// oracle evaluates it to.
pub fn is_constant(
    pool: &mut ExprPool,
    oracle: &dyn Oracle,
    constraints: &ConstraintSet,
    expr: ExprRef,
) -> Result<bool, Error> {
    Ok(constant_value(pool, oracle, constraints, expr)?.is_some())
}

fn require_signed_constant(
    pool: &mut ExprPool,
    oracle: &dyn Oracle,
    constraints: &ConstraintSet,
    expr: ExprRef,
) -> Result<Constant, Error> {
    let width = pool.width(expr);
    if width > 64 {
        return Err(Error::TooWide(width));
    }
    constant_value(pool, oracle, constraints, expr)?
        .ok_or_else(|| Error::NotConstant(pool.display(expr).to_string()))
}

/// Returns true if the constant `expr` is negative when read as two's
/// complement.
///
/// # Errors
/// `expr` is not constant, or wider than 64 bits.
pub fn is_constant_signed(
    pool: &mut ExprPool,
    oracle: &dyn Oracle,
    constraints: &ConstraintSet,
    expr: ExprRef,
) -> Result<bool, Error> {
    Ok(require_signed_constant(pool, oracle, constraints, expr)?.is_negative())
}

/// The value of the constant `expr` read as two's complement.
///
/// # Errors
/// `expr` is not constant, or wider than 64 bits.
pub fn get_constant_signed(
    pool: &mut ExprPool,
    oracle: &dyn Oracle,
    constraints: &ConstraintSet,
    expr: ExprRef,
) -> Result<i64, Error> {
    require_signed_constant(pool, oracle, constraints, expr)?.value_i64()
}

/// The constant byte indices of every read in a tree of reads and concats,
/// left to right.
///
/// Returns `None` if an index is not constant, or if anything other than
/// reads and concats appears.
pub fn get_bytes_read(pool: &ExprPool, expr: ExprRef) -> Option<Vec<u64>> {
    let mut cache = FxHashMap::default();
    collect_bytes_read(pool, expr, &mut cache).map(|bytes| bytes.to_vec())
}

fn collect_bytes_read(
    pool: &ExprPool,
    expr: ExprRef,
    cache: &mut FxHashMap<ExprRef, Option<RC<Vec<u64>>>>,
) -> Option<RC<Vec<u64>>> {
    if let Some(bytes) = cache.get(&expr) {
        return bytes.clone();
    }
    let bytes = match *pool.get(expr) {
        Expr::Read { .. } => pool
            .read_constant_index(expr)
            .map(|index| RC::new(vec![index])),
        Expr::Concat(lhs, rhs) => collect_bytes_read(pool, lhs, cache).and_then(|lhs| {
            collect_bytes_read(pool, rhs, cache).map(|rhs| {
                let mut bytes = Vec::with_capacity(lhs.len() + rhs.len());
                bytes.extend_from_slice(&lhs);
                bytes.extend_from_slice(&rhs);
                RC::new(bytes)
            })
        }),
        _ => None,
    };
    cache.insert(expr, bytes.clone());
    bytes
}

/// Returns true if `expr` is a little-endian reconstruction of a single
/// symbol: a concat of reads of one symbol, whose indices run from
/// `size - 1` down to `0`.
pub fn is_read_lsb(pool: &ExprPool, expr: ExprRef) -> bool {
    if !matches!(*pool.get(expr), Expr::Concat(_, _)) {
        return false;
    }
    let width = pool.width(expr);
    if width % 8 != 0 {
        return false;
    }
    if get_symbols(pool, expr).len() != 1 {
        return false;
    }
    let size = (width / 8) as u64;
    match get_bytes_read(pool, expr) {
        Some(bytes) => {
            bytes.len() as u64 == size
                && bytes
                    .iter()
                    .enumerate()
                    .all(|(i, index)| *index == size - 1 - i as u64)
        }
        None => false,
    }
}
