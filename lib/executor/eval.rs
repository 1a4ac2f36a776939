use crate::expr::{BinaryOp, CompareOp, Constant, Expr, ExprPool, ExprRef};
use crate::Error;
use num_bigint::BigUint;
use num_traits::One;
use rustc_hash::FxHashMap;

fn mask(bits: usize) -> BigUint {
    (BigUint::one() << bits) - BigUint::one()
}

fn bool_(value: bool) -> Constant {
    Constant::new(value as u64, 1)
}

/// Evaluate a ground expression to a constant.
///
/// # Errors
/// * `SymbolicRead` if the expression reads a byte without a constant value.
/// * `Arithmetic` on division by zero.
/// * `TooWide` for signed arithmetic over more than 64 bits.
pub fn eval(pool: &ExprPool, expr: ExprRef) -> Result<Constant, Error> {
    let mut cache = FxHashMap::default();
    eval_(pool, expr, &mut cache)
}

fn eval_(
    pool: &ExprPool,
    expr: ExprRef,
    cache: &mut FxHashMap<ExprRef, Constant>,
) -> Result<Constant, Error> {
    if let Some(constant) = cache.get(&expr) {
        return Ok(constant.clone());
    }

    let width = pool.width(expr);

    let result = match *pool.get(expr) {
        Expr::Constant(ref constant) => constant.clone(),

        Expr::Read { array, index } => {
            let array = pool.array(array);
            let index_value = eval_(pool, index, cache)?;
            let byte = index_value
                .value_u64()
                .and_then(|i| array.constant_at(i as usize))
                .ok_or_else(|| Error::SymbolicRead {
                    array: array.name().to_string(),
                    index: index_value.to_string(),
                })?;
            Constant::new(byte as u64, 8)
        }

        Expr::Concat(lhs, rhs) => {
            let lhs = eval_(pool, lhs, cache)?;
            let rhs = eval_(pool, rhs, cache)?;
            lhs.concat(&rhs)
        }

        Expr::Extract {
            expr: inner,
            offset,
            width,
        } => eval_(pool, inner, cache)?.extract(offset, width)?,

        Expr::ZExt(inner) => eval_(pool, inner, cache)?.zext(width),

        Expr::SExt(inner) => eval_(pool, inner, cache)?.sext(width),

        Expr::Not(inner) => {
            let inner = eval_(pool, inner, cache)?;
            Constant::new_big(inner.value() ^ mask(width), width)
        }

        Expr::Binary(op, lhs, rhs) => {
            let lhs = eval_(pool, lhs, cache)?;
            let rhs = eval_(pool, rhs, cache)?;
            eval_binary(op, &lhs, &rhs, width)?
        }

        Expr::Compare(op, lhs, rhs) => {
            let lhs = eval_(pool, lhs, cache)?;
            let rhs = eval_(pool, rhs, cache)?;
            eval_compare(op, &lhs, &rhs)?
        }

        Expr::Select { cond, then, else_ } => {
            if eval_(pool, cond, cache)?.is_one() {
                eval_(pool, then, cache)?
            } else {
                eval_(pool, else_, cache)?
            }
        }
    };

    cache.insert(expr, result.clone());
    Ok(result)
}

fn shift_amount(rhs: &Constant, width: usize) -> Option<usize> {
    rhs.value_u64()
        .filter(|amount| (*amount as usize) < width)
        .map(|amount| amount as usize)
}

fn eval_binary(
    op: BinaryOp,
    lhs: &Constant,
    rhs: &Constant,
    width: usize,
) -> Result<Constant, Error> {
    let l = lhs.value();
    let r = rhs.value();
    Ok(match op {
        BinaryOp::Add => Constant::new_big(l + r, width),
        BinaryOp::Sub => Constant::new_big((l + (BigUint::one() << width)) - r, width),
        BinaryOp::Mul => Constant::new_big(l * r, width),
        BinaryOp::UDiv | BinaryOp::URem => {
            if rhs.is_zero() {
                return Err(Error::Arithmetic("Division by zero".to_string()));
            }
            match op {
                BinaryOp::UDiv => Constant::new_big(l / r, width),
                _ => Constant::new_big(l % r, width),
            }
        }
        BinaryOp::SDiv | BinaryOp::SRem => {
            if rhs.is_zero() {
                return Err(Error::Arithmetic("Division by zero".to_string()));
            }
            let l = lhs.value_i64()?;
            let r = rhs.value_i64()?;
            match op {
                BinaryOp::SDiv => Constant::new(l.wrapping_div(r) as u64, width),
                _ => Constant::new(l.wrapping_rem(r) as u64, width),
            }
        }
        BinaryOp::And => Constant::new_big(l & r, width),
        BinaryOp::Or => Constant::new_big(l | r, width),
        BinaryOp::Xor => Constant::new_big(l ^ r, width),
        BinaryOp::Shl => match shift_amount(rhs, width) {
            Some(amount) => Constant::new_big(l << amount, width),
            None => Constant::new(0, width),
        },
        BinaryOp::LShr => match shift_amount(rhs, width) {
            Some(amount) => Constant::new_big(l >> amount, width),
            None => Constant::new(0, width),
        },
        BinaryOp::AShr => {
            let fill = if lhs.is_negative() {
                mask(width)
            } else {
                BigUint::from(0u32)
            };
            match shift_amount(rhs, width) {
                Some(amount) => {
                    let high = &fill ^ (&fill >> amount);
                    Constant::new_big((l >> amount) | high, width)
                }
                None => Constant::new_big(fill, width),
            }
        }
    })
}

fn eval_compare(op: CompareOp, lhs: &Constant, rhs: &Constant) -> Result<Constant, Error> {
    if op.is_signed() {
        let l = lhs.value_i64()?;
        let r = rhs.value_i64()?;
        return Ok(bool_(match op {
            CompareOp::Slt => l < r,
            CompareOp::Sle => l <= r,
            CompareOp::Sgt => l > r,
            _ => l >= r,
        }));
    }
    let l = lhs.value();
    let r = rhs.value();
    Ok(bool_(match op {
        CompareOp::Eq => l == r,
        CompareOp::Ne => l != r,
        CompareOp::Ult => l < r,
        CompareOp::Ule => l <= r,
        CompareOp::Ugt => l > r,
        CompareOp::Uge => l >= r,
        CompareOp::Slt | CompareOp::Sle | CompareOp::Sgt | CompareOp::Sge => {
            return Err(Error::Custom("signed comparison reached unsigned path".to_string()))
        }
    }))
}
