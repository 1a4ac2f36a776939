use crate::expr::{Expr, ExprPool, ExprRef};
use crate::Error;

/// Narrow an extract over nested concats to the concat operand which holds
/// the extracted bits.
///
/// Anything other than an `Extract` directly over a `Concat` is returned
/// unchanged. When the extracted range is exactly one operand, that
/// operand is returned, otherwise a narrower `Extract` over it.
///
/// # Errors
/// The extracted range straddles a concat boundary.
pub fn simplify_extract(pool: &mut ExprPool, expr: ExprRef) -> Result<ExprRef, Error> {
    let (mut inner, mut offset, width) = match *pool.get(expr) {
        Expr::Extract {
            expr: inner,
            offset,
            width,
        } => (inner, offset, width),
        _ => return Ok(expr),
    };

    if !matches!(*pool.get(inner), Expr::Concat(_, _)) {
        return Ok(expr);
    }

    while let Expr::Concat(lhs, rhs) = *pool.get(inner) {
        if offset == 0 && width == pool.width(inner) {
            return Ok(inner);
        }
        let rhs_width = pool.width(rhs);
        if rhs_width >= offset + width {
            inner = rhs;
        } else if offset >= rhs_width && pool.width(lhs) >= (offset - rhs_width) + width {
            offset -= rhs_width;
            inner = lhs;
        } else {
            return Err(Error::ExtractStraddlesConcat { offset, width });
        }
    }

    if offset == 0 && width == pool.width(inner) {
        Ok(inner)
    } else {
        pool.extract(inner, offset, width)
    }
}
