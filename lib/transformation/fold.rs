use crate::executor;
use crate::expr::{Expr, ExprPool, ExprRef};
use crate::transformation::{rewrite, RewriteCache};
use crate::Error;

/// Fold every operator whose operands are all constants.
///
/// Reads of constant roots at constant indices fold to their byte. Reads of
/// symbolic bytes, and divisions by zero, are left in place.
pub fn fold_constants(pool: &mut ExprPool, expr: ExprRef) -> Result<ExprRef, Error> {
    let mut cache = RewriteCache::default();
    rewrite(pool, expr, &mut cache, &mut |pool, e| {
        let node = pool.get(e);
        if node.is_constant() {
            return Ok(None);
        }
        if !node
            .children()
            .into_iter()
            .all(|child| pool.get(child).is_constant())
        {
            return Ok(None);
        }
        match executor::eval(pool, e) {
            Ok(constant) => Ok(Some(pool.constant_expr(constant))),
            Err(Error::SymbolicRead { .. }) | Err(Error::Arithmetic(_)) => Ok(None),
            Err(e) => Err(e),
        }
    })
}
