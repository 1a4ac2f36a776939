use crate::expr::{ExprPool, ExprRef};
use crate::Error;
use rustc_hash::FxHashMap;

/// Maps original nodes to their replacements for one rewriting pass.
pub type RewriteCache = FxHashMap<ExprRef, ExprRef>;

/// Rewrite an expression bottom-up.
///
/// Children are rewritten first, and a node whose children changed is
/// rebuilt over the new children. `callback` is then given the (possibly
/// rebuilt) node, and may return a replacement for it.
///
/// Every node is rewritten at most once per `cache`, so a node shared by
/// several parents gets a single replacement.
pub fn rewrite<F>(
    pool: &mut ExprPool,
    expr: ExprRef,
    cache: &mut RewriteCache,
    callback: &mut F,
) -> Result<ExprRef, Error>
where
    F: FnMut(&mut ExprPool, ExprRef) -> Result<Option<ExprRef>, Error>,
{
    if let Some(replacement) = cache.get(&expr) {
        return Ok(*replacement);
    }

    let children = pool.get(expr).children();
    let mut new_children = Vec::with_capacity(children.len());
    for child in &children {
        new_children.push(rewrite(pool, *child, cache, callback)?);
    }

    let rebuilt = if new_children != children {
        let node = pool.get(expr).with_children(&new_children)?;
        let width = pool.width(expr);
        pool.add(node, width)?
    } else {
        expr
    };

    let result = callback(pool, rebuilt)?.unwrap_or(rebuilt);
    cache.insert(expr, result);
    Ok(result)
}
