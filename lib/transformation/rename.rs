use crate::expr::{ArrayRef, Expr, ExprPool, ExprRef};
use crate::solver::ConstraintSet;
use crate::transformation::{rewrite, RewriteCache};
use crate::Error;
use log::trace;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Renames root symbols throughout expressions.
///
/// A renamed root keeps its size and constant contents. Within one rename
/// call every read of an old root is redirected to the same new root, and
/// shared nodes are rewritten once.
#[derive(Clone, Debug, Default)]
pub struct Renamer {
    translations: BTreeMap<String, String>,
    cache: RewriteCache,
    roots: FxHashMap<ArrayRef, ArrayRef>,
}

impl Renamer {
    pub fn new() -> Renamer {
        Renamer::default()
    }

    /// Create a renamer from a table of `old name -> new name` translations.
    pub fn with_translations(translations: BTreeMap<String, String>) -> Renamer {
        Renamer {
            translations,
            ..Renamer::default()
        }
    }

    pub fn add_translation<S: Into<String>, T: Into<String>>(&mut self, from: S, to: T) {
        self.translations.insert(from.into(), to.into());
    }

    pub fn translations(&self) -> &BTreeMap<String, String> {
        &self.translations
    }

    fn reset(&mut self) {
        self.cache.clear();
        self.roots.clear();
    }

    fn rename_(&mut self, pool: &mut ExprPool, expr: ExprRef) -> Result<ExprRef, Error> {
        let translations = &self.translations;
        let roots = &mut self.roots;
        rewrite(pool, expr, &mut self.cache, &mut |pool, e| {
            let (array, index) = match *pool.get(e) {
                Expr::Read { array, index } => (array, index),
                _ => return Ok(None),
            };
            let new_name = match translations.get(pool.array(array).name()) {
                Some(new_name) => new_name,
                None => return Ok(None),
            };
            let new_array = match roots.get(&array) {
                Some(new_array) => *new_array,
                None => {
                    let renamed = pool.array(array).renamed(new_name.as_str());
                    let new_array = pool.add_array(renamed);
                    roots.insert(array, new_array);
                    new_array
                }
            };
            pool.read(new_array, index).map(Some)
        })
    }

    /// Rename the root symbols of one expression.
    pub fn rename(&mut self, pool: &mut ExprPool, expr: ExprRef) -> Result<ExprRef, Error> {
        self.reset();
        trace!("renaming {} with {:?}", expr, self.translations);
        self.rename_(pool, expr)
    }

    /// Rename every constraint of every constraint set.
    ///
    /// Sharing is preserved between the constraints of one set, but each set
    /// is renamed independently of the others.
    pub fn rename_constraints(
        &mut self,
        pool: &mut ExprPool,
        constraint_sets: &[ConstraintSet],
    ) -> Result<Vec<ConstraintSet>, Error> {
        let mut renamed_sets = Vec::with_capacity(constraint_sets.len());
        for constraint_set in constraint_sets {
            self.reset();
            let mut renamed = ConstraintSet::new();
            for constraint in constraint_set.constraints() {
                let constraint = self.rename_(pool, *constraint)?;
                renamed.add(pool, constraint)?;
            }
            renamed_sets.push(renamed);
        }
        Ok(renamed_sets)
    }
}

/// Rename the root symbols of `expr` according to `translations`.
pub fn rename(
    pool: &mut ExprPool,
    expr: ExprRef,
    translations: &BTreeMap<String, String>,
) -> Result<ExprRef, Error> {
    Renamer::with_translations(translations.clone()).rename(pool, expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::get_symbols;
    use crate::expr::{Array, BinaryOp, CompareOp};

    fn translation(from: &str, to: &str) -> BTreeMap<String, String> {
        let mut translations = BTreeMap::new();
        translations.insert(from.to_string(), to.to_string());
        translations
    }

    #[test]
    fn rename_round_trip() {
        let mut pool = ExprPool::new();
        let a = pool.add_array(Array::new_constant("A", vec![1, 2, 3, 4]));
        let other = pool.add_array(Array::new("other", 2));
        let lhs = pool.read_lsb(a, 0, 2).unwrap();
        let rhs = pool.read_lsb(other, 0, 2).unwrap();
        let expr = pool.binary(BinaryOp::Xor, lhs, rhs).unwrap();

        let renamed = rename(&mut pool, expr, &translation("A", "B")).unwrap();
        let symbols = get_symbols(&pool, renamed);
        assert!(symbols.contains("B"));
        assert!(!symbols.contains("A"));
        assert!(symbols.contains("other"));

        let back = rename(&mut pool, renamed, &translation("B", "A")).unwrap();
        assert!(pool.structurally_equal(back, expr));
    }

    #[test]
    fn renamed_roots_are_shared() {
        let mut pool = ExprPool::new();
        let a = pool.add_array(Array::new("A", 4));
        let x = pool.read_at(a, 0).unwrap();
        let y = pool.read_at(a, 1).unwrap();
        let expr = pool.binary(BinaryOp::Add, x, y).unwrap();

        let renamed = rename(&mut pool, expr, &translation("A", "B")).unwrap();
        let (rx, ry) = match *pool.get(renamed) {
            Expr::Binary(_, rx, ry) => (rx, ry),
            ref other => panic!("unexpected {:?}", other),
        };
        match (pool.get(rx), pool.get(ry)) {
            (Expr::Read { array: ax, .. }, Expr::Read { array: ay, .. }) => assert_eq!(ax, ay),
            _ => panic!("expected reads"),
        }
        assert_eq!(pool.array(pool_root(&pool, rx)).size(), 4);
    }

    fn pool_root(pool: &ExprPool, read: ExprRef) -> ArrayRef {
        match *pool.get(read) {
            Expr::Read { array, .. } => array,
            _ => panic!("expected a read"),
        }
    }

    #[test]
    fn constraint_sets_are_renamed_independently() {
        let mut pool = ExprPool::new();
        let a = pool.add_array(Array::new("A", 4));
        let byte = pool.read_at(a, 0).unwrap();
        let zero = pool.constant(0, 8);
        let c0 = pool.compare(CompareOp::Eq, byte, zero).unwrap();
        let c1 = pool.compare(CompareOp::Ne, byte, zero).unwrap();
        let sets = vec![
            ConstraintSet::from(vec![c0, c1]),
            ConstraintSet::from(vec![c0]),
        ];

        let mut renamer = Renamer::with_translations(translation("A", "B"));
        let renamed = renamer.rename_constraints(&mut pool, &sets).unwrap();
        assert_eq!(renamed.len(), 2);

        let first = renamed[0].constraints();
        let read_of = |pool: &ExprPool, c: ExprRef| match *pool.get(c) {
            Expr::Compare(_, lhs, _) => lhs,
            _ => panic!("expected a compare"),
        };
        assert_eq!(read_of(&pool, first[0]), read_of(&pool, first[1]));
        assert_ne!(renamed[0].constraints()[0], renamed[1].constraints()[0]);
        assert!(pool.structurally_equal(renamed[0].constraints()[0], renamed[1].constraints()[0]));
        assert_eq!(get_symbol_name(&pool, renamed[1].constraints()[0]), "B");
    }

    fn get_symbol_name(pool: &ExprPool, expr: ExprRef) -> String {
        crate::analysis::get_symbol(pool, expr).unwrap()
    }
}
