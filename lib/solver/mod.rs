//! The solver oracle.
//!
//! Nothing in this crate solves constraints. Whenever a pass needs to know
//! whether two expressions are always equal, or what concrete value an
//! expression takes, it asks an `Oracle`.

use crate::executor;
use crate::expr::{Constant, ExprPool, ExprRef};
use crate::Error;
use serde::{Deserialize, Serialize};

pub mod smtlib;
mod z3;

pub use self::z3::Z3Oracle;

/// An ordered set of 1-bit expressions assumed to be true.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ConstraintSet {
    constraints: Vec<ExprRef>,
}

impl ConstraintSet {
    pub fn new() -> ConstraintSet {
        ConstraintSet::default()
    }

    /// Add a constraint. The constraint must be 1 bit wide.
    pub fn add(&mut self, pool: &ExprPool, constraint: ExprRef) -> Result<(), Error> {
        if pool.width(constraint) != 1 {
            return Err(Error::Sort);
        }
        self.constraints.push(constraint);
        Ok(())
    }

    pub fn constraints(&self) -> &[ExprRef] {
        &self.constraints
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl From<Vec<ExprRef>> for ConstraintSet {
    fn from(constraints: Vec<ExprRef>) -> ConstraintSet {
        ConstraintSet { constraints }
    }
}

/// Decides equivalence and evaluation questions under a constraint set.
pub trait Oracle {
    /// Returns true if `lhs` and `rhs` are equal in every model of
    /// `constraints`.
    fn always_equal(
        &self,
        pool: &ExprPool,
        constraints: &ConstraintSet,
        lhs: ExprRef,
        rhs: ExprRef,
    ) -> Result<bool, Error>;

    /// A concrete value `expr` takes in some model of `constraints`, or
    /// `None` if no value can be produced.
    fn evaluate(
        &self,
        pool: &ExprPool,
        constraints: &ConstraintSet,
        expr: ExprRef,
    ) -> Result<Option<Constant>, Error>;
}

/// An in-process oracle backed by concrete evaluation.
///
/// Ground expressions are compared by value. Anything else is equal only
/// when structurally equal. Constraints are not consulted, so this oracle
/// under-approximates equality.
#[derive(Clone, Debug, Default)]
pub struct EvalOracle;

impl EvalOracle {
    pub fn new() -> EvalOracle {
        EvalOracle
    }
}

fn ground(pool: &ExprPool, expr: ExprRef) -> Result<Option<Constant>, Error> {
    match executor::eval(pool, expr) {
        Ok(constant) => Ok(Some(constant)),
        Err(Error::SymbolicRead { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

impl Oracle for EvalOracle {
    fn always_equal(
        &self,
        pool: &ExprPool,
        _constraints: &ConstraintSet,
        lhs: ExprRef,
        rhs: ExprRef,
    ) -> Result<bool, Error> {
        if pool.width(lhs) != pool.width(rhs) {
            return Err(Error::Sort);
        }
        if lhs == rhs || pool.structurally_equal(lhs, rhs) {
            return Ok(true);
        }
        match (ground(pool, lhs)?, ground(pool, rhs)?) {
            (Some(l), Some(r)) => Ok(l == r),
            _ => Ok(false),
        }
    }

    fn evaluate(
        &self,
        pool: &ExprPool,
        _constraints: &ConstraintSet,
        expr: ExprRef,
    ) -> Result<Option<Constant>, Error> {
        ground(pool, expr)
    }
}
