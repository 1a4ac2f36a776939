use crate::ast::NodeRef;
use crate::expr::{ExprPool, ExprRef};
use crate::solver::{ConstraintSet, Oracle};
use crate::transformation::simplify_extract;
use crate::transpiler::{transpile, Environment};
use crate::types::Type;
use crate::Error;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step from a value into a part of it.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Step {
    Field(String),
    Element(usize),
}

/// A part of a typed value, named by a path from its base.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Location {
    base: NodeRef,
    path: Vec<Step>,
}

impl Location {
    pub fn new(base: NodeRef) -> Location {
        Location {
            base,
            path: Vec::new(),
        }
    }

    pub fn base(&self) -> &NodeRef {
        &self.base
    }

    pub fn path(&self) -> &[Step] {
        &self.path
    }

    fn field(&self, name: &str) -> Location {
        let mut location = self.clone();
        location.path.push(Step::Field(name.to_string()));
        location
    }

    fn element(&self, index: usize) -> Location {
        let mut location = self.clone();
        location.path.push(Step::Element(index));
        location
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for step in &self.path {
            match *step {
                Step::Field(ref name) => write!(f, ".{}", name)?,
                Step::Element(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// A new value for one location.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Assignment {
    location: Location,
    value: NodeRef,
}

impl Assignment {
    pub fn new(location: Location, value: NodeRef) -> Assignment {
        Assignment { location, value }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn value(&self) -> &NodeRef {
        &self.value
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {};", self.location, self.value)
    }
}

/// Computes the assignments which turn `before` into `after`.
///
/// `before` must transpile to a struct or array typed value, or a pointer
/// to one. A field or element is assigned when the oracle cannot prove it
/// holds the same value in both states.
pub fn diff(
    pool: &mut ExprPool,
    env: &Environment,
    oracle: &dyn Oracle,
    constraints: &ConstraintSet,
    before: ExprRef,
    after: ExprRef,
) -> Result<Vec<Assignment>, Error> {
    if pool.width(before) != pool.width(after) {
        return Err(Error::Sort);
    }

    let base = transpile(pool, env, before)?;
    let after_node = transpile(pool, env, after)?;
    debug!("diffing {} against {}", base, after_node);

    let type_ = base.type_().unwrap_pointer().clone();
    let mut differ = Differ {
        pool,
        env,
        oracle,
        constraints,
        assignments: Vec::new(),
    };
    differ.diff(before, after, &type_, &Location::new(base))?;
    Ok(differ.assignments)
}

struct Differ<'d> {
    pool: &'d mut ExprPool,
    env: &'d Environment,
    oracle: &'d dyn Oracle,
    constraints: &'d ConstraintSet,
    assignments: Vec<Assignment>,
}

impl<'d> Differ<'d> {
    /// Extract a bit range, narrowed to a single concat operand when the
    /// range lies inside one.
    fn slice(&mut self, expr: ExprRef, offset: usize, width: usize) -> Result<ExprRef, Error> {
        if offset == 0 && width == self.pool.width(expr) {
            return Ok(expr);
        }
        let extract = self.pool.extract(expr, offset, width)?;
        match simplify_extract(self.pool, extract) {
            Ok(simplified) => Ok(simplified),
            Err(Error::ExtractStraddlesConcat { .. }) => Ok(extract),
            Err(e) => Err(e),
        }
    }

    /// Slices of both states, and whether they are always equal.
    fn slices(
        &mut self,
        before: ExprRef,
        after: ExprRef,
        offset: usize,
        width: usize,
    ) -> Result<(ExprRef, ExprRef, bool), Error> {
        let before = self.slice(before, offset, width)?;
        let after = self.slice(after, offset, width)?;
        let equal = self
            .oracle
            .always_equal(self.pool, self.constraints, before, after)?;
        Ok((before, after, equal))
    }

    fn assign(&mut self, location: Location, after: ExprRef) -> Result<(), Error> {
        let value = transpile(self.pool, self.env, after)?;
        self.assignments.push(Assignment::new(location, value));
        Ok(())
    }

    fn diff(
        &mut self,
        before: ExprRef,
        after: ExprRef,
        type_: &Type,
        location: &Location,
    ) -> Result<(), Error> {
        match *type_ {
            Type::Struct(ref struct_) => {
                for field in struct_.fields() {
                    let (field_before, field_after, equal) = self.slices(
                        before,
                        after,
                        field.offset() * 8,
                        field.type_().bits(),
                    )?;
                    if equal {
                        continue;
                    }
                    let location = location.field(field.name());
                    match *field.type_() {
                        Type::Primitive(_) | Type::Pointer(_) => self.assign(location, field_after)?,
                        ref field_type => {
                            self.diff(field_before, field_after, field_type, &location)?
                        }
                    }
                }
                Ok(())
            }
            Type::Array(ref element, count) => {
                let element_bits = element.bits();
                for i in 0..count {
                    let (_, element_after, equal) =
                        self.slices(before, after, i * element_bits, element_bits)?;
                    if !equal {
                        self.assign(location.element(i), element_after)?;
                    }
                }
                Ok(())
            }
            Type::Primitive(_) => Err(Error::Unsupported(format!(
                "diff of {}, a primitive outside a struct or array",
                location
            ))),
            Type::Pointer(_) => Err(Error::Unsupported(format!(
                "diff through the pointer {}",
                location
            ))),
        }
    }
}
