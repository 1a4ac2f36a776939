use crate::expr::*;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A handle to an `Expr` held in an `ExprPool`.
///
/// Handles are identities. Two structurally equal expressions built
/// separately have different handles.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ExprRef(pub(crate) u32);

impl ExprRef {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ExprRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// A handle to an `Array` held in an `ExprPool`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct ArrayRef(pub(crate) u32);

impl ArrayRef {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Binary bitvector operators. Operands and result share one width.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    UDiv,
    SDiv,
    URem,
    SRem,
    And,
    Or,
    Xor,
    Shl,
    LShr,
    AShr,
}

impl BinaryOp {
    pub fn mnemonic(&self) -> &'static str {
        match *self {
            BinaryOp::Add => "Add",
            BinaryOp::Sub => "Sub",
            BinaryOp::Mul => "Mul",
            BinaryOp::UDiv => "UDiv",
            BinaryOp::SDiv => "SDiv",
            BinaryOp::URem => "URem",
            BinaryOp::SRem => "SRem",
            BinaryOp::And => "And",
            BinaryOp::Or => "Or",
            BinaryOp::Xor => "Xor",
            BinaryOp::Shl => "Shl",
            BinaryOp::LShr => "LShr",
            BinaryOp::AShr => "AShr",
        }
    }
}

/// Comparison operators. Operands share one width, the result is 1 bit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Ult,
    Ule,
    Ugt,
    Uge,
    Slt,
    Sle,
    Sgt,
    Sge,
}

impl CompareOp {
    pub fn mnemonic(&self) -> &'static str {
        match *self {
            CompareOp::Eq => "Eq",
            CompareOp::Ne => "Ne",
            CompareOp::Ult => "Ult",
            CompareOp::Ule => "Ule",
            CompareOp::Ugt => "Ugt",
            CompareOp::Uge => "Uge",
            CompareOp::Slt => "Slt",
            CompareOp::Sle => "Sle",
            CompareOp::Sgt => "Sgt",
            CompareOp::Sge => "Sge",
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            *self,
            CompareOp::Slt | CompareOp::Sle | CompareOp::Sgt | CompareOp::Sge
        )
    }
}

/// A bitvector expression node.
///
/// Children are handles into the owning `ExprPool`. Width is stored by the
/// pool next to the node.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Expr {
    Constant(Constant),
    Read {
        array: ArrayRef,
        index: ExprRef,
    },
    Concat(ExprRef, ExprRef),
    Extract {
        expr: ExprRef,
        offset: usize,
        width: usize,
    },
    ZExt(ExprRef),
    SExt(ExprRef),
    Not(ExprRef),
    Binary(BinaryOp, ExprRef, ExprRef),
    Compare(CompareOp, ExprRef, ExprRef),
    Select {
        cond: ExprRef,
        then: ExprRef,
        else_: ExprRef,
    },
}

impl Expr {
    /// The children of this node, left to right.
    pub fn children(&self) -> Vec<ExprRef> {
        match *self {
            Expr::Constant(_) => Vec::new(),
            Expr::Read { index, .. } => vec![index],
            Expr::Extract { expr, .. } | Expr::ZExt(expr) | Expr::SExt(expr) | Expr::Not(expr) => {
                vec![expr]
            }
            Expr::Concat(lhs, rhs) | Expr::Binary(_, lhs, rhs) | Expr::Compare(_, lhs, rhs) => {
                vec![lhs, rhs]
            }
            Expr::Select { cond, then, else_ } => vec![cond, then, else_],
        }
    }

    /// A copy of this node with its children replaced, in `children()`
    /// order.
    ///
    /// # Errors
    /// The number of children does not match this node's arity.
    pub fn with_children(&self, children: &[ExprRef]) -> Result<Expr, Error> {
        if children.len() != self.children().len() {
            return Err(Error::Custom(format!(
                "{} children given for a node of arity {}",
                children.len(),
                self.children().len()
            )));
        }
        Ok(match *self {
            Expr::Constant(ref constant) => Expr::Constant(constant.clone()),
            Expr::Read { array, .. } => Expr::Read {
                array,
                index: children[0],
            },
            Expr::Concat(_, _) => Expr::Concat(children[0], children[1]),
            Expr::Extract { offset, width, .. } => Expr::Extract {
                expr: children[0],
                offset,
                width,
            },
            Expr::ZExt(_) => Expr::ZExt(children[0]),
            Expr::SExt(_) => Expr::SExt(children[0]),
            Expr::Not(_) => Expr::Not(children[0]),
            Expr::Binary(op, _, _) => Expr::Binary(op, children[0], children[1]),
            Expr::Compare(op, _, _) => Expr::Compare(op, children[0], children[1]),
            Expr::Select { .. } => Expr::Select {
                cond: children[0],
                then: children[1],
                else_: children[2],
            },
        })
    }

    pub fn is_constant(&self) -> bool {
        matches!(*self, Expr::Constant(_))
    }

    pub fn constant(&self) -> Option<&Constant> {
        match *self {
            Expr::Constant(ref constant) => Some(constant),
            _ => None,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match *self {
            Expr::Constant(_) => "Constant",
            Expr::Read { .. } => "Read",
            Expr::Concat(_, _) => "Concat",
            Expr::Extract { .. } => "Extract",
            Expr::ZExt(_) => "ZExt",
            Expr::SExt(_) => "SExt",
            Expr::Not(_) => "Not",
            Expr::Binary(op, _, _) => op.mnemonic(),
            Expr::Compare(op, _, _) => op.mnemonic(),
            Expr::Select { .. } => "Select",
        }
    }
}
