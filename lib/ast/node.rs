use crate::types::Type;
use crate::RC;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A shared handle to an AST node.
pub type NodeRef = RC<Node>;

/// A declared program variable.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Variable {
    name: String,
    type_: Type,
}

impl Variable {
    pub fn new<S: Into<String>>(name: S, type_: Type) -> Variable {
        Variable {
            name: name.into(),
            type_,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_(&self) -> &Type {
        &self.type_
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum UnaryOp {
    Not,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum BinaryOp {
    And,
    Or,
    Xor,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    Equals,
    NotEquals,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match *self {
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            *self,
            BinaryOp::Equals
                | BinaryOp::NotEquals
                | BinaryOp::Less
                | BinaryOp::LessEq
                | BinaryOp::Greater
                | BinaryOp::GreaterEq
        )
    }
}

/// A typed AST node.
///
/// `Constant` holds one value for scalar types, and one value per element
/// for array types. `Read` reads a value of `type_` starting at byte
/// `index` of `variable`.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Node {
    Constant {
        type_: Type,
        values: Vec<u64>,
    },
    Variable(Variable),
    Read {
        variable: Variable,
        type_: Type,
        index: NodeRef,
    },
    Concat {
        left: NodeRef,
        right: NodeRef,
        type_: Type,
    },
    Select {
        cond: NodeRef,
        then: NodeRef,
        else_: NodeRef,
        type_: Type,
    },
    Cast {
        expr: NodeRef,
        type_: Type,
    },
    Unary {
        op: UnaryOp,
        expr: NodeRef,
        type_: Type,
    },
    Binary {
        op: BinaryOp,
        lhs: NodeRef,
        rhs: NodeRef,
        type_: Type,
    },
}

impl Node {
    /// A scalar constant.
    pub fn constant(type_: Type, value: u64) -> NodeRef {
        RC::new(Node::Constant {
            type_,
            values: vec![value],
        })
    }

    pub fn variable(variable: Variable) -> NodeRef {
        RC::new(Node::Variable(variable))
    }

    pub fn read(variable: Variable, type_: Type, index: NodeRef) -> NodeRef {
        RC::new(Node::Read {
            variable,
            type_,
            index,
        })
    }

    pub fn concat(left: NodeRef, right: NodeRef, type_: Type) -> NodeRef {
        RC::new(Node::Concat { left, right, type_ })
    }

    pub fn select(cond: NodeRef, then: NodeRef, else_: NodeRef) -> NodeRef {
        let type_ = then.type_().clone();
        RC::new(Node::Select {
            cond,
            then,
            else_,
            type_,
        })
    }

    pub fn cast(expr: NodeRef, type_: Type) -> NodeRef {
        RC::new(Node::Cast { expr, type_ })
    }

    pub fn not(expr: NodeRef) -> NodeRef {
        let type_ = expr.type_().clone();
        RC::new(Node::Unary {
            op: UnaryOp::Not,
            expr,
            type_,
        })
    }

    pub fn binary(op: BinaryOp, lhs: NodeRef, rhs: NodeRef, type_: Type) -> NodeRef {
        RC::new(Node::Binary {
            op,
            lhs,
            rhs,
            type_,
        })
    }

    /// The declared type of the value this node produces.
    pub fn type_(&self) -> &Type {
        match *self {
            Node::Constant { ref type_, .. }
            | Node::Read { ref type_, .. }
            | Node::Concat { ref type_, .. }
            | Node::Select { ref type_, .. }
            | Node::Cast { ref type_, .. }
            | Node::Unary { ref type_, .. }
            | Node::Binary { ref type_, .. } => type_,
            Node::Variable(ref variable) => variable.type_(),
        }
    }

    pub fn bits(&self) -> usize {
        self.type_().bits()
    }

    /// The value of a scalar constant.
    pub fn constant_value(&self) -> Option<u64> {
        match *self {
            Node::Constant {
                ref type_,
                ref values,
            } if !matches!(type_, Type::Array(_, _)) => values.first().cloned(),
            _ => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(*self, Node::Variable(_))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Node::Constant {
                ref type_,
                ref values,
            } => match *type_ {
                Type::Array(_, _) => {
                    write!(f, "{{")?;
                    for (i, value) in values.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", value)?;
                    }
                    write!(f, "}}")
                }
                _ => write!(f, "{}", values.first().cloned().unwrap_or(0)),
            },
            Node::Variable(ref variable) => write!(f, "{}", variable),
            Node::Read {
                ref variable,
                ref type_,
                ref index,
            } => write!(f, "*({}*)((uint8_t*)&{} + {})", type_, variable, index),
            Node::Concat {
                ref left,
                ref right,
                ..
            } => write!(f, "(({} << {}) | {})", left, right.bits(), right),
            Node::Select {
                ref cond,
                ref then,
                ref else_,
                ..
            } => write!(f, "({} ? {} : {})", cond, then, else_),
            Node::Cast {
                ref expr,
                ref type_,
            } => write!(f, "(({}){})", type_, expr),
            Node::Unary { ref expr, .. } => write!(f, "(~{})", expr),
            Node::Binary {
                op,
                ref lhs,
                ref rhs,
                ..
            } => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
        }
    }
}
