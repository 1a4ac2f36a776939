use crate::analysis::get_symbols;
use crate::ast::{self, BinaryOp as AstOp, Node, NodeRef};
use crate::expr::{BinaryOp, CompareOp, Constant, Expr, ExprPool, ExprRef};
use crate::transpiler::Environment;
use crate::types::Type;
use crate::Error;
use log::trace;
use rustc_hash::FxHashMap;

fn mask(bits: usize) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1 << bits) - 1
    }
}

fn index_constant(value: u64) -> NodeRef {
    Node::constant(Type::unsigned(32), value)
}

/// Converts bitvector expressions into typed AST.
///
/// A shared sub-expression is transpiled once per call to `transpile`, and
/// every parent referencing it gets the same node.
pub struct Transpiler<'t> {
    pool: &'t ExprPool,
    env: &'t Environment,
    cache: FxHashMap<ExprRef, NodeRef>,
}

impl<'t> Transpiler<'t> {
    pub fn new(pool: &'t ExprPool, env: &'t Environment) -> Transpiler<'t> {
        Transpiler {
            pool,
            env,
            cache: FxHashMap::default(),
        }
    }

    /// Transpile one expression.
    pub fn transpile(&mut self, expr: ExprRef) -> Result<NodeRef, Error> {
        self.cache.clear();
        trace!("transpiling {}", self.pool.display(expr));
        let node = self.visit(expr)?;
        self.cache.clear();
        Ok(node)
    }

    fn type_for(&self, width: usize) -> Result<Type, Error> {
        self.env.types().type_for(width)
    }

    fn visit(&mut self, expr: ExprRef) -> Result<NodeRef, Error> {
        if let Some(node) = self.cache.get(&expr) {
            return Ok(node.clone());
        }
        let node = self.visit_node(expr)?;
        // visit_concat decides itself whether its result may be merged.
        let node = match *self.pool.get(expr) {
            Expr::Concat(_, _) => node,
            _ => ast::simplify(node, self.env.types())?,
        };
        self.cache.insert(expr, node.clone());
        Ok(node)
    }

    fn visit_node(&mut self, expr: ExprRef) -> Result<NodeRef, Error> {
        let width = self.pool.width(expr);
        match *self.pool.get(expr) {
            Expr::Constant(ref constant) => self.visit_constant(constant),
            Expr::Read { .. } => self.visit_read(expr),
            Expr::Select { cond, then, else_ } => {
                let cond = self.visit(cond)?;
                let then = self.visit(then)?;
                let else_ = self.visit(else_)?;
                Ok(Node::select(cond, then, else_))
            }
            Expr::Concat(lhs, rhs) => self.visit_concat(expr, lhs, rhs),
            Expr::Extract {
                expr: inner,
                offset,
                width,
            } => self.visit_extract(inner, offset, width),
            Expr::ZExt(inner) => {
                let inner = self.visit(inner)?;
                Ok(Node::cast(inner, self.type_for(width)?))
            }
            Expr::SExt(inner) => self.visit_sext(inner, width),
            Expr::Not(inner) => Ok(Node::not(self.visit(inner)?)),
            Expr::Binary(op, lhs, rhs) => self.visit_binary(op, lhs, rhs, width),
            Expr::Compare(op, lhs, rhs) => self.visit_compare(op, lhs, rhs),
        }
    }

    fn visit_constant(&self, constant: &Constant) -> Result<NodeRef, Error> {
        let type_ = self.type_for(constant.bits())?;
        match type_ {
            Type::Array(element, count) => {
                let element_bits = element.bits();
                let mut values = Vec::with_capacity(count);
                for i in 0..count {
                    let value = constant
                        .extract(i * element_bits, element_bits)?
                        .value_u64()
                        .ok_or(Error::TooWide(element_bits))?;
                    values.push(value);
                }
                Ok(NodeRef::new(Node::Constant {
                    type_: Type::Array(element, count),
                    values,
                }))
            }
            Type::Primitive(_) => {
                let value = constant
                    .value_u64()
                    .ok_or(Error::TooWide(constant.bits()))?;
                Ok(Node::constant(type_, value))
            }
            _ => Err(Error::Unsupported(format!(
                "constant {} of type {}",
                constant, type_
            ))),
        }
    }

    fn visit_read(&mut self, expr: ExprRef) -> Result<NodeRef, Error> {
        let (array, index) = match *self.pool.get(expr) {
            Expr::Read { array, index } => (self.pool.array(array), index),
            _ => return Err(Error::Custom(format!("{} is not a read", expr))),
        };
        let options = self.env.options();
        let name = options.resolve_symbol(array.name());

        if name == options.packet_symbol() {
            let offset = self
                .pool
                .get(index)
                .constant()
                .and_then(|constant| constant.value_u64())
                .ok_or_else(|| {
                    Error::Unsupported(format!(
                        "packet read at symbolic index {}",
                        self.pool.display(index)
                    ))
                })?;
            return match self.env.chunks().lookup(offset) {
                Some((start, variable)) => Ok(Node::read(
                    variable.clone(),
                    Type::u8(),
                    index_constant(offset - start),
                )),
                None => Err(Error::UnresolvedSymbol {
                    name: format!("{}[{}]", name, offset),
                    context: self.env.dump()?,
                }),
            };
        }

        if let Some(variable) = self.env.symbols().get(name) {
            let variable = variable.clone();
            let index = self.visit(index)?;
            return Ok(Node::read(variable, Type::u8(), index));
        }

        if let Some(variable) = self.env.symbols().local(expr) {
            return Ok(Node::variable(variable.clone()));
        }

        Err(Error::UnresolvedSymbol {
            name: name.to_string(),
            context: self.env.dump()?,
        })
    }

    fn visit_concat(&mut self, expr: ExprRef, lhs: ExprRef, rhs: ExprRef) -> Result<NodeRef, Error> {
        let left = self.visit(lhs)?;
        let right = self.visit(rhs)?;

        // Bytes read past the end of a variable are zero padding.
        if let Node::Read {
            ref variable,
            ref index,
            ..
        } = *left
        {
            if let Some(index) = index.constant_value() {
                if index >= variable.type_().bytes() as u64 {
                    return Ok(right);
                }
            }
        }

        let type_ = self.type_for(self.pool.width(expr))?;
        let concat = Node::concat(left, right, type_);
        if get_symbols(self.pool, expr).len() > 1 {
            Ok(concat)
        } else {
            ast::simplify(concat, self.env.types())
        }
    }

    fn visit_extract(&mut self, inner: ExprRef, offset: usize, width: usize) -> Result<NodeRef, Error> {
        if offset % 8 != 0 {
            return Err(Error::Unaligned(offset));
        }

        let mut node = self.visit(inner)?;
        let mut offset = offset;
        loop {
            if offset == 0 && width == node.bits() {
                return Ok(node);
            }
            let next = match *node {
                Node::Concat {
                    ref left,
                    ref right,
                    ..
                } => {
                    if right.bits() >= offset + width {
                        right.clone()
                    } else if offset >= right.bits() && left.bits() >= offset - right.bits() + width
                    {
                        offset -= right.bits();
                        left.clone()
                    } else {
                        return Err(Error::ExtractStraddlesConcat { offset, width });
                    }
                }
                _ => break,
            };
            node = next;
        }

        let type_ = self.type_for(width)?;
        match *node {
            Node::Variable(ref variable) => Ok(Node::read(
                variable.clone(),
                type_,
                index_constant((offset / 8) as u64),
            )),
            Node::Constant {
                type_: ref constant_type,
                ref values,
            } => slice_constant(constant_type, values, offset, width, type_),
            Node::Read {
                ref variable,
                ref index,
                ..
            } if index.constant_value().is_some() => {
                let start = index.constant_value().unwrap_or(0);
                Ok(Node::read(
                    variable.clone(),
                    type_,
                    index_constant(start + (offset / 8) as u64),
                ))
            }
            _ => {
                let node_type = node.type_().clone();
                if !node_type.is_primitive() {
                    return Err(Error::Unsupported(format!(
                        "extract of {} bits at {} from {}",
                        width, offset, node_type
                    )));
                }
                if offset > 0 {
                    let shifted = Node::binary(
                        AstOp::Shr,
                        node.clone(),
                        Node::constant(node_type.clone(), offset as u64),
                        node_type.clone(),
                    );
                    let masked = Node::binary(
                        AstOp::And,
                        shifted,
                        Node::constant(node_type.clone(), mask(width)),
                        node_type,
                    );
                    Ok(Node::cast(masked, type_))
                } else {
                    Ok(Node::cast(node.clone(), type_))
                }
            }
        }
    }

    fn visit_sext(&mut self, inner: ExprRef, width: usize) -> Result<NodeRef, Error> {
        let node = self.visit(inner)?;
        let bits = node.bits();
        if bits == width {
            return Ok(node);
        }
        if width > 64 {
            return Err(Error::TooWide(width));
        }

        let type_ = self.type_for(width)?;
        let node_type = node.type_().clone();
        let sign = Node::binary(
            AstOp::Shr,
            node.clone(),
            Node::constant(node_type.clone(), (bits - 1) as u64),
            node_type.clone(),
        );
        let is_negative = Node::binary(
            AstOp::Equals,
            sign,
            Node::constant(node_type, 1),
            self.type_for(1)?,
        );
        let high_bits = Node::constant(type_.clone(), mask(width) ^ mask(bits));
        let extended = Node::cast(node, type_.clone());
        let negative = Node::binary(AstOp::Or, extended.clone(), high_bits, type_);
        Ok(Node::select(is_negative, negative, extended))
    }

    fn signed(&self, node: NodeRef) -> Result<NodeRef, Error> {
        let type_ = node.type_().to_signed()?;
        Ok(Node::cast(node, type_))
    }

    fn visit_binary(
        &mut self,
        op: BinaryOp,
        lhs: ExprRef,
        rhs: ExprRef,
        width: usize,
    ) -> Result<NodeRef, Error> {
        let lhs = self.visit(lhs)?;
        let rhs = self.visit(rhs)?;
        let type_ = self.type_for(width)?;
        let (op, lhs) = match op {
            BinaryOp::Add => (AstOp::Add, lhs),
            BinaryOp::Sub => (AstOp::Sub, lhs),
            BinaryOp::Mul => (AstOp::Mul, lhs),
            BinaryOp::UDiv => (AstOp::Div, lhs),
            BinaryOp::URem => (AstOp::Mod, lhs),
            BinaryOp::SDiv => (AstOp::Div, self.signed(lhs)?),
            BinaryOp::SRem => (AstOp::Mod, self.signed(lhs)?),
            BinaryOp::And => (AstOp::And, lhs),
            BinaryOp::Or => (AstOp::Or, lhs),
            BinaryOp::Xor => (AstOp::Xor, lhs),
            BinaryOp::Shl => (AstOp::Shl, lhs),
            BinaryOp::LShr => (AstOp::Shr, lhs),
            BinaryOp::AShr => (AstOp::Shr, self.signed(lhs)?),
        };
        Ok(Node::binary(op, lhs, rhs, type_))
    }

    fn is_zero(&self, expr: ExprRef) -> bool {
        self.pool
            .get(expr)
            .constant()
            .map(|constant| constant.is_zero())
            .unwrap_or(false)
    }

    fn visit_compare(&mut self, op: CompareOp, lhs: ExprRef, rhs: ExprRef) -> Result<NodeRef, Error> {
        if op == CompareOp::Eq && self.is_zero(lhs) {
            if let Expr::Compare(CompareOp::Eq, inner_lhs, inner_rhs) = *self.pool.get(rhs) {
                if self.is_zero(inner_lhs) {
                    return self.visit(inner_rhs);
                }
            }
        }

        let lhs = self.visit(lhs)?;
        let rhs = self.visit(rhs)?;
        let type_ = self.type_for(1)?;
        let (op, lhs, rhs) = match op {
            CompareOp::Eq => (AstOp::Equals, lhs, rhs),
            CompareOp::Ne => (AstOp::NotEquals, lhs, rhs),
            CompareOp::Ult => (AstOp::Less, lhs, rhs),
            CompareOp::Ule => (AstOp::LessEq, lhs, rhs),
            CompareOp::Ugt => (AstOp::Greater, lhs, rhs),
            CompareOp::Uge => (AstOp::GreaterEq, lhs, rhs),
            CompareOp::Slt => (AstOp::Less, self.signed(lhs)?, self.signed(rhs)?),
            CompareOp::Sle => (AstOp::LessEq, self.signed(lhs)?, self.signed(rhs)?),
            CompareOp::Sgt => (AstOp::Greater, self.signed(lhs)?, self.signed(rhs)?),
            CompareOp::Sge => (AstOp::GreaterEq, self.signed(lhs)?, self.signed(rhs)?),
        };
        Ok(Node::binary(op, lhs, rhs, type_))
    }
}

fn slice_constant(
    constant_type: &Type,
    values: &[u64],
    offset: usize,
    width: usize,
    type_: Type,
) -> Result<NodeRef, Error> {
    match *constant_type {
        Type::Primitive(_) => {
            let value = values.first().cloned().unwrap_or(0);
            let value = if offset >= 64 { 0 } else { value >> offset };
            Ok(Node::constant(type_, value & mask(width)))
        }
        Type::Array(ref element, _) => {
            let element_bits = element.bits();
            if offset % element_bits != 0 || width % element_bits != 0 {
                return Err(Error::Unaligned(offset));
            }
            let first = offset / element_bits;
            let last = first + width / element_bits;
            let slice = values
                .get(first..last)
                .ok_or_else(|| Error::Custom(format!("extract past the end of {}", constant_type)))?;
            let element_wise = match type_ {
                Type::Array(ref target, _) => target.bits() == element_bits,
                _ => false,
            };
            if element_wise {
                return Ok(NodeRef::new(Node::Constant {
                    type_,
                    values: slice.to_vec(),
                }));
            }
            if width > 64 {
                return Err(Error::TooWide(width));
            }
            let value = slice
                .iter()
                .enumerate()
                .fold(0u64, |value, (i, element)| value | (element << (i * element_bits)));
            Ok(Node::constant(type_, value))
        }
        _ => Err(Error::Unsupported(format!(
            "extract from a constant of type {}",
            constant_type
        ))),
    }
}

/// Transpile `expr` against `env`.
pub fn transpile(pool: &ExprPool, env: &Environment, expr: ExprRef) -> Result<NodeRef, Error> {
    Transpiler::new(pool, env).transpile(expr)
}
