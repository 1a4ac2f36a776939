//! Shape simplification of freshly built AST nodes.
//!
//! `simplify` only looks at the top of the node it is given. Children are
//! expected to already be simplified, which is how the transpiler builds
//! nodes: bottom-up, simplifying each node before attaching it to a parent.

use crate::ast::{Node, NodeRef};
use crate::types::{Type, TypeContext};
use crate::Error;

/// Collapse trivially reducible shapes.
///
/// * A concat of reads of one variable at adjacent offsets becomes one
/// wider read.
/// * A concat of two scalar constants becomes one constant.
/// * A read of a whole variable at offset 0 becomes the variable.
/// * A cast to the type a node already has is dropped.
///
/// Nodes which match no rule are returned as is, keeping their identity.
pub fn simplify(node: NodeRef, types: &TypeContext) -> Result<NodeRef, Error> {
    match *node {
        Node::Concat {
            ref left,
            ref right,
            ..
        } => {
            if let Some(merged) = merge_adjacent_reads(left, right, types)? {
                return simplify(merged, types);
            }
            if let (Some(l), Some(r)) = (left.constant_value(), right.constant_value()) {
                let bits = left.bits() + right.bits();
                if bits <= 64 {
                    let value = if right.bits() >= 64 { r } else { (l << right.bits()) | r };
                    return Ok(Node::constant(types.type_for(bits)?, value));
                }
            }
            Ok(node.clone())
        }
        Node::Read {
            ref variable,
            ref type_,
            ref index,
        } => {
            if index.constant_value() == Some(0) && type_.bits() == variable.type_().bits() {
                Ok(Node::variable(variable.clone()))
            } else {
                Ok(node.clone())
            }
        }
        Node::Cast {
            ref expr,
            ref type_,
        } => {
            if expr.type_() == type_ {
                Ok(expr.clone())
            } else {
                Ok(node.clone())
            }
        }
        _ => Ok(node.clone()),
    }
}

fn merge_adjacent_reads(
    left: &NodeRef,
    right: &NodeRef,
    types: &TypeContext,
) -> Result<Option<NodeRef>, Error> {
    let (
        Node::Read {
            variable: lv,
            type_: lt,
            index: li,
        },
        Node::Read {
            variable: rv,
            type_: rt,
            index: ri,
        },
    ) = (&**left, &**right)
    else {
        return Ok(None);
    };

    if lv != rv || lt.bits() % 8 != 0 || rt.bits() % 8 != 0 {
        return Ok(None);
    }

    match (li.constant_value(), ri.constant_value()) {
        (Some(l), Some(r)) if l == r + rt.bytes() as u64 => {
            let type_ = types.type_for(lt.bits() + rt.bits())?;
            let index = Node::constant(ri.type_().clone(), r);
            Ok(Some(Node::read(lv.clone(), type_, index)))
        }
        _ => Ok(None),
    }
}
