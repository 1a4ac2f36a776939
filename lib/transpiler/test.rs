use crate::ast::{BinaryOp as AstOp, Node, Variable};
use crate::expr::*;
use crate::solver::{ConstraintSet, EvalOracle};
use crate::transformation::simplify_extract;
use crate::transpiler::*;
use crate::types::{Field, StructType, Type};
use crate::Error;
use crate::RC;

fn environment() -> Environment {
    let mut env = Environment::default();
    env.chunks_mut()
        .declare(0, Variable::new("ether", Type::array(Type::u8(), 14)))
        .unwrap();
    env.chunks_mut()
        .declare(14, Variable::new("ipv4", Type::array(Type::u8(), 20)))
        .unwrap();
    env.symbols_mut()
        .declare("DEVICE", Variable::new("device", Type::unsigned(16)));
    env
}

#[test]
fn zext_of_narrow_constant_is_a_cast() {
    let env = environment();
    let mut pool = ExprPool::new();
    let seven = pool.constant(0x7, 3);
    let expr = pool.zext(seven, 8).unwrap();

    let node = transpile(&pool, &env, expr).unwrap();
    match *node {
        Node::Cast {
            ref expr,
            ref type_,
        } => {
            assert_eq!(*type_, Type::u8());
            assert_eq!(*expr.type_(), Type::unsigned(3));
            assert_eq!(expr.constant_value(), Some(7));
        }
        ref other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn packet_reads_resolve_to_chunks() {
    let env = environment();
    let mut pool = ExprPool::new();
    let packet = pool.add_array(Array::new("packet_chunks", 64));

    let byte = pool.read_at(packet, 16).unwrap();
    let node = transpile(&pool, &env, byte).unwrap();
    assert_eq!(
        *node,
        Node::Read {
            variable: Variable::new("ipv4", Type::array(Type::u8(), 20)),
            type_: Type::u8(),
            index: Node::constant(Type::unsigned(32), 2),
        }
    );

    let src_addr = pool.read_lsb(packet, 26, 4).unwrap();
    let node = transpile(&pool, &env, src_addr).unwrap();
    match *node {
        Node::Read {
            ref variable,
            ref type_,
            ref index,
        } => {
            assert_eq!(variable.name(), "ipv4");
            assert_eq!(*type_, Type::unsigned(32));
            assert_eq!(index.constant_value(), Some(12));
        }
        ref other => panic!("unexpected {:?}", other),
    }

    let outside = pool.read_at(packet, 40).unwrap();
    assert!(matches!(
        transpile(&pool, &env, outside),
        Err(Error::UnresolvedSymbol { .. })
    ));
}

#[test]
fn legacy_symbols_and_whole_variables() {
    let env = environment();
    let mut pool = ExprPool::new();
    let device = pool.add_array(Array::new("VIGOR_DEVICE", 2));
    let expr = pool.read_lsb(device, 0, 2).unwrap();
    let node = transpile(&pool, &env, expr).unwrap();
    assert_eq!(
        *node,
        Node::Variable(Variable::new("device", Type::unsigned(16)))
    );
}

#[test]
fn padding_bytes_are_dropped() {
    let env = environment();
    let mut pool = ExprPool::new();
    let device = pool.add_array(Array::new("DEVICE", 4));
    let expr = pool.read_lsb(device, 0, 4).unwrap();
    let node = transpile(&pool, &env, expr).unwrap();
    assert_eq!(
        *node,
        Node::Variable(Variable::new("device", Type::unsigned(16)))
    );
}

#[test]
fn unresolved_symbols_report_context() {
    let env = environment();
    let mut pool = ExprPool::new();
    let unknown = pool.add_array(Array::new("unknown", 4));
    let expr = pool.read_at(unknown, 0).unwrap();
    match transpile(&pool, &env, expr) {
        Err(Error::UnresolvedSymbol { name, context }) => {
            assert_eq!(name, "unknown");
            assert!(context.contains("DEVICE"));
        }
        other => panic!("unexpected {:?}", other),
    }

    let mut env = env;
    env.symbols_mut()
        .declare_local(expr, Variable::new("tmp", Type::u8()));
    let node = transpile(&pool, &env, expr).unwrap();
    assert_eq!(*node, Node::Variable(Variable::new("tmp", Type::u8())));
}

#[test]
fn concat_of_several_symbols_is_kept() {
    let env = environment();
    let mut pool = ExprPool::new();
    let packet = pool.add_array(Array::new("packet_chunks", 64));
    let device = pool.add_array(Array::new("DEVICE", 2));
    let hi = pool.read_lsb(device, 0, 2).unwrap();
    let lo = pool.read_lsb(packet, 12, 2).unwrap();
    let expr = pool.concat(hi, lo).unwrap();

    let node = transpile(&pool, &env, expr).unwrap();
    match *node {
        Node::Concat {
            ref left,
            ref right,
            ref type_,
        } => {
            assert!(left.is_variable());
            assert_eq!(right.bits(), 16);
            assert_eq!(*type_, Type::unsigned(32));
        }
        ref other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn shared_subexpressions_share_nodes() {
    let env = environment();
    let mut pool = ExprPool::new();
    let device = pool.add_array(Array::new("DEVICE", 2));
    let value = pool.read_lsb(device, 0, 2).unwrap();
    let one = pool.constant(1, 16);
    let shared = pool.binary(BinaryOp::Add, value, one).unwrap();
    let expr = pool.binary(BinaryOp::Mul, shared, shared).unwrap();

    let node = transpile(&pool, &env, expr).unwrap();
    match *node {
        Node::Binary {
            op: AstOp::Mul,
            ref lhs,
            ref rhs,
            ..
        } => assert!(RC::ptr_eq(lhs, rhs)),
        ref other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn sign_extension_is_a_select() {
    let env = environment();
    let mut pool = ExprPool::new();
    let device = pool.add_array(Array::new("DEVICE", 2));
    let value = pool.read_lsb(device, 0, 2).unwrap();
    let same = pool.sext(value, 16).unwrap();
    let wide = pool.sext(value, 32).unwrap();

    let node = transpile(&pool, &env, same).unwrap();
    assert!(node.is_variable());

    let node = transpile(&pool, &env, wide).unwrap();
    match *node {
        Node::Select {
            ref then,
            ref else_,
            ref type_,
            ..
        } => {
            assert_eq!(*type_, Type::unsigned(32));
            assert_eq!(then.to_string(), "(((u32)device) | 4294901760)");
            assert_eq!(else_.to_string(), "((u32)device)");
        }
        ref other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn signed_operations_cast_operands() {
    let env = environment();
    let mut pool = ExprPool::new();
    let device = pool.add_array(Array::new("DEVICE", 2));
    let value = pool.read_lsb(device, 0, 2).unwrap();
    let two = pool.constant(2, 16);
    let div = pool.binary(BinaryOp::SDiv, value, two).unwrap();
    let lt = pool.compare(CompareOp::Slt, value, two).unwrap();

    let node = transpile(&pool, &env, div).unwrap();
    assert_eq!(node.to_string(), "(((i16)device) / 2)");
    let node = transpile(&pool, &env, lt).unwrap();
    assert_eq!(node.to_string(), "(((i16)device) < ((i16)2))");
}

#[test]
fn double_negation_collapses() {
    let env = environment();
    let mut pool = ExprPool::new();
    let device = pool.add_array(Array::new("DEVICE", 2));
    let value = pool.read_lsb(device, 0, 2).unwrap();
    let zero = pool.constant(0, 16);
    let is_zero = pool.compare(CompareOp::Eq, zero, value).unwrap();
    let false_ = pool.constant(0, 1);
    let not_zero = pool.compare(CompareOp::Eq, false_, is_zero).unwrap();

    let node = transpile(&pool, &env, is_zero).unwrap();
    assert_eq!(node.to_string(), "(0 == device)");
    let node = transpile(&pool, &env, not_zero).unwrap();
    assert_eq!(node.to_string(), "device");
}

#[test]
fn extracts_of_constants_and_expressions() {
    let env = environment();
    let mut pool = ExprPool::new();
    let constant = pool.constant(0x1234, 16);
    let high = pool.extract(constant, 8, 8).unwrap();
    let node = transpile(&pool, &env, high).unwrap();
    assert_eq!(node.constant_value(), Some(0x12));
    assert_eq!(*node.type_(), Type::u8());

    let device = pool.add_array(Array::new("DEVICE", 2));
    let value = pool.read_lsb(device, 0, 2).unwrap();
    let one = pool.constant(1, 16);
    let sum = pool.binary(BinaryOp::Add, value, one).unwrap();
    let high = pool.extract(sum, 8, 8).unwrap();
    let node = transpile(&pool, &env, high).unwrap();
    assert_eq!(node.to_string(), "((u8)(((device + 1) >> 8) & 255))");

    let low = pool.extract(sum, 0, 8).unwrap();
    let node = transpile(&pool, &env, low).unwrap();
    assert_eq!(node.to_string(), "((u8)(device + 1))");

    let unaligned = pool.extract(sum, 4, 8).unwrap();
    assert!(matches!(
        transpile(&pool, &env, unaligned),
        Err(Error::Unaligned(4))
    ));
}

#[test]
fn wide_constants_become_byte_arrays() {
    let env = environment();
    let mut pool = ExprPool::new();
    let mac = Constant::from_bytes_le(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    let mac = pool.constant_expr(mac);
    let node = transpile(&pool, &env, mac).unwrap();
    assert_eq!(
        *node,
        Node::Constant {
            type_: Type::array(Type::u8(), 10),
            values: vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
        }
    );

    let slice = pool.extract(mac, 16, 16).unwrap();
    let node = transpile(&pool, &env, slice).unwrap();
    assert_eq!(node.constant_value(), Some(0x0403));
}

fn struct_environment() -> Environment {
    let s = StructType::new(
        "S",
        vec![
            Field::new("a", 0, Type::unsigned(32)),
            Field::new("b", 4, Type::unsigned(32)),
        ],
        8,
    )
    .unwrap();
    let mut env = environment();
    env.symbols_mut()
        .declare("S", Variable::new("s", Type::Struct(s)));
    env.symbols_mut()
        .declare("new_b", Variable::new("new_b", Type::unsigned(32)));
    env.symbols_mut()
        .declare("arr", Variable::new("arr", Type::array(Type::u8(), 4)));
    env.symbols_mut()
        .declare("val", Variable::new("val", Type::u8()));
    env
}

#[test]
fn diff_of_identical_values_is_empty() {
    let env = struct_environment();
    let mut pool = ExprPool::new();
    let s = pool.add_array(Array::new("S", 8));
    let before = pool.read_lsb(s, 0, 8).unwrap();
    let after = pool.read_lsb(s, 0, 8).unwrap();

    let constraints = ConstraintSet::new();
    let assignments = diff(&mut pool, &env, &EvalOracle, &constraints, before, after).unwrap();
    assert!(assignments.is_empty());
    let assignments = diff(&mut pool, &env, &EvalOracle, &constraints, before, before).unwrap();
    assert!(assignments.is_empty());
}

#[test]
fn diff_of_one_struct_field() {
    let env = struct_environment();
    let mut pool = ExprPool::new();
    let s = pool.add_array(Array::new("S", 8));
    let new_b = pool.add_array(Array::new("new_b", 4));
    let before = pool.read_lsb(s, 0, 8).unwrap();
    let low = pool.extract(before, 0, 32).unwrap();
    let low = simplify_extract(&mut pool, low).unwrap();
    let b = pool.read_lsb(new_b, 0, 4).unwrap();
    let after = pool.concat(b, low).unwrap();

    let constraints = ConstraintSet::new();
    let assignments = diff(&mut pool, &env, &EvalOracle, &constraints, before, after).unwrap();
    assert_eq!(assignments.len(), 1);
    let assignment = &assignments[0];
    assert_eq!(assignment.location().to_string(), "s.b");
    assert_eq!(
        assignment.location().path(),
        &[Step::Field("b".to_string())]
    );
    let after_b = pool.extract(after, 32, 32).unwrap();
    assert_eq!(*assignment.value(), transpile(&pool, &env, after_b).unwrap());
    assert_eq!(assignment.to_string(), "s.b = new_b;");
}

#[test]
fn diff_of_one_array_element() {
    let env = struct_environment();
    let mut pool = ExprPool::new();
    let arr = pool.add_array(Array::new("arr", 4));
    let val = pool.add_array(Array::new("val", 1));
    let b0 = pool.read_at(arr, 0).unwrap();
    let b1 = pool.read_at(arr, 1).unwrap();
    let b2 = pool.read_at(arr, 2).unwrap();
    let b3 = pool.read_at(arr, 3).unwrap();
    let v = pool.read_at(val, 0).unwrap();

    let low = pool.concat(b1, b0).unwrap();
    let before = pool.concat(b2, low).unwrap();
    let before = pool.concat(b3, before).unwrap();
    let after = pool.concat(v, low).unwrap();
    let after = pool.concat(b3, after).unwrap();

    let constraints = ConstraintSet::new();
    let assignments = diff(&mut pool, &env, &EvalOracle, &constraints, before, after).unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].to_string(), "arr[2] = val;");
}

#[test]
fn diff_requires_a_composite_type() {
    let env = struct_environment();
    let mut pool = ExprPool::new();
    let device = pool.add_array(Array::new("DEVICE", 2));
    let before = pool.read_lsb(device, 0, 2).unwrap();
    let one = pool.constant(1, 16);
    let after = pool.binary(BinaryOp::Add, before, one).unwrap();
    let constraints = ConstraintSet::new();
    assert!(matches!(
        diff(&mut pool, &env, &EvalOracle, &constraints, before, after),
        Err(Error::Unsupported(_))
    ));

    let narrow = pool.read_at(device, 0).unwrap();
    assert!(matches!(
        diff(&mut pool, &env, &EvalOracle, &constraints, before, narrow),
        Err(Error::Sort)
    ));
}

#[test]
fn extracts_of_merged_packet_reads_are_field_reads() {
    let env = environment();
    let mut pool = ExprPool::new();
    let packet = pool.add_array(Array::new("packet_chunks", 64));

    let wide = pool.read_lsb(packet, 0, 10).unwrap();
    let field = pool.extract(wide, 16, 16).unwrap();
    let node = transpile(&pool, &env, field).unwrap();
    assert_eq!(node.to_string(), "*(u16*)((uint8_t*)&ether + 2)");
    let same_bytes = pool.read_lsb(packet, 2, 2).unwrap();
    assert_eq!(node, transpile(&pool, &env, same_bytes).unwrap());

    let narrow = pool.read_lsb(packet, 0, 4).unwrap();
    let byte = pool.extract(narrow, 8, 8).unwrap();
    let node = transpile(&pool, &env, byte).unwrap();
    assert_eq!(node.to_string(), "*(u8*)((uint8_t*)&ether + 1)");
}

#[test]
fn concats_mixing_legacy_and_current_names_are_kept() {
    let env = environment();
    let mut pool = ExprPool::new();
    let legacy = pool.add_array(Array::new("VIGOR_DEVICE", 2));
    let current = pool.add_array(Array::new("DEVICE", 2));
    let hi = pool.read_at(legacy, 1).unwrap();
    let lo = pool.read_at(current, 0).unwrap();
    let mixed = pool.concat(hi, lo).unwrap();

    let node = transpile(&pool, &env, mixed).unwrap();
    match *node {
        Node::Concat {
            ref left,
            ref right,
            ..
        } => {
            assert_eq!(left.to_string(), "*(u8*)((uint8_t*)&device + 1)");
            assert_eq!(right.to_string(), "*(u8*)((uint8_t*)&device + 0)");
        }
        ref other => panic!("unexpected {:?}", other),
    }

    let hi = pool.read_at(current, 1).unwrap();
    let single = pool.concat(hi, lo).unwrap();
    let node = transpile(&pool, &env, single).unwrap();
    assert_eq!(
        *node,
        Node::Variable(Variable::new("device", Type::unsigned(16)))
    );
}

#[test]
fn bitwise_and_shift_operations() {
    let env = environment();
    let mut pool = ExprPool::new();
    let device = pool.add_array(Array::new("DEVICE", 2));
    let value = pool.read_lsb(device, 0, 2).unwrap();
    let two = pool.constant(2, 16);

    for (op, rendered) in [
        (BinaryOp::And, "(device & 2)"),
        (BinaryOp::Or, "(device | 2)"),
        (BinaryOp::Xor, "(device ^ 2)"),
        (BinaryOp::Shl, "(device << 2)"),
        (BinaryOp::LShr, "(device >> 2)"),
        (BinaryOp::AShr, "(((i16)device) >> 2)"),
        (BinaryOp::SRem, "(((i16)device) % 2)"),
    ] {
        let expr = pool.binary(op, value, two).unwrap();
        assert_eq!(transpile(&pool, &env, expr).unwrap().to_string(), rendered);
    }

    let not = pool.not(value).unwrap();
    assert_eq!(transpile(&pool, &env, not).unwrap().to_string(), "(~device)");
}

#[test]
fn unsigned_comparisons_and_selects() {
    let env = environment();
    let mut pool = ExprPool::new();
    let device = pool.add_array(Array::new("DEVICE", 2));
    let value = pool.read_lsb(device, 0, 2).unwrap();
    let two = pool.constant(2, 16);

    for (op, rendered) in [
        (CompareOp::Ne, "(device != 2)"),
        (CompareOp::Ult, "(device < 2)"),
        (CompareOp::Ule, "(device <= 2)"),
        (CompareOp::Ugt, "(device > 2)"),
        (CompareOp::Uge, "(device >= 2)"),
    ] {
        let expr = pool.compare(op, value, two).unwrap();
        let node = transpile(&pool, &env, expr).unwrap();
        assert_eq!(node.to_string(), rendered);
        assert_eq!(node.bits(), 1);
    }

    let below = pool.compare(CompareOp::Ult, value, two).unwrap();
    let clamped = pool.select(below, value, two).unwrap();
    let node = transpile(&pool, &env, clamped).unwrap();
    assert_eq!(node.to_string(), "((device < 2) ? device : 2)");
    assert_eq!(*node.type_(), Type::unsigned(16));
}

#[test]
fn diff_of_identical_arrays_is_empty() {
    let env = struct_environment();
    let mut pool = ExprPool::new();
    let arr = pool.add_array(Array::new("arr", 4));
    let before = pool.read_lsb(arr, 0, 4).unwrap();
    let after = pool.read_lsb(arr, 0, 4).unwrap();

    let constraints = ConstraintSet::new();
    let assignments = diff(&mut pool, &env, &EvalOracle, &constraints, before, before).unwrap();
    assert!(assignments.is_empty());
    let assignments = diff(&mut pool, &env, &EvalOracle, &constraints, before, after).unwrap();
    assert!(assignments.is_empty());
}
