use crate::analysis;
use crate::ast::{Node, Variable};
use crate::expr::*;
use crate::names::NameGenerator;
use crate::solver::{ConstraintSet, EvalOracle};
use crate::transformation;
use crate::transpiler::{self, Environment};
use crate::types::Type;
use std::collections::BTreeMap;

fn environment() -> Environment {
    let mut env = Environment::default();
    env.chunks_mut()
        .declare(0, Variable::new("ether", Type::array(Type::u8(), 14)))
        .unwrap();
    env.chunks_mut()
        .declare(14, Variable::new("ipv4", Type::array(Type::u8(), 20)))
        .unwrap();
    env.symbols_mut()
        .declare("map_value", Variable::new("value", Type::unsigned(32)));
    env
}

#[test]
fn swapped_mac_address_transpiles_to_one_read() {
    let env = environment();
    let mut names = NameGenerator::new();
    let mut pool = ExprPool::new();
    let packet = pool.add_array(Array::new("packet_chunks", 64));

    // Destination MAC as observed, most significant byte first.
    let mut mac = pool.read_at(packet, 5).unwrap();
    for index in (0..5).rev() {
        let byte = pool.read_at(packet, index).unwrap();
        mac = pool.concat(byte, mac).unwrap();
    }
    assert!(!analysis::is_read_lsb(&pool, mac));

    let swapped = transformation::swap_endianness(&mut pool, mac, env.options(), &mut names).unwrap();
    assert_eq!(analysis::get_bytes_read(&pool, swapped), Some(vec![5, 4, 3, 2, 1, 0]));

    let node = transpiler::transpile(&pool, &env, swapped).unwrap();
    assert_eq!(
        *node,
        Node::Read {
            variable: Variable::new("ether", Type::array(Type::u8(), 14)),
            type_: Type::unsigned(48),
            index: Node::constant(Type::unsigned(32), 0),
        }
    );
}

#[test]
fn renamed_then_folded_key_transpiles() {
    let env = environment();
    let mut pool = ExprPool::new();
    let value = pool.add_array(Array::new("vector_data_r1", 4));
    let read = pool.read_lsb(value, 0, 4).unwrap();
    let a = pool.constant(3, 32);
    let b = pool.constant(4, 32);
    let offset = pool.binary(BinaryOp::Mul, a, b).unwrap();
    let expr = pool.binary(BinaryOp::Add, read, offset).unwrap();

    let mut translations = BTreeMap::new();
    translations.insert("vector_data_r1".to_string(), "map_value".to_string());
    let renamed = transformation::rename(&mut pool, expr, &translations).unwrap();
    assert_eq!(analysis::get_symbol(&pool, renamed).unwrap(), "map_value");

    let folded = transformation::fold_constants(&mut pool, renamed).unwrap();
    let node = transpiler::transpile(&pool, &env, folded).unwrap();
    assert_eq!(node.to_string(), "(value + 12)");
}

#[test]
fn header_field_update_diffs_to_one_assignment() {
    let mut env = environment();
    env.symbols_mut()
        .declare("hdr", Variable::new("hdr", Type::array(Type::u8(), 6)));
    env.symbols_mut()
        .declare("new_ttl", Variable::new("ttl", Type::u8()));

    let mut pool = ExprPool::new();
    let hdr = pool.add_array(Array::new("hdr", 6));
    let ttl = pool.add_array(Array::new("new_ttl", 1));
    let before = pool.read_lsb(hdr, 0, 6).unwrap();

    let low = pool.extract(before, 0, 24).unwrap();
    let low = transformation::simplify_extract(&mut pool, low).unwrap();
    let new_ttl = pool.read_at(ttl, 0).unwrap();
    let mid = pool.concat(new_ttl, low).unwrap();
    let b5 = pool.read_at(hdr, 5).unwrap();
    let b4 = pool.read_at(hdr, 4).unwrap();
    let high = pool.concat(b5, b4).unwrap();
    let after = pool.concat(high, mid).unwrap();

    let constraints = ConstraintSet::new();
    let assignments =
        transpiler::diff(&mut pool, &env, &EvalOracle, &constraints, before, after).unwrap();
    let rendered: Vec<String> = assignments.iter().map(|a| a.to_string()).collect();
    assert_eq!(rendered, vec!["hdr[3] = ttl;".to_string()]);
}

#[test]
fn constant_checks_before_transpiling() {
    let env = environment();
    let mut pool = ExprPool::new();
    let value = pool.add_array(Array::new("map_value", 4));
    let read = pool.read_lsb(value, 0, 4).unwrap();
    let zero = pool.constant(0, 32);
    let masked = pool.binary(BinaryOp::And, read, zero).unwrap();
    let constraints = ConstraintSet::new();

    // The in-process oracle only proves ground equalities.
    assert!(!analysis::is_constant(&mut pool, &EvalOracle, &constraints, masked).unwrap());
    let minus_one = pool.constant(0xffff_ffff, 32);
    assert_eq!(
        analysis::get_constant_signed(&mut pool, &EvalOracle, &constraints, minus_one).unwrap(),
        -1
    );

    let is_big = pool.compare(CompareOp::Ugt, read, zero).unwrap();
    assert!(analysis::is_bool(&pool, is_big));
    let node = transpiler::transpile(&pool, &env, is_big).unwrap();
    assert_eq!(node.to_string(), "(value > 0)");
}
