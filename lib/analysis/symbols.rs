//! Retrieval of the root symbols an expression depends on.

use crate::expr::{Expr, ExprPool, ExprRef};
use crate::Error;
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, BTreeSet};

/// Collects the root symbols, and the `Read` nodes over each of them, of one
/// or more expressions.
///
/// Nodes reached more than once through sharing are visited once.
#[derive(Clone, Debug, Default)]
pub struct SymbolRetriever {
    symbols: BTreeSet<String>,
    reads: BTreeMap<String, Vec<ExprRef>>,
    visited: FxHashSet<ExprRef>,
}

impl SymbolRetriever {
    pub fn new() -> SymbolRetriever {
        SymbolRetriever::default()
    }

    /// Visit an expression, recording every read in left-to-right order.
    pub fn visit(&mut self, pool: &ExprPool, expr: ExprRef) {
        if !self.visited.insert(expr) {
            return;
        }
        if let Expr::Read { array, .. } = *pool.get(expr) {
            let name = pool.array(array).name().to_string();
            self.reads.entry(name.clone()).or_default().push(expr);
            self.symbols.insert(name);
        }
        for child in pool.get(expr).children() {
            self.visit(pool, child);
        }
    }

    /// The distinct root symbol names seen so far.
    pub fn symbols(&self) -> &BTreeSet<String> {
        &self.symbols
    }

    /// The reads of the given root symbol seen so far.
    pub fn reads_of(&self, name: &str) -> &[ExprRef] {
        self.reads.get(name).map(|reads| reads.as_slice()).unwrap_or(&[])
    }

    pub fn into_symbols(self) -> BTreeSet<String> {
        self.symbols
    }
}

/// The distinct root symbol names referenced by `expr`.
pub fn get_symbols(pool: &ExprPool, expr: ExprRef) -> BTreeSet<String> {
    let mut retriever = SymbolRetriever::new();
    retriever.visit(pool, expr);
    retriever.into_symbols()
}

/// The single root symbol referenced by `expr`.
///
/// # Errors
/// `expr` references no symbol, or more than one.
pub fn get_symbol(pool: &ExprPool, expr: ExprRef) -> Result<String, Error> {
    let symbols = get_symbols(pool, expr);
    if symbols.len() != 1 {
        return Err(Error::AmbiguousSymbols(pool.display(expr).to_string()));
    }
    symbols
        .into_iter()
        .next()
        .ok_or_else(|| Error::AmbiguousSymbols(pool.display(expr).to_string()))
}

/// The reads of the packet-bytes symbol in `expr`, left to right.
pub fn packet_chunk_reads(pool: &ExprPool, expr: ExprRef, packet_symbol: &str) -> Vec<ExprRef> {
    let mut retriever = SymbolRetriever::new();
    retriever.visit(pool, expr);
    retriever.reads_of(packet_symbol).to_vec()
}

/// Returns true if two key expressions read the same packet bytes, in the
/// same order.
pub fn same_chunk_reads(pool: &ExprPool, lhs: ExprRef, rhs: ExprRef, packet_symbol: &str) -> bool {
    let lhs = packet_chunk_reads(pool, lhs, packet_symbol);
    let rhs = packet_chunk_reads(pool, rhs, packet_symbol);
    lhs.len() == rhs.len()
        && lhs
            .iter()
            .zip(rhs.iter())
            .all(|(l, r)| pool.structurally_equal(*l, *r))
}
