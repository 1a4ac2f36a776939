use crate::ast::Variable;
use crate::expr::ExprRef;
use crate::options::Options;
use crate::types::TypeContext;
use crate::Error;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared variables, by root symbol name.
///
/// Anonymous reads, whose root has no declared name, can be bound to a
/// variable by the handle of the read expression itself.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SymbolTable {
    symbols: BTreeMap<String, Variable>,
    #[serde(skip)]
    locals: FxHashMap<ExprRef, Variable>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    /// Declare the variable a root symbol resolves to.
    pub fn declare<S: Into<String>>(&mut self, symbol: S, variable: Variable) {
        self.symbols.insert(symbol.into(), variable);
    }

    /// Bind one expression to a variable.
    pub fn declare_local(&mut self, expr: ExprRef, variable: Variable) {
        self.locals.insert(expr, variable);
    }

    pub fn get(&self, symbol: &str) -> Option<&Variable> {
        self.symbols.get(symbol)
    }

    pub fn local(&self, expr: ExprRef) -> Option<&Variable> {
        self.locals.get(&expr)
    }

    pub fn symbols(&self) -> &BTreeMap<String, Variable> {
        &self.symbols
    }
}

/// Declared variables covering byte ranges of the packet symbol.
///
/// Each variable starts at a byte offset and covers as many bytes as its
/// type.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ChunkTable {
    chunks: BTreeMap<u64, Variable>,
}

impl ChunkTable {
    pub fn new() -> ChunkTable {
        ChunkTable::default()
    }

    /// Declare a variable covering the packet bytes starting at `offset`.
    ///
    /// # Errors
    /// The variable overlaps a previously declared chunk.
    pub fn declare(&mut self, offset: u64, variable: Variable) -> Result<(), Error> {
        let end = offset + variable.type_().bytes() as u64;
        let overlaps = self
            .chunks
            .range(..end)
            .next_back()
            .map(|(start, existing)| start + existing.type_().bytes() as u64 > offset)
            .unwrap_or(false);
        if overlaps {
            return Err(Error::Custom(format!(
                "Chunk {} at packet offset {} overlaps a declared chunk",
                variable, offset
            )));
        }
        self.chunks.insert(offset, variable);
        Ok(())
    }

    /// The chunk holding the packet byte at `offset`, and the offset the
    /// chunk starts at.
    pub fn lookup(&self, offset: u64) -> Option<(u64, &Variable)> {
        self.chunks
            .range(..=offset)
            .next_back()
            .filter(|(start, variable)| offset < *start + variable.type_().bytes() as u64)
            .map(|(start, variable)| (*start, variable))
    }

    pub fn chunks(&self) -> &BTreeMap<u64, Variable> {
        &self.chunks
    }
}

/// Everything a transpilation resolves against.
///
/// An environment is fully populated before transpiling, and only read
/// while transpiling.
#[derive(Clone, Debug, Default)]
pub struct Environment {
    symbols: SymbolTable,
    chunks: ChunkTable,
    types: TypeContext,
    options: Options,
}

impl Environment {
    pub fn new(
        symbols: SymbolTable,
        chunks: ChunkTable,
        types: TypeContext,
        options: Options,
    ) -> Environment {
        Environment {
            symbols,
            chunks,
            types,
            options,
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn chunks(&self) -> &ChunkTable {
        &self.chunks
    }

    pub fn chunks_mut(&mut self) -> &mut ChunkTable {
        &mut self.chunks
    }

    pub fn types(&self) -> &TypeContext {
        &self.types
    }

    pub fn types_mut(&mut self) -> &mut TypeContext {
        &mut self.types
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    /// A JSON dump of the declared symbols and chunks, for diagnostics.
    pub fn dump(&self) -> Result<String, Error> {
        #[derive(Serialize)]
        struct Dump<'e> {
            symbols: &'e SymbolTable,
            chunks: &'e ChunkTable,
        }
        Ok(serde_json::to_string(&Dump {
            symbols: &self.symbols,
            chunks: &self.chunks,
        })?)
    }
}
