//! Fresh name generation.

use rustc_hash::FxHashMap;

/// Hands out names which are unique among the names it has generated.
///
/// One generator is owned by a synthesis session and passed to whatever
/// needs fresh names.
#[derive(Clone, Debug, Default)]
pub struct NameGenerator {
    counters: FxHashMap<String, usize>,
}

impl NameGenerator {
    pub fn new() -> NameGenerator {
        NameGenerator::default()
    }

    /// A fresh name derived from `base`, `base__0`, `base__1`, ...
    pub fn generate(&mut self, base: &str) -> String {
        let counter = self.counters.entry(base.to_string()).or_insert(0);
        let name = format!("{}__{}", base, counter);
        *counter += 1;
        name
    }
}
