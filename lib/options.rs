use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::default;

/// An inclusive range of packet byte offsets whose bytes are mirrored when
/// swapping endianness.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct SwapRange {
    low: u64,
    high: u64,
}

impl SwapRange {
    /// Create a new swap range. `low` and `high` are inclusive.
    pub fn new(low: u64, high: u64) -> SwapRange {
        if low <= high {
            SwapRange { low, high }
        } else {
            SwapRange {
                low: high,
                high: low,
            }
        }
    }

    pub fn low(&self) -> u64 {
        self.low
    }

    pub fn high(&self) -> u64 {
        self.high
    }

    pub fn contains(&self, index: u64) -> bool {
        index >= self.low && index <= self.high
    }

    /// The index mirrored around the midpoint of this range.
    pub fn mirror(&self, index: u64) -> u64 {
        (self.high + self.low) - index
    }
}

const DEFAULT_PACKET_SYMBOL: &str = "packet_chunks";

const DEFAULT_SWAP_RANGES: [(u64, u64); 6] = [(0, 5), (6, 11), (53, 56), (57, 60), (82, 83), (84, 85)];

const DEFAULT_LEGACY_SYMBOLS: [(&str, &str); 3] = [
    ("VIGOR_DEVICE", "DEVICE"),
    ("next_time", "now"),
    ("pkt_len", "packet_length"),
];

/// Options which change how expressions are rewritten and transpiled.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Options {
    packet_symbol: String,
    legacy_symbols: BTreeMap<String, String>,
    swap_ranges: Vec<SwapRange>,
}

impl Options {
    /// Create a new set of Options with the default settings.
    pub fn new() -> Options {
        Options::default()
    }

    /// The name of the root symbol holding raw packet bytes.
    pub fn packet_symbol(&self) -> &str {
        &self.packet_symbol
    }

    pub fn set_packet_symbol<S: Into<String>>(&mut self, packet_symbol: S) {
        self.packet_symbol = packet_symbol.into();
    }

    /// Legacy root symbol names, and the names they are resolved as.
    pub fn legacy_symbols(&self) -> &BTreeMap<String, String> {
        &self.legacy_symbols
    }

    /// Resolve a root symbol name through the legacy name table.
    pub fn resolve_symbol<'a>(&'a self, name: &'a str) -> &'a str {
        self.legacy_symbols
            .get(name)
            .map(|modern| modern.as_str())
            .unwrap_or(name)
    }

    pub fn add_legacy_symbol<S: Into<String>, T: Into<String>>(&mut self, legacy: S, modern: T) {
        self.legacy_symbols.insert(legacy.into(), modern.into());
    }

    /// The packet byte ranges mirrored by the endianness swapper.
    pub fn swap_ranges(&self) -> &[SwapRange] {
        &self.swap_ranges
    }

    pub fn set_swap_ranges(&mut self, swap_ranges: Vec<SwapRange>) {
        self.swap_ranges = swap_ranges;
    }
}

impl default::Default for Options {
    fn default() -> Options {
        Options {
            packet_symbol: DEFAULT_PACKET_SYMBOL.to_string(),
            legacy_symbols: DEFAULT_LEGACY_SYMBOLS
                .iter()
                .map(|(legacy, modern)| (legacy.to_string(), modern.to_string()))
                .collect(),
            swap_ranges: DEFAULT_SWAP_RANGES
                .iter()
                .map(|&(low, high)| SwapRange::new(low, high))
                .collect(),
        }
    }
}

/// Create your options with the builder pattern.
///
/// For more details on the options, see `options::Options`
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    pub fn new() -> OptionsBuilder {
        OptionsBuilder {
            options: Options::default(),
        }
    }

    pub fn packet_symbol<S: Into<String>>(mut self, packet_symbol: S) -> OptionsBuilder {
        self.options.set_packet_symbol(packet_symbol);
        self
    }

    pub fn legacy_symbol<S: Into<String>, T: Into<String>>(
        mut self,
        legacy: S,
        modern: T,
    ) -> OptionsBuilder {
        self.options.add_legacy_symbol(legacy, modern);
        self
    }

    pub fn swap_ranges(mut self, swap_ranges: Vec<SwapRange>) -> OptionsBuilder {
        self.options.set_swap_ranges(swap_ranges);
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}

impl default::Default for OptionsBuilder {
    fn default() -> OptionsBuilder {
        OptionsBuilder::new()
    }
}
