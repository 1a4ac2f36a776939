use crate::analysis::get_symbols;
use crate::expr::{Expr, ExprPool, ExprRef};
use crate::names::NameGenerator;
use crate::options::{Options, SwapRange};
use crate::transformation::{rewrite, RewriteCache, Renamer};
use crate::Error;
use log::debug;

/// Mirrors reads of packet bytes within fixed header ranges.
///
/// A read of the packet symbol at a constant index inside one of the swap
/// ranges is replaced with a read at the index mirrored around the middle
/// of that range. Reads outside every range are kept.
#[derive(Clone, Debug)]
pub struct EndiannessSwapper {
    packet_symbol: String,
    ranges: Vec<SwapRange>,
    swapped: bool,
}

impl EndiannessSwapper {
    pub fn new(options: &Options) -> EndiannessSwapper {
        EndiannessSwapper {
            packet_symbol: options.packet_symbol().to_string(),
            ranges: options.swap_ranges().to_vec(),
            swapped: false,
        }
    }

    /// Returns true if the last call to `swap` replaced any read.
    pub fn has_swapped(&self) -> bool {
        self.swapped
    }

    /// Swap the packet byte reads of `expr`.
    ///
    /// The packet symbol is first renamed to a fresh name from `names`, so
    /// reads already swapped are never mistaken for reads still to swap,
    /// and renamed back once the swap is done.
    pub fn swap(
        &mut self,
        pool: &mut ExprPool,
        expr: ExprRef,
        names: &mut NameGenerator,
    ) -> Result<ExprRef, Error> {
        self.swapped = false;

        let symbols = get_symbols(pool, expr);
        let mut temporary = names.generate(&self.packet_symbol);
        while symbols.contains(&temporary) {
            temporary = names.generate(&self.packet_symbol);
        }
        let mut renamer = Renamer::new();
        renamer.add_translation(self.packet_symbol.clone(), temporary.clone());
        let renamed = renamer.rename(pool, expr)?;

        let ranges = &self.ranges;
        let swapped = &mut self.swapped;
        let mut cache = RewriteCache::default();
        let result = rewrite(pool, renamed, &mut cache, &mut |pool, e| {
            let (array, index) = match *pool.get(e) {
                Expr::Read { array, index } => (array, index),
                _ => return Ok(None),
            };
            if pool.array(array).name() != temporary {
                return Ok(None);
            }
            let (value, bits) = match pool.get(index).constant() {
                Some(constant) => match constant.value_u64() {
                    Some(value) => (value, constant.bits()),
                    None => return Ok(None),
                },
                None => return Ok(None),
            };
            let range = match ranges.iter().find(|range| range.contains(value)) {
                Some(range) => range,
                None => return Ok(None),
            };
            let mirrored = pool.constant(range.mirror(value), bits);
            *swapped = true;
            pool.read(array, mirrored).map(Some)
        })?;

        let mut renamer = Renamer::new();
        renamer.add_translation(temporary, self.packet_symbol.clone());
        let result = renamer.rename(pool, result)?;

        debug!(
            "swapped endianness of {} into {}, changed: {}",
            expr, result, self.swapped
        );
        Ok(result)
    }
}

/// Swap the packet byte reads of `expr` with the ranges of `options`.
pub fn swap_endianness(
    pool: &mut ExprPool,
    expr: ExprRef,
    options: &Options,
    names: &mut NameGenerator,
) -> Result<ExprRef, Error> {
    EndiannessSwapper::new(options).swap(pool, expr, names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Array, BinaryOp};

    fn packet_read(pool: &mut ExprPool, index: u64) -> ExprRef {
        let packet = pool.add_array(Array::new("packet_chunks", 128));
        pool.read_at(packet, index).unwrap()
    }

    #[test]
    fn indices_mirror_within_ranges() {
        let options = Options::default();
        let mut names = NameGenerator::new();
        let mut pool = ExprPool::new();
        let mut swapper = EndiannessSwapper::new(&options);

        for (index, expected) in [(0, 5), (5, 0), (7, 10), (55, 54), (83, 82)] {
            let read = packet_read(&mut pool, index);
            let swapped = swapper.swap(&mut pool, read, &mut names).unwrap();
            assert!(swapper.has_swapped());
            assert_eq!(pool.read_constant_index(swapped), Some(expected));
            assert_eq!(pool.read_array(swapped).unwrap().name(), "packet_chunks");
        }

        let read = packet_read(&mut pool, 40);
        let swapped = swapper.swap(&mut pool, read, &mut names).unwrap();
        assert!(!swapper.has_swapped());
        assert!(pool.structurally_equal(swapped, read));
        assert_eq!(pool.read_constant_index(swapped), Some(40));
    }

    #[test]
    fn swapping_twice_restores_the_expression() {
        let options = Options::default();
        let mut names = NameGenerator::new();
        let mut pool = ExprPool::new();
        let packet = pool.add_array(Array::new("packet_chunks", 128));
        let mac = pool.read_lsb(packet, 0, 6).unwrap();
        let port = pool.read_lsb(packet, 82, 2).unwrap();
        let port = pool.zext(port, 48).unwrap();
        let expr = pool.binary(BinaryOp::Xor, mac, port).unwrap();

        let once = swap_endianness(&mut pool, expr, &options, &mut names).unwrap();
        assert!(!pool.structurally_equal(once, expr));
        let twice = swap_endianness(&mut pool, once, &options, &mut names).unwrap();
        assert!(pool.structurally_equal(twice, expr));
    }

    #[test]
    fn other_symbols_are_untouched() {
        let options = Options::default();
        let mut names = NameGenerator::new();
        let mut pool = ExprPool::new();
        let device = pool.add_array(Array::new("DEVICE", 4));
        let read = pool.read_at(device, 0).unwrap();
        let mut swapper = EndiannessSwapper::new(&options);
        let swapped = swapper.swap(&mut pool, read, &mut names).unwrap();
        assert_eq!(swapped, read);
        assert!(!swapper.has_swapped());
    }

    #[test]
    fn roots_named_like_temporaries_are_untouched() {
        let options = Options::default();
        let mut names = NameGenerator::new();
        let mut pool = ExprPool::new();
        let lookalike = pool.add_array(Array::new("packet_chunks__0", 8));
        let other = pool.read_at(lookalike, 0).unwrap();
        let packet = packet_read(&mut pool, 6);
        let expr = pool.concat(other, packet).unwrap();

        let mut swapper = EndiannessSwapper::new(&options);
        let swapped = swapper.swap(&mut pool, expr, &mut names).unwrap();
        assert!(swapper.has_swapped());
        let (lhs, rhs) = match *pool.get(swapped) {
            Expr::Concat(lhs, rhs) => (lhs, rhs),
            ref other => panic!("unexpected {:?}", other),
        };
        assert_eq!(pool.read_array(lhs).unwrap().name(), "packet_chunks__0");
        assert_eq!(pool.read_constant_index(lhs), Some(0));
        assert_eq!(pool.read_array(rhs).unwrap().name(), "packet_chunks");
        assert_eq!(pool.read_constant_index(rhs), Some(11));
    }
}
