//! A `Constant` holds a single bitvector value of arbitrary width.
//!
//! Values wider than 64 bits are common here, since symbolic execution
//! happily concatenates whole packet headers into one bitvector.

use crate::Error;
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A constant bitvector value.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Constant {
    value: BigUint,
    bits: usize,
}

impl Constant {
    /// Create a new `Constant` with the given value and bitness.
    pub fn new(value: u64, bits: usize) -> Constant {
        Constant::new_big(BigUint::from(value), bits)
    }

    /// Create a new `Constant` from a `BigUint`. The value is truncated to
    /// `bits`.
    pub fn new_big(value: BigUint, bits: usize) -> Constant {
        Constant {
            value: Constant::trim(value, bits),
            bits,
        }
    }

    /// Create a new `Constant` from little-endian bytes.
    pub fn from_bytes_le(bytes: &[u8]) -> Constant {
        Constant::new_big(BigUint::from_bytes_le(bytes), bytes.len() * 8)
    }

    fn trim(value: BigUint, bits: usize) -> BigUint {
        if value.bits() as usize > bits {
            value & Constant::mask_big(bits)
        } else {
            value
        }
    }

    fn mask_big(bits: usize) -> BigUint {
        (BigUint::one() << bits) - BigUint::one()
    }

    /// Get the value of this `Constant`.
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// Get the value of this `Constant` if it fits in a u64.
    pub fn value_u64(&self) -> Option<u64> {
        self.value.to_u64()
    }

    /// Interpret this constant as a two's complement signed value.
    ///
    /// # Errors
    /// The constant is wider than 64 bits.
    pub fn value_i64(&self) -> Result<i64, Error> {
        if self.bits > 64 || self.bits == 0 {
            return Err(Error::TooWide(self.bits));
        }
        let value = self.value_u64().ok_or(Error::TooWide(self.bits))?;
        if self.bits == 64 {
            return Ok(value as i64);
        }
        if self.is_negative() {
            Ok((value | (u64::MAX << self.bits)) as i64)
        } else {
            Ok(value as i64)
        }
    }

    /// Returns true if the most significant bit of this constant is set.
    pub fn is_negative(&self) -> bool {
        self.bits > 0 && self.value.bit(self.bits as u64 - 1)
    }

    /// Get the number of bits for this `Constant`.
    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.value.is_one()
    }

    /// Take `width` bits of this constant, starting at bit `offset`.
    pub fn extract(&self, offset: usize, width: usize) -> Result<Constant, Error> {
        if offset + width > self.bits {
            return Err(Error::Sort);
        }
        Ok(Constant::new_big(&self.value >> offset, width))
    }

    /// Concatenate two constants, `self` becoming the high bits.
    pub fn concat(&self, low: &Constant) -> Constant {
        Constant::new_big(
            (&self.value << low.bits) | &low.value,
            self.bits + low.bits,
        )
    }

    /// Zero-extend this constant to `bits`.
    pub fn zext(&self, bits: usize) -> Constant {
        Constant::new_big(self.value.clone(), bits)
    }

    /// Sign-extend this constant to `bits`.
    pub fn sext(&self, bits: usize) -> Constant {
        if !self.is_negative() || bits <= self.bits {
            return Constant::new_big(self.value.clone(), bits);
        }
        let high = Constant::mask_big(bits) ^ Constant::mask_big(self.bits);
        Constant::new_big(&self.value | high, bits)
    }

    /// The bytes of this constant in little-endian order, padded to
    /// `ceil(bits / 8)` bytes.
    pub fn to_bytes_le(&self) -> Vec<u8> {
        let mut bytes = self.value.to_bytes_le();
        bytes.resize((self.bits + 7) / 8, 0);
        bytes
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:X}:{}", self.value, self.bits)
    }
}
