//! An `Array` is the root symbol a `Read` indexes into.
//!
//! Symbolic execution models every input (packet bytes, device ids, time,
//! map values) as a named array of bytes. Some arrays carry constant initial
//! contents, in which case reads at constant indices are themselves
//! constant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named symbolic array of bytes.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Array {
    name: String,
    size: usize,
    constant_values: Option<Vec<u8>>,
}

impl Array {
    /// Create a new symbolic array.
    ///
    /// Size is the size of the `Array` in bytes.
    pub fn new<S>(name: S, size: usize) -> Array
    where
        S: Into<String>,
    {
        Array {
            name: name.into(),
            size,
            constant_values: None,
        }
    }

    /// Create a new array with constant initial contents.
    pub fn new_constant<S>(name: S, values: Vec<u8>) -> Array
    where
        S: Into<String>,
    {
        Array {
            name: name.into(),
            size: values.len(),
            constant_values: Some(values),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the size of the `Array` in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn constant_values(&self) -> Option<&[u8]> {
        self.constant_values.as_deref()
    }

    /// The constant byte at `index`, if this array is constant.
    pub fn constant_at(&self, index: usize) -> Option<u8> {
        self.constant_values
            .as_ref()
            .and_then(|values| values.get(index).cloned())
    }

    /// The same array layout and contents under a new name.
    pub fn renamed<S>(&self, name: S) -> Array
    where
        S: Into<String>,
    {
        Array {
            name: name.into(),
            size: self.size,
            constant_values: self.constant_values.clone(),
        }
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.size)
    }
}
