//! Declared types of the typed AST.
//!
//! Every AST node carries a `Type`. The transpiler chooses types for raw
//! bitvector widths through a `TypeContext`, and picks up richer struct and
//! array types from the variables declared in its symbol and chunk tables.

use crate::Error;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An integer type.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Primitive {
    bits: usize,
    signed: bool,
}

impl Primitive {
    pub fn new(bits: usize, signed: bool) -> Primitive {
        Primitive { bits, signed }
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn signed(&self) -> bool {
        self.signed
    }
}

/// A named field of a struct.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Field {
    name: String,
    offset: usize,
    type_: Type,
}

impl Field {
    /// Create a field at byte `offset` within its struct.
    pub fn new<S: Into<String>>(name: S, offset: usize, type_: Type) -> Field {
        Field {
            name: name.into(),
            offset,
            type_,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Offset of this field in bytes.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn type_(&self) -> &Type {
        &self.type_
    }
}

/// A struct layout.
///
/// Fields are kept in offset order. Bytes not covered by any field are
/// padding.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct StructType {
    name: String,
    fields: Vec<Field>,
    size: usize,
}

impl StructType {
    /// Create a new struct type of `size` bytes.
    ///
    /// # Errors
    /// Fields overlap, or extend past `size`.
    pub fn new<S: Into<String>>(
        name: S,
        mut fields: Vec<Field>,
        size: usize,
    ) -> Result<StructType, Error> {
        let name = name.into();
        fields.sort_by_key(|field| field.offset);

        let mut end = 0;
        for field in &fields {
            if field.offset < end {
                return Err(Error::Custom(format!(
                    "Field {}.{} overlaps the previous field",
                    name, field.name
                )));
            }
            if field.type_.bits() % 8 != 0 {
                return Err(Error::Unaligned(field.type_.bits()));
            }
            end = field.offset + field.type_.bytes();
        }
        if end > size {
            return Err(Error::Custom(format!(
                "Fields of {} span {} bytes, more than its size of {}",
                name, end, size
            )));
        }

        Ok(StructType { name, fields, size })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Size of this struct in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The number of padding bytes in this struct.
    pub fn padding(&self) -> usize {
        self.size
            - self
                .fields
                .iter()
                .map(|field| field.type_.bytes())
                .sum::<usize>()
    }
}

/// The declared type of an AST node.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Type {
    Primitive(Primitive),
    Pointer(Box<Type>),
    Struct(StructType),
    Array(Box<Type>, usize),
}

impl Type {
    pub fn unsigned(bits: usize) -> Type {
        Type::Primitive(Primitive::new(bits, false))
    }

    pub fn signed(bits: usize) -> Type {
        Type::Primitive(Primitive::new(bits, true))
    }

    pub fn bool_() -> Type {
        Type::unsigned(1)
    }

    pub fn u8() -> Type {
        Type::unsigned(8)
    }

    pub fn pointer(pointee: Type) -> Type {
        Type::Pointer(Box::new(pointee))
    }

    pub fn array(element: Type, count: usize) -> Type {
        Type::Array(Box::new(element), count)
    }

    /// Size of this type in bits.
    pub fn bits(&self) -> usize {
        match *self {
            Type::Primitive(ref primitive) => primitive.bits,
            Type::Pointer(_) => 64,
            Type::Struct(ref struct_) => struct_.size * 8,
            Type::Array(ref element, count) => element.bits() * count,
        }
    }

    /// Size of this type in bytes, rounded up.
    pub fn bytes(&self) -> usize {
        (self.bits() + 7) / 8
    }

    pub fn is_primitive(&self) -> bool {
        matches!(*self, Type::Primitive(_))
    }

    pub fn is_signed(&self) -> bool {
        match *self {
            Type::Primitive(ref primitive) => primitive.signed,
            _ => false,
        }
    }

    /// The signed variant of a primitive type.
    ///
    /// # Errors
    /// This type is not a primitive.
    pub fn to_signed(&self) -> Result<Type, Error> {
        match *self {
            Type::Primitive(ref primitive) => Ok(Type::signed(primitive.bits)),
            _ => Err(Error::Unsupported(format!("signed variant of {}", self))),
        }
    }

    /// The pointee of a pointer type, or this type.
    pub fn unwrap_pointer(&self) -> &Type {
        match *self {
            Type::Pointer(ref pointee) => pointee.unwrap_pointer(),
            _ => self,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Type::Primitive(ref primitive) => write!(
                f,
                "{}{}",
                if primitive.signed { "i" } else { "u" },
                primitive.bits
            ),
            Type::Pointer(ref pointee) => write!(f, "{}*", pointee),
            Type::Struct(ref struct_) => write!(f, "struct {}", struct_.name),
            Type::Array(ref element, count) => write!(f, "{}[{}]", element, count),
        }
    }
}

/// Maps bitvector widths to declared types.
///
/// Widths up to 64 bits default to unsigned primitives of that exact width.
/// Wider widths which are a whole number of bytes default to byte arrays.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TypeContext {
    overrides: FxHashMap<usize, Type>,
}

impl TypeContext {
    pub fn new() -> TypeContext {
        TypeContext::default()
    }

    /// Declare the type used for bitvectors of `width` bits.
    ///
    /// # Errors
    /// The type's size is not `width` bits.
    pub fn declare(&mut self, width: usize, type_: Type) -> Result<(), Error> {
        if type_.bits() != width {
            return Err(Error::Sort);
        }
        self.overrides.insert(width, type_);
        Ok(())
    }

    /// The declared type for bitvectors of `width` bits.
    pub fn type_for(&self, width: usize) -> Result<Type, Error> {
        if let Some(type_) = self.overrides.get(&width) {
            return Ok(type_.clone());
        }
        if width == 0 {
            Err(Error::Sort)
        } else if width <= 64 {
            Ok(Type::unsigned(width))
        } else if width % 8 == 0 {
            Ok(Type::array(Type::u8(), width / 8))
        } else {
            Err(Error::Unaligned(width))
        }
    }
}
