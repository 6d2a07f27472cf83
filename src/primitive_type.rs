//! The schema-type classifier.
use serde_json::{Number, Value};
use std::{fmt, ops::BitOrAssign};

/// JSON Schema type names.
///
/// `integer` is a distinct schema type that also matches `number` values with
/// a zero fractional part.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[allow(missing_docs)]
pub enum PrimitiveType {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

const ARRAY: u8 = 1;
const BOOLEAN: u8 = 2;
const INTEGER: u8 = 4;
const NULL: u8 = 8;
const NUMBER: u8 = 16;
const OBJECT: u8 = 32;
const STRING: u8 = 64;

impl PrimitiveType {
    const fn to_bit(self) -> u8 {
        match self {
            PrimitiveType::Array => ARRAY,
            PrimitiveType::Boolean => BOOLEAN,
            PrimitiveType::Integer => INTEGER,
            PrimitiveType::Null => NULL,
            PrimitiveType::Number => NUMBER,
            PrimitiveType::Object => OBJECT,
            PrimitiveType::String => STRING,
        }
    }

    /// The schema type of `instance`. Integer-valued numbers classify as `integer`.
    pub(crate) fn of(instance: &Value) -> PrimitiveType {
        match instance {
            Value::Null => PrimitiveType::Null,
            Value::Bool(_) => PrimitiveType::Boolean,
            Value::Number(number) => {
                if is_integer(number) {
                    PrimitiveType::Integer
                } else {
                    PrimitiveType::Number
                }
            }
            Value::String(_) => PrimitiveType::String,
            Value::Array(_) => PrimitiveType::Array,
            Value::Object(_) => PrimitiveType::Object,
        }
    }
}

/// Whether a JSON number has an integral value.
#[inline]
pub(crate) fn is_integer(number: &Number) -> bool {
    number.is_u64() || number.is_i64() || number.as_f64().expect("Always valid").fract() == 0.
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Array => f.write_str("array"),
            PrimitiveType::Boolean => f.write_str("boolean"),
            PrimitiveType::Integer => f.write_str("integer"),
            PrimitiveType::Null => f.write_str("null"),
            PrimitiveType::Number => f.write_str("number"),
            PrimitiveType::Object => f.write_str("object"),
            PrimitiveType::String => f.write_str("string"),
        }
    }
}

impl TryFrom<&str> for PrimitiveType {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "array" => Ok(PrimitiveType::Array),
            "boolean" => Ok(PrimitiveType::Boolean),
            "integer" => Ok(PrimitiveType::Integer),
            "null" => Ok(PrimitiveType::Null),
            "number" => Ok(PrimitiveType::Number),
            "object" => Ok(PrimitiveType::Object),
            "string" => Ok(PrimitiveType::String),
            _ => Err(()),
        }
    }
}

/// Compact set of primitive types.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub(crate) struct PrimitiveTypesBitMap {
    inner: u8,
}

impl PrimitiveTypesBitMap {
    pub(crate) const fn new() -> Self {
        Self { inner: 0 }
    }

    #[inline]
    pub(crate) const fn add_type(mut self, primitive_type: PrimitiveType) -> Self {
        self.inner |= primitive_type.to_bit();
        self
    }

    pub(crate) const fn contains_type(self, primitive_type: PrimitiveType) -> bool {
        primitive_type.to_bit() & self.inner != 0
    }

    /// Whether `instance` satisfies the set. `integer` satisfies `number` and
    /// integer-valued numbers satisfy `integer`.
    pub(crate) fn is_valid(self, instance: &Value) -> bool {
        match instance {
            Value::Array(_) => self.contains_type(PrimitiveType::Array),
            Value::Bool(_) => self.contains_type(PrimitiveType::Boolean),
            Value::Null => self.contains_type(PrimitiveType::Null),
            Value::Number(number) => {
                self.contains_type(PrimitiveType::Number)
                    || (self.contains_type(PrimitiveType::Integer) && is_integer(number))
            }
            Value::Object(_) => self.contains_type(PrimitiveType::Object),
            Value::String(_) => self.contains_type(PrimitiveType::String),
        }
    }
}

impl BitOrAssign<PrimitiveType> for PrimitiveTypesBitMap {
    #[inline]
    fn bitor_assign(&mut self, rhs: PrimitiveType) {
        *self = self.add_type(rhs);
    }
}

impl IntoIterator for PrimitiveTypesBitMap {
    type Item = PrimitiveType;
    type IntoIter = PrimitiveTypesBitMapIterator;
    fn into_iter(self) -> Self::IntoIter {
        PrimitiveTypesBitMapIterator { bit_map: self }
    }
}

pub(crate) struct PrimitiveTypesBitMapIterator {
    bit_map: PrimitiveTypesBitMap,
}

impl Iterator for PrimitiveTypesBitMapIterator {
    type Item = PrimitiveType;

    fn next(&mut self) -> Option<Self::Item> {
        for (bit, primitive_type) in [
            (ARRAY, PrimitiveType::Array),
            (BOOLEAN, PrimitiveType::Boolean),
            (INTEGER, PrimitiveType::Integer),
            (NULL, PrimitiveType::Null),
            (NUMBER, PrimitiveType::Number),
            (OBJECT, PrimitiveType::Object),
            (STRING, PrimitiveType::String),
        ] {
            if self.bit_map.inner & bit != 0 {
                self.bit_map.inner &= !bit;
                return Some(primitive_type);
            }
        }
        None
    }
}
