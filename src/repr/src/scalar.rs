// Copyright Quill Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use quill_ore::str::StrExt;

use crate::adt::char::CharLength;
use crate::adt::varchar::VarCharMaxLength;
use crate::{ColumnName, ColumnType};

/// An owned scalar value.
///
/// Analysis passes only ever carry literals symbolically, so unlike an
/// execution-oriented representation there is no packed or borrowed form:
/// a `Datum` owns its data outright.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Datum {
    /// An unknown value.
    Null,
    /// The `false` boolean value.
    False,
    /// The `true` boolean value.
    True,
    /// A 16-bit signed integer.
    Int16(i16),
    /// A 32-bit signed integer.
    Int32(i32),
    /// A 64-bit signed integer.
    Int64(i64),
    /// A 32-bit floating point number.
    Float32(OrderedFloat<f32>),
    /// A 64-bit floating point number.
    Float64(OrderedFloat<f64>),
    /// A sequence of untyped bytes.
    Bytes(Vec<u8>),
    /// A sequence of Unicode codepoints encoded as UTF-8.
    String(String),
}

impl Datum {
    /// Reports whether this datum is `Datum::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("null"),
            Datum::False => f.write_str("false"),
            Datum::True => f.write_str("true"),
            Datum::Int16(n) => write!(f, "{}", n),
            Datum::Int32(n) => write!(f, "{}", n),
            Datum::Int64(n) => write!(f, "{}", n),
            Datum::Float32(n) => write!(f, "{}", n),
            Datum::Float64(n) => write!(f, "{}", n),
            Datum::Bytes(b) => {
                f.write_str("\\x")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            Datum::String(s) => write!(f, "{}", s.quoted()),
        }
    }
}

impl From<i16> for Datum {
    fn from(n: i16) -> Datum {
        Datum::Int16(n)
    }
}

impl From<i32> for Datum {
    fn from(n: i32) -> Datum {
        Datum::Int32(n)
    }
}

impl From<i64> for Datum {
    fn from(n: i64) -> Datum {
        Datum::Int64(n)
    }
}

impl From<f32> for Datum {
    fn from(n: f32) -> Datum {
        Datum::Float32(OrderedFloat(n))
    }
}

impl From<f64> for Datum {
    fn from(n: f64) -> Datum {
        Datum::Float64(OrderedFloat(n))
    }
}

impl From<bool> for Datum {
    fn from(b: bool) -> Datum {
        if b {
            Datum::True
        } else {
            Datum::False
        }
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Datum {
        Datum::String(s.into())
    }
}

/// The type of a [`Datum`], including the nested types a datum cannot
/// itself represent.
///
/// [`ScalarType::Record`], [`ScalarType::Array`], and [`ScalarType::Map`]
/// describe container values. Analysis passes construct and deconstruct
/// containers symbolically via expressions, so no corresponding `Datum`
/// variants exist.
#[derive(
    Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub enum ScalarType {
    /// The type of [`Datum::True`] and [`Datum::False`].
    Bool,
    /// The type of [`Datum::Int16`].
    Int16,
    /// The type of [`Datum::Int32`].
    Int32,
    /// The type of [`Datum::Int64`].
    Int64,
    /// The type of [`Datum::Float32`].
    Float32,
    /// The type of [`Datum::Float64`].
    Float64,
    /// The type of [`Datum::Bytes`].
    Bytes,
    /// The type of [`Datum::String`].
    String,
    /// Stored as [`Datum::String`], but expresses a fixed-width,
    /// blank-padded string.
    Char {
        /// The declared width. `None` expresses a `char` with no declared
        /// width, which a handful of cast paths produce.
        length: Option<CharLength>,
    },
    /// Stored as [`Datum::String`], but can optionally express a limit on
    /// the string's length.
    VarChar {
        /// The declared maximum length, if any.
        max_length: Option<VarCharMaxLength>,
    },
    /// An ordered and named sequence of values.
    Record {
        /// The names and types of the fields of the record, in order from
        /// left to right.
        fields: Vec<(ColumnName, ColumnType)>,
    },
    /// A variable-length array.
    ///
    /// Elements within the array are of the specified type. Array elements
    /// may always be null.
    Array(Box<ScalarType>),
    /// An unordered map.
    ///
    /// Keys within the map are of the first specified type and values of
    /// the second. Values may always be null.
    Map {
        /// The type of the map's keys.
        key_type: Box<ScalarType>,
        /// The type of the map's values.
        value_type: Box<ScalarType>,
    },
}

impl ScalarType {
    /// Derives a [`ColumnType`] from `self` with the specified nullability.
    pub fn nullable(self, nullable: bool) -> ColumnType {
        ColumnType {
            scalar_type: self,
            nullable,
        }
    }

    /// Reports whether this type is stored as [`Datum::String`].
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            ScalarType::String | ScalarType::Char { .. } | ScalarType::VarChar { .. }
        )
    }

    /// Returns the fields of a [`ScalarType::Record`].
    ///
    /// # Panics
    ///
    /// Panics if called on a non-record type.
    pub fn unwrap_record_fields(&self) -> &[(ColumnName, ColumnType)] {
        match self {
            ScalarType::Record { fields } => fields,
            _ => panic!("ScalarType::unwrap_record_fields called on {:?}", self),
        }
    }

    /// Returns the element type of a [`ScalarType::Array`].
    ///
    /// # Panics
    ///
    /// Panics if called on a non-array type.
    pub fn unwrap_array_element_type(&self) -> &ScalarType {
        match self {
            ScalarType::Array(element_type) => element_type,
            _ => panic!("ScalarType::unwrap_array_element_type called on {:?}", self),
        }
    }

    /// Returns the value type of a [`ScalarType::Map`].
    ///
    /// # Panics
    ///
    /// Panics if called on a non-map type.
    pub fn unwrap_map_value_type(&self) -> &ScalarType {
        match self {
            ScalarType::Map { value_type, .. } => value_type,
            _ => panic!("ScalarType::unwrap_map_value_type called on {:?}", self),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::Bool => f.write_str("boolean"),
            ScalarType::Int16 => f.write_str("smallint"),
            ScalarType::Int32 => f.write_str("integer"),
            ScalarType::Int64 => f.write_str("bigint"),
            ScalarType::Float32 => f.write_str("real"),
            ScalarType::Float64 => f.write_str("double precision"),
            ScalarType::Bytes => f.write_str("bytea"),
            ScalarType::String => f.write_str("text"),
            ScalarType::Char { length: Some(l) } => write!(f, "character({})", l),
            ScalarType::Char { length: None } => f.write_str("character"),
            ScalarType::VarChar { max_length: Some(l) } => {
                write!(f, "character varying({})", l)
            }
            ScalarType::VarChar { max_length: None } => f.write_str("character varying"),
            ScalarType::Record { fields } => {
                f.write_str("record(")?;
                for (i, (name, typ)) in fields.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {}", name, typ.scalar_type)?;
                }
                f.write_str(")")
            }
            ScalarType::Array(element_type) => write!(f, "{}[]", element_type),
            ScalarType::Map {
                key_type,
                value_type,
            } => write!(f, "map[{}=>{}]", key_type, value_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_type_display() {
        let record = ScalarType::Record {
            fields: vec![
                ("a".into(), ScalarType::Int32.nullable(true)),
                ("b".into(), ScalarType::Int64.nullable(false)),
            ],
        };
        assert_eq!(record.to_string(), "record(a integer, b bigint)");
        assert_eq!(
            ScalarType::Array(Box::new(ScalarType::Int32)).to_string(),
            "integer[]"
        );
        assert_eq!(
            ScalarType::Map {
                key_type: Box::new(ScalarType::String),
                value_type: Box::new(record),
            }
            .to_string(),
            "map[text=>record(a integer, b bigint)]"
        );
        assert_eq!(
            ScalarType::Char {
                length: Some(CharLength::try_from(5i64).unwrap())
            }
            .to_string(),
            "character(5)"
        );
    }

    #[test]
    fn datum_display() {
        assert_eq!(Datum::from("foo").to_string(), "\"foo\"");
        assert_eq!(Datum::from(42i32).to_string(), "42");
        assert_eq!(Datum::Null.to_string(), "null");
        assert_eq!(Datum::Bytes(vec![0xde, 0xad]).to_string(), "\\xdead");
    }
}
