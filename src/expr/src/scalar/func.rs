// Copyright Quill Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;

use serde::{Deserialize, Serialize};

use quill_ore::str::separated;
use quill_repr::adt::char::CharLength;
use quill_repr::adt::varchar::VarCharMaxLength;
use quill_repr::{ColumnName, ColumnType, ScalarType};

/// A function that takes one expression as an argument.
///
/// The `Cast*To*` variants between two numeric types come in two flavors.
/// Widening casts (e.g. [`UnaryFunc::CastInt32ToInt64`]) always succeed.
/// Narrowing casts (e.g. [`UnaryFunc::CastInt64ToInt32`]) fail at
/// evaluation time when the input is out of range for the output type;
/// they never truncate.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum UnaryFunc {
    CastInt16ToInt32,
    CastInt16ToInt64,
    CastInt16ToFloat32,
    CastInt16ToFloat64,
    CastInt32ToInt64,
    CastInt32ToFloat32,
    CastInt32ToFloat64,
    CastInt64ToFloat32,
    CastInt64ToFloat64,
    CastFloat32ToFloat64,
    CastInt32ToInt16,
    CastInt64ToInt16,
    CastInt64ToInt32,
    CastFloat32ToInt16,
    CastFloat32ToInt32,
    CastFloat32ToInt64,
    CastFloat64ToInt16,
    CastFloat64ToInt32,
    CastFloat64ToInt64,
    CastFloat64ToFloat32,
    CastBoolToString,
    CastInt16ToString,
    CastInt32ToString,
    CastInt64ToString,
    CastFloat32ToString,
    CastFloat64ToString,
    /// Converts a `char` value to `text`, stripping trailing blanks.
    CastCharToString,
    /// Converts a `varchar` value to `text`. A representational no-op.
    CastVarCharToString,
    /// Restores the blank padding of a `char` value to the declared width.
    ///
    /// All `char` data is carried with its blank padding trimmed, so this
    /// function runs whenever a value is written to a `char` column.
    PadChar {
        length: Option<CharLength>,
    },
    /// Converts a string value to `varchar`, enforcing the declared maximum
    /// length.
    ///
    /// When `fail_on_len` is set, evaluation fails if the input exceeds
    /// `max_length`; otherwise the input is truncated.
    CastStringToVarChar {
        max_length: Option<VarCharMaxLength>,
        fail_on_len: bool,
    },
    /// Extracts the field at the given index from a record value.
    RecordGet(usize),
    /// Passes the input through unchanged, but fails at evaluation time if
    /// the input is null.
    ///
    /// The path names the schema location being enforced, e.g.
    /// `["s", "n_s", "dn_i"]`, so the evaluation error can point at the
    /// offending field rather than the whole statement.
    AssertNotNull {
        path: Vec<ColumnName>,
    },
}

impl UnaryFunc {
    /// Reports the type of the function's output given the type of its
    /// input.
    pub fn output_type(&self, input_type: ColumnType) -> ColumnType {
        use UnaryFunc::*;
        let in_nullable = input_type.nullable;
        match self {
            CastInt16ToInt32 | CastFloat32ToInt32 | CastFloat64ToInt32 | CastInt64ToInt32 => {
                ScalarType::Int32.nullable(in_nullable)
            }
            CastInt16ToInt64 | CastInt32ToInt64 | CastFloat32ToInt64 | CastFloat64ToInt64 => {
                ScalarType::Int64.nullable(in_nullable)
            }
            CastInt32ToInt16 | CastInt64ToInt16 | CastFloat32ToInt16 | CastFloat64ToInt16 => {
                ScalarType::Int16.nullable(in_nullable)
            }
            CastInt16ToFloat32 | CastInt32ToFloat32 | CastInt64ToFloat32
            | CastFloat64ToFloat32 => ScalarType::Float32.nullable(in_nullable),
            CastInt16ToFloat64 | CastInt32ToFloat64 | CastInt64ToFloat64
            | CastFloat32ToFloat64 => ScalarType::Float64.nullable(in_nullable),
            CastBoolToString | CastInt16ToString | CastInt32ToString | CastInt64ToString
            | CastFloat32ToString | CastFloat64ToString | CastCharToString
            | CastVarCharToString => ScalarType::String.nullable(in_nullable),
            PadChar { length } => ScalarType::Char { length: *length }.nullable(in_nullable),
            CastStringToVarChar { max_length, .. } => ScalarType::VarChar {
                max_length: *max_length,
            }
            .nullable(in_nullable),
            RecordGet(i) => {
                let (_name, typ) = &input_type.scalar_type.unwrap_record_fields()[*i];
                typ.clone().nullable(typ.nullable || in_nullable)
            }
            AssertNotNull { .. } => input_type.nullable(false),
        }
    }

    /// Reports whether evaluating the function can fail.
    pub fn could_error(&self) -> bool {
        use UnaryFunc::*;
        match self {
            CastInt32ToInt16 | CastInt64ToInt16 | CastInt64ToInt32 | CastFloat32ToInt16
            | CastFloat32ToInt32 | CastFloat32ToInt64 | CastFloat64ToInt16
            | CastFloat64ToInt32 | CastFloat64ToInt64 | CastFloat64ToFloat32 => true,
            CastStringToVarChar { fail_on_len, .. } => *fail_on_len,
            AssertNotNull { .. } => true,
            _ => false,
        }
    }
}

impl fmt::Display for UnaryFunc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use UnaryFunc::*;
        match self {
            CastInt16ToInt32 => f.write_str("i16toi32"),
            CastInt16ToInt64 => f.write_str("i16toi64"),
            CastInt16ToFloat32 => f.write_str("i16tof32"),
            CastInt16ToFloat64 => f.write_str("i16tof64"),
            CastInt32ToInt64 => f.write_str("i32toi64"),
            CastInt32ToFloat32 => f.write_str("i32tof32"),
            CastInt32ToFloat64 => f.write_str("i32tof64"),
            CastInt64ToFloat32 => f.write_str("i64tof32"),
            CastInt64ToFloat64 => f.write_str("i64tof64"),
            CastFloat32ToFloat64 => f.write_str("f32tof64"),
            CastInt32ToInt16 => f.write_str("i32toi16"),
            CastInt64ToInt16 => f.write_str("i64toi16"),
            CastInt64ToInt32 => f.write_str("i64toi32"),
            CastFloat32ToInt16 => f.write_str("f32toi16"),
            CastFloat32ToInt32 => f.write_str("f32toi32"),
            CastFloat32ToInt64 => f.write_str("f32toi64"),
            CastFloat64ToInt16 => f.write_str("f64toi16"),
            CastFloat64ToInt32 => f.write_str("f64toi32"),
            CastFloat64ToInt64 => f.write_str("f64toi64"),
            CastFloat64ToFloat32 => f.write_str("f64tof32"),
            CastBoolToString => f.write_str("booltostr"),
            CastInt16ToString => f.write_str("i16tostr"),
            CastInt32ToString => f.write_str("i32tostr"),
            CastInt64ToString => f.write_str("i64tostr"),
            CastFloat32ToString => f.write_str("f32tostr"),
            CastFloat64ToString => f.write_str("f64tostr"),
            CastCharToString => f.write_str("chartostr"),
            CastVarCharToString => f.write_str("varchartostr"),
            PadChar { .. } => f.write_str("padchar"),
            CastStringToVarChar { .. } => f.write_str("strtovarchar"),
            RecordGet(i) => write!(f, "record_get[{}]", i),
            AssertNotNull { .. } => f.write_str("assert_not_null"),
        }
    }
}

/// A function that takes an arbitrary number of arguments.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum VariadicFunc {
    /// Constructs a record from its arguments, with the given field names.
    RecordCreate {
        field_names: Vec<ColumnName>,
    },
    /// Constructs an array of the given element type from its arguments.
    ArrayCreate {
        elem_type: ScalarType,
    },
    /// Constructs a map from its arguments, which alternate between keys
    /// and values.
    MapBuild {
        key_type: ScalarType,
        value_type: ScalarType,
    },
}

impl VariadicFunc {
    /// Reports the type of the function's output given the types of its
    /// inputs.
    pub fn output_type(&self, input_types: Vec<ColumnType>) -> ColumnType {
        match self {
            VariadicFunc::RecordCreate { field_names } => ScalarType::Record {
                fields: field_names
                    .iter()
                    .cloned()
                    .zip(input_types)
                    .collect(),
            }
            .nullable(false),
            VariadicFunc::ArrayCreate { elem_type } => {
                ScalarType::Array(Box::new(elem_type.clone())).nullable(false)
            }
            VariadicFunc::MapBuild {
                key_type,
                value_type,
            } => ScalarType::Map {
                key_type: Box::new(key_type.clone()),
                value_type: Box::new(value_type.clone()),
            }
            .nullable(false),
        }
    }
}

impl fmt::Display for VariadicFunc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VariadicFunc::RecordCreate { field_names } => {
                write!(f, "record_create[{}]", separated(", ", field_names.iter()))
            }
            VariadicFunc::ArrayCreate { .. } => f.write_str("array_create"),
            VariadicFunc::MapBuild { .. } => f.write_str("map_build"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_casts_could_error() {
        assert!(UnaryFunc::CastInt64ToInt32.could_error());
        assert!(UnaryFunc::CastFloat64ToFloat32.could_error());
        assert!(!UnaryFunc::CastInt32ToInt64.could_error());
        assert!(!UnaryFunc::CastFloat32ToFloat64.could_error());
        assert!(UnaryFunc::CastStringToVarChar {
            max_length: None,
            fail_on_len: true
        }
        .could_error());
        assert!(!UnaryFunc::CastStringToVarChar {
            max_length: None,
            fail_on_len: false
        }
        .could_error());
    }

    #[test]
    fn record_get_output_type() {
        let record = ScalarType::Record {
            fields: vec![
                ("a".into(), ScalarType::Int32.nullable(false)),
                ("b".into(), ScalarType::String.nullable(true)),
            ],
        };
        let typ = UnaryFunc::RecordGet(0).output_type(record.clone().nullable(true));
        assert_eq!(typ, ScalarType::Int32.nullable(true));
        let typ = UnaryFunc::RecordGet(0).output_type(record.nullable(false));
        assert_eq!(typ, ScalarType::Int32.nullable(false));
    }

    #[test]
    fn record_create_output_type() {
        let func = VariadicFunc::RecordCreate {
            field_names: vec!["x".into(), "y".into()],
        };
        let typ = func.output_type(vec![
            ScalarType::Int64.nullable(true),
            ScalarType::Bool.nullable(false),
        ]);
        assert_eq!(
            typ,
            ScalarType::Record {
                fields: vec![
                    ("x".into(), ScalarType::Int64.nullable(true)),
                    ("y".into(), ScalarType::Bool.nullable(false)),
                ],
            }
            .nullable(false)
        );
    }
}
