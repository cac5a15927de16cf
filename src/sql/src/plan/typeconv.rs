// Copyright Quill Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Maps SQL values to the types of the columns they are assigned to.
//!
//! Casts planned here run on the write path of a mutation, so the rules are
//! stricter than those for ordinary expressions: a conversion is only
//! planned when the active [`StoreAssignmentPolicy`] considers it safe, and
//! conversions that can fail do so at evaluation time rather than storing a
//! truncated value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use quill_expr::{ScalarExpr, UnaryFunc, VariadicFunc};
use quill_ore::str::StrExt;
use quill_repr::{ColumnName, ColumnType, ScalarType};

use crate::plan::error::PlanError;

/// The store assignment rules in effect for a statement.
///
/// The SQL standard calls the conversion applied when a value is written to
/// a column a "store assignment". Sessions choose among the following rule
/// sets.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub enum StoreAssignmentPolicy {
    /// Permits implicit-safe conversions plus numeric narrowing, with the
    /// narrowing conversions checked at evaluation time: writing an
    /// out-of-range value fails the statement rather than truncating.
    Ansi,
    /// Permits only implicit-safe conversions: identical types and
    /// widening.
    Strict,
    /// The truncating rules of legacy SQL engines. Never permitted for
    /// row-level mutations.
    Legacy,
}

impl Default for StoreAssignmentPolicy {
    fn default() -> Self {
        StoreAssignmentPolicy::Ansi
    }
}

impl fmt::Display for StoreAssignmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreAssignmentPolicy::Ansi => f.write_str("ANSI"),
            StoreAssignmentPolicy::Strict => f.write_str("STRICT"),
            StoreAssignmentPolicy::Legacy => f.write_str("LEGACY"),
        }
    }
}

impl FromStr for StoreAssignmentPolicy {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ansi" => Ok(StoreAssignmentPolicy::Ansi),
            "strict" => Ok(StoreAssignmentPolicy::Strict),
            "legacy" => Ok(StoreAssignmentPolicy::Legacy),
            _ => Err(PlanError::Unstructured(format!(
                "invalid store assignment policy: {}",
                s.quoted()
            ))),
        }
    }
}

/// The context in which a cast is permitted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum CastContext {
    /// The cast is safe in any context: it cannot fail and loses no
    /// information.
    Implicit,
    /// The cast is permitted only when a value is stored to a column under
    /// the ANSI policy. It may fail at evaluation time.
    Assignment,
}

/// Plans a cast of `expr` (of type `typ`) for storage into a column or
/// nested field of type `dest` at `path`.
///
/// On success the returned expression has exactly the shape of `dest`:
/// record values are reordered to declared field order, values destined for
/// fixed-length character fields are wrapped in the write-side length
/// checks, and nullable values destined for non-nullable fields are wrapped
/// in a runtime not-null assertion naming `path`.
pub fn plan_assignment_cast(
    policy: StoreAssignmentPolicy,
    path: &[ColumnName],
    dest: &ColumnType,
    expr: ScalarExpr,
    typ: &ColumnType,
) -> Result<ScalarExpr, PlanError> {
    if let StoreAssignmentPolicy::Legacy = policy {
        return Err(PlanError::UnsupportedPolicy { policy });
    }
    let mut path = path.to_vec();
    plan_cast(policy, &mut path, dest, expr, typ)
}

fn plan_cast(
    policy: StoreAssignmentPolicy,
    path: &mut Vec<ColumnName>,
    dest: &ColumnType,
    expr: ScalarExpr,
    typ: &ColumnType,
) -> Result<ScalarExpr, PlanError> {
    let unsafe_cast = |typ: &ColumnType| PlanError::UnsafeCast {
        from: typ.scalar_type.clone(),
        to: dest.scalar_type.clone(),
        policy,
    };

    let out = if expr.is_existing_value_ref() && typ.scalar_type == dest.scalar_type {
        // An unmodified read of a column (or field of a column) that
        // already has the destination's exact declared type needs no
        // conversion and no write-side check.
        expr
    } else {
        match (&dest.scalar_type, &typ.scalar_type) {
            (ScalarType::Char { length }, src) if src.is_string_like() => {
                expr.call_unary(UnaryFunc::PadChar { length: *length })
            }
            (ScalarType::VarChar { max_length }, src) if src.is_string_like() => {
                expr.call_unary(UnaryFunc::CastStringToVarChar {
                    max_length: *max_length,
                    fail_on_len: true,
                })
            }
            (ScalarType::Record { fields }, ScalarType::Record { .. }) => {
                plan_record_cast(policy, path, fields, expr, typ)?
            }
            (ScalarType::Array(dest_elem), ScalarType::Array(src_elem)) => {
                if dest_elem == src_elem && !contains_fixed_length_string(dest_elem) {
                    expr
                } else {
                    let body = plan_cast(
                        policy,
                        path,
                        &(**dest_elem).clone().nullable(true),
                        ScalarExpr::ElementRef,
                        &(**src_elem).clone().nullable(true),
                    )?;
                    expr.transform_array_elements(body)
                }
            }
            (
                ScalarType::Map {
                    key_type: dest_key,
                    value_type: dest_value,
                },
                ScalarType::Map {
                    key_type: src_key,
                    value_type: src_value,
                },
            ) => {
                if dest_key != src_key {
                    return Err(unsafe_cast(typ));
                }
                if dest_value == src_value && !contains_fixed_length_string(dest_value) {
                    expr
                } else {
                    let body = plan_cast(
                        policy,
                        path,
                        &(**dest_value).clone().nullable(true),
                        ScalarExpr::ElementRef,
                        &(**src_value).clone().nullable(true),
                    )?;
                    expr.transform_map_values(body)
                }
            }
            (dest_type, src_type) if dest_type == src_type => expr,
            (dest_type, src_type) => match direct_cast(src_type, dest_type) {
                Some((func, CastContext::Implicit)) => expr.call_unary(func),
                Some((func, CastContext::Assignment)) => match policy {
                    StoreAssignmentPolicy::Ansi => expr.call_unary(func),
                    _ => return Err(unsafe_cast(typ)),
                },
                None => return Err(unsafe_cast(typ)),
            },
        }
    };

    if typ.nullable && !dest.nullable {
        Ok(out.call_unary(UnaryFunc::AssertNotNull {
            path: path.clone(),
        }))
    } else {
        Ok(out)
    }
}

/// Plans a cast of a record value field by field.
///
/// Record literals are matched to the declared fields by name and re-emitted
/// in declared order, so `record_create[b, a](..)` stores correctly into a
/// column declared as `record(a ..., b ...)`. Any other record-typed value
/// is decomposed positionally with field accesses; its field names must
/// already agree with the declaration.
fn plan_record_cast(
    policy: StoreAssignmentPolicy,
    path: &mut Vec<ColumnName>,
    dest_fields: &[(ColumnName, ColumnType)],
    expr: ScalarExpr,
    typ: &ColumnType,
) -> Result<ScalarExpr, PlanError> {
    let src_fields = typ.scalar_type.unwrap_record_fields();

    if let ScalarExpr::CallVariadic {
        func: VariadicFunc::RecordCreate { field_names },
        exprs,
    } = &expr
    {
        for (i, name) in field_names.iter().enumerate() {
            if field_names[..i].contains(name) {
                return Err(PlanError::Unstructured(format!(
                    "field {} specified more than once",
                    name.as_str().quoted()
                )));
            }
        }
        for name in field_names {
            if !dest_fields.iter().any(|(n, _)| n == name) {
                let mut unknown = path.clone();
                unknown.push(name.clone());
                return Err(PlanError::UnknownColumn { path: unknown });
            }
        }
        let mut out_names = Vec::with_capacity(dest_fields.len());
        let mut out_exprs = Vec::with_capacity(dest_fields.len());
        for (dest_name, dest_typ) in dest_fields {
            let p = match field_names.iter().position(|n| n == dest_name) {
                Some(p) => p,
                None => {
                    let mut missing = path.clone();
                    missing.push(dest_name.clone());
                    return Err(PlanError::MissingField { path: missing });
                }
            };
            path.push(dest_name.clone());
            let field =
                plan_cast(policy, path, dest_typ, exprs[p].clone(), &src_fields[p].1)?;
            path.pop();
            out_names.push(dest_name.clone());
            out_exprs.push(field);
        }
        return Ok(ScalarExpr::CallVariadic {
            func: VariadicFunc::RecordCreate {
                field_names: out_names,
            },
            exprs: out_exprs,
        });
    }

    if src_fields.len() > dest_fields.len() {
        return Err(PlanError::UnsafeCast {
            from: typ.scalar_type.clone(),
            to: ScalarType::Record {
                fields: dest_fields.to_vec(),
            },
            policy,
        });
    }
    let mut out_names = Vec::with_capacity(dest_fields.len());
    let mut out_exprs = Vec::with_capacity(dest_fields.len());
    for (i, (dest_name, dest_typ)) in dest_fields.iter().enumerate() {
        match src_fields.get(i) {
            Some((src_name, src_typ)) if src_name == dest_name => {
                let src_typ = src_typ
                    .clone()
                    .nullable(src_typ.nullable || typ.nullable);
                let field_expr = expr.clone().call_unary(UnaryFunc::RecordGet(i));
                path.push(dest_name.clone());
                let field = plan_cast(policy, path, dest_typ, field_expr, &src_typ)?;
                path.pop();
                out_names.push(dest_name.clone());
                out_exprs.push(field);
            }
            Some(_) => {
                return Err(PlanError::UnsafeCast {
                    from: typ.scalar_type.clone(),
                    to: ScalarType::Record {
                        fields: dest_fields.to_vec(),
                    },
                    policy,
                })
            }
            None => {
                let mut missing = path.clone();
                missing.push(dest_name.clone());
                return Err(PlanError::MissingField { path: missing });
            }
        }
    }
    Ok(ScalarExpr::CallVariadic {
        func: VariadicFunc::RecordCreate {
            field_names: out_names,
        },
        exprs: out_exprs,
    })
}

/// Looks up the function implementing a cast between two non-container
/// types, along with the context in which the cast is permitted.
fn direct_cast(from: &ScalarType, to: &ScalarType) -> Option<(UnaryFunc, CastContext)> {
    use CastContext::*;
    use ScalarType::*;
    use UnaryFunc::*;
    let cast = match (from, to) {
        // Numeric widening, in precedence order:
        // smallint < integer < bigint < real < double precision.
        (Int16, Int32) => (CastInt16ToInt32, Implicit),
        (Int16, Int64) => (CastInt16ToInt64, Implicit),
        (Int16, Float32) => (CastInt16ToFloat32, Implicit),
        (Int16, Float64) => (CastInt16ToFloat64, Implicit),
        (Int32, Int64) => (CastInt32ToInt64, Implicit),
        (Int32, Float32) => (CastInt32ToFloat32, Implicit),
        (Int32, Float64) => (CastInt32ToFloat64, Implicit),
        (Int64, Float32) => (CastInt64ToFloat32, Implicit),
        (Int64, Float64) => (CastInt64ToFloat64, Implicit),
        (Float32, Float64) => (CastFloat32ToFloat64, Implicit),
        // Numeric narrowing. Checked at evaluation time.
        (Int32, Int16) => (CastInt32ToInt16, Assignment),
        (Int64, Int16) => (CastInt64ToInt16, Assignment),
        (Int64, Int32) => (CastInt64ToInt32, Assignment),
        (Float32, Int16) => (CastFloat32ToInt16, Assignment),
        (Float32, Int32) => (CastFloat32ToInt32, Assignment),
        (Float32, Int64) => (CastFloat32ToInt64, Assignment),
        (Float64, Int16) => (CastFloat64ToInt16, Assignment),
        (Float64, Int32) => (CastFloat64ToInt32, Assignment),
        (Float64, Int64) => (CastFloat64ToInt64, Assignment),
        (Float64, Float32) => (CastFloat64ToFloat32, Assignment),
        // Everything stringifies under ANSI store assignment rules.
        (Bool, String) => (CastBoolToString, Assignment),
        (Int16, String) => (CastInt16ToString, Assignment),
        (Int32, String) => (CastInt32ToString, Assignment),
        (Int64, String) => (CastInt64ToString, Assignment),
        (Float32, String) => (CastFloat32ToString, Assignment),
        (Float64, String) => (CastFloat64ToString, Assignment),
        (Char { .. }, String) => (CastCharToString, Implicit),
        (VarChar { .. }, String) => (CastVarCharToString, Implicit),
        _ => return None,
    };
    Some(cast)
}

/// Reports whether a value of the given type contains a fixed-length
/// character field anywhere in its shape, and therefore cannot skip the
/// write-side checks even when the source type matches exactly.
fn contains_fixed_length_string(typ: &ScalarType) -> bool {
    match typ {
        ScalarType::Char { .. } | ScalarType::VarChar { .. } => true,
        ScalarType::Record { fields } => fields
            .iter()
            .any(|(_, typ)| contains_fixed_length_string(&typ.scalar_type)),
        ScalarType::Array(element_type) => contains_fixed_length_string(element_type),
        ScalarType::Map {
            key_type,
            value_type,
        } => contains_fixed_length_string(key_type) || contains_fixed_length_string(value_type),
        _ => false,
    }
}
