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
use quill_repr::{ColumnType, Datum, ScalarType};

use self::func::{UnaryFunc, VariadicFunc};

pub mod func;

/// A scalar expression.
///
/// Expressions are constructed by the analysis passes in `quill-sql` and
/// consumed by the execution planner. [`ScalarExpr::Column`] references
/// always name a column of the statement's target relation; there is no
/// notion of scope levels because the analyses that produce these trees
/// operate on a single relation at a time.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum ScalarExpr {
    /// A column of the target relation's pre-update row.
    Column(usize),
    /// The element bound by the nearest enclosing
    /// [`ScalarExpr::TransformArrayElements`] or
    /// [`ScalarExpr::TransformMapValues`].
    ElementRef,
    /// A literal value.
    Literal(Datum, ColumnType),
    /// A function call that takes one expression as an argument.
    CallUnary {
        func: UnaryFunc,
        expr: Box<ScalarExpr>,
    },
    /// A function call that takes an arbitrary number of arguments.
    CallVariadic {
        func: VariadicFunc,
        exprs: Vec<ScalarExpr>,
    },
    /// Reconstructs an array by applying `body` to each element of `input`.
    ///
    /// Within `body`, [`ScalarExpr::ElementRef`] refers to the element being
    /// transformed. The output array has one element per input element, in
    /// the same order.
    TransformArrayElements {
        input: Box<ScalarExpr>,
        body: Box<ScalarExpr>,
    },
    /// Reconstructs a map by applying `body` to each value of `input`,
    /// preserving the keys.
    ///
    /// Within `body`, [`ScalarExpr::ElementRef`] refers to the value being
    /// transformed.
    TransformMapValues {
        input: Box<ScalarExpr>,
        body: Box<ScalarExpr>,
    },
}

impl ScalarExpr {
    /// Constructs an expression referencing the given column of the target
    /// relation.
    pub fn column(column: usize) -> Self {
        ScalarExpr::Column(column)
    }

    /// Constructs a literal expression of the given type.
    ///
    /// The literal's column type is nullable iff the datum is
    /// [`Datum::Null`].
    pub fn literal(datum: Datum, scalar_type: ScalarType) -> Self {
        let nullable = datum.is_null();
        ScalarExpr::Literal(datum, scalar_type.nullable(nullable))
    }

    /// Constructs a null literal of the given type.
    pub fn literal_null(scalar_type: ScalarType) -> Self {
        ScalarExpr::literal(Datum::Null, scalar_type)
    }

    /// Applies a unary function to this expression.
    pub fn call_unary(self, func: UnaryFunc) -> Self {
        ScalarExpr::CallUnary {
            func,
            expr: Box::new(self),
        }
    }

    /// Transforms this expression's array elements with `body`.
    pub fn transform_array_elements(self, body: ScalarExpr) -> Self {
        ScalarExpr::TransformArrayElements {
            input: Box::new(self),
            body: Box::new(body),
        }
    }

    /// Transforms this expression's map values with `body`.
    pub fn transform_map_values(self, body: ScalarExpr) -> Self {
        ScalarExpr::TransformMapValues {
            input: Box::new(self),
            body: Box::new(body),
        }
    }

    /// Reports whether this expression is a pure reference to existing
    /// data: a column of the pre-update row, or a chain of record field
    /// accesses over one.
    pub fn is_existing_value_ref(&self) -> bool {
        match self {
            ScalarExpr::Column(_) => true,
            ScalarExpr::CallUnary {
                func: UnaryFunc::RecordGet(_),
                expr,
            } => expr.is_existing_value_ref(),
            _ => false,
        }
    }

    /// Computes the type of this expression, given the types of the target
    /// relation's columns.
    ///
    /// # Panics
    ///
    /// Panics if the expression is ill-formed, e.g. a
    /// [`ScalarExpr::ElementRef`] outside of a transform or a
    /// [`UnaryFunc::RecordGet`] over a non-record input.
    pub fn typ(&self, column_types: &[ColumnType]) -> ColumnType {
        self.typ_inner(column_types, &mut Vec::new())
    }

    fn typ_inner(
        &self,
        column_types: &[ColumnType],
        element_types: &mut Vec<ColumnType>,
    ) -> ColumnType {
        match self {
            ScalarExpr::Column(i) => column_types[*i].clone(),
            ScalarExpr::ElementRef => element_types
                .last()
                .expect("ElementRef outside of a transform")
                .clone(),
            ScalarExpr::Literal(_, typ) => typ.clone(),
            ScalarExpr::CallUnary { func, expr } => {
                func.output_type(expr.typ_inner(column_types, element_types))
            }
            ScalarExpr::CallVariadic { func, exprs } => func.output_type(
                exprs
                    .iter()
                    .map(|e| e.typ_inner(column_types, element_types))
                    .collect(),
            ),
            ScalarExpr::TransformArrayElements { input, body } => {
                let input_typ = input.typ_inner(column_types, element_types);
                let elem_typ = input_typ
                    .scalar_type
                    .unwrap_array_element_type()
                    .clone()
                    .nullable(true);
                element_types.push(elem_typ);
                let body_typ = body.typ_inner(column_types, element_types);
                element_types.pop();
                ScalarType::Array(Box::new(body_typ.scalar_type)).nullable(input_typ.nullable)
            }
            ScalarExpr::TransformMapValues { input, body } => {
                let input_typ = input.typ_inner(column_types, element_types);
                let value_typ = input_typ
                    .scalar_type
                    .unwrap_map_value_type()
                    .clone()
                    .nullable(true);
                let key_type = match &input_typ.scalar_type {
                    ScalarType::Map { key_type, .. } => key_type.clone(),
                    typ => panic!("TransformMapValues over non-map type {:?}", typ),
                };
                element_types.push(value_typ);
                let body_typ = body.typ_inner(column_types, element_types);
                element_types.pop();
                ScalarType::Map {
                    key_type,
                    value_type: Box::new(body_typ.scalar_type),
                }
                .nullable(input_typ.nullable)
            }
        }
    }
}

impl fmt::Display for ScalarExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScalarExpr::Column(i) => write!(f, "#{}", i),
            ScalarExpr::ElementRef => f.write_str("element"),
            ScalarExpr::Literal(datum, _typ) => write!(f, "{}", datum),
            ScalarExpr::CallUnary { func, expr } => write!(f, "{}({})", func, expr),
            ScalarExpr::CallVariadic { func, exprs } => {
                write!(f, "{}({})", func, separated(", ", exprs.iter()))
            }
            ScalarExpr::TransformArrayElements { input, body } => {
                write!(f, "transform_array({}, {})", input, body)
            }
            ScalarExpr::TransformMapValues { input, body } => {
                write!(f, "transform_map_values({}, {})", input, body)
            }
        }
    }
}
