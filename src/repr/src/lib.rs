// Copyright Quill Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Fundamental data representation.
//!
//! This crate contains the types that describe the shape of data in Quill:
//! [`ScalarType`] describes an individual value, [`ColumnType`] bundles a
//! scalar type with nullability, and [`RelationDesc`] describes the named,
//! ordered columns of a relation. [`Datum`] is an owned scalar value, used to
//! represent literals during analysis.
//!
//! The types here are purely descriptive. Expressions over them live in the
//! `quill-expr` crate, and the analyses that consume both live in
//! `quill-sql`.

pub mod adt;

mod relation;
mod scalar;

pub use relation::{ColumnName, ColumnType, RelationDesc, RelationType};
pub use scalar::{Datum, ScalarType};
