// Copyright Quill Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! SQL analysis.
//!
//! This crate analyzes the `SET` clauses of `UPDATE` and `MERGE` statements
//! against a target table's schema. The parser and binder hand it a list of
//! raw `path = expr` assignments; the [`plan::align_assignments`] entry point
//! turns those into exactly one fully-typed value expression per top-level
//! column, merging untouched existing data with newly assigned values and
//! rejecting ambiguous or conflicting input. The execution planner consumes
//! the result.
//!
//! Catalog lookup, SQL text parsing, and execution are out of scope: tables
//! arrive as implementations of [`catalog::CatalogTable`], and assignments
//! arrive pre-parsed.

pub mod catalog;
pub mod plan;
