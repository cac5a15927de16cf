// Copyright Quill Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! SQL planning.
//!
//! Planning is the process of turning the parser's raw, unchecked view of a
//! statement into typed expressions the execution layer can run. This module
//! currently covers the write side of row-level mutations: the
//! [`align_assignments`] entry point reshapes `UPDATE ... SET` clauses onto
//! the target table's schema.

// Internal module layout.
//
// `align` owns the statement-level algorithm: grouping raw assignments by
// top-level column, rejecting overlaps, and reconstructing one expression
// per column. It calls into `typeconv` whenever a user-supplied value lands
// on a schema leaf. `error` holds the structured error type everything in
// this module returns.

pub(crate) mod align;
pub(crate) mod error;
pub(crate) mod typeconv;

pub use align::{
    align_assignments, AlignedAssignments, AssignmentValue, RawAssignment, ResolvedAssignment,
};
pub use error::PlanError;
pub use typeconv::StoreAssignmentPolicy;
