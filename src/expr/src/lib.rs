// Copyright Quill Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Scalar expressions.
//!
//! This crate defines [`ScalarExpr`], the expression language that Quill's
//! analysis passes construct and rewrite. Expressions here are symbolic:
//! functions know their output types, but evaluation belongs to the
//! execution layer, which consumes these trees after planning.

pub mod scalar;

pub use scalar::func::{UnaryFunc, VariadicFunc};
pub use scalar::ScalarExpr;
