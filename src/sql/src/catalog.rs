// Copyright Quill Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Catalog abstractions.
//!
//! The analyses in this crate do not talk to a real catalog. They see target
//! tables through the narrow [`CatalogTable`] trait, which production catalog
//! objects and test doubles implement identically.

use std::collections::BTreeSet;

use quill_expr::ScalarExpr;
use quill_repr::{ColumnName, RelationDesc};

/// An optional capability that a table may advertise.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TableCapability {
    /// The table has no fixed column set. Writes against it are not
    /// constrained to a declared schema, which exempts its statements from
    /// assignment alignment.
    AcceptsAnySchema,
}

/// A table in the catalog, as seen by the analyses in this crate.
pub trait CatalogTable {
    /// The fully qualified name of the table.
    fn name(&self) -> &str;

    /// The shape of the table's columns.
    fn desc(&self) -> &RelationDesc;

    /// The default value expression of the `column`th column, if one was
    /// declared.
    fn column_default(&self, column: usize) -> Option<&ScalarExpr>;

    /// The columns the table is partitioned by.
    fn partitioning(&self) -> &[ColumnName] {
        &[]
    }

    /// The capabilities the table advertises.
    fn capabilities(&self) -> &BTreeSet<TableCapability>;
}
