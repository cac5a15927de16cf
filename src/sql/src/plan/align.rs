// Copyright Quill Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Aligns the `SET` clauses of a mutation with the target table's schema.
//!
//! Users write `SET` clauses against arbitrary nested fields, in arbitrary
//! order, covering an arbitrary subset of the target's columns. Storage
//! wants none of that flexibility: it consumes exactly one value expression
//! per top-level column. [`align_assignments`] bridges the two views. For
//! every column it reconstructs a full value expression, substituting the
//! assigned sub-paths and preserving everything else as reads of the
//! pre-update row, so that
//!
//! ```sql
//! UPDATE t SET s.n_s.dn_i = 1
//! ```
//!
//! against `s record(n_i integer, n_s record(dn_i integer, dn_l bigint))`
//! produces for `s` the expression
//!
//! ```text
//! record_create[n_i, n_s](
//!     record_get[0](#0),
//!     record_create[dn_i, dn_l](1, record_get[1](record_get[1](#0))),
//! )
//! ```
//!
//! Assignments inside arrays of records and map values of record type
//! cannot be rewritten positionally, so they become element-wise transforms
//! over a fresh per-element binding.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use quill_expr::{ScalarExpr, UnaryFunc, VariadicFunc};
use quill_repr::{ColumnName, ColumnType, ScalarType};

use crate::catalog::{CatalogTable, TableCapability};
use crate::plan::error::PlanError;
use crate::plan::typeconv::{self, StoreAssignmentPolicy};

/// The value side of a raw `SET` clause.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum AssignmentValue {
    /// An explicit value expression.
    Expr(ScalarExpr),
    /// The `DEFAULT` keyword.
    Default,
}

/// One `SET` clause, as produced by the parser.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RawAssignment {
    /// The assigned path: a top-level column name followed by zero or more
    /// nested field names.
    pub target: Vec<ColumnName>,
    /// The assigned value.
    pub value: AssignmentValue,
}

/// A fully aligned assignment: the complete new value of one top-level
/// column.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAssignment {
    /// The index of the column in the target's relation description.
    pub column: usize,
    /// The name of the column.
    pub name: ColumnName,
    /// The column's new value. Its shape exactly matches the column's
    /// declared type.
    pub value: ScalarExpr,
}

/// The result of assignment alignment.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum AlignedAssignments {
    /// One assignment per top-level column of the target, in the target's
    /// declared column order.
    Aligned(Vec<ResolvedAssignment>),
    /// The target accepts any schema, so the assignments pass through
    /// exactly as written.
    Passthrough(Vec<RawAssignment>),
}

/// The assignments addressing one top-level column, reshaped into the
/// column's own tree structure.
///
/// Built and discarded within a single call to [`align_assignments`].
#[derive(Debug)]
enum AlignmentNode {
    /// This exact path was assigned a value.
    Set {
        path: Vec<ColumnName>,
        expr: ScalarExpr,
    },
    /// Strict descendants of this path were assigned values.
    Nested {
        children: BTreeMap<ColumnName, AlignmentNode>,
        /// The first assignment inserted beneath this node, for
        /// diagnostics.
        witness: (Vec<ColumnName>, ScalarExpr),
    },
}

/// Aligns the `SET` clauses of an `UPDATE` or `MERGE` statement with the
/// target table's schema.
///
/// Returns one [`ResolvedAssignment`] per top-level column, in declared
/// column order. Columns the statement does not touch resolve to a plain
/// read of the pre-update row. Any invalid input — conflicting or duplicate
/// paths, unknown fields, values the active [`StoreAssignmentPolicy`]
/// cannot store — fails the whole statement; there are no partial results.
///
/// Targets that advertise [`TableCapability::AcceptsAnySchema`] have no
/// fixed schema to align with, so their assignments pass through untouched.
pub fn align_assignments(
    table: &dyn CatalogTable,
    policy: StoreAssignmentPolicy,
    assignments: Vec<RawAssignment>,
) -> Result<AlignedAssignments, PlanError> {
    if table
        .capabilities()
        .contains(&TableCapability::AcceptsAnySchema)
    {
        debug!(
            table = table.name(),
            "target accepts any schema; passing assignments through unaligned"
        );
        return Ok(AlignedAssignments::Passthrough(assignments));
    }
    if let StoreAssignmentPolicy::Legacy = policy {
        return Err(PlanError::UnsupportedPolicy { policy });
    }
    debug!(
        table = table.name(),
        assignments = assignments.len(),
        "aligning assignments with the target schema"
    );

    let desc = table.desc();

    // Group the assignments by top-level column, checking each path for
    // validity and for overlap with the paths already seen. Processing in
    // input order means diagnostics name the first offending pair.
    let mut trees: BTreeMap<usize, AlignmentNode> = BTreeMap::new();
    for RawAssignment { target, value } in assignments {
        let Some(head) = target.first() else {
            return Err(PlanError::Unstructured(
                "assignment target is empty".into(),
            ));
        };
        let Some((column, typ)) = desc.get_by_name(head) else {
            return Err(PlanError::UnknownColumn { path: target });
        };
        let expr = match value {
            AssignmentValue::Expr(expr) => expr,
            AssignmentValue::Default => match table.column_default(column) {
                Some(default) if target.len() == 1 => default.clone(),
                _ => return Err(PlanError::MissingDefault { path: target }),
            },
        };
        match trees.entry(column) {
            Entry::Occupied(mut entry) => {
                insert_into_node(entry.get_mut(), typ, 1, &target, expr)?
            }
            Entry::Vacant(entry) => {
                entry.insert(build_subtree(typ, 1, &target, expr)?);
            }
        }
    }

    let column_types: Vec<_> = desc.iter_types().cloned().collect();
    let mut aligned = Vec::with_capacity(desc.arity());
    for (column, (name, typ)) in desc.iter().enumerate() {
        let value = match trees.remove(&column) {
            None => ScalarExpr::column(column),
            Some(node) => {
                let mut path = vec![name.clone()];
                apply_node(
                    policy,
                    &column_types,
                    ScalarExpr::column(column),
                    typ,
                    &mut path,
                    node,
                )?
            }
        };
        aligned.push(ResolvedAssignment {
            column,
            name: name.clone(),
            value,
        });
    }
    Ok(AlignedAssignments::Aligned(aligned))
}

/// Returns the record fields that nested assignments under a value of type
/// `typ` address.
///
/// Paths may dive into records directly, into the elements of an array of
/// records, or into the values of a map whose value type is a record. Keys
/// of a map are not addressable by field name. Diving into anything else
/// has no coherent rewrite, and fails.
fn record_fields_for_update<'a>(
    typ: &'a ColumnType,
    full: &[ColumnName],
) -> Result<&'a [(ColumnName, ColumnType)], PlanError> {
    let unsupported = || PlanError::UnsupportedNestedUpdateTarget {
        path: full.to_vec(),
        typ: typ.scalar_type.clone(),
    };
    match &typ.scalar_type {
        ScalarType::Record { fields } => Ok(fields),
        ScalarType::Array(element_type) => match &**element_type {
            ScalarType::Record { fields } => Ok(fields),
            _ => Err(unsupported()),
        },
        ScalarType::Map { value_type, .. } => match &**value_type {
            ScalarType::Record { fields } => Ok(fields),
            _ => Err(unsupported()),
        },
        _ => Err(unsupported()),
    }
}

/// Builds the [`AlignmentNode`] chain for the remainder of a path that no
/// earlier assignment has touched.
fn build_subtree(
    typ: &ColumnType,
    prefix_len: usize,
    full: &[ColumnName],
    expr: ScalarExpr,
) -> Result<AlignmentNode, PlanError> {
    if prefix_len == full.len() {
        return Ok(AlignmentNode::Set {
            path: full.to_vec(),
            expr,
        });
    }
    let fields = record_fields_for_update(typ, full)?;
    let name = &full[prefix_len];
    let Some((_, child_typ)) = fields.iter().find(|(n, _)| n == name) else {
        return Err(PlanError::UnknownColumn {
            path: full[..prefix_len + 1].to_vec(),
        });
    };
    let witness = (full.to_vec(), expr.clone());
    let child = build_subtree(child_typ, prefix_len + 1, full, expr)?;
    let mut children = BTreeMap::new();
    children.insert(name.clone(), child);
    Ok(AlignmentNode::Nested { children, witness })
}

/// Merges one assignment into the tree of assignments already recorded for
/// its top-level column, rejecting exact duplicates and ancestor/descendant
/// overlaps.
fn insert_into_node(
    node: &mut AlignmentNode,
    typ: &ColumnType,
    prefix_len: usize,
    full: &[ColumnName],
    expr: ScalarExpr,
) -> Result<(), PlanError> {
    match node {
        AlignmentNode::Set { path, expr: first } => {
            if prefix_len == full.len() {
                Err(PlanError::DuplicateAssignment {
                    path: path.clone(),
                    first: first.clone(),
                    second: expr,
                })
            } else {
                Err(PlanError::ConflictingAssignment {
                    ancestor_path: path.clone(),
                    descendant_path: full.to_vec(),
                    ancestor: first.clone(),
                    descendant: expr,
                })
            }
        }
        AlignmentNode::Nested { children, witness } => {
            if prefix_len == full.len() {
                return Err(PlanError::ConflictingAssignment {
                    ancestor_path: full.to_vec(),
                    descendant_path: witness.0.clone(),
                    ancestor: expr,
                    descendant: witness.1.clone(),
                });
            }
            let fields = record_fields_for_update(typ, full)?;
            let name = &full[prefix_len];
            let Some((_, child_typ)) = fields.iter().find(|(n, _)| n == name) else {
                return Err(PlanError::UnknownColumn {
                    path: full[..prefix_len + 1].to_vec(),
                });
            };
            match children.entry(name.clone()) {
                Entry::Occupied(mut entry) => {
                    insert_into_node(entry.get_mut(), child_typ, prefix_len + 1, full, expr)
                }
                Entry::Vacant(entry) => {
                    entry.insert(build_subtree(child_typ, prefix_len + 1, full, expr)?);
                    Ok(())
                }
            }
        }
    }
}

/// Reconstructs the full value expression for one schema node.
///
/// `base` is the expression that reads the node's pre-update value; it
/// supplies every field the assignments do not touch.
fn apply_node(
    policy: StoreAssignmentPolicy,
    column_types: &[ColumnType],
    base: ScalarExpr,
    typ: &ColumnType,
    path: &mut Vec<ColumnName>,
    node: AlignmentNode,
) -> Result<ScalarExpr, PlanError> {
    match node {
        AlignmentNode::Set { expr, .. } => {
            let expr_typ = expr.typ(column_types);
            typeconv::plan_assignment_cast(policy, path, typ, expr, &expr_typ)
        }
        AlignmentNode::Nested {
            mut children,
            witness,
        } => match &typ.scalar_type {
            ScalarType::Record { fields } => {
                let mut field_names = Vec::with_capacity(fields.len());
                let mut exprs = Vec::with_capacity(fields.len());
                for (i, (name, field_typ)) in fields.iter().enumerate() {
                    let field_base = base.clone().call_unary(UnaryFunc::RecordGet(i));
                    let expr = match children.remove(name) {
                        Some(child) => {
                            path.push(name.clone());
                            let expr = apply_node(
                                policy,
                                column_types,
                                field_base,
                                field_typ,
                                path,
                                child,
                            )?;
                            path.pop();
                            expr
                        }
                        None => field_base,
                    };
                    field_names.push(name.clone());
                    exprs.push(expr);
                }
                Ok(ScalarExpr::CallVariadic {
                    func: VariadicFunc::RecordCreate { field_names },
                    exprs,
                })
            }
            ScalarType::Array(element_type) => {
                let element_typ = (**element_type).clone().nullable(true);
                let body = apply_node(
                    policy,
                    column_types,
                    ScalarExpr::ElementRef,
                    &element_typ,
                    path,
                    AlignmentNode::Nested { children, witness },
                )?;
                Ok(base.transform_array_elements(body))
            }
            ScalarType::Map { value_type, .. } => {
                let value_typ = (**value_type).clone().nullable(true);
                let body = apply_node(
                    policy,
                    column_types,
                    ScalarExpr::ElementRef,
                    &value_typ,
                    path,
                    AlignmentNode::Nested { children, witness },
                )?;
                Ok(base.transform_map_values(body))
            }
            typ => Err(PlanError::UnsupportedNestedUpdateTarget {
                path: path.clone(),
                typ: typ.clone(),
            }),
        },
    }
}
