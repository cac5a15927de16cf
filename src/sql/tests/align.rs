// Copyright Quill Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Tests for `UPDATE` assignment alignment against a catalog test double.

use std::collections::{BTreeMap, BTreeSet};

use quill_expr::{ScalarExpr, UnaryFunc, VariadicFunc};
use quill_repr::adt::char::CharLength;
use quill_repr::adt::varchar::VarCharMaxLength;
use quill_repr::{ColumnName, Datum, RelationDesc, ScalarType};
use quill_sql::catalog::{CatalogTable, TableCapability};
use quill_sql::plan::{
    align_assignments, AlignedAssignments, AssignmentValue, PlanError, RawAssignment,
    ResolvedAssignment, StoreAssignmentPolicy,
};

struct TestTable {
    name: String,
    desc: RelationDesc,
    defaults: BTreeMap<usize, ScalarExpr>,
    capabilities: BTreeSet<TableCapability>,
}

impl TestTable {
    fn new(name: &str, desc: RelationDesc) -> TestTable {
        TestTable {
            name: name.into(),
            desc,
            defaults: BTreeMap::new(),
            capabilities: BTreeSet::new(),
        }
    }

    fn with_default(mut self, column: usize, default: ScalarExpr) -> TestTable {
        self.defaults.insert(column, default);
        self
    }

    fn with_capability(mut self, capability: TableCapability) -> TestTable {
        self.capabilities.insert(capability);
        self
    }
}

impl CatalogTable for TestTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn desc(&self) -> &RelationDesc {
        &self.desc
    }

    fn column_default(&self, column: usize) -> Option<&ScalarExpr> {
        self.defaults.get(&column)
    }

    fn capabilities(&self) -> &BTreeSet<TableCapability> {
        &self.capabilities
    }
}

/// `primitive_table(i integer not null, l bigint, txt text)`
fn primitive_table() -> TestTable {
    TestTable::new(
        "primitive_table",
        RelationDesc::empty()
            .with_column("i", ScalarType::Int32.nullable(false))
            .with_column("l", ScalarType::Int64.nullable(true))
            .with_column("txt", ScalarType::String.nullable(true)),
    )
}

fn inner_record() -> ScalarType {
    ScalarType::Record {
        fields: vec![
            ("dn_i".into(), ScalarType::Int32.nullable(true)),
            ("dn_l".into(), ScalarType::Int64.nullable(true)),
        ],
    }
}

fn element_record() -> ScalarType {
    ScalarType::Record {
        fields: vec![
            ("i1".into(), ScalarType::Int32.nullable(true)),
            ("i2".into(), ScalarType::Int64.nullable(true)),
        ],
    }
}

fn value_record() -> ScalarType {
    ScalarType::Record {
        fields: vec![
            ("v1".into(), ScalarType::Int32.nullable(true)),
            ("v2".into(), ScalarType::Int64.nullable(true)),
        ],
    }
}

/// A table covering the nested shapes the rewriter must handle:
///
/// ```text
/// nested_table(
///     i integer,
///     s record(n_i integer, n_s record(dn_i integer, dn_l bigint)),
///     a record(i1 integer, i2 bigint)[],
///     m map[text=>record(v1 integer, v2 bigint)],
///     pa bigint[],
/// )
/// ```
fn nested_table() -> TestTable {
    let outer = ScalarType::Record {
        fields: vec![
            ("n_i".into(), ScalarType::Int32.nullable(true)),
            ("n_s".into(), inner_record().nullable(true)),
        ],
    };
    TestTable::new(
        "nested_table",
        RelationDesc::empty()
            .with_column("i", ScalarType::Int32.nullable(true))
            .with_column("s", outer.nullable(true))
            .with_column("a", ScalarType::Array(Box::new(element_record())).nullable(true))
            .with_column(
                "m",
                ScalarType::Map {
                    key_type: Box::new(ScalarType::String),
                    value_type: Box::new(value_record()),
                }
                .nullable(true),
            )
            .with_column("pa", ScalarType::Array(Box::new(ScalarType::Int64)).nullable(true)),
    )
}

fn char_table() -> TestTable {
    TestTable::new(
        "char_table",
        RelationDesc::empty()
            .with_column("c", ScalarType::Char { length: char_len(5) }.nullable(true))
            .with_column("c2", ScalarType::Char { length: char_len(5) }.nullable(true))
            .with_column(
                "vc",
                ScalarType::VarChar {
                    max_length: varchar_len(10),
                }
                .nullable(true),
            ),
    )
}

fn char_len(n: i64) -> Option<CharLength> {
    Some(CharLength::try_from(n).unwrap())
}

fn varchar_len(n: i64) -> Option<VarCharMaxLength> {
    Some(VarCharMaxLength::try_from(n).unwrap())
}

fn set(target: &[&str], expr: ScalarExpr) -> RawAssignment {
    RawAssignment {
        target: target.iter().map(|n| ColumnName::from(*n)).collect(),
        value: AssignmentValue::Expr(expr),
    }
}

fn set_default(target: &[&str]) -> RawAssignment {
    RawAssignment {
        target: target.iter().map(|n| ColumnName::from(*n)).collect(),
        value: AssignmentValue::Default,
    }
}

fn lit_i32(n: i32) -> ScalarExpr {
    ScalarExpr::literal(Datum::from(n), ScalarType::Int32)
}

fn lit_i64(n: i64) -> ScalarExpr {
    ScalarExpr::literal(Datum::from(n), ScalarType::Int64)
}

fn lit_str(s: &str) -> ScalarExpr {
    ScalarExpr::literal(Datum::from(s), ScalarType::String)
}

fn record_create(names: &[&str], exprs: Vec<ScalarExpr>) -> ScalarExpr {
    ScalarExpr::CallVariadic {
        func: VariadicFunc::RecordCreate {
            field_names: names.iter().map(|n| ColumnName::from(*n)).collect(),
        },
        exprs,
    }
}

fn align(
    table: &TestTable,
    policy: StoreAssignmentPolicy,
    assignments: Vec<RawAssignment>,
) -> Result<AlignedAssignments, PlanError> {
    align_assignments(table, policy, assignments)
}

fn align_ok(table: &TestTable, assignments: Vec<RawAssignment>) -> Vec<ResolvedAssignment> {
    match align(table, StoreAssignmentPolicy::Ansi, assignments).unwrap() {
        AlignedAssignments::Aligned(resolved) => resolved,
        AlignedAssignments::Passthrough(_) => panic!("unexpected passthrough"),
    }
}

#[test]
fn unmodified_columns_resolve_to_existing_values() {
    let table = primitive_table();
    let resolved = align_ok(&table, vec![set(&["l"], lit_i64(10))]);

    assert_eq!(resolved.len(), 3);
    assert_eq!(resolved[0].name, ColumnName::from("i"));
    assert_eq!(resolved[0].value, ScalarExpr::column(0));
    assert_eq!(resolved[1].name, ColumnName::from("l"));
    assert_eq!(resolved[1].value, lit_i64(10));
    assert_eq!(resolved[2].name, ColumnName::from("txt"));
    assert_eq!(resolved[2].value, ScalarExpr::column(2));
}

#[test]
fn set_clause_order_does_not_matter() {
    let table = primitive_table();
    let a = align_ok(
        &table,
        vec![set(&["txt"], lit_str("new")), set(&["i"], lit_i32(1))],
    );
    let b = align_ok(
        &table,
        vec![set(&["i"], lit_i32(1)), set(&["txt"], lit_str("new"))],
    );
    assert_eq!(a, b);
}

#[test]
fn output_always_follows_schema_order() {
    let table = primitive_table();
    let resolved = align_ok(
        &table,
        vec![set(&["txt"], lit_str("new")), set(&["i"], lit_i32(1))],
    );
    let names: Vec<_> = resolved.iter().map(|r| r.name.as_str().to_owned()).collect();
    assert_eq!(names, vec!["i", "l", "txt"]);
    let columns: Vec<_> = resolved.iter().map(|r| r.column).collect();
    assert_eq!(columns, vec![0, 1, 2]);
}

#[test]
fn duplicate_assignments_are_rejected() {
    let table = primitive_table();
    let err = align(
        &table,
        StoreAssignmentPolicy::Ansi,
        vec![
            set(&["i"], lit_i32(1)),
            set(&["l"], lit_i64(1)),
            set(&["i"], lit_i32(-1)),
        ],
    )
    .unwrap_err();
    match err {
        PlanError::DuplicateAssignment {
            path,
            first,
            second,
        } => {
            assert_eq!(path, vec![ColumnName::from("i")]);
            assert_eq!(first, lit_i32(1));
            assert_eq!(second, lit_i32(-1));
        }
        err => panic!("expected DuplicateAssignment, got {:?}", err),
    }
}

#[test]
fn overlapping_assignments_are_rejected() {
    let table = nested_table();
    let whole = record_create(&["dn_i", "dn_l"], vec![lit_i32(1), lit_i64(1)]);

    // Descendant first, ancestor second.
    let err = align(
        &table,
        StoreAssignmentPolicy::Ansi,
        vec![
            set(&["s", "n_s", "dn_i"], lit_i32(1)),
            set(&["s", "n_s"], whole.clone()),
        ],
    )
    .unwrap_err();
    match err {
        PlanError::ConflictingAssignment {
            ancestor_path,
            descendant_path,
            ..
        } => {
            assert_eq!(ancestor_path, vec![ColumnName::from("s"), "n_s".into()]);
            assert_eq!(
                descendant_path,
                vec![ColumnName::from("s"), "n_s".into(), "dn_i".into()]
            );
        }
        err => panic!("expected ConflictingAssignment, got {:?}", err),
    }

    // Ancestor first, descendant second.
    let err = align(
        &table,
        StoreAssignmentPolicy::Ansi,
        vec![
            set(&["s", "n_s"], whole),
            set(&["s", "n_s", "dn_l"], lit_i64(2)),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, PlanError::ConflictingAssignment { .. }));
}

#[test]
fn nested_struct_updates_reconstruct_the_column() {
    let table = nested_table();
    let resolved = align_ok(&table, vec![set(&["s", "n_s", "dn_i"], lit_i32(1))]);

    let s = ScalarExpr::column(1);
    let expected = record_create(
        &["n_i", "n_s"],
        vec![
            s.clone().call_unary(UnaryFunc::RecordGet(0)),
            record_create(
                &["dn_i", "dn_l"],
                vec![
                    lit_i32(1),
                    s.call_unary(UnaryFunc::RecordGet(1))
                        .call_unary(UnaryFunc::RecordGet(1)),
                ],
            ),
        ],
    );
    assert_eq!(resolved[1].value, expected);
}

#[test]
fn record_literals_align_to_declared_field_order() {
    let table = nested_table();
    let forward = align_ok(
        &table,
        vec![set(
            &["s", "n_s"],
            record_create(&["dn_i", "dn_l"], vec![lit_i32(1), lit_i64(1)]),
        )],
    );
    let reversed = align_ok(
        &table,
        vec![set(
            &["s", "n_s"],
            record_create(&["dn_l", "dn_i"], vec![lit_i64(1), lit_i32(1)]),
        )],
    );
    assert_eq!(forward, reversed);

    let expected = record_create(
        &["n_i", "n_s"],
        vec![
            ScalarExpr::column(1).call_unary(UnaryFunc::RecordGet(0)),
            record_create(&["dn_i", "dn_l"], vec![lit_i32(1), lit_i64(1)]),
        ],
    );
    assert_eq!(forward[1].value, expected);
}

#[test]
fn record_literals_missing_a_field_are_rejected() {
    let table = nested_table();
    let err = align(
        &table,
        StoreAssignmentPolicy::Ansi,
        vec![set(
            &["s", "n_s"],
            record_create(&["dn_i"], vec![lit_i32(1)]),
        )],
    )
    .unwrap_err();
    match err {
        PlanError::MissingField { path } => {
            assert_eq!(
                path,
                vec![ColumnName::from("s"), "n_s".into(), "dn_l".into()]
            );
        }
        err => panic!("expected MissingField, got {:?}", err),
    }
}

#[test]
fn array_of_records_updates_element_wise() {
    let table = nested_table();
    let resolved = align_ok(&table, vec![set(&["a", "i1"], lit_i32(1))]);

    let expected = ScalarExpr::column(2).transform_array_elements(record_create(
        &["i1", "i2"],
        vec![
            lit_i32(1),
            ScalarExpr::ElementRef.call_unary(UnaryFunc::RecordGet(1)),
        ],
    ));
    assert_eq!(resolved[2].value, expected);
}

#[test]
fn map_values_update_element_wise() {
    let table = nested_table();
    let resolved = align_ok(&table, vec![set(&["m", "v1"], lit_i32(5))]);

    let expected = ScalarExpr::column(3).transform_map_values(record_create(
        &["v1", "v2"],
        vec![
            lit_i32(5),
            ScalarExpr::ElementRef.call_unary(UnaryFunc::RecordGet(1)),
        ],
    ));
    assert_eq!(resolved[3].value, expected);
}

#[test]
fn whole_container_assignments_are_leaf_replacements() {
    let table = nested_table();
    let empty = ScalarExpr::CallVariadic {
        func: VariadicFunc::ArrayCreate {
            elem_type: element_record(),
        },
        exprs: vec![],
    };
    let resolved = align_ok(&table, vec![set(&["a"], empty.clone())]);
    assert_eq!(resolved[2].value, empty);
}

#[test]
fn updates_inside_plain_arrays_are_rejected() {
    let table = nested_table();
    let err = align(
        &table,
        StoreAssignmentPolicy::Ansi,
        vec![set(&["pa", "x"], lit_i64(1))],
    )
    .unwrap_err();
    match err {
        PlanError::UnsupportedNestedUpdateTarget { path, typ } => {
            assert_eq!(path, vec![ColumnName::from("pa"), "x".into()]);
            assert_eq!(typ.to_string(), "bigint[]");
        }
        err => panic!("expected UnsupportedNestedUpdateTarget, got {:?}", err),
    }
}

#[test]
fn ansi_policy_narrows_with_runtime_checks() {
    let table = primitive_table();
    let resolved = align_ok(&table, vec![set(&["i"], lit_i64(10))]);
    assert_eq!(
        resolved[0].value,
        lit_i64(10).call_unary(UnaryFunc::CastInt64ToInt32)
    );

    let err = align(
        &table,
        StoreAssignmentPolicy::Ansi,
        vec![set(&["i"], lit_str("5"))],
    )
    .unwrap_err();
    assert!(matches!(err, PlanError::UnsafeCast { .. }));
}

#[test]
fn strict_policy_rejects_narrowing() {
    let table = primitive_table();
    let err = align(
        &table,
        StoreAssignmentPolicy::Strict,
        vec![set(&["i"], lit_i64(10))],
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "cannot safely cast bigint to integer");

    // Widening remains implicit.
    let resolved = match align(
        &table,
        StoreAssignmentPolicy::Strict,
        vec![set(&["l"], lit_i32(10))],
    )
    .unwrap()
    {
        AlignedAssignments::Aligned(resolved) => resolved,
        AlignedAssignments::Passthrough(_) => panic!("unexpected passthrough"),
    };
    assert_eq!(
        resolved[1].value,
        lit_i32(10).call_unary(UnaryFunc::CastInt32ToInt64)
    );
}

#[test]
fn legacy_policy_always_fails() {
    let table = primitive_table();
    // Even an assignment needing no conversion at all fails under LEGACY.
    let err = align(
        &table,
        StoreAssignmentPolicy::Legacy,
        vec![set(&["l"], lit_i64(1))],
    )
    .unwrap_err();
    match err {
        PlanError::UnsupportedPolicy { policy } => {
            assert_eq!(policy, StoreAssignmentPolicy::Legacy)
        }
        err => panic!("expected UnsupportedPolicy, got {:?}", err),
    }
}

#[test]
fn nullable_values_into_non_nullable_columns_are_asserted() {
    let table = primitive_table();
    let resolved = align_ok(&table, vec![set(&["i"], ScalarExpr::column(1))]);
    assert_eq!(
        resolved[0].value,
        ScalarExpr::column(1)
            .call_unary(UnaryFunc::CastInt64ToInt32)
            .call_unary(UnaryFunc::AssertNotNull {
                path: vec!["i".into()],
            })
    );
}

#[test]
fn default_resolves_to_the_declared_default() {
    let table = primitive_table().with_default(1, lit_i64(42));
    let resolved = align_ok(&table, vec![set_default(&["l"])]);
    assert_eq!(resolved[1].value, lit_i64(42));

    let err = align(
        &table,
        StoreAssignmentPolicy::Ansi,
        vec![set_default(&["txt"])],
    )
    .unwrap_err();
    match err {
        PlanError::MissingDefault { path } => assert_eq!(path, vec![ColumnName::from("txt")]),
        err => panic!("expected MissingDefault, got {:?}", err),
    }
}

#[test]
fn nested_defaults_are_rejected() {
    let table = nested_table();
    let err = align(
        &table,
        StoreAssignmentPolicy::Ansi,
        vec![set_default(&["s", "n_i"])],
    )
    .unwrap_err();
    assert!(matches!(err, PlanError::MissingDefault { .. }));
}

#[test]
fn accept_any_schema_targets_bypass_alignment() {
    let table = primitive_table().with_capability(TableCapability::AcceptsAnySchema);
    // The paths below would never align: the bypass must not look at them.
    let assignments = vec![
        set(&["nonexistent", "nested"], lit_i32(1)),
        set(&["nonexistent"], lit_i32(2)),
    ];
    let out = align(&table, StoreAssignmentPolicy::Ansi, assignments.clone()).unwrap();
    assert_eq!(out, AlignedAssignments::Passthrough(assignments));
}

#[test]
fn fixed_length_strings_always_get_write_side_checks() {
    let table = char_table();
    let resolved = align_ok(
        &table,
        vec![set(&["c"], lit_str("abc")), set(&["vc"], lit_str("abc"))],
    );
    assert_eq!(
        resolved[0].value,
        lit_str("abc").call_unary(UnaryFunc::PadChar {
            length: char_len(5),
        })
    );
    assert_eq!(
        resolved[2].value,
        lit_str("abc").call_unary(UnaryFunc::CastStringToVarChar {
            max_length: varchar_len(10),
            fail_on_len: true,
        })
    );

    // Matching nominal type, but not a pure passthrough: still wrapped.
    let char_lit = ScalarExpr::literal(
        Datum::from("ab"),
        ScalarType::Char { length: char_len(5) },
    );
    let resolved = align_ok(&table, vec![set(&["c"], char_lit.clone())]);
    assert_eq!(
        resolved[0].value,
        char_lit.call_unary(UnaryFunc::PadChar {
            length: char_len(5),
        })
    );

    // A pure passthrough of a column of the exact declared type is not.
    let resolved = align_ok(&table, vec![set(&["c"], ScalarExpr::column(1))]);
    assert_eq!(resolved[0].value, ScalarExpr::column(1));
}

#[test]
fn unknown_paths_are_rejected() {
    let table = nested_table();
    let err = align(
        &table,
        StoreAssignmentPolicy::Ansi,
        vec![set(&["bogus"], lit_i32(1))],
    )
    .unwrap_err();
    match err {
        PlanError::UnknownColumn { path } => assert_eq!(path, vec![ColumnName::from("bogus")]),
        err => panic!("expected UnknownColumn, got {:?}", err),
    }

    let err = align(
        &table,
        StoreAssignmentPolicy::Ansi,
        vec![set(&["s", "bogus"], lit_i32(1))],
    )
    .unwrap_err();
    match err {
        PlanError::UnknownColumn { path } => {
            assert_eq!(path, vec![ColumnName::from("s"), "bogus".into()])
        }
        err => panic!("expected UnknownColumn, got {:?}", err),
    }
}

#[test]
fn disjoint_nested_updates_merge() {
    let table = nested_table();
    let resolved = align_ok(
        &table,
        vec![
            set(&["s", "n_s", "dn_i"], lit_i32(1)),
            set(&["s", "n_i"], lit_i32(2)),
        ],
    );

    let s = ScalarExpr::column(1);
    let expected = record_create(
        &["n_i", "n_s"],
        vec![
            lit_i32(2),
            record_create(
                &["dn_i", "dn_l"],
                vec![
                    lit_i32(1),
                    s.call_unary(UnaryFunc::RecordGet(1))
                        .call_unary(UnaryFunc::RecordGet(1)),
                ],
            ),
        ],
    );
    assert_eq!(resolved[1].value, expected);
}
