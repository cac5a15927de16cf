// Copyright Quill Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::error::Error;
use std::fmt;

use itertools::Itertools;

use quill_expr::ScalarExpr;
use quill_ore::str::StrExt;
use quill_repr::adt::char::InvalidCharLengthError;
use quill_repr::adt::varchar::InvalidVarCharMaxLengthError;
use quill_repr::{ColumnName, ScalarType};

use crate::plan::typeconv::StoreAssignmentPolicy;

/// An error produced during planning.
///
/// Every failure is terminal for the statement being analyzed: nothing is
/// retried and nothing is partially applied.
#[derive(Clone, Debug)]
pub enum PlanError {
    /// The same path was assigned twice in one statement.
    DuplicateAssignment {
        path: Vec<ColumnName>,
        /// The two assigned values, in encounter order.
        first: ScalarExpr,
        second: ScalarExpr,
    },
    /// One assigned path is a strict ancestor of another.
    ConflictingAssignment {
        ancestor_path: Vec<ColumnName>,
        descendant_path: Vec<ColumnName>,
        ancestor: ScalarExpr,
        descendant: ScalarExpr,
    },
    /// A record value omits a declared field that has no default.
    MissingField { path: Vec<ColumnName> },
    /// The active store assignment policy forbids the required conversion.
    UnsafeCast {
        from: ScalarType,
        to: ScalarType,
        policy: StoreAssignmentPolicy,
    },
    /// The active store assignment policy is not supported for this
    /// statement kind.
    UnsupportedPolicy { policy: StoreAssignmentPolicy },
    /// An assigned path dives into a container that is not a record, an
    /// array of records, or a map with record values.
    UnsupportedNestedUpdateTarget {
        path: Vec<ColumnName>,
        typ: ScalarType,
    },
    /// `DEFAULT` was used to assign a column that has no default.
    MissingDefault { path: Vec<ColumnName> },
    /// A path does not resolve to a column or nested field of the target.
    UnknownColumn { path: Vec<ColumnName> },
    InvalidCharLength(InvalidCharLengthError),
    InvalidVarCharMaxLength(InvalidVarCharMaxLengthError),
    Unstructured(String),
}

impl PlanError {
    /// Reports additional details about the error, if any are available.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::ConflictingAssignment {
                ancestor_path,
                descendant_path,
                ancestor,
                descendant,
            } => Some(format!(
                "{} was assigned {}; {} was assigned {}",
                PathDisplay(ancestor_path),
                ancestor,
                PathDisplay(descendant_path),
                descendant,
            )),
            _ => None,
        }
    }

    /// Reports a hint for the user about how the error could be fixed.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::UnsafeCast {
                policy: StoreAssignmentPolicy::Strict,
                ..
            } => Some(
                "Write an explicit cast, or set the store assignment policy to 'ansi' \
                to allow runtime-checked narrowing conversions."
                    .into(),
            ),
            Self::UnsupportedPolicy { .. } => {
                Some("Set the store assignment policy to 'ansi' or 'strict'.".into())
            }
            Self::MissingField { .. } => {
                Some("Provide a value for every declared field of the record.".into())
            }
            _ => None,
        }
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::DuplicateAssignment {
                path,
                first,
                second,
            } => write!(
                f,
                "multiple assignments for {}: {}, {}",
                PathDisplay(path),
                first,
                second
            ),
            Self::ConflictingAssignment {
                ancestor_path,
                descendant_path,
                ..
            } => write!(
                f,
                "conflicting assignments for {}: assignment to {} overlaps with assignment to {}",
                PathDisplay(ancestor_path),
                PathDisplay(ancestor_path),
                PathDisplay(descendant_path),
            ),
            Self::MissingField { path } => {
                write!(f, "record value is missing field {}", PathDisplay(path))
            }
            Self::UnsafeCast { from, to, policy } => match policy {
                StoreAssignmentPolicy::Strict => {
                    write!(f, "cannot safely cast {} to {}", from, to)
                }
                _ => write!(
                    f,
                    "cannot cast {} to {} under the {} store assignment policy",
                    from, to, policy
                ),
            },
            Self::UnsupportedPolicy { policy } => write!(
                f,
                "the {} store assignment policy is not supported for UPDATE",
                policy
            ),
            Self::UnsupportedNestedUpdateTarget { path, typ } => write!(
                f,
                "cannot update nested field {}: the containing value has type {}",
                PathDisplay(path),
                typ
            ),
            Self::MissingDefault { path } => {
                write!(f, "no default value for {}", PathDisplay(path))
            }
            Self::UnknownColumn { path } => {
                write!(f, "column {} does not exist", PathDisplay(path))
            }
            Self::InvalidCharLength(e) => e.fmt(f),
            Self::InvalidVarCharMaxLength(e) => e.fmt(f),
            Self::Unstructured(e) => write!(f, "{}", e),
        }
    }
}

impl Error for PlanError {}

impl From<InvalidCharLengthError> for PlanError {
    fn from(e: InvalidCharLengthError) -> PlanError {
        PlanError::InvalidCharLength(e)
    }
}

impl From<InvalidVarCharMaxLengthError> for PlanError {
    fn from(e: InvalidVarCharMaxLengthError) -> PlanError {
        PlanError::InvalidVarCharMaxLength(e)
    }
}

/// Displays a dotted column path surrounded by quotes, e.g. `"s.n_s.dn_i"`.
pub(crate) struct PathDisplay<'a>(pub &'a [ColumnName]);

impl<'a> fmt::Display for PathDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let path = self.0.iter().map(|n| n.as_str()).join(".");
        write!(f, "{}", path.quoted())
    }
}

#[cfg(test)]
mod tests {
    use quill_repr::Datum;

    use super::*;

    #[test]
    fn duplicate_assignment_message_lists_values_in_order() {
        let e = PlanError::DuplicateAssignment {
            path: vec!["i".into()],
            first: ScalarExpr::literal(Datum::from(1i32), ScalarType::Int32),
            second: ScalarExpr::literal(Datum::from(-1i32), ScalarType::Int32),
        };
        assert_eq!(e.to_string(), "multiple assignments for \"i\": 1, -1");
    }

    #[test]
    fn unsafe_cast_message_depends_on_policy() {
        let e = PlanError::UnsafeCast {
            from: ScalarType::Int64,
            to: ScalarType::Int32,
            policy: StoreAssignmentPolicy::Strict,
        };
        assert_eq!(e.to_string(), "cannot safely cast bigint to integer");
        assert!(e.hint().is_some());

        let e = PlanError::UnsafeCast {
            from: ScalarType::String,
            to: ScalarType::Int32,
            policy: StoreAssignmentPolicy::Ansi,
        };
        assert_eq!(
            e.to_string(),
            "cannot cast text to integer under the ANSI store assignment policy"
        );
    }
}
