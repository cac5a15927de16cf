// Copyright Quill Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Methods for the variable-length `varchar` type.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The maximum length of a `varchar` type, matching the limit PostgreSQL
/// enforces for `character varying` values.
pub const MAX_MAX_LENGTH: u32 = 10_485_760;

/// A newtype wrapper for the declared maximum length of a
/// [`ScalarType::VarChar`] type.
///
/// The length is guaranteed to be within `1..=MAX_MAX_LENGTH`.
///
/// [`ScalarType::VarChar`]: crate::ScalarType::VarChar
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct VarCharMaxLength(pub(crate) u32);

impl VarCharMaxLength {
    /// Consumes the newtype wrapper, returning the maximum length as a
    /// `u32`.
    pub fn into_u32(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for VarCharMaxLength {
    type Error = InvalidVarCharMaxLengthError;

    fn try_from(max_length: i64) -> Result<Self, Self::Error> {
        match u32::try_from(max_length) {
            Ok(max_length) if max_length > 0 && max_length <= MAX_MAX_LENGTH => {
                Ok(VarCharMaxLength(max_length))
            }
            _ => Err(InvalidVarCharMaxLengthError),
        }
    }
}

impl TryFrom<usize> for VarCharMaxLength {
    type Error = InvalidVarCharMaxLengthError;

    fn try_from(max_length: usize) -> Result<Self, Self::Error> {
        Self::try_from(i64::try_from(max_length).map_err(|_| InvalidVarCharMaxLengthError)?)
    }
}

impl fmt::Display for VarCharMaxLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The error returned when constructing a [`VarCharMaxLength`] from an
/// invalid value.
#[derive(Debug, Clone)]
pub struct InvalidVarCharMaxLengthError;

impl fmt::Display for InvalidVarCharMaxLengthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "length for type character varying must be between 1 and {}",
            MAX_MAX_LENGTH
        )
    }
}

impl Error for InvalidVarCharMaxLengthError {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn varchar_max_length_bounds() {
        assert!(VarCharMaxLength::try_from(0i64).is_err());
        assert!(VarCharMaxLength::try_from(-7i64).is_err());
        assert!(VarCharMaxLength::try_from(i64::from(MAX_MAX_LENGTH) + 1).is_err());
        assert_eq!(VarCharMaxLength::try_from(255i64).unwrap().into_u32(), 255);
    }

    proptest! {
        #[test]
        fn varchar_max_length_roundtrips(len in 1u32..=MAX_MAX_LENGTH) {
            let max_length = VarCharMaxLength::try_from(i64::from(len)).unwrap();
            prop_assert_eq!(max_length.into_u32(), len);
        }
    }
}
