// Copyright Quill Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Methods for the fixed-length `char` type.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The maximum length of a `char` type, matching the limit PostgreSQL
/// enforces for `character` values.
pub const MAX_LENGTH: u32 = 10_485_760;

/// A newtype wrapper for the declared length of a [`ScalarType::Char`] type.
///
/// The length is guaranteed to be within `1..=MAX_LENGTH`.
///
/// [`ScalarType::Char`]: crate::ScalarType::Char
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct CharLength(pub(crate) u32);

impl CharLength {
    /// Consumes the newtype wrapper, returning the length as a `u32`.
    pub fn into_u32(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for CharLength {
    type Error = InvalidCharLengthError;

    fn try_from(length: i64) -> Result<Self, Self::Error> {
        match u32::try_from(length) {
            Ok(length) if length > 0 && length <= MAX_LENGTH => Ok(CharLength(length)),
            _ => Err(InvalidCharLengthError),
        }
    }
}

impl TryFrom<usize> for CharLength {
    type Error = InvalidCharLengthError;

    fn try_from(length: usize) -> Result<Self, Self::Error> {
        Self::try_from(i64::try_from(length).map_err(|_| InvalidCharLengthError)?)
    }
}

impl fmt::Display for CharLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The error returned when constructing a [`CharLength`] from an invalid
/// value.
#[derive(Debug, Clone)]
pub struct InvalidCharLengthError;

impl fmt::Display for InvalidCharLengthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "length for type character must be between 1 and {}",
            MAX_LENGTH
        )
    }
}

impl Error for InvalidCharLengthError {}
