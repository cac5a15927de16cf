// Copyright Quill Data, Inc. and contributors. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository, or online at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! String utilities.

use std::fmt::{self, Display};

/// Extension methods for [`str`].
pub trait StrExt {
    /// Wraps the string slice in a type whose display implementation renders
    /// the string surrounded by double quotes with any inner double quote
    /// characters escaped.
    fn quoted(&self) -> QuotedStr;
}

impl StrExt for str {
    fn quoted(&self) -> QuotedStr {
        QuotedStr(self)
    }
}

/// Displays a string slice surrounded by double quotes with any inner double
/// quote characters escaped.
///
/// Constructed by [`StrExt::quoted`].
#[derive(Debug)]
pub struct QuotedStr<'a>(&'a str);

impl<'a> Display for QuotedStr<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for c in self.0.chars() {
            match c {
                '"' | '\\' => write!(f, "\\{}", c)?,
                _ => write!(f, "{}", c)?,
            }
        }
        f.write_str("\"")
    }
}

/// Creates a type whose [`fmt::Display`] implementation outputs each item in
/// `iter` separated by `separator`.
pub fn separated<'a, I>(separator: &'a str, iter: I) -> Separated<'a, I::Item>
where
    I: IntoIterator,
    I::Item: Display,
{
    Separated {
        separator,
        iter: iter.into_iter().collect(),
    }
}

/// See [`separated`].
#[derive(Debug)]
pub struct Separated<'a, D> {
    separator: &'a str,
    iter: Vec<D>,
}

impl<'a, D> Display for Separated<'a, D>
where
    D: Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.iter.iter().enumerate() {
            if i != 0 {
                write!(f, "{}", self.separator)?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_quoted() {
        assert_eq!(format!("{}", "foo".quoted()), r#""foo""#);
        assert_eq!(format!("{}", r#"f"oo"#.quoted()), r#""f\"oo""#);
        assert_eq!(format!("{}", r"f\oo".quoted()), r#""f\\oo""#);
    }

    #[test]
    fn test_separated() {
        assert_eq!(format!("{}", separated(", ", vec![1, 2, 3])), "1, 2, 3");
        assert_eq!(format!("{}", separated(" ", Vec::<usize>::new())), "");
    }
}
