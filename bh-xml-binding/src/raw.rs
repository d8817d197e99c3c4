// Copyright (C) 2020-2026  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Raw caller input for the [`NodeBuilder`][crate::NodeBuilder].

use serde_json::Value;

/// Untyped, possibly nested input data.
///
/// Mirrors the shapes callers naturally hold: nothing, a scalar, a list, or an
/// ordered mapping from field names to values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Raw {
    /// No content.
    #[default]
    Empty,
    /// A scalar value.
    Scalar(String),
    /// A list of values.
    List(Vec<Raw>),
    /// A mapping from field names to values, in caller order.
    Map(Vec<(String, Raw)>),
}

impl Raw {
    /// Create a mapping from `(field name, value)` pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Raw>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Create a list of field names, each of which will produce an empty node.
    pub fn fields<K, I>(names: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = K>,
    {
        Self::List(
            names
                .into_iter()
                .map(|name| Self::Scalar(name.into()))
                .collect(),
        )
    }

    /// Whether the value carries no content.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Look up `key` in a mapping.
    pub fn get(&self, key: &str) -> Option<&Raw> {
        match self {
            Self::Map(entries) => entries
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

impl From<&str> for Raw {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_owned())
    }
}

impl From<String> for Raw {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl<T: Into<Raw>> From<Vec<T>> for Raw {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Raw>> From<Option<T>> for Raw {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

impl From<Value> for Raw {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Bool(value) => Self::Scalar(value.to_string()),
            Value::Number(value) => Self::Scalar(value.to_string()),
            Value::String(value) => Self::Scalar(value),
            Value::Array(values) => Self::List(values.into_iter().map(Into::into).collect()),
            Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, value.into()))
                    .collect(),
            ),
        }
    }
}
