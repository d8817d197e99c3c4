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

//! This module defines the error values returned by the crate API.

use std::fmt;

/// Error type used across the crate API.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum Error {
    /// Error coming from schema registration, element building or XML handling.
    #[strum(to_string = "{0}")]
    Binding(bh_xml_binding::Error),

    /// Error when the configuration cannot be read or is incomplete.
    #[strum(to_string = "Invalid configuration: {0}")]
    Config(String),

    /// Error when a request is missing its correlation token.
    #[strum(to_string = "No {0} provided")]
    MissingToken(&'static str),

    /// Error when required elements of a request are not set.
    #[strum(to_string = "Missing required elements: {0}")]
    MissingRequiredElements(FieldList),

    /// Error when required attributes of a request are not set.
    #[strum(to_string = "Missing required attributes: {0}")]
    MissingRequiredAttributes(FieldList),

    /// Error when the response root element matches no known response kind.
    ///
    /// Carries the received document, truncated to a fixed bound.
    #[strum(to_string = "Unknown response type, raw XML:\n\n{0}")]
    UnknownResponseType(String),

    /// Error when the response is recognized but cannot be parsed.
    #[strum(to_string = "Malformed response: {0}")]
    MalformedResponse(String),

    /// Error reported by Trufina, with the error kind and the error text.
    #[strum(to_string = "{0}: {1}")]
    TrufinaResponse(String, String),

    /// Error when the request cannot be delivered to Trufina.
    #[strum(to_string = "Network error: {0}")]
    Network(String),
}

impl bherror::BhError for Error {}

/// Result type alias for the crate.
pub type Result<T> = bherror::Result<T, Error>;

/// Field names reported by the request validation, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldList(pub Vec<String>);

impl FieldList {
    /// Whether `name` is one of the listed fields.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|field| field == name)
    }
}

impl fmt::Display for FieldList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

impl From<Vec<String>> for FieldList {
    fn from(fields: Vec<String>) -> Self {
        Self(fields)
    }
}

pub(crate) fn binding_err(error: &bh_xml_binding::Error) -> Error {
    Error::Binding(error.clone())
}
