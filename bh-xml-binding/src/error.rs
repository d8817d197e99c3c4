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

use crate::schema::PrimitiveType;

/// Error type used across the crate API.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum Error {
    /// Error in the definition or lookup of a [`Schema`][crate::Schema].
    #[strum(to_string = "Schema error: {0}")]
    Schema(SchemaError),

    /// Error when the raw input names an element the schema does not know.
    ///
    /// The first value is the schema name, the second the offending field name.
    #[strum(to_string = "No known element named '{1}' in schema `{0}`")]
    InvalidElement(String, String),

    /// Error when an attribute is not declared by the schema.
    #[strum(to_string = "No known attribute named '{1}' in schema `{0}`")]
    InvalidAttribute(String, String),

    /// Error when the raw value does not fit the shape of the element, e.g. a
    /// mapping given for a primitive element.
    #[strum(to_string = "Unexpected value for element '{1}' of schema `{0}`")]
    UnexpectedValue(String, String),

    /// Error when a primitive value cannot be converted to its declared type.
    #[strum(to_string = "Value \"{1}\" is not a valid {0}")]
    InvalidPrimitive(PrimitiveType, String),

    /// Error when the XML input is not well-formed.
    #[strum(to_string = "Malformed XML: {0}")]
    MalformedXml(String),

    /// Error when writing the XML output fails.
    #[strum(to_string = "Unable to write XML")]
    XmlWrite,
}

impl bherror::BhError for Error {}

/// Errors raised while registering or resolving schemas.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum SchemaError {
    /// Two schemas were registered under the same name.
    #[strum(to_string = "Schema `{0}` is already registered")]
    DuplicateSchema(String),

    /// Two descriptors of one schema share a field name.
    #[strum(to_string = "Field '{1}' is declared twice in schema `{0}`")]
    DuplicateField(String, String),

    /// A nested element references a schema that was never registered.
    #[strum(to_string = "Schema `{0}` references unregistered schema `{1}`")]
    UnresolvedReference(String, String),

    /// The requested schema is not part of the registry.
    #[strum(to_string = "Unknown schema `{0}`")]
    UnknownSchema(String),

    /// The label of the schema is not one of its primitive elements.
    #[strum(to_string = "Label '{1}' of schema `{0}` is not a primitive element")]
    InvalidLabel(String, String),
}

impl bherror::BhError for SchemaError {}

/// Type alias for [`bherror::Result`] types returned by the crate's API.
pub type Result<T> = bherror::Result<T, Error>;
