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

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! This crate implements schema-driven binding between XML documents and typed element trees.
//!
//! Every element kind is described once by a [`Schema`], a list of named and typed slots that
//! map to XML child elements and attributes. Schemas are collected into an immutable
//! [`SchemaRegistry`] which resolves references between them up front, so that nothing is looked
//! up by string at the time documents are built or read.
//!
//! # Details
//!
//! The main components of this crate are the following.
//!
//! * [`schema`] -- Element, attribute and schema descriptors, and the registry.
//! * [`NodeBuilder`] -- Builds an [`Element`] tree from loosely structured [`Raw`] caller input.
//! * [`Element`] -- A concrete instance of a schema, with accessors and validation helpers.
//! * [`verified_facts`] -- Keeps only the values a remote party marked as verified and present.
//! * [`XmlNode`] -- Namespace-aware XML reading, plus [`Element::to_xml`] for writing.
//!
//! # Example
//!
//! ```rust
//! use bh_xml_binding::{ElementDescriptor, NodeBuilder, Raw, Schema, SchemaRegistry};
//!
//! let registry = SchemaRegistry::builder()
//!     .register(
//!         Schema::builder("Name", "Name")
//!             .element(ElementDescriptor::string("first", "First"))
//!             .element(ElementDescriptor::string("surname", "Surname")),
//!     )
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let name = NodeBuilder::new(&registry)
//!     .build("Name", &Raw::map([("first", Raw::from("Bob"))]))
//!     .unwrap();
//!
//! assert_eq!(name.text("first"), Some("Bob"));
//! assert!(name.to_xml().unwrap().contains("<First>Bob</First>"));
//! ```

pub use builder::NodeBuilder;
pub use element::{Attributes, Element, Leaf, Node, Slot};
pub use error::{Error, Result, SchemaError};
pub use filter::{verified_facts, Fact, VerifiedFacts};
pub use raw::Raw;
pub use schema::{
    AttributeDescriptor, Cardinality, ElementDescriptor, FieldRef, PrimitiveType, RegistryBuilder,
    Schema, SchemaBuilder, SchemaRegistry, ValueKind,
};
pub use xml::{parse_element, XmlNode};

mod builder;
mod element;
mod error;
mod filter;
mod raw;
pub mod schema;
#[cfg(test)]
mod test_utils;
mod xml;
