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

use lazy_static::lazy_static;

use crate::schema::{
    AttributeDescriptor, ElementDescriptor, PrimitiveType, Schema, SchemaRegistry,
};

pub(crate) const PERSON_NAMESPACE: &str = "urn:example:person";

lazy_static! {
    static ref REGISTRY: SchemaRegistry = build_registry();
}

/// Registry with a small person record used throughout the unit tests.
pub(crate) fn registry() -> &'static SchemaRegistry {
    &REGISTRY
}

fn remote_attributes() -> [AttributeDescriptor; 2] {
    [
        AttributeDescriptor::new("state"),
        AttributeDescriptor::new("status"),
    ]
}

fn verifiable(field_name: &str, xml_tag: &str) -> ElementDescriptor {
    ElementDescriptor::string(field_name, xml_tag).with_attributes(remote_attributes())
}

fn build_registry() -> SchemaRegistry {
    let name = Schema::builder("Name", "Name")
        .element(verifiable("prefix", "Prefix"))
        .element(verifiable("first", "First"))
        .element(verifiable("middle", "MiddleName"))
        .element(verifiable("surname", "Surname"))
        .element(verifiable("suffix", "Suffix"));

    let street_address = Schema::builder("StreetAddress", "StreetAddress")
        .element(ElementDescriptor::string("name", "StreetAddress"))
        .attributes(remote_attributes())
        .label("name");

    let residence_address = Schema::builder("ResidenceAddress", "ResidenceAddress")
        .element(ElementDescriptor::nested("street_addresses", "StreetAddress").many())
        .element(verifiable("city", "City"))
        .element(verifiable("postal_code", "PostalCode"))
        .attribute(AttributeDescriptor::new("timeframe"));

    let person = Schema::builder("Person", "Person")
        .namespace(PERSON_NAMESPACE)
        .element(ElementDescriptor::nested("name", "Name").required())
        .element(ElementDescriptor::primitive(
            "birth_date",
            "DateOfBirth",
            PrimitiveType::Date,
        ))
        .element(
            ElementDescriptor::primitive("age", "Age", PrimitiveType::Integer)
                .with_attributes([AttributeDescriptor::new("comparison").required()]),
        )
        .element(verifiable("phone", "Phone").required())
        .element(ElementDescriptor::nested("residence_address", "ResidenceAddress"))
        .attribute(AttributeDescriptor::new("id").required());

    SchemaRegistry::builder()
        .register(name)
        .and_then(|builder| builder.register(street_address))
        .and_then(|builder| builder.register(residence_address))
        .and_then(|builder| builder.register(person))
        .and_then(|builder| builder.build())
        .expect("test schemas must be valid")
}
