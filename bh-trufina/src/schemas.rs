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

//! The element schemas of the Trufina API.
//!
//! Request and response documents live in the [`NAMESPACE`] namespace. Their
//! nested groups declare no namespace of their own and are looked up in the
//! namespace of the enclosing document.

use bh_xml_binding::{
    AttributeDescriptor, ElementDescriptor, PrimitiveType, Schema, SchemaBuilder, SchemaRegistry,
};
use lazy_static::lazy_static;

/// Namespace of every document exchanged with Trufina.
pub const NAMESPACE: &str = "http://www.trufina.com/truapi/1/0";

/// Attributes Trufina attaches to the values it returns.
pub const RESPONSE_ATTRIBUTES: [&str; 5] = ["state", "age", "charged", "status", "errors"];

/// Schema of the nested person name.
pub const NAME: &str = "Name";
/// Schema of a single street address line.
pub const STREET_ADDRESS: &str = "StreetAddress";
/// Schema of the residence address.
pub const RESIDENCE_ADDRESS: &str = "ResidenceAddress";
/// Schema of the data Trufina returns about a user.
pub const ACCESS_RESPONSE_GROUP: &str = "AccessResponseGroup";
/// Schema of the data a partner requests about a user.
pub const ACCESS_REQUEST: &str = "AccessRequest";
/// Schema of the data a partner already knows about a user.
pub const SEED_INFO_GROUP: &str = "SeedInfoGroup";

lazy_static! {
    static ref REGISTRY: SchemaRegistry =
        build_registry().expect("built-in Trufina schemas must be valid");
}

/// The registry holding every Trufina schema.
///
/// Request schemas are registered under their root tags (e.g.
/// `TrufinaLoginRequest`), response schemas under their response kind (e.g.
/// `LoginResponse`).
pub fn registry() -> &'static SchemaRegistry {
    &REGISTRY
}

fn response_attributes() -> impl Iterator<Item = AttributeDescriptor> {
    RESPONSE_ATTRIBUTES.into_iter().map(AttributeDescriptor::new)
}

fn reported(field_name: &str, xml_tag: &str) -> ElementDescriptor {
    ElementDescriptor::string(field_name, xml_tag).with_attributes(response_attributes())
}

fn token(field_name: &str, xml_tag: &str) -> ElementDescriptor {
    ElementDescriptor::string(field_name, xml_tag).required()
}

fn groups() -> Vec<SchemaBuilder> {
    let name = Schema::builder(NAME, "Name")
        .element(reported("prefix", "Prefix"))
        .element(reported("first", "First"))
        .element(reported("middle", "MiddleName"))
        .element(reported("middle_initial", "MiddleInitial"))
        .element(reported("surname", "Surname"))
        .element(reported("suffix", "Suffix"));

    let street_address = Schema::builder(STREET_ADDRESS, "StreetAddress")
        .element(ElementDescriptor::string("name", "StreetAddress"))
        .attributes(response_attributes())
        .label("name");

    let residence_address = Schema::builder(RESIDENCE_ADDRESS, "ResidenceAddress")
        .element(ElementDescriptor::nested("street_addresses", STREET_ADDRESS).many())
        .element(reported("city", "City"))
        .element(reported("state", "State"))
        .element(reported("postal_code", "PostalCode"))
        .attribute(AttributeDescriptor::new("timeframe"));

    let access_response = Schema::builder(ACCESS_RESPONSE_GROUP, "AccessResponse")
        .element(ElementDescriptor::nested("name", NAME))
        // Kept as reported, read with `Leaf::as_date`.
        .element(reported("birth_date", "DateOfBirth"))
        .element(reported("birth_country", "CountryOfBirth"))
        .element(reported("phone", "Phone"))
        .element(ElementDescriptor::nested("residence_address", RESIDENCE_ADDRESS))
        .element(reported("ssn", "fullSSN"))
        .element(reported("last_4_ssn", "Last4SSN"))
        .element(reported("age", "Age"));

    let access_request = Schema::builder(ACCESS_REQUEST, "AccessRequest")
        .element(ElementDescriptor::nested("name", NAME))
        .element(ElementDescriptor::primitive(
            "birth_date",
            "DateOfBirth",
            PrimitiveType::Date,
        ))
        .element(ElementDescriptor::string("birth_country", "CountryOfBirth"))
        .element(ElementDescriptor::string("phone", "Phone"))
        .element(ElementDescriptor::nested("residence_address", RESIDENCE_ADDRESS))
        .element(ElementDescriptor::string("ssn", "fullSSN"))
        .element(ElementDescriptor::string("last_4_ssn", "Last4SSN"))
        .element(
            ElementDescriptor::string("age", "Age")
                .with_attributes([AttributeDescriptor::new("comparison")]),
        );

    let seed_info = Schema::builder(SEED_INFO_GROUP, "SeedInfo")
        .element(ElementDescriptor::nested("name", NAME))
        .element(ElementDescriptor::string("email", "email"))
        .element(ElementDescriptor::primitive(
            "birth_date",
            "DateOfBirth",
            PrimitiveType::Date,
        ))
        .element(ElementDescriptor::string("birth_country", "CountryOfBirth"))
        .element(ElementDescriptor::string("phone", "Phone"))
        .element(ElementDescriptor::nested("residence_address", RESIDENCE_ADDRESS))
        .element(ElementDescriptor::string("ssn", "fullSSN"))
        .element(ElementDescriptor::string("last_4_ssn", "Last4SSN"))
        .element(ElementDescriptor::string("age", "Age"));

    vec![
        name,
        street_address,
        residence_address,
        access_response,
        access_request,
        seed_info,
    ]
}

fn requests() -> Vec<SchemaBuilder> {
    let login = Schema::builder("TrufinaLoginRequest", "TrufinaLoginRequest")
        .namespace(NAMESPACE)
        .element(token("pid", "PID"))
        .element(token("prt", "PRT"))
        .element(token("pak", "PAK"))
        .element(token("cancel_url", "CancelURL"))
        .element(token("success_url", "SuccessURL"))
        .element(token("failure_url", "FailureURL"))
        .element(ElementDescriptor::nested("data", ACCESS_REQUEST))
        .element(ElementDescriptor::nested("seed", SEED_INFO_GROUP));

    let info = Schema::builder("TrufinaInfoRequest", "TrufinaInfoRequest")
        .namespace(NAMESPACE)
        .element(token("pid", "PID"))
        .element(token("tnid", "TNID"))
        .element(token("pak", "PAK"));

    let login_info = Schema::builder("TrufinaLoginInfoRequest", "TrufinaLoginInfoRequest")
        .namespace(NAMESPACE)
        .element(token("pid", "PID"))
        .element(token("tlid", "TLID"))
        .element(token("pak", "PAK"));

    let access = Schema::builder("TrufinaAccessRequest", "TrufinaAccessRequest")
        .namespace(NAMESPACE)
        .element(token("pid", "PID"))
        .element(token("prt", "PRT"))
        .element(token("tlid", "TLID"))
        .element(token("pak", "PAK"))
        .element(token("pur", "PUR"))
        .element(ElementDescriptor::nested("data", ACCESS_REQUEST).required());

    vec![login, info, login_info, access]
}

fn responses() -> Vec<SchemaBuilder> {
    let error = || ElementDescriptor::string("error", "Error");

    let request_failure = Schema::builder("RequestFailure", "TrufinaRequestFailure")
        .namespace(NAMESPACE)
        .element(error().with_attributes([AttributeDescriptor::new("kind")]));

    let access_notification = Schema::builder("AccessNotification", "TrufinaAccessNotification")
        .namespace(NAMESPACE)
        .element(ElementDescriptor::string("prt", "PRT"))
        .element(ElementDescriptor::string("tnid", "TNID"));

    let access = Schema::builder("AccessResponse", "TrufinaAccessResponse")
        .namespace(NAMESPACE)
        .element(ElementDescriptor::string("prt", "PRT"))
        .element(ElementDescriptor::nested("data", ACCESS_RESPONSE_GROUP))
        .element(error());

    let info = Schema::builder("InfoResponse", "TrufinaInfoResponse")
        .namespace(NAMESPACE)
        .element(ElementDescriptor::string("prt", "PRT"))
        .element(ElementDescriptor::string("tnid", "TNID"))
        .element(ElementDescriptor::string("pur", "PUR"))
        .element(ElementDescriptor::nested("data", ACCESS_RESPONSE_GROUP))
        .element(error());

    let login_info = Schema::builder("LoginInfoResponse", "TrufinaLoginInfoResponse")
        .namespace(NAMESPACE)
        .element(ElementDescriptor::string("tlid", "TLID"))
        .element(ElementDescriptor::string("prt", "PRT"))
        .element(ElementDescriptor::string("pur", "PUR"))
        .element(ElementDescriptor::nested("data", ACCESS_RESPONSE_GROUP))
        .element(error());

    let login = Schema::builder("LoginResponse", "TrufinaLoginResponse")
        .namespace(NAMESPACE)
        .element(ElementDescriptor::string("prt", "PRT"))
        .element(ElementDescriptor::string("plid", "PLID"))
        .element(error());

    vec![
        request_failure,
        access_notification,
        access,
        info,
        login_info,
        login,
    ]
}

fn build_registry() -> bh_xml_binding::Result<SchemaRegistry> {
    groups()
        .into_iter()
        .chain(requests())
        .chain(responses())
        .try_fold(SchemaRegistry::builder(), |builder, schema| {
            builder.register(schema)
        })?
        .build()
}
