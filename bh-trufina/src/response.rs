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

//! Classification and parsing of inbound Trufina documents.

use bh_xml_binding::{verified_facts, Element, Leaf, VerifiedFacts, XmlNode};
use bherror::traits::PropagateError as _;

use crate::{schemas, Error, Result};

/// Prefix of the root tag of every Trufina response.
pub const ROOT_TAG_PREFIX: &str = "Trufina";

/// Upper bound on the raw XML kept in [`Error::UnknownResponseType`].
pub const MAX_RAW_XML_LEN: usize = 16 * 1024;

/// The documents Trufina sends to a partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum ResponseKind {
    /// Answer to a login request.
    LoginResponse,
    /// Answer to a login info request.
    LoginInfoResponse,
    /// Answer to an info request.
    InfoResponse,
    /// Answer to an access request.
    AccessResponse,
    /// Asynchronous notification that new data is available.
    AccessNotification,
    /// Document-level failure of any request.
    RequestFailure,
}

impl ResponseKind {
    /// Every response kind.
    pub const ALL: [Self; 6] = [
        Self::LoginResponse,
        Self::LoginInfoResponse,
        Self::InfoResponse,
        Self::AccessResponse,
        Self::AccessNotification,
        Self::RequestFailure,
    ];

    /// Look up the kind named `discriminant`, i.e. the root tag without its
    /// [`ROOT_TAG_PREFIX`].
    pub fn from_discriminant(discriminant: &str) -> Option<Self> {
        let kind = match discriminant {
            "LoginResponse" => Self::LoginResponse,
            "LoginInfoResponse" => Self::LoginInfoResponse,
            "InfoResponse" => Self::InfoResponse,
            "AccessResponse" => Self::AccessResponse,
            "AccessNotification" => Self::AccessNotification,
            "RequestFailure" => Self::RequestFailure,
            _ => return None,
        };
        Some(kind)
    }

    /// Name of the schema describing this kind.
    pub fn schema_name(self) -> &'static str {
        match self {
            Self::LoginResponse => "LoginResponse",
            Self::LoginInfoResponse => "LoginInfoResponse",
            Self::InfoResponse => "InfoResponse",
            Self::AccessResponse => "AccessResponse",
            Self::AccessNotification => "AccessNotification",
            Self::RequestFailure => "RequestFailure",
        }
    }
}

/// A successfully parsed Trufina response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDocument {
    kind: ResponseKind,
    element: Element,
}

impl ResponseDocument {
    /// The kind of the response.
    pub fn kind(&self) -> ResponseKind {
        self.kind
    }

    /// The root element of the response.
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Consume the document, returning its root element.
    pub fn into_element(self) -> Element {
        self.element
    }

    /// Partner reference token.
    pub fn prt(&self) -> Option<&str> {
        self.element.text("prt")
    }

    /// Temporary login ID to send the user to.
    pub fn plid(&self) -> Option<&str> {
        self.element.text("plid")
    }

    /// Temporary notification ID.
    pub fn tnid(&self) -> Option<&str> {
        self.element.text("tnid")
    }

    /// Temporary login ID.
    pub fn tlid(&self) -> Option<&str> {
        self.element.text("tlid")
    }

    /// Purpose code.
    pub fn pur(&self) -> Option<&str> {
        self.element.text("pur")
    }

    /// The returned user data.
    pub fn data(&self) -> Option<&Element> {
        self.element.element("data")
    }

    /// The returned user data Trufina verified.
    pub fn verified_facts(&self) -> Option<VerifiedFacts> {
        self.data().map(verified_facts)
    }

    /// The returned name as a single line, see [`full_name`].
    pub fn full_name(&self) -> Option<String> {
        self.data()?.element("name").map(full_name)
    }

    /// The returned residence address as a single line, see [`address_line`].
    pub fn address_line(&self) -> Option<String> {
        self.data()?
            .element("residence_address")
            .map(address_line)
    }
}

/// Join the parts of a `Name` element with spaces, from prefix to suffix.
pub fn full_name(name: &Element) -> String {
    join_present(
        name.fields()
            .filter_map(|(descriptor, _)| name.text(descriptor.field_name())),
        " ",
    )
}

/// Join the first two street lines, city, state and postal code of a
/// `ResidenceAddress` element with commas.
pub fn address_line(address: &Element) -> String {
    let streets = address.texts("street_addresses");
    let rest = ["city", "state", "postal_code"]
        .into_iter()
        .filter_map(|field_name| address.text(field_name));

    join_present(streets.into_iter().take(2).chain(rest), ", ")
}

fn join_present<'a>(parts: impl Iterator<Item = &'a str>, separator: &str) -> String {
    parts
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Parse a document received from Trufina.
///
/// Fails with [`Error::UnknownResponseType`] if the root tag names no known
/// response, with [`Error::MalformedResponse`] if the document cannot be
/// parsed, and with [`Error::TrufinaResponse`] if Trufina reported an error,
/// either as a `TrufinaRequestFailure` or inline in the response.
pub fn parse(raw_xml: &str) -> Result<ResponseDocument> {
    tracing::debug!(xml = raw_xml, "Received Trufina response");

    let node = XmlNode::parse(raw_xml).match_err(malformed)?;

    let Some(kind) = node
        .name()
        .strip_prefix(ROOT_TAG_PREFIX)
        .and_then(ResponseKind::from_discriminant)
    else {
        return Err(bherror::Error::root(Error::UnknownResponseType(bounded(
            raw_xml,
        ))));
    };

    let registry = schemas::registry();
    let schema = registry
        .get(kind.schema_name())
        .match_err(crate::error::binding_err)?;
    let element = Element::from_xml(registry, schema, &node).match_err(malformed)?;

    tracing::debug!(kind = %kind, "Dispatched Trufina response");

    if kind == ResponseKind::RequestFailure {
        let error = element.leaf("error");
        let error_kind = error.and_then(|error| error.attribute("kind"));
        return Err(bherror::Error::root(Error::TrufinaResponse(
            error_kind.unwrap_or_default().to_owned(),
            error.map(Leaf::text).unwrap_or_default().to_owned(),
        )));
    }

    if let Some(error) = element.leaf("error") {
        return Err(bherror::Error::root(Error::TrufinaResponse(
            kind.to_string(),
            error.text().to_owned(),
        )));
    }

    Ok(ResponseDocument { kind, element })
}

fn malformed(error: &bh_xml_binding::Error) -> Error {
    Error::MalformedResponse(error.to_string())
}

fn bounded(raw_xml: &str) -> String {
    if raw_xml.len() <= MAX_RAW_XML_LEN {
        return raw_xml.to_owned();
    }

    let mut end = MAX_RAW_XML_LEN;
    while !raw_xml.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &raw_xml[..end])
}
