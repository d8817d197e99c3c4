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

//! Assembly and validation of outbound request documents.

use bh_xml_binding::{Element, Node, NodeBuilder, Raw, Slot};
use bherror::traits::PropagateError as _;

use crate::{
    error::binding_err,
    schemas::{self, ACCESS_REQUEST, SEED_INFO_GROUP},
    Config, Error, FieldList, Mode, Result,
};

const CURRENT_TIMEFRAME: &str = "current";

/// The requests a partner can send to Trufina.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum RequestKind {
    /// Starts a user login, answered by a `TrufinaLoginResponse`.
    Login,
    /// Fetches the data behind an access notification.
    Info,
    /// Fetches the data shared during a login.
    LoginInfo,
    /// Requests additional data about a user who already logged in.
    Access,
}

impl RequestKind {
    /// Root tag of the request document, which is also the name of its schema.
    pub fn root_tag(self) -> &'static str {
        match self {
            Self::Login => "TrufinaLoginRequest",
            Self::Info => "TrufinaInfoRequest",
            Self::LoginInfo => "TrufinaLoginInfoRequest",
            Self::Access => "TrufinaAccessRequest",
        }
    }

    /// The correlation token that must be supplied up front, if any.
    fn token(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Login => Some(("prt", "PRT")),
            Self::Info => Some(("tnid", "TNID")),
            Self::LoginInfo => Some(("tlid", "TLID")),
            Self::Access => None,
        }
    }
}

/// Caller supplied contents of a request.
///
/// Fields the requested [`RequestKind`] does not declare are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFields {
    /// Partner reference token.
    pub prt: Option<String>,
    /// Temporary notification ID.
    pub tnid: Option<String>,
    /// Temporary login ID.
    pub tlid: Option<String>,
    /// Purpose code.
    pub pur: Option<String>,
    /// The requested data, following the `AccessRequest` schema.
    pub data: Raw,
    /// Data the partner already knows, following the `SeedInfoGroup` schema.
    pub seed: Raw,
}

impl RequestFields {
    fn token(&self, field_name: &str) -> Option<&str> {
        match field_name {
            "prt" => self.prt.as_deref(),
            "tnid" => self.tnid.as_deref(),
            "tlid" => self.tlid.as_deref(),
            "pur" => self.pur.as_deref(),
            _ => None,
        }
    }
}

/// A validated request, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDocument {
    kind: RequestKind,
    element: Element,
}

impl RequestDocument {
    /// The kind of the request.
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// The root element of the request.
    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Render the request as an XML document.
    pub fn to_xml(&self) -> Result<String> {
        self.element.to_xml().match_err(binding_err)
    }
}

/// Builds request documents, injecting the partner configuration of one
/// [`Mode`].
#[derive(Debug, Clone, Copy)]
pub struct Assembler<'c> {
    config: &'c Config,
    mode: Mode,
}

impl<'c> Assembler<'c> {
    /// Create an assembler using the credentials of `mode`.
    pub fn new(config: &'c Config, mode: Mode) -> Self {
        Self { config, mode }
    }

    /// The mode whose credentials are injected.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Assemble and validate a request of `kind`.
    pub fn assemble(&self, kind: RequestKind, fields: &RequestFields) -> Result<RequestDocument> {
        if let Some((field_name, tag)) = kind.token() {
            if is_blank(fields.token(field_name)) {
                return Err(bherror::Error::root(Error::MissingToken(tag)));
            }
        }

        let registry = schemas::registry();
        let schema = registry.get(kind.root_tag()).match_err(binding_err)?;
        let mut element = Element::empty(schema.clone());

        let credentials = self.config.credentials(self.mode);
        let endpoints = &self.config.endpoints;
        let injected = [
            ("pid", credentials.pid.as_str()),
            ("pak", credentials.pak.as_str()),
            ("success_url", endpoints.success.as_str()),
            ("failure_url", endpoints.failure.as_str()),
            ("cancel_url", endpoints.cancel.as_str()),
        ];
        for (field_name, value) in injected {
            set_if_declared(&mut element, field_name, Some(value))?;
        }
        for field_name in ["prt", "tnid", "tlid", "pur"] {
            set_if_declared(&mut element, field_name, fields.token(field_name))?;
        }

        let builder = NodeBuilder::new(registry);
        if schema.element("data").is_some() {
            let data = builder
                .build(ACCESS_REQUEST, &fields.data)
                .match_err(binding_err)?;
            if !data.is_empty() {
                element
                    .set_slot("data", Slot::One(Node::Element(data)))
                    .match_err(binding_err)?;
            }
        }
        if schema.element("seed").is_some() && !fields.seed.is_empty() {
            let mut seed = builder
                .build(SEED_INFO_GROUP, &fields.seed)
                .match_err(binding_err)?;
            // Trufina rejects seeded addresses of any other timeframe.
            if let Some(address) = seed.element_mut("residence_address") {
                address
                    .set_attribute("timeframe", CURRENT_TIMEFRAME)
                    .match_err(binding_err)?;
            }
            element
                .set_slot("seed", Slot::One(Node::Element(seed)))
                .match_err(binding_err)?;
        }

        validate_contents(&element)?;

        tracing::debug!(kind = %kind, mode = %self.mode, "Assembled Trufina request");

        Ok(RequestDocument { kind, element })
    }

    /// Assemble a login request for the partner reference token `prt`.
    ///
    /// `data` lists the values requested from the user, `seed` the values the
    /// partner already knows; either may be [`Raw::Empty`].
    pub fn login_request(
        &self,
        prt: &str,
        data: impl Into<Raw>,
        seed: impl Into<Raw>,
    ) -> Result<RequestDocument> {
        let fields = RequestFields {
            prt: Some(prt.to_owned()),
            data: data.into(),
            seed: seed.into(),
            ..Default::default()
        };
        self.assemble(RequestKind::Login, &fields)
    }

    /// Assemble an info request for the notification ID `tnid`.
    pub fn info_request(&self, tnid: &str) -> Result<RequestDocument> {
        let fields = RequestFields {
            tnid: Some(tnid.to_owned()),
            ..Default::default()
        };
        self.assemble(RequestKind::Info, &fields)
    }

    /// Assemble a login info request for the login ID `tlid`.
    pub fn login_info_request(&self, tlid: &str) -> Result<RequestDocument> {
        let fields = RequestFields {
            tlid: Some(tlid.to_owned()),
            ..Default::default()
        };
        self.assemble(RequestKind::LoginInfo, &fields)
    }

    /// Assemble an access request for additional `data` about the user
    /// identified by `prt` and `tlid`, for the purpose `pur`.
    pub fn access_request(
        &self,
        prt: &str,
        tlid: &str,
        pur: &str,
        data: impl Into<Raw>,
    ) -> Result<RequestDocument> {
        let fields = RequestFields {
            prt: Some(prt.to_owned()),
            tlid: Some(tlid.to_owned()),
            pur: Some(pur.to_owned()),
            data: data.into(),
            ..Default::default()
        };
        self.assemble(RequestKind::Access, &fields)
    }
}

/// Check that every required element and attribute of `element` and of its
/// nested elements is set.
///
/// All missing elements are reported at once, before any missing attribute.
/// Nested fields are reported by their dotted path, e.g. `data.name`.
pub fn validate_contents(element: &Element) -> Result<()> {
    let mut elements = Vec::new();
    let mut attributes = Vec::new();
    collect_missing(element, "", &mut elements, &mut attributes);

    if !elements.is_empty() {
        return Err(bherror::Error::root(Error::MissingRequiredElements(
            FieldList(elements),
        )));
    }
    if !attributes.is_empty() {
        return Err(bherror::Error::root(Error::MissingRequiredAttributes(
            FieldList(attributes),
        )));
    }

    Ok(())
}

fn collect_missing(
    element: &Element,
    prefix: &str,
    elements: &mut Vec<String>,
    attributes: &mut Vec<String>,
) {
    elements.extend(
        element
            .missing_required_elements()
            .into_iter()
            .map(|name| format!("{prefix}{name}")),
    );
    attributes.extend(
        element
            .missing_required_attributes()
            .into_iter()
            .map(|name| format!("{prefix}{name}")),
    );

    for (descriptor, slot) in element.fields() {
        let prefix = format!("{prefix}{}.", descriptor.field_name());
        for nested in slot.nodes().iter().filter_map(Node::as_element) {
            collect_missing(nested, &prefix, elements, attributes);
        }
    }
}

fn set_if_declared(element: &mut Element, field_name: &str, value: Option<&str>) -> Result<()> {
    if element.schema().element(field_name).is_none() || is_blank(value) {
        return Ok(());
    }

    element
        .set_text(field_name, value.unwrap_or_default())
        .match_err(binding_err)
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |value| value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use bh_xml_binding::{
        AttributeDescriptor, ElementDescriptor, NodeBuilder, Schema, SchemaRegistry,
    };
    use serde_json::json;

    use super::*;
    use crate::test_utils::config;

    #[test]
    fn test_login_request() {
        let config = config();
        let assembler = Assembler::new(&config, Mode::Staging);

        let request = assembler
            .login_request("prt-1", Raw::fields(["name", "phone"]), Raw::Empty)
            .unwrap();

        let element = request.element();
        assert_eq!(request.kind(), RequestKind::Login);
        assert_eq!(element.text("pid"), Some("1234"));
        assert_eq!(element.text("pak"), Some("staging-key"));
        assert_eq!(element.text("prt"), Some("prt-1"));
        assert_eq!(
            element.text("success_url"),
            Some("https://partner.example/trufina/success")
        );
        assert!(element.element("data").unwrap().element("name").is_some());
        assert!(element.slot("seed").unwrap().is_unset());

        let xml = request.to_xml().unwrap();
        assert!(xml.contains(
            r#"<TrufinaLoginRequest xmlns="http://www.trufina.com/truapi/1/0">"#
        ));
        assert!(xml.contains("<PRT>prt-1</PRT>"));
        assert!(xml.contains("<Name/>"));
        assert!(xml.contains("<Phone/>"));
    }

    #[test]
    fn test_credentials_follow_mode() {
        let config = config();

        let request = Assembler::new(&config, Mode::Production)
            .info_request("tnid-1")
            .unwrap();

        assert_eq!(request.element().text("pak"), Some("production-key"));
        assert_eq!(request.element().text("tnid"), Some("tnid-1"));
    }

    #[test]
    fn test_missing_token() {
        let config = config();
        let assembler = Assembler::new(&config, Mode::Staging);

        let error = assembler
            .login_request("  ", Raw::Empty, Raw::Empty)
            .unwrap_err();
        assert_eq!(error.error, Error::MissingToken("PRT"));

        let error = assembler.info_request("").unwrap_err();
        assert_eq!(error.error, Error::MissingToken("TNID"));

        let error = assembler.login_info_request("").unwrap_err();
        assert_eq!(error.error, Error::MissingToken("TLID"));
    }

    #[test]
    fn test_seeded_residence_address_is_current() {
        let config = config();
        let assembler = Assembler::new(&config, Mode::Staging);

        for seed in [
            json!({ "residence_address": { "city": "Springfield" } }),
            json!({ "residence_address": { "city": "Springfield", "timeframe": "past" } }),
        ] {
            let request = assembler
                .login_request("prt-1", Raw::Empty, seed)
                .unwrap();

            let address = request
                .element()
                .element("seed")
                .unwrap()
                .element("residence_address")
                .unwrap();
            assert_eq!(address.attribute("timeframe"), Some("current"));

            let xml = request.to_xml().unwrap();
            assert!(xml.contains(r#"<ResidenceAddress timeframe="current">"#));
        }
    }

    #[test]
    fn test_seed_without_address_is_untouched() {
        let config = config();

        let request = Assembler::new(&config, Mode::Staging)
            .login_request("prt-1", Raw::Empty, json!({ "email": "bob@example.com" }))
            .unwrap();

        let seed = request.element().element("seed").unwrap();
        assert_eq!(seed.text("email"), Some("bob@example.com"));
        assert!(seed.slot("residence_address").unwrap().is_unset());
    }

    #[test]
    fn test_unknown_data_field() {
        let config = config();

        let error = Assembler::new(&config, Mode::Staging)
            .login_request("prt-1", json!({ "nickname": "Bobby" }), Raw::Empty)
            .unwrap_err();

        assert!(matches!(
            error.error,
            Error::Binding(bh_xml_binding::Error::InvalidElement(_, ref name)) if name == "nickname"
        ));
    }

    #[test]
    fn test_access_request_lists_every_missing_element() {
        let mut config = config();
        config.staging.pak = " ".to_owned();
        let assembler = Assembler::new(&config, Mode::Staging);

        let error = assembler
            .access_request("prt-1", "", "", Raw::Empty)
            .unwrap_err();

        assert_eq!(
            error.error,
            Error::MissingRequiredElements(FieldList(vec![
                "tlid".to_owned(),
                "pak".to_owned(),
                "pur".to_owned(),
                "data".to_owned(),
            ]))
        );
        assert_eq!(
            error.error.to_string(),
            "Missing required elements: tlid, pak, pur, data"
        );
    }

    #[test]
    fn test_access_request() {
        let config = config();

        let request = Assembler::new(&config, Mode::Staging)
            .access_request("prt-1", "tlid-1", "pur-1", json!({ "age": "21" }))
            .unwrap();

        let element = request.element();
        assert_eq!(element.text("pur"), Some("pur-1"));
        assert_eq!(element.element("data").unwrap().text("age"), Some("21"));
    }

    #[test]
    fn test_missing_required_attributes() {
        let registry = SchemaRegistry::builder()
            .register(
                Schema::builder("Query", "Query")
                    .element(
                        ElementDescriptor::string("age", "Age")
                            .with_attributes([AttributeDescriptor::new("comparison").required()]),
                    )
                    .element(ElementDescriptor::nested("sub", "Query"))
                    .attribute(AttributeDescriptor::new("id").required()),
            )
            .unwrap()
            .build()
            .unwrap();

        let query = NodeBuilder::new(&registry)
            .build(
                "Query",
                &json!({ "age": "21", "sub": { "id": "2", "age": "" } }).into(),
            )
            .unwrap();

        let error = validate_contents(&query).unwrap_err();

        assert_eq!(
            error.error,
            Error::MissingRequiredAttributes(FieldList(vec![
                "id".to_owned(),
                "age@comparison".to_owned(),
                "sub.age@comparison".to_owned(),
            ]))
        );
    }
}
