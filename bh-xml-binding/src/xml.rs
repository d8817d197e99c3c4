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

//! XML reading and writing of [`Element`]s.
//!
//! Parsing goes through a small owned tree, [`XmlNode`], which records the
//! resolved namespace of every element. Child lookups first try the declared
//! namespace and fall back to unqualified children, since some documents
//! qualify their elements and others do not.

use std::sync::Arc;

use bherror::traits::ForeignError as _;
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    name::{Namespace, ResolveResult},
    NsReader, Writer,
};

use crate::{
    element::{check_primitive, Element, Leaf, Node, Slot},
    schema::{ElementDescriptor, Schema, SchemaRegistry, ValueKind},
    Error, Result,
};

const XML_VERSION: &str = "1.0";
const XML_ENCODING: &str = "UTF-8";
const INDENT_SIZE: usize = 2;

/// Deepest element nesting [`XmlNode::parse`] accepts.
pub const MAX_DEPTH: usize = 128;

/// An owned XML element with its namespace resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    name: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
    text: String,
}

impl XmlNode {
    /// Parse a whole XML document and return its root element.
    ///
    /// Text is kept as received, except for whitespace-only text next to
    /// child elements. Documents nested deeper than [`MAX_DEPTH`] are
    /// rejected.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(xml);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root = None;
        // Whitespace-only text of the innermost open element, kept until it
        // is known whether a child element follows.
        let mut pending = String::new();

        loop {
            let (resolved, event) = reader
                .read_resolved_event()
                .match_foreign_err(|error| Error::MalformedXml(error.to_string()))?;
            let namespace = resolved_namespace(resolved)?;

            match event {
                Event::Start(start) => {
                    if stack.len() >= MAX_DEPTH {
                        return Err(malformed("document nested too deeply"));
                    }
                    pending.clear();
                    stack.push(Self::open(&start, namespace)?);
                }
                Event::Empty(start) => {
                    pending.clear();
                    let node = Self::open(&start, namespace)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::End(_) => {
                    let Some(mut node) = stack.pop() else {
                        return Err(malformed("unexpected closing tag"));
                    };
                    node.text.push_str(&pending);
                    pending.clear();
                    attach(&mut stack, &mut root, node)?;
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .match_foreign_err(|error| Error::MalformedXml(error.to_string()))?;
                    push_text(&mut stack, &mut pending, &text);
                }
                Event::CData(data) => {
                    let text = String::from_utf8(data.into_inner().into_owned())
                        .match_foreign_err(|error| Error::MalformedXml(error.to_string()))?;
                    push_text(&mut stack, &mut pending, &text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(malformed("unclosed element"));
        }

        root.ok_or_else(|| malformed("document has no root element"))
    }

    fn open(start: &BytesStart, namespace: Option<String>) -> Result<Self> {
        let name = utf8(start.local_name().as_ref())?;

        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute =
                attribute.match_foreign_err(|error| Error::MalformedXml(error.to_string()))?;
            if attribute.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = utf8(attribute.key.local_name().as_ref())?;
            let value = attribute
                .unescape_value()
                .match_foreign_err(|error| Error::MalformedXml(error.to_string()))?;
            attributes.push((key, value.into_owned()));
        }

        Ok(Self {
            name,
            namespace,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    /// Local name of the element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved namespace URI of the element.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Value of the attribute with the local name `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Text content directly inside the element.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Children named `tag`.
    ///
    /// If `namespace` is given, children in that namespace are returned when
    /// there are any; otherwise children without a namespace are returned.
    pub fn children_named<'a>(&'a self, tag: &str, namespace: Option<&str>) -> Vec<&'a XmlNode> {
        if let Some(namespace) = namespace {
            let qualified: Vec<_> = self
                .children
                .iter()
                .filter(|child| child.name == tag && child.namespace() == Some(namespace))
                .collect();
            if !qualified.is_empty() {
                return qualified;
            }
        }

        self.children
            .iter()
            .filter(|child| child.name == tag && child.namespace.is_none())
            .collect()
    }

    /// First child named `tag`, looked up as in [`XmlNode::children_named`].
    pub fn child(&self, tag: &str, namespace: Option<&str>) -> Option<&XmlNode> {
        self.children_named(tag, namespace).into_iter().next()
    }
}

fn push_text(stack: &mut [XmlNode], pending: &mut String, text: &str) {
    let Some(node) = stack.last_mut() else {
        return;
    };

    if !text.chars().all(char::is_whitespace) {
        node.text.push_str(pending);
        node.text.push_str(text);
        pending.clear();
    } else if node.children.is_empty() {
        pending.push_str(text);
    }
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }

    if root.is_some() {
        return Err(malformed("document has more than one root element"));
    }
    *root = Some(node);
    Ok(())
}

fn resolved_namespace(resolved: ResolveResult) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(Namespace(namespace)) if namespace.is_empty() => Ok(None),
        ResolveResult::Bound(Namespace(namespace)) => utf8(namespace).map(Some),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(malformed(&format!(
            "unknown namespace prefix `{}`",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(ToOwned::to_owned)
        .match_foreign_err(|error| Error::MalformedXml(error.to_string()))
}

#[track_caller]
fn malformed(detail: &str) -> bherror::Error<Error> {
    bherror::Error::root(Error::MalformedXml(detail.to_owned()))
}

/// Parse `xml` into an element of the schema named `schema`.
pub fn parse_element(registry: &SchemaRegistry, schema: &str, xml: &str) -> Result<Element> {
    let node = XmlNode::parse(xml)?;
    Element::from_xml(registry, registry.get(schema)?, &node)
}

impl Element {
    /// Read an element of `schema` from `node`, resolving nested schemas
    /// through `registry`.
    ///
    /// Children are looked up in the namespace of `node`, falling back to
    /// unqualified children. Undeclared children and attributes are ignored.
    pub fn from_xml(
        registry: &SchemaRegistry,
        schema: &Arc<Schema>,
        node: &XmlNode,
    ) -> Result<Self> {
        if node.name() != schema.root_tag() {
            return Err(malformed(&format!(
                "expected <{}>, found <{}>",
                schema.root_tag(),
                node.name()
            )));
        }

        read_element(registry, schema, node, node.namespace())
    }

    /// Serialize the element as an XML document.
    ///
    /// Unset slots are omitted, empty values are written as empty elements.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);

        writer
            .write_event(Event::Decl(BytesDecl::new(
                XML_VERSION,
                Some(XML_ENCODING),
                None,
            )))
            .foreign_err(|| Error::XmlWrite)?;
        write_element(&mut writer, self, self.schema().root_tag(), None)?;

        String::from_utf8(writer.into_inner()).foreign_err(|| Error::XmlWrite)
    }
}

fn read_element(
    registry: &SchemaRegistry,
    schema: &Arc<Schema>,
    node: &XmlNode,
    namespace: Option<&str>,
) -> Result<Element> {
    let mut element = Element::empty(schema.clone());

    for attribute in schema.attributes() {
        if let Some(value) = node.attribute(attribute.name()) {
            check_primitive(attribute.kind(), value)?;
            element
                .attributes
                .insert(attribute.name().to_owned(), value.to_owned());
        }
    }

    for (idx, descriptor) in schema.elements().iter().enumerate() {
        if schema.label_index() == Some(idx) {
            let mut leaf = Leaf::new(node.text());
            read_leaf_attributes(descriptor, node, &mut leaf);
            element.set_slot_at(idx, Slot::One(Node::Leaf(leaf)));
            continue;
        }

        let children = node.children_named(descriptor.xml_tag(), namespace);
        if children.is_empty() {
            continue;
        }

        let mut nodes = children
            .into_iter()
            .map(|child| read_node(registry, descriptor, child, namespace))
            .collect::<Result<Vec<_>>>()?;

        let slot = if descriptor.is_many() {
            Slot::Many(nodes)
        } else {
            Slot::One(nodes.swap_remove(0))
        };
        element.set_slot_at(idx, slot);
    }

    Ok(element)
}

fn read_node(
    registry: &SchemaRegistry,
    descriptor: &ElementDescriptor,
    node: &XmlNode,
    namespace: Option<&str>,
) -> Result<Node> {
    match descriptor.value_kind() {
        ValueKind::Primitive(kind) => {
            check_primitive(*kind, node.text())?;
            let mut leaf = Leaf::new(node.text());
            read_leaf_attributes(descriptor, node, &mut leaf);
            Ok(Node::Leaf(leaf))
        }
        ValueKind::Nested(target) => {
            let nested = registry.get(target)?;
            read_element(registry, nested, node, namespace).map(Node::Element)
        }
    }
}

fn read_leaf_attributes(descriptor: &ElementDescriptor, node: &XmlNode, leaf: &mut Leaf) {
    for attribute in descriptor.attributes() {
        if let Some(value) = node.attribute(attribute.name()) {
            leaf.insert_attribute(attribute.name().to_owned(), value.to_owned());
        }
    }
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &Element,
    tag: &str,
    parent_namespace: Option<&str>,
) -> Result<()> {
    let schema = element.schema();
    let namespace = schema.namespace().or(parent_namespace);

    let mut start = BytesStart::new(tag);
    if schema.namespace().is_some() && schema.namespace() != parent_namespace {
        if let Some(namespace) = schema.namespace() {
            start.push_attribute(("xmlns", namespace));
        }
    }
    for (name, value) in element.attributes() {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    let label = element.label().unwrap_or_default();
    let has_children = element
        .fields()
        .enumerate()
        .any(|(idx, (_, slot))| schema.label_index() != Some(idx) && !slot.is_unset());

    if label.is_empty() && !has_children {
        return writer
            .write_event(Event::Empty(start))
            .foreign_err(|| Error::XmlWrite);
    }

    writer
        .write_event(Event::Start(start))
        .foreign_err(|| Error::XmlWrite)?;

    if !label.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(label)))
            .foreign_err(|| Error::XmlWrite)?;
    }

    for (idx, (descriptor, slot)) in element.fields().enumerate() {
        if schema.label_index() == Some(idx) {
            continue;
        }
        for node in slot.nodes() {
            match node {
                Node::Leaf(leaf) => write_leaf(writer, descriptor.xml_tag(), leaf)?,
                Node::Element(nested) => {
                    write_element(writer, nested, descriptor.xml_tag(), namespace)?
                }
            }
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .foreign_err(|| Error::XmlWrite)?;

    Ok(())
}

fn write_leaf(writer: &mut Writer<Vec<u8>>, tag: &str, leaf: &Leaf) -> Result<()> {
    let mut start = BytesStart::new(tag);
    for (name, value) in leaf.attributes() {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if leaf.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .foreign_err(|| Error::XmlWrite);
    }

    writer
        .write_event(Event::Start(start))
        .foreign_err(|| Error::XmlWrite)?;
    writer
        .write_event(Event::Text(BytesText::new(leaf.text())))
        .foreign_err(|| Error::XmlWrite)?;
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .foreign_err(|| Error::XmlWrite)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{test_utils::registry, NodeBuilder, Raw};

    const NAMESPACE: &str = "urn:example:person";

    #[test]
    fn test_parse_tree() {
        let node = XmlNode::parse(
            r#"<?xml version="1.0"?>
            <p:Person xmlns:p="urn:example:person" id="7">
              <p:Phone kind="home">555 &amp; more</p:Phone>
              <Phone><![CDATA[<raw>]]></Phone>
              <Empty/>
            </p:Person>"#,
        )
        .unwrap();

        assert_eq!(node.name(), "Person");
        assert_eq!(node.namespace(), Some(NAMESPACE));
        assert_eq!(node.attribute("id"), Some("7"));
        assert_eq!(node.children().len(), 3);

        let phones = node.children_named("Phone", Some(NAMESPACE));
        assert_eq!(phones.len(), 1);
        assert_eq!(phones[0].text(), "555 & more");
        assert_eq!(phones[0].attribute("kind"), Some("home"));

        assert_eq!(node.child("Phone", None).unwrap().text(), "<raw>");
        assert_eq!(node.child("Empty", Some(NAMESPACE)).unwrap().text(), "");
    }

    #[test]
    fn test_namespace_fallback() {
        let qualified = r#"<Person xmlns="urn:example:person"><Phone>1</Phone></Person>"#;
        let unqualified = r#"<Person><Phone>2</Phone></Person>"#;
        let mixed = r#"<Person xmlns="urn:example:person"><Phone xmlns="">3</Phone></Person>"#;

        for (xml, phone) in [(qualified, "1"), (unqualified, "2"), (mixed, "3")] {
            let person = parse_element(registry(), "Person", xml).unwrap();
            assert_eq!(person.text("phone"), Some(phone));
        }
    }

    #[test]
    fn test_malformed_documents() {
        for xml in [
            "",
            "<Person>",
            "<Person></Phone>",
            "<Person/><Person/>",
            "<x:Person/>",
        ] {
            let error = XmlNode::parse(xml).unwrap_err();
            assert!(
                matches!(error.error, Error::MalformedXml(_)),
                "{xml:?} gave {error}"
            );
        }
    }

    #[test]
    fn test_text_is_kept_verbatim() {
        let node = XmlNode::parse(
            "<Person>\n  <Phone>  555 </Phone>\n  <Blank>   </Blank>\n  <Mixed> a <![CDATA[b]]> </Mixed>\n</Person>",
        )
        .unwrap();

        assert_eq!(node.text(), "");
        assert_eq!(node.child("Phone", None).unwrap().text(), "  555 ");
        assert_eq!(node.child("Blank", None).unwrap().text(), "   ");
        assert_eq!(node.child("Mixed", None).unwrap().text(), " a b ");
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let nested = |depth: usize| format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));

        assert!(XmlNode::parse(&nested(MAX_DEPTH)).is_ok());

        for depth in [MAX_DEPTH + 1, 200_000] {
            let error = XmlNode::parse(&nested(depth)).unwrap_err();
            assert!(matches!(error.error, Error::MalformedXml(_)), "{error}");
        }
    }

    #[test]
    fn test_from_xml_checks_root_tag() {
        let error = parse_element(registry(), "Person", "<Name/>").unwrap_err();
        assert!(matches!(error.error, Error::MalformedXml(_)));
    }

    #[test]
    fn test_from_xml_validates_primitives() {
        let error = parse_element(
            registry(),
            "Person",
            "<Person><DateOfBirth>someday</DateOfBirth></Person>",
        )
        .unwrap_err();
        assert!(matches!(error.error, Error::InvalidPrimitive(_, _)));
    }

    #[test]
    fn test_to_xml() {
        let person = NodeBuilder::new(registry())
            .build(
                "Person",
                &Raw::from(json!({
                    "id": "p-1",
                    "name": ["first", { "surname": "Smith & Sons" }],
                    "residence_address": {
                        "street_addresses": ["1 Main St", "Apt <2>"],
                        "timeframe": "current",
                    },
                })),
            )
            .unwrap();

        let xml = person.to_xml().unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        for expected in [
            r#"<Person xmlns="urn:example:person" id="p-1">"#,
            "<First/>",
            "<Surname>Smith &amp; Sons</Surname>",
            r#"<ResidenceAddress timeframe="current">"#,
            "<StreetAddress>1 Main St</StreetAddress>",
            "<StreetAddress>Apt &lt;2&gt;</StreetAddress>",
            "</Person>",
        ] {
            assert!(xml.contains(expected), "{expected} not in {xml}");
        }
        assert!(!xml.contains("<Phone"));
        assert!(!xml.contains("<Name xmlns"));
        assert!(xml.find("<First/>") < xml.find("<Surname>"));
    }

    #[test]
    fn test_written_document_reads_back() {
        let raw = Raw::from(json!({
            "name": { "first": "Bob", "surname": "  van Dyke ", "suffix": "III" },
            "birth_date": "1980-01-31",
            "phone": "",
        }));
        let person = NodeBuilder::new(registry()).build("Person", &raw).unwrap();

        let parsed = parse_element(registry(), "Person", &person.to_xml().unwrap()).unwrap();

        assert_eq!(parsed, person);
        assert_eq!(
            parsed.element("name").unwrap().text("surname"),
            Some("  van Dyke ")
        );
    }
}
