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

//! Runtime element instances populated according to a [`Schema`].

use std::{collections::BTreeMap, sync::Arc};

use bherror::traits::ForeignError as _;
use chrono::NaiveDate;
use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::{
    schema::{ElementDescriptor, FieldRef, PrimitiveType, Schema, ValueKind},
    Error, Result,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Attribute values keyed by attribute name.
pub type Attributes = BTreeMap<String, String>;

/// A primitive value together with the attributes of its XML element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaf {
    text: String,
    attributes: Attributes,
}

impl Leaf {
    /// Create a leaf holding `text` and no attributes.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: Attributes::new(),
        }
    }

    /// The text value, exactly as supplied.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the text value is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Value of the attribute `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// All attributes of the leaf.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Interpret the text as a `YYYY-MM-DD` date.
    pub fn as_date(&self) -> Result<NaiveDate> {
        parse_date(&self.text)
    }

    /// Interpret the text as an integer.
    pub fn as_integer(&self) -> Result<i64> {
        parse_integer(&self.text)
    }

    pub(crate) fn insert_attribute(&mut self, name: String, value: String) {
        self.attributes.insert(name, value);
    }
}

/// One value within a [`Slot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A primitive value.
    Leaf(Leaf),
    /// A nested element instance.
    Element(Element),
}

impl Node {
    /// The leaf, if this is a primitive value.
    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Element(_) => None,
        }
    }

    /// The element, if this is a nested element.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Leaf(_) => None,
        }
    }

    /// The text of a leaf, or the label text of an element.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Leaf(leaf) => Some(leaf.text()),
            Self::Element(element) => element.label(),
        }
    }

    /// Attribute value carried by the node's XML element.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            Self::Leaf(leaf) => leaf.attribute(name),
            Self::Element(element) => element.attribute(name),
        }
    }
}

/// The state of one element descriptor within an [`Element`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Slot {
    /// Never set, the nil state. Unset slots are not serialized.
    #[default]
    Unset,
    /// A single value, possibly empty.
    One(Node),
    /// Repeated values in document order, possibly none.
    Many(Vec<Node>),
}

impl Slot {
    /// Whether the slot was never set.
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// All nodes in the slot.
    pub fn nodes(&self) -> &[Node] {
        match self {
            Self::Unset => &[],
            Self::One(node) => std::slice::from_ref(node),
            Self::Many(nodes) => nodes,
        }
    }
}

/// A populated runtime tree conforming to one [`Schema`].
///
/// Holds exactly one [`Slot`] per element descriptor of its schema, in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    schema: Arc<Schema>,
    pub(crate) slots: Vec<Slot>,
    pub(crate) attributes: Attributes,
}

impl Element {
    /// Create an element whose slots are all [`Slot::Unset`].
    pub fn empty(schema: Arc<Schema>) -> Self {
        let slots = vec![Slot::Unset; schema.elements().len()];
        Self {
            schema,
            slots,
            attributes: Attributes::new(),
        }
    }

    pub(crate) fn with_label(schema: Arc<Schema>, text: &str) -> Result<Self> {
        let Some(idx) = schema.label_index() else {
            return Err(bherror::Error::root(Error::InvalidElement(
                schema.name().to_owned(),
                text.to_owned(),
            )));
        };

        let mut element = Self::empty(schema);
        element.slots[idx] = Slot::One(Node::Leaf(Leaf::new(text)));
        Ok(element)
    }

    /// The schema of this element.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The slot of the element named `field_name`.
    pub fn slot(&self, field_name: &str) -> Result<&Slot> {
        let idx = self.index_of(field_name)?;
        Ok(&self.slots[idx])
    }

    /// Replace the slot of the element named `field_name`.
    pub fn set_slot(&mut self, field_name: &str, slot: Slot) -> Result<()> {
        let idx = self.index_of(field_name)?;
        self.slots[idx] = slot;
        Ok(())
    }

    pub(crate) fn set_slot_at(&mut self, idx: usize, slot: Slot) {
        self.slots[idx] = slot;
    }

    /// Descriptors paired with their slots, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&ElementDescriptor, &Slot)> {
        self.schema.elements().iter().zip(self.slots.iter())
    }

    /// Text of the single value of `field_name`.
    ///
    /// Returns [`None`] for unknown fields, unset slots and repeated elements.
    pub fn text(&self, field_name: &str) -> Option<&str> {
        match self.slot(field_name).ok()? {
            Slot::One(node) => node.text(),
            _ => None,
        }
    }

    /// Texts of all values of `field_name`.
    pub fn texts(&self, field_name: &str) -> Vec<&str> {
        self.slot(field_name)
            .map(|slot| slot.nodes().iter().filter_map(Node::text).collect())
            .unwrap_or_default()
    }

    /// The single primitive value of `field_name`.
    pub fn leaf(&self, field_name: &str) -> Option<&Leaf> {
        match self.slot(field_name).ok()? {
            Slot::One(node) => node.as_leaf(),
            _ => None,
        }
    }

    /// The single nested element of `field_name`.
    pub fn element(&self, field_name: &str) -> Option<&Element> {
        match self.slot(field_name).ok()? {
            Slot::One(node) => node.as_element(),
            _ => None,
        }
    }

    /// Mutable access to the single nested element of `field_name`.
    pub fn element_mut(&mut self, field_name: &str) -> Option<&mut Element> {
        let idx = self.index_of(field_name).ok()?;
        match &mut self.slots[idx] {
            Slot::One(Node::Element(element)) => Some(element),
            _ => None,
        }
    }

    /// All nested elements of `field_name`.
    pub fn elements(&self, field_name: &str) -> Vec<&Element> {
        self.slot(field_name)
            .map(|slot| slot.nodes().iter().filter_map(Node::as_element).collect())
            .unwrap_or_default()
    }

    /// Text of the label element, for schemas that declare one.
    pub fn label(&self) -> Option<&str> {
        let idx = self.schema.label_index()?;
        match &self.slots[idx] {
            Slot::One(node) => node.text(),
            _ => None,
        }
    }

    /// Value of the attribute `name` of this element.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// All attributes of this element.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Set an attribute declared by the schema.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let Some(attribute) = self.schema.attribute(name) else {
            return Err(bherror::Error::root(Error::InvalidAttribute(
                self.schema.name().to_owned(),
                name.to_owned(),
            )));
        };

        let value = value.into();
        check_primitive(attribute.kind(), &value)?;
        self.attributes.insert(name.to_owned(), value);
        Ok(())
    }

    /// Set the text of a single primitive element, keeping its attributes.
    pub fn set_text(&mut self, field_name: &str, text: impl Into<String>) -> Result<()> {
        let idx = self.index_of(field_name)?;
        let descriptor = &self.schema.elements()[idx];
        let ValueKind::Primitive(kind) = descriptor.value_kind() else {
            return Err(self.unexpected_value(field_name));
        };
        if descriptor.is_many() {
            return Err(self.unexpected_value(field_name));
        }

        let text = text.into();
        check_primitive(*kind, &text)?;
        match &mut self.slots[idx] {
            Slot::One(Node::Leaf(leaf)) => leaf.text = text,
            slot => *slot = Slot::One(Node::Leaf(Leaf::new(text))),
        }
        Ok(())
    }

    /// Set an attribute of the single primitive element `field_name`.
    ///
    /// The attribute must be declared on the element descriptor, and the
    /// element must already hold a value.
    pub fn set_leaf_attribute(
        &mut self,
        field_name: &str,
        name: &str,
        value: impl Into<String>,
    ) -> Result<()> {
        let idx = self.index_of(field_name)?;
        let Some(attribute) = self.schema.elements()[idx].attribute(name) else {
            return Err(bherror::Error::root(Error::InvalidAttribute(
                self.schema.name().to_owned(),
                format!("{field_name}@{name}"),
            )));
        };

        let value = value.into();
        check_primitive(attribute.kind(), &value)?;
        match &mut self.slots[idx] {
            Slot::One(Node::Leaf(leaf)) => {
                leaf.insert_attribute(name.to_owned(), value);
                Ok(())
            }
            _ => Err(self.unexpected_value(field_name)),
        }
    }

    /// Whether nothing was set on the element.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.slots.iter().all(Slot::is_unset)
    }

    /// Field names of all required elements that are unset, in declaration
    /// order.
    pub fn missing_required_elements(&self) -> Vec<String> {
        self.fields()
            .filter(|(descriptor, slot)| descriptor.is_required() && slot.is_unset())
            .map(|(descriptor, _)| descriptor.field_name().to_owned())
            .collect()
    }

    /// Names of all required attributes that are not set, in declaration
    /// order.
    ///
    /// Attributes of the element itself are reported by name, attributes of
    /// its primitive children as `field@attribute`.
    pub fn missing_required_attributes(&self) -> Vec<String> {
        let own = self
            .schema
            .attributes()
            .iter()
            .filter(|attribute| attribute.is_required())
            .filter(|attribute| !self.attributes.contains_key(attribute.name()))
            .map(|attribute| attribute.name().to_owned());

        let children = self.fields().flat_map(|(descriptor, slot)| {
            descriptor
                .attributes()
                .iter()
                .filter(|attribute| attribute.is_required())
                .filter(move |attribute| {
                    slot.nodes().iter().any(|node| {
                        node.as_leaf()
                            .is_some_and(|leaf| leaf.attribute(attribute.name()).is_none())
                    })
                })
                .map(move |attribute| format!("{}@{}", descriptor.field_name(), attribute.name()))
        });

        own.chain(children).collect()
    }

    fn index_of(&self, field_name: &str) -> Result<usize> {
        match self.schema.resolve_field(field_name) {
            Some(FieldRef::Element(idx)) => Ok(idx),
            _ => Err(bherror::Error::root(Error::InvalidElement(
                self.schema.name().to_owned(),
                field_name.to_owned(),
            ))),
        }
    }

    #[track_caller]
    fn unexpected_value(&self, field_name: &str) -> bherror::Error<Error> {
        bherror::Error::root(Error::UnexpectedValue(
            self.schema.name().to_owned(),
            field_name.to_owned(),
        ))
    }
}

/// Leaves serialize as their text.
impl Serialize for Leaf {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(leaf) => leaf.serialize(serializer),
            Self::Element(element) => element.serialize(serializer),
        }
    }
}

/// Elements serialize as a map of their set fields. Elements whose schema
/// declares a label serialize as the label text.
impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.schema.label_index().is_some() {
            return serializer.serialize_str(self.label().unwrap_or_default());
        }

        let mut map = serializer.serialize_map(None)?;
        for (descriptor, slot) in self.fields() {
            match slot {
                Slot::Unset => {}
                Slot::One(node) => map.serialize_entry(descriptor.field_name(), node)?,
                Slot::Many(nodes) => map.serialize_entry(descriptor.field_name(), nodes)?,
            }
        }
        map.end()
    }
}

/// Check that `text` is a valid value of `kind`. Empty text is always
/// accepted, as it marks a named but empty element.
pub(crate) fn check_primitive(kind: PrimitiveType, text: &str) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }

    match kind {
        PrimitiveType::String => Ok(()),
        PrimitiveType::Date => parse_date(text).map(|_| ()),
        PrimitiveType::Integer => parse_integer(text).map(|_| ()),
    }
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .foreign_err(|| Error::InvalidPrimitive(PrimitiveType::Date, text.to_owned()))
}

fn parse_integer(text: &str) -> Result<i64> {
    text.trim()
        .parse()
        .foreign_err(|| Error::InvalidPrimitive(PrimitiveType::Integer, text.to_owned()))
}
