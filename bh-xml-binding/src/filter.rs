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

//! Extraction of the facts the remote party reports as verified.
//!
//! Elements parsed from a response carry `state` and `status` attributes. A
//! value counts as a verified fact only when `state="verified"` and
//! `status="present"`, compared exactly.

use std::sync::Arc;

use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::{
    element::{Element, Leaf, Node, Slot},
    schema::Schema,
};

/// Name of the attribute carrying the verification state.
pub const STATE_ATTRIBUTE: &str = "state";

/// Name of the attribute carrying the presence status.
pub const STATUS_ATTRIBUTE: &str = "status";

/// The only accepted value of [`STATE_ATTRIBUTE`].
pub const VERIFIED: &str = "verified";

/// The only accepted value of [`STATUS_ATTRIBUTE`].
pub const PRESENT: &str = "present";

/// One retained field of a [`VerifiedFacts`] structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fact {
    /// A verified primitive value.
    Value(Leaf),
    /// The filtered contents of a nested element. Kept even when empty.
    Facts(VerifiedFacts),
    /// The qualifying entries of a repeated element, in document order.
    List(Vec<Node>),
}

/// The subset of an [`Element`] marked both verified and present, keyed by
/// field name in schema declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedFacts {
    schema: Arc<Schema>,
    entries: Vec<(String, Fact)>,
}

impl VerifiedFacts {
    /// The schema of the filtered element.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The retained field `field_name`.
    pub fn get(&self, field_name: &str) -> Option<&Fact> {
        self.entries
            .iter()
            .find(|(name, _)| name == field_name)
            .map(|(_, fact)| fact)
    }

    /// Whether the field `field_name` was retained.
    pub fn contains(&self, field_name: &str) -> bool {
        self.get(field_name).is_some()
    }

    /// Text of the verified value `field_name`.
    pub fn text(&self, field_name: &str) -> Option<&str> {
        match self.get(field_name)? {
            Fact::Value(leaf) => Some(leaf.text()),
            _ => None,
        }
    }

    /// Filtered contents of the nested element `field_name`.
    pub fn facts(&self, field_name: &str) -> Option<&VerifiedFacts> {
        match self.get(field_name)? {
            Fact::Facts(facts) => Some(facts),
            _ => None,
        }
    }

    /// Qualifying entries of the repeated element `field_name`.
    pub fn list(&self, field_name: &str) -> Option<&[Node]> {
        match self.get(field_name)? {
            Fact::List(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// Retained fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Fact)> {
        self.entries.iter().map(|(name, fact)| (name.as_str(), fact))
    }

    /// Number of retained fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no field was retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wrap the facts back into an [`Element`] of the same schema. Fields that
    /// were not retained are unset.
    pub fn into_element(self) -> Element {
        let mut element = Element::empty(self.schema.clone());

        for (field_name, fact) in self.entries {
            let Some(idx) = self.schema.element_index(&field_name) else {
                continue;
            };
            let slot = match fact {
                Fact::Value(leaf) => Slot::One(Node::Leaf(leaf)),
                Fact::Facts(facts) => Slot::One(Node::Element(facts.into_element())),
                Fact::List(nodes) => Slot::Many(nodes),
            };
            element.set_slot_at(idx, slot);
        }

        element
    }
}

/// Collect the verified and present facts of `element`.
///
/// Traversal follows the schema declaration order. Unset fields are skipped,
/// nested elements are always recursed into and kept, primitive values are
/// kept only when verified and present, and repeated fields keep the
/// qualifying entries.
pub fn verified_facts(element: &Element) -> VerifiedFacts {
    let entries = element
        .fields()
        .filter_map(|(descriptor, slot)| {
            let fact = match slot {
                Slot::Unset => return None,
                Slot::One(Node::Element(nested)) => Fact::Facts(verified_facts(nested)),
                Slot::One(Node::Leaf(leaf)) if is_verified_and_present(leaf.attributes()) => {
                    Fact::Value(leaf.clone())
                }
                Slot::One(Node::Leaf(_)) => return None,
                Slot::Many(nodes) => Fact::List(
                    nodes
                        .iter()
                        .filter(|node| is_node_verified(node))
                        .cloned()
                        .collect(),
                ),
            };
            Some((descriptor.field_name().to_owned(), fact))
        })
        .collect();

    VerifiedFacts {
        schema: element.schema().clone(),
        entries,
    }
}

fn is_node_verified(node: &Node) -> bool {
    match node {
        Node::Leaf(leaf) => is_verified_and_present(leaf.attributes()),
        Node::Element(element) => is_verified_and_present(element.attributes()),
    }
}

fn is_verified_and_present(attributes: &crate::element::Attributes) -> bool {
    attributes.get(STATE_ATTRIBUTE).map(String::as_str) == Some(VERIFIED)
        && attributes.get(STATUS_ATTRIBUTE).map(String::as_str) == Some(PRESENT)
}

impl Serialize for Fact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(leaf) => leaf.serialize(serializer),
            Self::Facts(facts) => facts.serialize(serializer),
            Self::List(nodes) => nodes.serialize(serializer),
        }
    }
}

impl Serialize for VerifiedFacts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field_name, fact) in &self.entries {
            map.serialize_entry(field_name, fact)?;
        }
        map.end()
    }
}
