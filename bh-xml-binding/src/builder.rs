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

//! Instantiation of [`Element`]s from [`Raw`] caller data.

use std::sync::Arc;

use crate::{
    element::{check_primitive, Element, Leaf, Node, Slot},
    schema::{ElementDescriptor, FieldRef, PrimitiveType, Schema, SchemaRegistry, ValueKind},
    Error, Raw, Result,
};

/// Builds populated [`Element`]s from nested [`Raw`] values.
///
/// The raw value may be:
///
/// * [`Raw::Empty`], producing an element with every slot unset;
/// * a [`Raw::List`] of field names, producing empty but present nodes for
///   each of them;
/// * a [`Raw::Map`] from field names to scalars, nested maps, or lists.
///
/// Any other top-level value, or any name the schema does not know, fails with
/// [`Error::InvalidElement`].
#[derive(Debug, Clone, Copy)]
pub struct NodeBuilder<'r> {
    registry: &'r SchemaRegistry,
}

impl<'r> NodeBuilder<'r> {
    /// Create a builder resolving schemas from `registry`.
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Build an element of the schema named `schema` from `raw`.
    pub fn build(&self, schema: &str, raw: &Raw) -> Result<Element> {
        let schema = self.registry.get(schema)?;
        self.build_with(schema.clone(), raw)
    }

    /// Build an element of `schema` from `raw`.
    pub fn build_with(&self, schema: Arc<Schema>, raw: &Raw) -> Result<Element> {
        let mut element = Element::empty(schema);
        self.populate(&mut element, raw)?;
        Ok(element)
    }

    fn populate(&self, element: &mut Element, raw: &Raw) -> Result<()> {
        match raw {
            Raw::Empty => Ok(()),
            Raw::Scalar(value) => Err(invalid_element(element.schema(), value)),
            Raw::List(names) => {
                for name in names {
                    match name {
                        Raw::Scalar(name) => self.create_node(element, name, &Raw::Empty)?,
                        nested => self.populate(element, nested)?,
                    }
                }
                Ok(())
            }
            Raw::Map(entries) => {
                for (name, content) in entries {
                    self.create_node(element, name, content)?;
                }
                Ok(())
            }
        }
    }

    fn create_node(&self, element: &mut Element, name: &str, content: &Raw) -> Result<()> {
        let schema = element.schema().clone();

        let idx = match schema.resolve_field(name) {
            Some(FieldRef::Element(idx)) => idx,
            Some(FieldRef::Attribute(_)) => {
                let value = match content {
                    Raw::Empty => "",
                    Raw::Scalar(value) => value.as_str(),
                    _ => return Err(unexpected_value(&schema, name)),
                };
                return element.set_attribute(name, value);
            }
            None => return Err(invalid_element(&schema, name)),
        };

        let descriptor = &schema.elements()[idx];
        let slot = match descriptor.value_kind() {
            ValueKind::Primitive(kind) => primitive_slot(&schema, descriptor, *kind, content)?,
            ValueKind::Nested(target) => {
                let nested = self.registry.get(target)?;
                self.nested_slot(descriptor, nested, content)?
            }
        };

        element.set_slot_at(idx, slot);
        Ok(())
    }

    fn nested_slot(
        &self,
        descriptor: &ElementDescriptor,
        nested: &Arc<Schema>,
        content: &Raw,
    ) -> Result<Slot> {
        if !descriptor.is_many() {
            let element = self.nested_element(nested, content)?;
            return Ok(Slot::One(Node::Element(element)));
        }

        let entries = match content {
            Raw::List(entries) => entries
                .iter()
                .map(|entry| self.nested_element(nested, entry))
                .collect::<Result<Vec<_>>>()?,
            single => vec![self.nested_element(nested, single)?],
        };

        Ok(Slot::Many(entries.into_iter().map(Node::Element).collect()))
    }

    // A bare scalar stands for the label of the nested schema, e.g. one street
    // address line.
    fn nested_element(&self, nested: &Arc<Schema>, content: &Raw) -> Result<Element> {
        match content {
            Raw::Scalar(text) if nested.label_index().is_some() => {
                let label = nested
                    .label()
                    .and_then(|label| match label.value_kind() {
                        ValueKind::Primitive(kind) => Some(*kind),
                        ValueKind::Nested(_) => None,
                    })
                    .unwrap_or(PrimitiveType::String);
                check_primitive(label, text)?;
                Element::with_label(nested.clone(), text)
            }
            raw => self.build_with(nested.clone(), raw),
        }
    }
}

fn primitive_slot(
    schema: &Schema,
    descriptor: &ElementDescriptor,
    kind: PrimitiveType,
    content: &Raw,
) -> Result<Slot> {
    let leaf = |raw: &Raw| -> Result<Node> {
        let text = match raw {
            Raw::Empty => "",
            Raw::Scalar(text) => text.as_str(),
            _ => return Err(unexpected_value(schema, descriptor.field_name())),
        };
        check_primitive(kind, text)?;
        Ok(Node::Leaf(Leaf::new(text)))
    };

    match content {
        Raw::List(values) if descriptor.is_many() => values
            .iter()
            .map(leaf)
            .collect::<Result<Vec<_>>>()
            .map(Slot::Many),
        value if descriptor.is_many() => Ok(Slot::Many(vec![leaf(value)?])),
        value => Ok(Slot::One(leaf(value)?)),
    }
}

#[track_caller]
fn invalid_element(schema: &Schema, name: &str) -> bherror::Error<Error> {
    bherror::Error::root(Error::InvalidElement(
        schema.name().to_owned(),
        name.to_owned(),
    ))
}

#[track_caller]
fn unexpected_value(schema: &Schema, name: &str) -> bherror::Error<Error> {
    bherror::Error::root(Error::UnexpectedValue(
        schema.name().to_owned(),
        name.to_owned(),
    ))
}
