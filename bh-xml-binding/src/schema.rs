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

//! Declarative description of XML elements: descriptors, schemas and the
//! registry holding them.
//!
//! Schemas are registered once through a [`RegistryBuilder`] and frozen into an
//! immutable [`SchemaRegistry`]. Nested element references are resolved when
//! the registry is built, so every [`Schema`] reachable from the registry is
//! complete.

use std::{collections::HashMap, sync::Arc};

use crate::{Error, Result, SchemaError};

/// The closed set of primitive value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PrimitiveType {
    /// Free-form text.
    #[strum(to_string = "string")]
    String,
    /// Calendar date in the `YYYY-MM-DD` format.
    #[strum(to_string = "date")]
    Date,
    /// Signed integer.
    #[strum(to_string = "integer")]
    Integer,
}

/// What an element holds: a primitive value or another schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    /// A primitive value of the given type.
    Primitive(PrimitiveType),
    /// A nested element following the schema with the given name.
    Nested(String),
}

/// How many times an element may occur within its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one value.
    One,
    /// An optional single child element.
    OptionalOne,
    /// Any number of values, kept in document order.
    Many,
}

/// Static definition of an XML attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    name: String,
    kind: PrimitiveType,
    required: bool,
}

impl AttributeDescriptor {
    /// Create a new optional `string` attribute.
    pub fn new(name: impl Into<String>) -> Self {
        Self::typed(name, PrimitiveType::String)
    }

    /// Create a new optional attribute of the given type.
    pub fn typed(name: impl Into<String>, kind: PrimitiveType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }

    /// Mark the attribute as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The attribute name, used both as the field name and as the XML name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attribute value type.
    pub fn kind(&self) -> PrimitiveType {
        self.kind
    }

    /// Whether the attribute must be present before serialization.
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Static definition of one named, typed slot within a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDescriptor {
    field_name: String,
    xml_tag: String,
    value_kind: ValueKind,
    cardinality: Cardinality,
    required: bool,
    attributes: Vec<AttributeDescriptor>,
}

impl ElementDescriptor {
    /// Create a descriptor of a single primitive element.
    pub fn primitive(
        field_name: impl Into<String>,
        xml_tag: impl Into<String>,
        kind: PrimitiveType,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            xml_tag: xml_tag.into(),
            value_kind: ValueKind::Primitive(kind),
            cardinality: Cardinality::One,
            required: false,
            attributes: Vec::new(),
        }
    }

    /// Create a descriptor of a single `string` element.
    pub fn string(field_name: impl Into<String>, xml_tag: impl Into<String>) -> Self {
        Self::primitive(field_name, xml_tag, PrimitiveType::String)
    }

    /// Create a descriptor of an optional child element following the schema
    /// named `schema`.
    ///
    /// The XML tag is taken from the referenced schema when the registry is
    /// built.
    pub fn nested(field_name: impl Into<String>, schema: impl Into<String>) -> Self {
        let schema = schema.into();
        Self {
            field_name: field_name.into(),
            xml_tag: schema.clone(),
            value_kind: ValueKind::Nested(schema),
            cardinality: Cardinality::OptionalOne,
            required: false,
            attributes: Vec::new(),
        }
    }

    /// Allow the element to repeat.
    pub fn many(mut self) -> Self {
        self.cardinality = Cardinality::Many;
        self
    }

    /// Mark the element as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Declare the attributes the element may carry.
    pub fn with_attributes<I>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = AttributeDescriptor>,
    {
        self.attributes.extend(attributes);
        self
    }

    /// The identifier used by callers to address the element.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// The XML tag of the element.
    pub fn xml_tag(&self) -> &str {
        &self.xml_tag
    }

    /// The kind of value the element holds.
    pub fn value_kind(&self) -> &ValueKind {
        &self.value_kind
    }

    /// The cardinality of the element.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Whether the element must be set before serialization.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether the element may repeat.
    pub fn is_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }

    /// Attributes declared on this element.
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    /// Look up a declared attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    /// Name of the nested schema, if the element is not primitive.
    pub fn nested_schema(&self) -> Option<&str> {
        match &self.value_kind {
            ValueKind::Nested(schema) => Some(schema),
            ValueKind::Primitive(_) => None,
        }
    }
}

/// Resolved meaning of a field name within a [`Schema`].
///
/// Built once per schema at registration, so assigning a value by name is a
/// single map lookup followed by a match on this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRef {
    /// Index into [`Schema::elements`].
    Element(usize),
    /// Index into [`Schema::attributes`].
    Attribute(usize),
}

/// An ordered set of element descriptors and attribute descriptors bound to
/// one root XML tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    name: String,
    root_tag: String,
    namespace: Option<String>,
    elements: Vec<ElementDescriptor>,
    attributes: Vec<AttributeDescriptor>,
    label: Option<usize>,
    fields: HashMap<String, FieldRef>,
}

impl Schema {
    /// Start the definition of a schema called `name` whose elements use the
    /// `root_tag` XML tag.
    pub fn builder(name: impl Into<String>, root_tag: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            root_tag: root_tag.into(),
            namespace: None,
            elements: Vec::new(),
            attributes: Vec::new(),
            label: None,
        }
    }

    /// The registered name of the schema.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The XML tag of elements following this schema.
    pub fn root_tag(&self) -> &str {
        &self.root_tag
    }

    /// The namespace URI of the schema, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Element descriptors in declaration order.
    pub fn elements(&self) -> &[ElementDescriptor] {
        &self.elements
    }

    /// Attribute descriptors in declaration order.
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    /// Resolve a field name to an element or an attribute.
    pub fn resolve_field(&self, field_name: &str) -> Option<FieldRef> {
        self.fields.get(field_name).copied()
    }

    /// Index of the element descriptor with the given field name.
    pub fn element_index(&self, field_name: &str) -> Option<usize> {
        match self.resolve_field(field_name)? {
            FieldRef::Element(idx) => Some(idx),
            FieldRef::Attribute(_) => None,
        }
    }

    /// Element descriptor with the given field name.
    pub fn element(&self, field_name: &str) -> Option<&ElementDescriptor> {
        self.element_index(field_name).map(|idx| &self.elements[idx])
    }

    /// Attribute descriptor with the given name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        match self.resolve_field(name)? {
            FieldRef::Attribute(idx) => Some(&self.attributes[idx]),
            FieldRef::Element(_) => None,
        }
    }

    /// Index of the element holding the text content of the schema's own XML
    /// element, if the schema has one.
    pub fn label_index(&self) -> Option<usize> {
        self.label
    }

    /// The element holding the text content of the schema's own XML element.
    pub fn label(&self) -> Option<&ElementDescriptor> {
        self.label.map(|idx| &self.elements[idx])
    }
}

/// Builder for a [`Schema`], consumed by [`RegistryBuilder::register`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    root_tag: String,
    namespace: Option<String>,
    elements: Vec<ElementDescriptor>,
    attributes: Vec<AttributeDescriptor>,
    label: Option<String>,
}

impl SchemaBuilder {
    /// Set the namespace URI of the schema.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Append an element descriptor.
    pub fn element(mut self, element: ElementDescriptor) -> Self {
        self.elements.push(element);
        self
    }

    /// Append an attribute descriptor.
    pub fn attribute(mut self, attribute: AttributeDescriptor) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Append several attribute descriptors.
    pub fn attributes<I>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = AttributeDescriptor>,
    {
        self.attributes.extend(attributes);
        self
    }

    /// Designate a primitive element as the text content of the schema's own
    /// XML element, e.g. `<StreetAddress>1 Main St</StreetAddress>`.
    pub fn label(mut self, field_name: impl Into<String>) -> Self {
        self.label = Some(field_name.into());
        self
    }

    fn build(self) -> Result<Schema> {
        let mut fields = HashMap::new();

        let element_refs = self
            .elements
            .iter()
            .enumerate()
            .map(|(idx, element)| (element.field_name.as_str(), FieldRef::Element(idx)));
        let attribute_refs = self
            .attributes
            .iter()
            .enumerate()
            .map(|(idx, attribute)| (attribute.name.as_str(), FieldRef::Attribute(idx)));

        for (field_name, field_ref) in element_refs.chain(attribute_refs) {
            if fields.insert(field_name.to_owned(), field_ref).is_some() {
                return Err(schema_error(SchemaError::DuplicateField(
                    self.name.clone(),
                    field_name.to_owned(),
                )));
            }
        }

        let label = match self.label {
            None => None,
            Some(label) => match fields.get(&label) {
                Some(FieldRef::Element(idx))
                    if matches!(self.elements[*idx].value_kind, ValueKind::Primitive(_)) =>
                {
                    Some(*idx)
                }
                _ => {
                    return Err(schema_error(SchemaError::InvalidLabel(self.name, label)));
                }
            },
        };

        Ok(Schema {
            name: self.name,
            root_tag: self.root_tag,
            namespace: self.namespace,
            elements: self.elements,
            attributes: self.attributes,
            label,
            fields,
        })
    }
}

/// Collects schemas before freezing them into a [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    schemas: Vec<Schema>,
}

impl RegistryBuilder {
    /// Register a schema.
    ///
    /// Fails if a schema with the same name is already registered, or if the
    /// schema declares the same field name twice.
    pub fn register(mut self, schema: SchemaBuilder) -> Result<Self> {
        let schema = schema.build()?;

        if self.schemas.iter().any(|known| known.name == schema.name) {
            return Err(schema_error(SchemaError::DuplicateSchema(schema.name)));
        }

        self.schemas.push(schema);
        Ok(self)
    }

    /// Resolve all nested references and freeze the registry.
    pub fn build(self) -> Result<SchemaRegistry> {
        let root_tags: HashMap<String, String> = self
            .schemas
            .iter()
            .map(|schema| (schema.name.clone(), schema.root_tag.clone()))
            .collect();

        let mut schemas = self.schemas;
        for schema in &mut schemas {
            for element in &mut schema.elements {
                if let ValueKind::Nested(target) = &element.value_kind {
                    let Some(root_tag) = root_tags.get(target) else {
                        return Err(schema_error(SchemaError::UnresolvedReference(
                            schema.name.clone(),
                            target.clone(),
                        )));
                    };
                    element.xml_tag = root_tag.clone();
                }
            }
        }

        tracing::debug!(count = schemas.len(), "schema registry built");

        Ok(SchemaRegistry {
            schemas: schemas
                .into_iter()
                .map(|schema| (schema.name.clone(), Arc::new(schema)))
                .collect(),
        })
    }
}

/// Immutable set of resolved schemas, keyed by schema name.
///
/// Safe to share between threads; nothing mutates it after
/// [`RegistryBuilder::build`].
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    /// Start a new registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Get the schema registered under `name`.
    pub fn get(&self, name: &str) -> Result<&Arc<Schema>> {
        self.schemas
            .get(name)
            .ok_or_else(|| schema_error(SchemaError::UnknownSchema(name.to_owned())))
    }

    /// Whether a schema named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry holds no schemas.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[track_caller]
fn schema_error(error: SchemaError) -> bherror::Error<Error> {
    bherror::Error::root(Error::Schema(error))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_schema() -> SchemaBuilder {
        Schema::builder("Name", "Name")
            .element(ElementDescriptor::string("first", "First"))
            .element(ElementDescriptor::string("surname", "Surname"))
    }

    fn person_schema() -> SchemaBuilder {
        Schema::builder("Person", "Person")
            .namespace("urn:test")
            .element(ElementDescriptor::nested("name", "Name"))
            .element(ElementDescriptor::primitive("born", "Born", PrimitiveType::Date))
            .attribute(AttributeDescriptor::new("id").required())
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = SchemaRegistry::builder()
            .register(person_schema())
            .unwrap()
            .register(name_schema())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(registry.len(), 2);

        let person = registry.get("Person").unwrap();
        assert_eq!(person.namespace(), Some("urn:test"));
        assert_eq!(person.element("name").unwrap().xml_tag(), "Name");
        assert_eq!(person.element("name").unwrap().nested_schema(), Some("Name"));
        assert_eq!(person.resolve_field("born"), Some(FieldRef::Element(1)));
        assert_eq!(person.resolve_field("id"), Some(FieldRef::Attribute(0)));
        assert!(person.attribute("id").unwrap().is_required());
        assert!(person.resolve_field("nickname").is_none());
    }

    #[test]
    fn test_nested_tag_comes_from_referenced_schema() {
        let registry = SchemaRegistry::builder()
            .register(
                Schema::builder("Group", "Group").element(ElementDescriptor::nested("data", "Data")),
            )
            .unwrap()
            .register(Schema::builder("Data", "AccessResponse"))
            .unwrap()
            .build()
            .unwrap();

        let group = registry.get("Group").unwrap();
        assert_eq!(group.element("data").unwrap().xml_tag(), "AccessResponse");
    }

    #[test]
    fn test_unresolved_reference() {
        let error = SchemaRegistry::builder()
            .register(person_schema())
            .unwrap()
            .build()
            .unwrap_err();

        assert_eq!(
            error.error,
            Error::Schema(SchemaError::UnresolvedReference(
                "Person".to_owned(),
                "Name".to_owned()
            ))
        );
    }

    #[test]
    fn test_duplicate_field() {
        let error = SchemaRegistry::builder()
            .register(name_schema().element(ElementDescriptor::string("first", "Other")))
            .unwrap_err();

        assert_eq!(
            error.error,
            Error::Schema(SchemaError::DuplicateField(
                "Name".to_owned(),
                "first".to_owned()
            ))
        );

        let error = SchemaRegistry::builder()
            .register(name_schema().attribute(AttributeDescriptor::new("surname")))
            .unwrap_err();

        assert!(matches!(
            error.error,
            Error::Schema(SchemaError::DuplicateField(_, _))
        ));
    }

    #[test]
    fn test_duplicate_schema() {
        let error = SchemaRegistry::builder()
            .register(name_schema())
            .unwrap()
            .register(name_schema())
            .unwrap_err();

        assert_eq!(
            error.error,
            Error::Schema(SchemaError::DuplicateSchema("Name".to_owned()))
        );
    }

    #[test]
    fn test_label_must_be_primitive() {
        let schema = Schema::builder("Street", "StreetAddress")
            .element(ElementDescriptor::string("name", "."))
            .label("name");
        let registry = SchemaRegistry::builder()
            .register(schema)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            registry.get("Street").unwrap().label().unwrap().field_name(),
            "name"
        );

        let error = SchemaRegistry::builder()
            .register(person_schema().label("name"))
            .unwrap_err();
        assert_eq!(
            error.error,
            Error::Schema(SchemaError::InvalidLabel(
                "Person".to_owned(),
                "name".to_owned()
            ))
        );
    }

    #[test]
    fn test_unknown_schema() {
        let registry = SchemaRegistry::builder().build().unwrap();

        assert!(registry.is_empty());
        assert_eq!(
            registry.get("Name").unwrap_err().error,
            Error::Schema(SchemaError::UnknownSchema("Name".to_owned()))
        );
    }
}
