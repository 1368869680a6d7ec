use std::collections::HashMap;
use std::fmt;

use crate::errors::{ItemGraphError, Result};
use crate::props::{ChildListProp, ChildSlotProp, IdProp, ReferenceProp, ScalarProp};

/// Kind of a declared property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Id,
    Scalar,
    Reference,
    ChildList,
    ChildSlot,
}

impl PropertyKind {
    /// True for properties that own their values
    pub fn is_container(self) -> bool {
        matches!(self, PropertyKind::ChildList | PropertyKind::ChildSlot)
    }
}

/// A named slot on one item type
///
/// This is the untyped form of a descriptor. Typed handles (`ScalarProp`,
/// `ChildListProp`, ...) wrap one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyRef {
    pub(crate) type_name: &'static str,
    pub(crate) name: &'static str,
    pub(crate) slot: usize,
    pub(crate) kind: PropertyKind,
}

impl PropertyRef {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }
}

impl fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.name)
    }
}

/// Index of a template inside a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(pub(crate) usize);

/// The fixed shape of one item kind
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    type_name: &'static str,
    properties: Vec<PropertyRef>,
}

impl Template {
    /// Start declaring a template
    pub fn builder(type_name: &'static str) -> TemplateBuilder {
        TemplateBuilder {
            type_name,
            properties: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Declared properties in declaration order
    pub fn properties(&self) -> &[PropertyRef] {
        &self.properties
    }

    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&PropertyRef> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// The id property, if the template declares one
    pub fn id_property(&self) -> Option<&PropertyRef> {
        self.properties.iter().find(|p| p.kind == PropertyKind::Id)
    }
}

/// Declares the properties of a template and hands out typed descriptors
///
/// # Example
///
/// ```
/// use itemgraph_core::model::{Template, TemplateRegistry};
///
/// let mut builder = Template::builder("Node");
/// let _id = builder.id("id");
/// let x = builder.scalar("x");
/// let children = builder.child_list("children");
///
/// let mut registry = TemplateRegistry::new();
/// registry.register(builder.build()).unwrap();
///
/// assert_eq!(x.property().name(), "x");
/// assert_eq!(children.property().slot(), 2);
/// ```
#[derive(Debug)]
pub struct TemplateBuilder {
    type_name: &'static str,
    properties: Vec<PropertyRef>,
}

impl TemplateBuilder {
    fn declare(&mut self, name: &'static str, kind: PropertyKind) -> PropertyRef {
        let property = PropertyRef {
            type_name: self.type_name,
            name,
            slot: self.properties.len(),
            kind,
        };
        self.properties.push(property);
        property
    }

    pub fn id(&mut self, name: &'static str) -> IdProp {
        IdProp::new(self.declare(name, PropertyKind::Id))
    }

    pub fn scalar(&mut self, name: &'static str) -> ScalarProp {
        ScalarProp::new(self.declare(name, PropertyKind::Scalar))
    }

    pub fn reference(&mut self, name: &'static str) -> ReferenceProp {
        ReferenceProp::new(self.declare(name, PropertyKind::Reference))
    }

    pub fn child_list(&mut self, name: &'static str) -> ChildListProp {
        ChildListProp::new(self.declare(name, PropertyKind::ChildList))
    }

    pub fn child_slot(&mut self, name: &'static str) -> ChildSlotProp {
        ChildSlotProp::new(self.declare(name, PropertyKind::ChildSlot))
    }

    pub fn build(self) -> Template {
        Template {
            type_name: self.type_name,
            properties: self.properties,
        }
    }
}

/// The set of item kinds a context can construct
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<Template>,
    by_name: HashMap<&'static str, TemplateId>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template
    ///
    /// # Errors
    ///
    /// Returns `DuplicateType` if a template with the same type name exists.
    pub fn register(&mut self, template: Template) -> Result<TemplateId> {
        if self.by_name.contains_key(template.type_name) {
            return Err(ItemGraphError::DuplicateType {
                type_name: template.type_name.to_string(),
            });
        }
        let id = TemplateId(self.templates.len());
        self.by_name.insert(template.type_name, id);
        self.templates.push(template);
        Ok(id)
    }

    /// Find a template id by type name
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if no template has this name.
    pub fn lookup(&self, type_name: &str) -> Result<TemplateId> {
        self.by_name
            .get(type_name)
            .copied()
            .ok_or_else(|| ItemGraphError::UnknownType {
                type_name: type_name.to_string(),
            })
    }

    /// Get a registered template
    ///
    /// Template ids are only handed out by `register`, so an id from this
    /// registry always resolves.
    pub fn get(&self, id: TemplateId) -> &Template {
        &self.templates[id.0]
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
