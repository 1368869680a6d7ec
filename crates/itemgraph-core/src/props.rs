//! Typed property descriptors
//!
//! Each descriptor is bound to one slot of one template. Reads go straight
//! to the arena; every write is routed through the context's observable
//! operations so it produces exactly one `Change` per structural step.

use itemgraph_core_types::ItemId;

use crate::context::Context;
use crate::errors::{ItemGraphError, Result};
use crate::model::item::Slot;
use crate::model::{PropertyRef, PropertyValue, Value};

fn mismatch(item: ItemId, property: &PropertyRef) -> ItemGraphError {
    ItemGraphError::PropertyMismatch {
        item_id: item,
        property: property.to_string(),
    }
}

/// The immutable id of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdProp(PropertyRef);

impl IdProp {
    pub(crate) fn new(property: PropertyRef) -> Self {
        Self(property)
    }

    pub fn property(&self) -> PropertyRef {
        self.0
    }

    /// # Errors
    ///
    /// Returns `ItemNotFound` or `PropertyMismatch` for a bad item.
    pub fn get(&self, ctx: &Context, item: ItemId) -> Result<ItemId> {
        match ctx.slot(item, &self.0)? {
            Slot::Id => Ok(item),
            _ => Err(mismatch(item, &self.0)),
        }
    }
}

/// A primitive value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScalarProp(PropertyRef);

impl ScalarProp {
    pub(crate) fn new(property: PropertyRef) -> Self {
        Self(property)
    }

    pub fn property(&self) -> PropertyRef {
        self.0
    }

    /// Current value; `None` when unset
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` or `PropertyMismatch` for a bad item.
    pub fn get<'a>(&self, ctx: &'a Context, item: ItemId) -> Result<Option<&'a Value>> {
        match ctx.slot(item, &self.0)? {
            Slot::Scalar(value) => Ok(value.as_ref()),
            _ => Err(mismatch(item, &self.0)),
        }
    }

    /// Set the value, returning the previous one
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` or `PropertyMismatch` for a bad item.
    pub fn set(
        &self,
        ctx: &mut Context,
        item: ItemId,
        value: impl Into<Value>,
    ) -> Result<Option<Value>> {
        self.set_value(ctx, item, Some(value.into()))
    }

    /// Reset the value to unset
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` or `PropertyMismatch` for a bad item.
    pub fn clear(&self, ctx: &mut Context, item: ItemId) -> Result<Option<Value>> {
        self.set_value(ctx, item, None)
    }

    /// Set or unset the value, returning the previous one
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` or `PropertyMismatch` for a bad item.
    pub fn set_value(
        &self,
        ctx: &mut Context,
        item: ItemId,
        value: Option<Value>,
    ) -> Result<Option<Value>> {
        match ctx.change_value(item, self.0, PropertyValue::Scalar(value))? {
            PropertyValue::Scalar(old) => Ok(old),
            _ => Err(mismatch(item, &self.0)),
        }
    }
}

/// A weak, id-based reference to another item
///
/// The stored id is the source of truth. Reading resolves it against the
/// context's tracked graph and yields `None` when the target is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceProp(PropertyRef);

impl ReferenceProp {
    pub(crate) fn new(property: PropertyRef) -> Self {
        Self(property)
    }

    pub fn property(&self) -> PropertyRef {
        self.0
    }

    /// Resolved target, `None` when unset or dangling
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` or `PropertyMismatch` for a bad item.
    pub fn get(&self, ctx: &Context, item: ItemId) -> Result<Option<ItemId>> {
        Ok(self
            .get_id(ctx, item)?
            .and_then(|target| ctx.resolve_id(target)))
    }

    /// Stored target id, without resolution
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` or `PropertyMismatch` for a bad item.
    pub fn get_id(&self, ctx: &Context, item: ItemId) -> Result<Option<ItemId>> {
        match ctx.slot(item, &self.0)? {
            Slot::Reference(target) => Ok(*target),
            _ => Err(mismatch(item, &self.0)),
        }
    }

    /// Point the reference at `target`, returning the previous stored id
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` or `PropertyMismatch` for a bad item.
    pub fn set(
        &self,
        ctx: &mut Context,
        item: ItemId,
        target: Option<ItemId>,
    ) -> Result<Option<ItemId>> {
        match ctx.change_value(item, self.0, PropertyValue::Reference(target))? {
            PropertyValue::Reference(old) => Ok(old),
            _ => Err(mismatch(item, &self.0)),
        }
    }
}

/// Read-only view of an ordered child list
#[derive(Debug, Clone, Copy)]
pub struct ChildList<'a> {
    owner: ItemId,
    property: PropertyRef,
    children: &'a [ItemId],
}

impl<'a> ChildList<'a> {
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// # Errors
    ///
    /// Returns `IndexOutOfRange` when `index >= len()`.
    pub fn get(&self, index: usize) -> Result<ItemId> {
        self.children
            .get(index)
            .copied()
            .ok_or_else(|| ItemGraphError::IndexOutOfRange {
                item_id: self.owner,
                property: self.property.to_string(),
                index,
                len: self.children.len(),
            })
    }

    pub fn index_of(&self, child: ItemId) -> Option<usize> {
        self.children.iter().position(|c| *c == child)
    }

    pub fn contains(&self, child: ItemId) -> bool {
        self.children.contains(&child)
    }

    /// Children front to back
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = ItemId> + 'a {
        self.children.iter().copied()
    }

    /// Children back to front
    pub fn iter_rev(&self) -> impl Iterator<Item = ItemId> + 'a {
        self.children.iter().rev().copied()
    }

    pub fn to_vec(&self) -> Vec<ItemId> {
        self.children.to_vec()
    }
}

/// An ordered, owned collection of children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildListProp(PropertyRef);

impl ChildListProp {
    pub(crate) fn new(property: PropertyRef) -> Self {
        Self(property)
    }

    pub fn property(&self) -> PropertyRef {
        self.0
    }

    /// # Errors
    ///
    /// Returns `ItemNotFound` or `PropertyMismatch` for a bad item.
    pub fn get<'a>(&self, ctx: &'a Context, item: ItemId) -> Result<ChildList<'a>> {
        match ctx.slot(item, &self.0)? {
            Slot::ChildList(children) => Ok(ChildList {
                owner: item,
                property: self.0,
                children,
            }),
            _ => Err(mismatch(item, &self.0)),
        }
    }

    pub fn len(&self, ctx: &Context, item: ItemId) -> Result<usize> {
        Ok(self.get(ctx, item)?.len())
    }

    /// Add `child` at the end
    ///
    /// # Errors
    ///
    /// Fails when the child is already owned or would create a cycle.
    pub fn append(&self, ctx: &mut Context, item: ItemId, child: ItemId) -> Result<()> {
        let len = self.len(ctx, item)?;
        ctx.insert_element(item, self.0, len, child)
    }

    /// Insert `child` before position `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` when `index > len()`, and fails when the
    /// child is already owned or would create a cycle.
    pub fn insert(
        &self,
        ctx: &mut Context,
        item: ItemId,
        child: ItemId,
        index: usize,
    ) -> Result<()> {
        ctx.insert_element(item, self.0, index, child)
    }

    /// Remove `child` if present, returning the index it had
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` or `PropertyMismatch` for a bad item.
    pub fn remove(&self, ctx: &mut Context, item: ItemId, child: ItemId) -> Result<Option<usize>> {
        let Some(index) = self.get(ctx, item)?.index_of(child) else {
            return Ok(None);
        };
        ctx.remove_element(item, self.0, index)?;
        Ok(Some(index))
    }

    /// Remove the child at `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` when `index >= len()`.
    pub fn remove_at(&self, ctx: &mut Context, item: ItemId, index: usize) -> Result<ItemId> {
        ctx.remove_element(item, self.0, index)
    }
}

/// A single, optional owned child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildSlotProp(PropertyRef);

impl ChildSlotProp {
    pub(crate) fn new(property: PropertyRef) -> Self {
        Self(property)
    }

    pub fn property(&self) -> PropertyRef {
        self.0
    }

    /// # Errors
    ///
    /// Returns `ItemNotFound` or `PropertyMismatch` for a bad item.
    pub fn get(&self, ctx: &Context, item: ItemId) -> Result<Option<ItemId>> {
        match ctx.slot(item, &self.0)? {
            Slot::ChildSlot(child) => Ok(*child),
            _ => Err(mismatch(item, &self.0)),
        }
    }

    /// Replace the child, returning the previous one; `None` empties the slot
    ///
    /// Replacement is a removal followed by an insertion, each observed.
    ///
    /// # Errors
    ///
    /// Fails when the new child is already owned or would create a cycle.
    /// Nothing is changed in that case.
    pub fn set(
        &self,
        ctx: &mut Context,
        item: ItemId,
        child: Option<ItemId>,
    ) -> Result<Option<ItemId>> {
        let old = self.get(ctx, item)?;
        if old == child {
            return Ok(old);
        }
        if let Some(child) = child {
            ctx.check_insertable(item, child)?;
        }
        if old.is_some() {
            ctx.remove_element(item, self.0, 0)?;
        }
        if let Some(child) = child {
            ctx.insert_element(item, self.0, 0, child)?;
        }
        Ok(old)
    }
}
