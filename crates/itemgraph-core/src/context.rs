//! The item context
//!
//! A `Context` owns every item it constructs together with the derived
//! indices (parent map, reference targets, selection) and the transaction
//! and history state. All structural mutation goes through
//! `change_value`, `insert_element` and `remove_element`, which keep the
//! indices current, record the change in the open transaction and publish
//! it on the event bus, in that order.

use std::collections::BTreeSet;

use itemgraph_core_types::ItemId;

use crate::config::ContextConfig;
use crate::errors::{ItemGraphError, Result};
use crate::events::{
    Change, ChangeEvent, EventBus, HandlerId, TransactionEvent, TransactionNotice,
};
use crate::history::History;
use crate::hooks::ConsistencyHook;
use crate::model::item::{self, Arena, Slot};
use crate::model::{Item, PropertyRef, PropertyValue, Template, TemplateId, TemplateRegistry};
use crate::props::ChildListProp;
use crate::references::ReferenceIndex;
use crate::selection::SelectionSet;
use crate::transaction::{Operation, TransactionManager};
use crate::traversal::Hierarchy;

pub struct Context {
    pub(crate) registry: TemplateRegistry,
    pub(crate) config: ContextConfig,
    pub(crate) items: Arena,
    /// `None` once the last id has been handed out
    next_id: Option<ItemId>,
    root: ItemId,
    pub(crate) hierarchy: Hierarchy,
    pub(crate) references: ReferenceIndex,
    pub(crate) selection: SelectionSet<ItemId>,
    pub(crate) transactions: TransactionManager,
    pub(crate) history: History,
    pub(crate) change_events: EventBus<ChangeEvent, Change>,
    pub(crate) transaction_events: EventBus<TransactionEvent, TransactionNotice>,
    pub(crate) hooks: Vec<Box<dyn ConsistencyHook>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("root", &self.root)
            .field("items", &self.items.len())
            .field("next_id", &self.next_id)
            .field("state", &self.transactions.state())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl Context {
    /// Create a context whose tracked graph is rooted at a new `root_type` item
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if `root_type` is not registered.
    pub fn new(registry: TemplateRegistry, root_type: &str) -> Result<Self> {
        Self::with_config(registry, root_type, ContextConfig::default())
    }

    /// # Errors
    ///
    /// Returns `UnknownType` if `root_type` is not registered.
    pub fn with_config(
        registry: TemplateRegistry,
        root_type: &str,
        config: ContextConfig,
    ) -> Result<Self> {
        let template_id = registry.lookup(root_type)?;
        let root = ItemId::FIRST;
        let mut ctx = Self {
            registry,
            config,
            items: Arena::new(),
            next_id: Some(root),
            root,
            hierarchy: Hierarchy::new(),
            references: ReferenceIndex::new(),
            selection: SelectionSet::new(),
            transactions: TransactionManager::default(),
            history: History::default(),
            change_events: EventBus::new(),
            transaction_events: EventBus::new(),
            hooks: Vec::new(),
        };
        let root = ctx.alloc_item(template_id)?;
        ctx.root = root;
        ctx.references.rebuild(&ctx.items, root);
        tracing::debug!(root = %root, root_type, "context created");
        Ok(ctx)
    }

    /// Construct a detached item of the given type
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if `type_name` is not registered.
    pub fn construct(&mut self, type_name: &str) -> Result<ItemId> {
        let template_id = self.registry.lookup(type_name)?;
        self.alloc_item(template_id)
    }

    /// # Errors
    ///
    /// Returns `IdsExhausted` once every id has been used; ids are never
    /// reused.
    pub(crate) fn alloc_item(&mut self, template_id: TemplateId) -> Result<ItemId> {
        let id = self.next_id.ok_or(ItemGraphError::IdsExhausted)?;
        self.next_id = id.successor();
        let item = Item::new(id, template_id, self.registry.get(template_id));
        self.items.insert(id, item);
        Ok(id)
    }

    // --- accessors ---

    pub fn root(&self) -> ItemId {
        self.root
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Number of items ever constructed in this context
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn references(&self) -> &ReferenceIndex {
        &self.references
    }

    pub fn selection(&self) -> &SelectionSet<ItemId> {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionSet<ItemId> {
        &mut self.selection
    }

    /// Template of an item
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` for an unknown id.
    pub fn template_of(&self, id: ItemId) -> Result<&Template> {
        let item = self.get_item(id)?;
        Ok(self.registry.get(item.template))
    }

    pub fn type_name(&self, id: ItemId) -> Result<&'static str> {
        Ok(self.template_of(id)?.type_name())
    }

    /// Whether the item is reachable from the root
    pub fn is_tracked(&self, id: ItemId) -> bool {
        self.references.is_tracked(id)
    }

    /// Resolve a stored reference id against the tracked graph
    pub fn resolve_id(&self, id: ItemId) -> Option<ItemId> {
        self.references.resolve(id)
    }

    pub(crate) fn get_item(&self, id: ItemId) -> Result<&Item> {
        self.items
            .get(&id)
            .ok_or(ItemGraphError::ItemNotFound { item_id: id })
    }

    /// Storage for `property` on `item`, checked against the item's template
    pub(crate) fn slot(&self, id: ItemId, property: &PropertyRef) -> Result<&Slot> {
        let item = self.get_item(id)?;
        if self.registry.get(item.template).type_name() != property.type_name {
            return Err(ItemGraphError::PropertyMismatch {
                item_id: id,
                property: property.to_string(),
            });
        }
        item.slots
            .get(property.slot)
            .ok_or_else(|| ItemGraphError::PropertyMismatch {
                item_id: id,
                property: property.to_string(),
            })
    }

    fn slot_mut(&mut self, id: ItemId, property: &PropertyRef) -> Result<&mut Slot> {
        self.slot(id, property)?;
        self.items
            .get_mut(&id)
            .and_then(|item| item.slots.get_mut(property.slot))
            .ok_or(ItemGraphError::ItemNotFound { item_id: id })
    }

    /// Current value of a scalar, reference or child slot property
    ///
    /// # Errors
    ///
    /// Returns `PropertyMismatch` for id and child list properties.
    pub fn property_value(&self, id: ItemId, property: &PropertyRef) -> Result<PropertyValue> {
        match self.slot(id, property)? {
            Slot::Scalar(value) => Ok(PropertyValue::Scalar(value.clone())),
            Slot::Reference(target) => Ok(PropertyValue::Reference(*target)),
            Slot::ChildSlot(child) => Ok(PropertyValue::Child(*child)),
            Slot::Id | Slot::ChildList(_) => Err(ItemGraphError::PropertyMismatch {
                item_id: id,
                property: property.to_string(),
            }),
        }
    }

    // --- observable mutation ---

    /// Replace a scalar or reference value, returning the previous one
    ///
    /// Writing the current value is a no-op: nothing is emitted or recorded.
    ///
    /// # Errors
    ///
    /// Returns `PropertyMismatch` if the property is not a scalar or
    /// reference, or if `value` is of the other kind.
    pub fn change_value(
        &mut self,
        id: ItemId,
        property: PropertyRef,
        value: PropertyValue,
    ) -> Result<PropertyValue> {
        let slot = self.slot_mut(id, &property)?;
        let old = match (slot, value.clone()) {
            (Slot::Scalar(current), PropertyValue::Scalar(new)) => {
                if *current == new {
                    return Ok(PropertyValue::Scalar(new));
                }
                PropertyValue::Scalar(std::mem::replace(current, new))
            }
            (Slot::Reference(current), PropertyValue::Reference(new)) => {
                if *current == new {
                    return Ok(PropertyValue::Reference(new));
                }
                PropertyValue::Reference(std::mem::replace(current, new))
            }
            _ => {
                return Err(ItemGraphError::PropertyMismatch {
                    item_id: id,
                    property: property.to_string(),
                })
            }
        };

        self.on_changed(
            Change::value_changed(id, property, old.clone(), value.clone()),
            Operation::ChangeValue {
                item: id,
                property,
                old: old.clone(),
                new: value,
            },
        );
        Ok(old)
    }

    /// Check that `child` may become a child of `owner`
    ///
    /// # Errors
    ///
    /// Returns `IllegalReparent` for the root, `AlreadyOwned` if the child
    /// has an owner, `CycleDetected` if the child is the owner or one of
    /// its ancestors.
    pub fn check_insertable(&self, owner: ItemId, child: ItemId) -> Result<()> {
        self.get_item(owner)?;
        self.get_item(child)?;
        if child == self.root {
            return Err(ItemGraphError::IllegalReparent {
                reason: format!("root item {child} cannot be inserted"),
            });
        }
        if let Some(current) = self.hierarchy.parent(child) {
            return Err(ItemGraphError::AlreadyOwned {
                child_id: child,
                owner_id: current,
            });
        }
        if child == owner || self.hierarchy.is_ancestor(child, owner) {
            return Err(ItemGraphError::CycleDetected { item_id: child });
        }
        Ok(())
    }

    /// Insert `child` into a container property at `index`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` past the end of a child list,
    /// `IllegalReparent` for an occupied child slot, and the errors of
    /// `check_insertable`.
    pub fn insert_element(
        &mut self,
        id: ItemId,
        property: PropertyRef,
        index: usize,
        child: ItemId,
    ) -> Result<()> {
        self.check_insertable(id, child)?;
        match self.slot_mut(id, &property)? {
            Slot::ChildList(children) => {
                if index > children.len() {
                    return Err(ItemGraphError::IndexOutOfRange {
                        item_id: id,
                        property: property.to_string(),
                        index,
                        len: children.len(),
                    });
                }
                children.insert(index, child);
            }
            Slot::ChildSlot(slot) => {
                if index != 0 {
                    return Err(ItemGraphError::IndexOutOfRange {
                        item_id: id,
                        property: property.to_string(),
                        index,
                        len: usize::from(slot.is_some()),
                    });
                }
                if slot.is_some() {
                    return Err(ItemGraphError::IllegalReparent {
                        reason: format!("{property} on {id} is occupied"),
                    });
                }
                *slot = Some(child);
            }
            _ => {
                return Err(ItemGraphError::PropertyMismatch {
                    item_id: id,
                    property: property.to_string(),
                })
            }
        }

        self.hierarchy.set_parent(child, id);
        if self.references.is_tracked(id) {
            self.references.attach(&self.items, child);
        }

        self.on_changed(
            Change::element_inserted(id, property, index, child),
            Operation::InsertElement {
                item: id,
                property,
                index,
                child,
            },
        );
        Ok(())
    }

    /// Remove the child at `index` from a container property
    ///
    /// The removed subtree leaves the tracked graph and the selection. Its
    /// items stay in the arena.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if there is no child at `index`.
    pub fn remove_element(
        &mut self,
        id: ItemId,
        property: PropertyRef,
        index: usize,
    ) -> Result<ItemId> {
        let out_of_range = |len: usize| ItemGraphError::IndexOutOfRange {
            item_id: id,
            property: property.to_string(),
            index,
            len,
        };
        let child = match self.slot_mut(id, &property)? {
            Slot::ChildList(children) => {
                if index >= children.len() {
                    return Err(out_of_range(children.len()));
                }
                children.remove(index)
            }
            Slot::ChildSlot(slot) => match (index, slot.take()) {
                (0, Some(child)) => child,
                (_, taken) => {
                    let len = usize::from(taken.is_some());
                    *slot = taken;
                    return Err(out_of_range(len));
                }
            },
            _ => {
                return Err(ItemGraphError::PropertyMismatch {
                    item_id: id,
                    property: property.to_string(),
                })
            }
        };

        self.hierarchy.clear_parent(child);
        self.references.detach(&self.items, child);
        if !self.transactions.is_replaying() {
            for removed in item::subtree_ids(&self.items, child) {
                self.selection.delete(&removed);
            }
        }

        self.on_changed(
            Change::element_removed(id, property, index, child),
            Operation::RemoveElement {
                item: id,
                property,
                index,
                child,
            },
        );
        Ok(child)
    }

    /// Record the change in the open transaction, then publish it
    fn on_changed(&mut self, change: Change, op: Operation) {
        tracing::debug!(
            item_id = %change.item,
            property = %change.property,
            kind = ?change.kind,
            index = ?change.index,
            "change"
        );
        if self.transactions.is_recording() {
            self.transactions.record(op);
        }
        self.change_events.emit(&change.kind.channel(), &change);
        self.change_events.emit(&ChangeEvent::Changed, &change);
    }

    // --- structure helpers ---

    /// `(owner, property, index)` of the container holding `child`
    pub fn owner_of(&self, child: ItemId) -> Option<(ItemId, PropertyRef, usize)> {
        let owner = self.hierarchy.parent(child)?;
        let item = self.items.get(&owner)?;
        let template = self.registry.get(item.template);
        template
            .properties()
            .iter()
            .zip(item.slots.iter())
            .find_map(|(property, slot)| {
                slot.children()
                    .iter()
                    .position(|c| *c == child)
                    .map(|index| (owner, *property, index))
            })
    }

    /// Detach the item from its owner and drop it from the selection
    ///
    /// Returns false if the item had no owner.
    ///
    /// # Errors
    ///
    /// Returns `IllegalReparent` for the root.
    pub fn delete_item(&mut self, id: ItemId) -> Result<bool> {
        self.get_item(id)?;
        if id == self.root {
            return Err(ItemGraphError::IllegalReparent {
                reason: "root item cannot be deleted".to_string(),
            });
        }
        self.selection.delete(&id);
        match self.owner_of(id) {
            Some((owner, property, index)) => {
                self.remove_element(owner, property, index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Reparent `child` into `list` on `new_owner`, as remove-then-insert
    ///
    /// `index` is interpreted after the removal; `None` appends. Every check
    /// runs before the child leaves its current owner, so a failed move
    /// changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `CycleDetected` if `new_owner` is inside `child`,
    /// `IndexOutOfRange` past the end of the list, and `PropertyMismatch`
    /// if `list` does not apply to `new_owner`.
    pub fn move_item(
        &mut self,
        child: ItemId,
        new_owner: ItemId,
        list: &ChildListProp,
        index: Option<usize>,
    ) -> Result<()> {
        self.get_item(child)?;
        let property = list.property();
        let len = list.len(self, new_owner)?;
        if child == self.root {
            return Err(ItemGraphError::IllegalReparent {
                reason: "root item cannot be moved".to_string(),
            });
        }
        if child == new_owner || self.hierarchy.is_ancestor(child, new_owner) {
            return Err(ItemGraphError::CycleDetected { item_id: child });
        }

        let current = self.owner_of(child);
        let len = match current {
            Some((owner, from, _)) if owner == new_owner && from == property => {
                len.saturating_sub(1)
            }
            _ => len,
        };
        let index = index.unwrap_or(len);
        if index > len {
            return Err(ItemGraphError::IndexOutOfRange {
                item_id: new_owner,
                property: property.to_string(),
                index,
                len,
            });
        }

        if let Some((owner, from, at)) = current {
            self.remove_element(owner, from, at)?;
        }
        self.insert_element(new_owner, property, index, child)
    }

    /// Visit the item and everything it owns, pre-order
    pub fn visit_subtree<F>(&self, id: ItemId, mut visit: F)
    where
        F: FnMut(&Item),
    {
        item::visit_subtree(&self.items, id, &mut visit);
    }

    /// Ids of the item and everything it owns, pre-order
    pub fn subtree_ids(&self, id: ItemId) -> Vec<ItemId> {
        item::subtree_ids(&self.items, id)
    }

    /// Recompute the parent map and reference targets from the containers
    ///
    /// Walks the whole arena.
    pub fn rebuild_indices(&mut self) {
        self.hierarchy.rebuild(&self.items);
        self.references.rebuild(&self.items, self.root);
    }

    /// The tracked graph plus the subtrees of `touched`, in id order
    pub(crate) fn index_scope(&self, touched: &[ItemId]) -> Vec<ItemId> {
        let mut scope = BTreeSet::new();
        for start in std::iter::once(self.root).chain(touched.iter().copied()) {
            if !scope.contains(&start) {
                scope.extend(item::subtree_ids(&self.items, start));
            }
        }
        scope.into_iter().collect()
    }

    /// Recompute parents over `index_scope(touched)` and return the scope
    ///
    /// Items outside the tracked graph that no operation touched keep
    /// their entries, so the cost follows the graph, not the arena.
    pub(crate) fn rebuild_hierarchy_for(&mut self, touched: &[ItemId]) -> Vec<ItemId> {
        let scope = self.index_scope(touched);
        self.hierarchy.rebuild_scope(&self.items, &scope);
        scope
    }

    /// Replace the selection with its roots, keeping order
    pub fn reduce_selection(&mut self) {
        let roots = self
            .hierarchy
            .reduce_to_roots(self.selection.contents(), &self.selection);
        self.selection.set(roots);
    }

    // --- subscriptions ---

    pub fn add_change_handler<F>(&mut self, event: ChangeEvent, handler: F) -> HandlerId
    where
        F: FnMut(&Change) + 'static,
    {
        self.change_events.add_handler(event, handler)
    }

    pub fn remove_change_handler(&mut self, id: HandlerId) -> bool {
        self.change_events.remove_handler(id)
    }

    pub fn add_transaction_handler<F>(&mut self, event: TransactionEvent, handler: F) -> HandlerId
    where
        F: FnMut(&TransactionNotice) + 'static,
    {
        self.transaction_events.add_handler(event, handler)
    }

    pub fn remove_transaction_handler(&mut self, id: HandlerId) -> bool {
        self.transaction_events.remove_handler(id)
    }

    /// Register a hook run before every commit, in registration order
    pub fn add_consistency_hook<H>(&mut self, hook: H)
    where
        H: ConsistencyHook + 'static,
    {
        self.hooks.push(Box::new(hook));
    }
}
