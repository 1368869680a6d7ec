use std::collections::HashMap;

use itemgraph_core_types::ItemId;

use super::template::{PropertyKind, Template, TemplateId};
use super::value::Value;

/// Storage for one declared property
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    Id,
    Scalar(Option<Value>),
    Reference(Option<ItemId>),
    ChildList(Vec<ItemId>),
    ChildSlot(Option<ItemId>),
}

impl Slot {
    fn empty(kind: PropertyKind) -> Self {
        match kind {
            PropertyKind::Id => Slot::Id,
            PropertyKind::Scalar => Slot::Scalar(None),
            PropertyKind::Reference => Slot::Reference(None),
            PropertyKind::ChildList => Slot::ChildList(Vec::new()),
            PropertyKind::ChildSlot => Slot::ChildSlot(None),
        }
    }

    /// Owned children held by this slot, in order
    pub(crate) fn children(&self) -> &[ItemId] {
        match self {
            Slot::ChildList(list) => list,
            Slot::ChildSlot(child) => child.as_slice(),
            _ => &[],
        }
    }
}

/// A node of the managed object graph
///
/// Items live in their context's arena and are addressed by id. The shape
/// is fixed by the template the item was constructed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub(crate) id: ItemId,
    pub(crate) template: TemplateId,
    pub(crate) slots: Vec<Slot>,
}

impl Item {
    pub(crate) fn new(id: ItemId, template_id: TemplateId, template: &Template) -> Self {
        Self {
            id,
            template: template_id,
            slots: template
                .properties()
                .iter()
                .map(|p| Slot::empty(p.kind()))
                .collect(),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn template(&self) -> TemplateId {
        self.template
    }

    /// Owned children across all container properties, in declaration order
    pub fn children(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.slots.iter().flat_map(|s| s.children().iter().copied())
    }

    /// Stored reference ids, unresolved
    pub fn reference_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.slots.iter().filter_map(|s| match s {
            Slot::Reference(id) => *id,
            _ => None,
        })
    }
}

/// Id-indexed owning store of items
pub(crate) type Arena = HashMap<ItemId, Item>;

/// Visit the item and all of its descendants, pre-order
///
/// Ids missing from the arena are skipped.
pub(crate) fn visit_subtree<F>(items: &Arena, root: ItemId, visit: &mut F)
where
    F: FnMut(&Item),
{
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(item) = items.get(&id) else {
            continue;
        };
        visit(item);
        let children: Vec<ItemId> = item.children().collect();
        stack.extend(children.into_iter().rev());
    }
}

/// Collect the ids of the item and all of its descendants, pre-order
pub(crate) fn subtree_ids(items: &Arena, root: ItemId) -> Vec<ItemId> {
    let mut ids = Vec::new();
    visit_subtree(items, root, &mut |item| ids.push(item.id));
    ids
}
