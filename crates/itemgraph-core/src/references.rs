//! Reference resolution
//!
//! References store target ids. Resolution is a set lookup against the
//! items reachable from the context root, so a reference whose target has
//! been removed resolves to `None` without any bookkeeping on the
//! referencing side.

use std::collections::HashSet;

use itemgraph_core_types::ItemId;

use crate::model::item::{visit_subtree, Arena};

#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    targets: HashSet<ItemId>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(id)` if the id names an item in the tracked graph
    pub fn resolve(&self, id: ItemId) -> Option<ItemId> {
        self.targets.contains(&id).then_some(id)
    }

    pub fn is_tracked(&self, id: ItemId) -> bool {
        self.targets.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Register `root` and everything it owns
    pub(crate) fn attach(&mut self, items: &Arena, root: ItemId) {
        visit_subtree(items, root, &mut |item| {
            self.targets.insert(item.id());
        });
    }

    /// Unregister `root` and everything it owns
    pub(crate) fn detach(&mut self, items: &Arena, root: ItemId) {
        visit_subtree(items, root, &mut |item| {
            self.targets.remove(&item.id());
        });
    }

    /// Recompute from the graph root
    pub(crate) fn rebuild(&mut self, items: &Arena, root: ItemId) {
        self.targets.clear();
        self.attach(items, root);
    }
}
