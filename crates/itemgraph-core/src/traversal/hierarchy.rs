use std::collections::{HashMap, HashSet};

use itemgraph_core_types::ItemId;

use crate::model::item::{visit_subtree, Arena};
use crate::selection::SelectionSet;

/// Parent pointers for every owned item
///
/// Maintained incrementally on insert and remove, for detached subtrees as
/// well as the tracked graph. `rebuild_scope` recomputes the entries of a
/// set of items from container contents and runs after every commit and
/// replay; `rebuild` does the same for the whole arena.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    parents: HashMap<ItemId, ItemId>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct owner of the item, if any
    pub fn parent(&self, item: ItemId) -> Option<ItemId> {
        self.parents.get(&item).copied()
    }

    pub(crate) fn set_parent(&mut self, child: ItemId, owner: ItemId) {
        self.parents.insert(child, owner);
    }

    pub(crate) fn clear_parent(&mut self, child: ItemId) {
        self.parents.remove(&child);
    }

    /// Record parents for every item below `root`
    pub(crate) fn set_children(&mut self, items: &Arena, root: ItemId) {
        visit_subtree(items, root, &mut |item| {
            for child in item.children() {
                self.parents.insert(child, item.id());
            }
        });
    }

    /// Recompute the whole map from container contents
    pub(crate) fn rebuild(&mut self, items: &Arena) {
        self.parents.clear();
        for item in items.values() {
            for child in item.children() {
                self.parents.insert(child, item.id());
            }
        }
    }

    /// Recompute the entries of `scope` from container contents
    ///
    /// An item whose recorded owner lies outside `scope` keeps it while that
    /// owner still holds the item.
    pub(crate) fn rebuild_scope(&mut self, items: &Arena, scope: &[ItemId]) {
        let in_scope: HashSet<ItemId> = scope.iter().copied().collect();
        for id in scope {
            let Some(owner) = self.parent(*id) else {
                continue;
            };
            let held_outside = !in_scope.contains(&owner)
                && items
                    .get(&owner)
                    .is_some_and(|item| item.children().any(|c| c == *id));
            if !held_outside {
                self.parents.remove(id);
            }
        }
        for id in scope {
            if let Some(item) = items.get(id) {
                for child in item.children() {
                    self.parents.insert(child, *id);
                }
            }
        }
    }

    /// `[item, parent, grandparent, ..., root]`
    pub fn lineage(&self, item: ItemId) -> Vec<ItemId> {
        let mut lineage = vec![item];
        let mut current = item;
        while let Some(parent) = self.parent(current) {
            // a corrupt map must not hang the walk
            if lineage.len() > self.parents.len() {
                break;
            }
            lineage.push(parent);
            current = parent;
        }
        lineage
    }

    /// Length of the lineage; a parentless item has height 1
    pub fn height(&self, item: ItemId) -> usize {
        self.lineage(item).len()
    }

    /// True if `ancestor` strictly contains `item`
    pub fn is_ancestor(&self, ancestor: ItemId, item: ItemId) -> bool {
        self.lineage(item).iter().skip(1).any(|id| *id == ancestor)
    }

    /// Deepest item that is an ancestor-or-self of all `items`
    ///
    /// Returns `None` for an empty input or when the items live in
    /// disjoint trees.
    pub fn lowest_common_ancestor(&self, items: &[ItemId]) -> Option<ItemId> {
        let (first, rest) = items.split_first()?;
        rest.iter()
            .try_fold(*first, |acc, item| self.pair_lca(acc, *item))
    }

    fn pair_lca(&self, a: ItemId, b: ItemId) -> Option<ItemId> {
        let (mut a, mut b) = (a, b);
        let (mut height_a, mut height_b) = (self.height(a), self.height(b));
        while height_a > height_b {
            a = self.parent(a)?;
            height_a -= 1;
        }
        while height_b > height_a {
            b = self.parent(b)?;
            height_b -= 1;
        }
        while a != b {
            a = self.parent(a)?;
            b = self.parent(b)?;
        }
        Some(a)
    }

    /// Nearest strict ancestor of `item` that is in `set`
    pub fn ancestor_in_set(&self, item: ItemId, set: &SelectionSet<ItemId>) -> Option<ItemId> {
        self.lineage(item)
            .into_iter()
            .skip(1)
            .find(|id| set.has(id))
    }

    /// Drop every item that has a strict ancestor in `set`, keeping order
    pub fn reduce_to_roots<I>(&self, items: I, set: &SelectionSet<ItemId>) -> Vec<ItemId>
    where
        I: IntoIterator<Item = ItemId>,
    {
        items
            .into_iter()
            .filter(|item| self.ancestor_in_set(*item, set).is_none())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}
