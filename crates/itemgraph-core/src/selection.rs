//! Ordered selection set
//!
//! Membership is insertion-ordered. The most recently added item still
//! present is the "last selected" one; iteration runs from it backwards.

use std::hash::Hash;

use indexmap::IndexSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet<T: Hash + Eq> {
    items: IndexSet<T>,
}

impl<T: Hash + Eq> Default for SelectionSet<T> {
    fn default() -> Self {
        Self {
            items: IndexSet::new(),
        }
    }
}

impl<T: Hash + Eq + Clone> SelectionSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    /// Add an item, making it the last selected
    pub fn add(&mut self, item: T) {
        // re-adding moves the item to the end
        self.items.shift_remove(&item);
        self.items.insert(item);
    }

    /// Returns true if the item was present
    pub fn delete(&mut self, item: &T) -> bool {
        self.items.shift_remove(item)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Add the item if absent, remove it if present
    pub fn toggle(&mut self, item: T) {
        if !self.items.shift_remove(&item) {
            self.items.insert(item);
        }
    }

    /// Replace the whole contents, adding in the given order
    pub fn set<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.items.clear();
        for item in items {
            self.add(item);
        }
    }

    /// Editor-style selection
    ///
    /// Without `extend`, the selection becomes exactly `item`. With
    /// `extend`, the item is toggled. Selecting an already selected item
    /// without `extend` only makes it the last selected.
    pub fn select(&mut self, item: T, extend: bool) {
        if extend {
            self.toggle(item);
        } else if self.has(&item) {
            self.add(item);
        } else {
            self.set(std::iter::once(item));
        }
    }

    pub fn last_selected(&self) -> Option<&T> {
        self.items.last()
    }

    /// Most recently selected first
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter().rev()
    }

    /// Oldest selection first
    pub fn iter_rev(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter()
    }

    /// Snapshot that reproduces the same order when passed to `set`
    pub fn contents(&self) -> Vec<T> {
        self.iter_rev().cloned().collect()
    }
}

impl<T: Hash + Eq + Clone> FromIterator<T> for SelectionSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.set(iter);
        set
    }
}
