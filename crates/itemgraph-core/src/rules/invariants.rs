//! Structural checks over a set of item ids
//!
//! Each check looks only at the containers of the ids it is given. Pass
//! `all_ids` for the whole arena.

use std::collections::{BTreeMap, HashSet};

use itemgraph_core_types::ItemId;

use crate::context::Context;

/// Every id in the arena, in id order
pub fn all_ids(ctx: &Context) -> Vec<ItemId> {
    let mut ids: Vec<ItemId> = ctx.items.keys().copied().collect();
    ids.sort();
    ids
}

/// Owners of every item contained by one of `ids`
///
/// Owner lists follow the order of `ids` so reports are deterministic.
pub fn container_owners(ctx: &Context, ids: &[ItemId]) -> BTreeMap<ItemId, Vec<ItemId>> {
    let mut owners: BTreeMap<ItemId, Vec<ItemId>> = BTreeMap::new();
    for id in ids {
        if let Some(item) = ctx.items.get(id) {
            for child in item.children() {
                owners.entry(child).or_default().push(*id);
            }
        }
    }
    owners
}

/// Containers that name an item missing from the arena
///
/// Returns list of (owner_id, child_id) tuples
pub fn find_missing_children(ctx: &Context, ids: &[ItemId]) -> Vec<(ItemId, ItemId)> {
    container_owners(ctx, ids)
        .into_iter()
        .filter(|(child, _)| !ctx.contains(*child))
        .flat_map(|(child, owners)| owners.into_iter().map(move |owner| (owner, child)))
        .collect()
}

/// Items held by more than one container slot
///
/// An item listed twice by the same owner counts as two owners.
pub fn find_multiple_owners(ctx: &Context, ids: &[ItemId]) -> Vec<(ItemId, Vec<ItemId>)> {
    container_owners(ctx, ids)
        .into_iter()
        .filter(|(_, owners)| owners.len() > 1)
        .collect()
}

/// Owner of the root item, if something contains it
pub fn find_root_owner(ctx: &Context, ids: &[ItemId]) -> Option<ItemId> {
    container_owners(ctx, ids)
        .get(&ctx.root())
        .and_then(|owners| owners.first().copied())
}

/// Check if an item is part of an ownership cycle
pub fn has_cycle(ctx: &Context, item: ItemId) -> bool {
    on_cycle(&container_owners(ctx, &all_ids(ctx)), item)
}

fn first_owner(owners: &BTreeMap<ItemId, Vec<ItemId>>, id: ItemId) -> Option<ItemId> {
    owners.get(&id).and_then(|o| o.first().copied())
}

fn on_cycle(owners: &BTreeMap<ItemId, Vec<ItemId>>, item: ItemId) -> bool {
    let mut visited = HashSet::new();
    let mut current = first_owner(owners, item);
    while let Some(id) = current {
        if id == item {
            return true;
        }
        if !visited.insert(id) {
            // loops above the item, not through it
            return false;
        }
        current = first_owner(owners, id);
    }
    false
}

/// Items of `ids` whose owner chain loops back on itself
pub fn find_cycles(ctx: &Context, ids: &[ItemId]) -> Vec<ItemId> {
    let owners = container_owners(ctx, ids);
    ids.iter()
        .copied()
        .filter(|id| on_cycle(&owners, *id))
        .collect()
}

/// Items of `ids` whose recorded parent differs from the container holding them
///
/// A recorded parent outside `ids` counts as the actual owner while it
/// still holds the item.
///
/// Returns list of (child_id, recorded, actual) tuples
pub fn find_parent_mismatches(
    ctx: &Context,
    ids: &[ItemId],
) -> Vec<(ItemId, Option<ItemId>, Option<ItemId>)> {
    let owners = container_owners(ctx, ids);
    ids.iter()
        .filter_map(|id| {
            let recorded = ctx.hierarchy().parent(*id);
            let actual = first_owner(&owners, *id).or_else(|| {
                recorded.filter(|owner| {
                    ctx.items
                        .get(owner)
                        .is_some_and(|item| item.children().any(|c| c == *id))
                })
            });
            (recorded != actual).then_some((*id, recorded, actual))
        })
        .collect()
}
