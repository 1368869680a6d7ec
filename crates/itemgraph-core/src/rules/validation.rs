use itemgraph_core_types::ItemId;

use crate::context::Context;
use crate::errors::{ItemGraphError, Result};

use super::invariants;

/// Validate the ownership structure of the whole arena
///
/// # Errors
///
/// Returns the first violation found, as `validate_items` does.
pub fn validate_structure(ctx: &Context) -> Result<()> {
    validate_items(ctx, &invariants::all_ids(ctx))
}

/// Validate the containers of `ids`
///
/// Checks, in order:
///
/// 1. Every container entry names an existing item
/// 2. No item is contained twice
/// 3. The root has no owner
/// 4. Owner chains are acyclic
/// 5. The parent map agrees with container contents
///
/// # Errors
///
/// Returns the first violation found. For exhaustive reporting, call the
/// individual invariant functions directly.
pub fn validate_items(ctx: &Context, ids: &[ItemId]) -> Result<()> {
    if let Some((owner_id, child_id)) = invariants::find_missing_children(ctx, ids).first() {
        return Err(ItemGraphError::MissingChild {
            owner_id: *owner_id,
            child_id: *child_id,
        });
    }

    if let Some((child_id, owner_ids)) = invariants::find_multiple_owners(ctx, ids)
        .into_iter()
        .next()
    {
        return Err(ItemGraphError::MultipleOwners {
            child_id,
            owner_ids,
        });
    }

    if let Some(owner) = invariants::find_root_owner(ctx, ids) {
        return Err(ItemGraphError::IllegalReparent {
            reason: format!("root item {} is owned by {}", ctx.root(), owner),
        });
    }

    if let Some(item_id) = invariants::find_cycles(ctx, ids).first() {
        return Err(ItemGraphError::CycleDetected { item_id: *item_id });
    }

    if let Some((child_id, recorded, actual)) = invariants::find_parent_mismatches(ctx, ids).first()
    {
        return Err(ItemGraphError::ParentMismatch {
            child_id: *child_id,
            recorded: *recorded,
            actual: *actual,
        });
    }

    Ok(())
}
