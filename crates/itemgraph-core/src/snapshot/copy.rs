use std::collections::HashMap;
use std::time::Instant;

use itemgraph_core_types::ItemId;

use crate::context::Context;
use crate::errors::Result;
use crate::model::item::{subtree_ids, Slot};
use crate::{log_op_end, log_op_error, log_op_start};

/// Deep-copy the given subtrees into new detached items
///
/// Every clone gets a fresh id. References between copied items are
/// rewritten to point at the corresponding clones; references to items
/// outside the copied set keep pointing at the originals. No change events
/// are emitted: the copies are not part of the graph until inserted.
///
/// Returns the clone of each root, in input order. Roots listed twice are
/// copied once. A root inside another listed root is copied only as part
/// of that ancestor, and its entry is the clone inside the ancestor's copy.
///
/// # Errors
///
/// Returns `ItemNotFound` if a root is not in the context and
/// `IdsExhausted` if the context runs out of ids.
pub fn copy_items(ctx: &mut Context, roots: &[ItemId]) -> Result<Vec<ItemId>> {
    let mut map = HashMap::new();
    copy_items_with_map(ctx, roots, &mut map)
}

/// Like `copy_items`, also filling `map` with original id -> clone id
///
/// # Errors
///
/// Returns `ItemNotFound` if a root is not in the context.
pub fn copy_items_with_map(
    ctx: &mut Context,
    roots: &[ItemId],
    map: &mut HashMap<ItemId, ItemId>,
) -> Result<Vec<ItemId>> {
    let start = Instant::now();
    log_op_start!("copy_items", item_count = roots.len());

    for root in roots {
        if let Err(e) = ctx.get_item(*root) {
            log_op_error!(
                "copy_items",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            return Err(e);
        }
    }

    let mut cloned = Vec::new();
    let mut top = Vec::new();
    for root in roots {
        let nested = roots
            .iter()
            .any(|other| other != root && ctx.hierarchy.is_ancestor(*other, *root));
        if nested || top.contains(root) {
            continue;
        }
        if let Err(e) = clone_subtree(ctx, *root, map, &mut cloned) {
            log_op_error!(
                "copy_items",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            return Err(e);
        }
        top.push(*root);
    }

    // second pass: references inside the copied set follow the copies
    for clone in &cloned {
        if let Some(item) = ctx.items.get_mut(clone) {
            for slot in item.slots.iter_mut() {
                if let Slot::Reference(Some(target)) = slot {
                    if let Some(mapped) = map.get(target) {
                        *target = *mapped;
                    }
                }
            }
        }
    }

    for root in &top {
        if let Some(copy) = map.get(root).copied() {
            ctx.hierarchy.set_children(&ctx.items, copy);
        }
    }
    let result = roots
        .iter()
        .map(|root| map.get(root).copied().unwrap_or(*root))
        .collect();

    log_op_end!(
        "copy_items",
        duration_ms = start.elapsed().as_millis() as u64,
        item_count = cloned.len()
    );
    Ok(result)
}

fn clone_subtree(
    ctx: &mut Context,
    root: ItemId,
    map: &mut HashMap<ItemId, ItemId>,
    cloned: &mut Vec<ItemId>,
) -> Result<()> {
    let originals = subtree_ids(&ctx.items, root);
    let mut local = HashMap::with_capacity(originals.len());
    for original in &originals {
        if let Some(template) = ctx.items.get(original).map(|item| item.template) {
            let copy = ctx.alloc_item(template)?;
            local.insert(*original, copy);
        }
    }

    for original in &originals {
        let (Some(copy), Some(source)) = (local.get(original), ctx.items.get(original)) else {
            continue;
        };
        let slots: Vec<Slot> = source
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::ChildList(children) => Slot::ChildList(
                    children
                        .iter()
                        .map(|c| local.get(c).copied().unwrap_or(*c))
                        .collect(),
                ),
                Slot::ChildSlot(child) => {
                    Slot::ChildSlot(child.map(|c| local.get(&c).copied().unwrap_or(c)))
                }
                other => other.clone(),
            })
            .collect();
        if let Some(target) = ctx.items.get_mut(copy) {
            target.slots = slots;
        }
        cloned.push(*copy);
    }

    map.extend(local);
    Ok(())
}
