#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Property-based invariant tests for transactions, history and snapshots.
//!
//! 1. Repeated scalar writes in one transaction coalesce to one operation.
//! 2. Undo restores the pre-transaction state; redo restores the post state.
//! 3. The lowest common ancestor is the deepest shared ancestor-or-self.
//! 4. Serialize then deserialize yields an isomorphic subtree.

mod common;

use common::{new_context, Node};
use itemgraph_core::snapshot::{deserialize, isomorphic, serialize};
use itemgraph_core::{Context, ItemId, PropertyValue, TransactionOutcome, Value};
use proptest::prelude::*;

const POOL: usize = 8;

// ── Helpers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Edit {
    SetX(usize, i64),
    ClearX(usize),
    Insert { child: usize, owner: usize, at: usize },
    RemoveFirst(usize),
    Move { child: usize, owner: usize },
    SetRef(usize, Option<usize>),
    SetChild(usize, Option<usize>),
}

fn index() -> impl Strategy<Value = usize> {
    0..=POOL
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (index(), -5i64..5).prop_map(|(i, v)| Edit::SetX(i, v)),
        index().prop_map(Edit::ClearX),
        (index(), index(), 0usize..3)
            .prop_map(|(child, owner, at)| Edit::Insert { child, owner, at }),
        index().prop_map(Edit::RemoveFirst),
        (index(), index()).prop_map(|(child, owner)| Edit::Move { child, owner }),
        (index(), proptest::option::of(index())).prop_map(|(i, t)| Edit::SetRef(i, t)),
        (index(), proptest::option::of(index())).prop_map(|(i, c)| Edit::SetChild(i, c)),
    ]
}

/// Root at index 0, then a pool of nodes; the first half starts under the root
fn build(node: &Node, ctx: &mut Context) -> Vec<ItemId> {
    let root = ctx.root();
    let mut items = vec![root];
    for i in 0..POOL {
        let item = ctx.construct("Node").unwrap();
        if i < POOL / 2 {
            node.array.append(ctx, root, item).unwrap();
        }
        items.push(item);
    }
    items
}

/// Apply an edit; rejected edits leave the graph untouched
fn apply(ctx: &mut Context, node: &Node, items: &[ItemId], edit: &Edit) {
    let _ = match *edit {
        Edit::SetX(i, v) => node.x.set(ctx, items[i], v).map(|_| ()),
        Edit::ClearX(i) => node.x.clear(ctx, items[i]).map(|_| ()),
        Edit::Insert { child, owner, at } => {
            node.array.insert(ctx, items[owner], items[child], at)
        }
        Edit::RemoveFirst(owner) => node.array.remove_at(ctx, items[owner], 0).map(|_| ()),
        Edit::Move { child, owner } => ctx.move_item(items[child], items[owner], &node.array, None),
        Edit::SetRef(i, target) => node
            .reference
            .set(ctx, items[i], target.map(|t| items[t]))
            .map(|_| ()),
        Edit::SetChild(i, child) => node
            .child
            .set(ctx, items[i], child.map(|c| items[c]))
            .map(|_| ()),
    };
}

type ItemState = (Option<Value>, Vec<ItemId>, Option<ItemId>, Option<ItemId>, Option<ItemId>);

fn state(ctx: &Context, node: &Node, items: &[ItemId]) -> Vec<ItemState> {
    items
        .iter()
        .map(|item| {
            (
                node.x.get(ctx, *item).unwrap().cloned(),
                node.array.get(ctx, *item).unwrap().to_vec(),
                node.child.get(ctx, *item).unwrap(),
                node.reference.get(ctx, *item).unwrap(),
                ctx.hierarchy().parent(*item),
            )
        })
        .collect()
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Coalescing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn repeated_writes_coalesce(initial in proptest::option::of(-3i64..3), writes in prop::collection::vec(-3i64..3, 1..12)) {
        let (mut ctx, node) = new_context();
        let root = ctx.root();
        node.x.set_value(&mut ctx, root, initial.map(Value::Int)).unwrap();
        let before = PropertyValue::Scalar(initial.map(Value::Int));

        ctx.begin_transaction("writes").unwrap();
        for value in &writes {
            node.x.set(&mut ctx, root, *value).unwrap();
            prop_assert_eq!(ctx.get_old_value(root, &node.x.property()).unwrap(), before.clone());
        }
        let recorded = ctx.current_transaction().unwrap().len();
        ctx.end_transaction().unwrap();

        let changed = writes.iter().any(|v| Some(*v) != initial);
        prop_assert_eq!(recorded, usize::from(changed));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Undo and redo are inverses
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn undo_redo_round_trip(edits in prop::collection::vec(edit_strategy(), 1..24)) {
        let (mut ctx, node) = new_context();
        let items = build(&node, &mut ctx);
        let pre = state(&ctx, &node, &items);

        ctx.begin_transaction("edits").unwrap();
        for edit in &edits {
            apply(&mut ctx, &node, &items, edit);
        }
        prop_assert_eq!(ctx.end_transaction().unwrap(), TransactionOutcome::Committed);
        let post = state(&ctx, &node, &items);

        prop_assert!(ctx.undo().unwrap());
        prop_assert_eq!(&state(&ctx, &node, &items), &pre, "undo did not restore {:?}", edits);

        prop_assert!(ctx.redo().unwrap());
        prop_assert_eq!(&state(&ctx, &node, &items), &post, "redo did not restore {:?}", edits);
    }
}

proptest! {
    #[test]
    fn cancel_restores_pre_state(edits in prop::collection::vec(edit_strategy(), 1..24)) {
        let (mut ctx, node) = new_context();
        let items = build(&node, &mut ctx);
        let pre = state(&ctx, &node, &items);

        ctx.begin_transaction("scratch").unwrap();
        for edit in &edits {
            apply(&mut ctx, &node, &items, edit);
        }
        ctx.cancel_transaction().unwrap();

        prop_assert_eq!(&state(&ctx, &node, &items), &pre);
        prop_assert!(!ctx.can_undo());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Lowest common ancestor
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn lca_is_deepest_shared_ancestor(
        parents in prop::collection::vec(any::<prop::sample::Index>(), 1..20),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        // item k+1 is appended under one of the items 0..=k
        let (mut ctx, node) = new_context();
        let mut items = vec![ctx.root()];
        for parent in &parents {
            let owner = items[parent.index(items.len())];
            let item = ctx.construct("Node").unwrap();
            node.array.append(&mut ctx, owner, item).unwrap();
            items.push(item);
        }
        let (a, b) = (items[a.index(items.len())], items[b.index(items.len())]);

        let hierarchy = ctx.hierarchy();
        let lca = hierarchy.lowest_common_ancestor(&[a, b]).unwrap();
        let lineage_a = hierarchy.lineage(a);
        let lineage_b = hierarchy.lineage(b);
        prop_assert!(lineage_a.contains(&lca));
        prop_assert!(lineage_b.contains(&lca));

        // the step below the lca on a's side is not shared with b
        let depth = lineage_a.iter().position(|id| *id == lca).unwrap();
        if depth > 0 {
            prop_assert!(!lineage_b.contains(&lineage_a[depth - 1]));
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Serialization round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn serialize_round_trip_is_isomorphic(edits in prop::collection::vec(edit_strategy(), 0..32)) {
        let (mut source, node) = new_context();
        let items = build(&node, &mut source);
        for edit in &edits {
            apply(&mut source, &node, &items, edit);
        }
        // only references inside the graph survive a trip to a fresh context
        for item in &items {
            if let Some(target) = node.reference.get_id(&source, *item).unwrap() {
                if !source.is_tracked(target) {
                    node.reference.set(&mut source, *item, None).unwrap();
                }
            }
        }
        let root = source.root();

        let blob = serialize(&source, root).unwrap();
        let (mut target, _) = new_context();
        let restored = deserialize(&mut target, &blob).unwrap();
        prop_assert!(isomorphic(&source, Some(root), &target, Some(restored)));

        let again = deserialize(&mut source, &blob).unwrap();
        prop_assert!(isomorphic(&source, Some(root), &source, Some(again)));
    }
}
