#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{children, new_context};

/// Scenario: appending two children, then undo and redo
///
/// Tests that:
/// - Undo empties the list
/// - Redo restores both children in their original order
/// - Parent tracking follows every step
#[test]
fn test_append_undo_redo_preserves_order() {
    // GIVEN a parent P with an empty list
    let (mut ctx, node) = new_context();
    let parent = ctx.root();
    let c1 = ctx.construct("Node").unwrap();
    let c2 = ctx.construct("Node").unwrap();

    // WHEN c1 and c2 are appended in transaction "t"
    ctx.begin_transaction("t").unwrap();
    node.array.append(&mut ctx, parent, c1).unwrap();
    node.array.append(&mut ctx, parent, c2).unwrap();
    ctx.end_transaction().unwrap();

    // THEN both are children and tracked
    assert_eq!(children(&ctx, &node, parent), vec![c1, c2]);
    assert_eq!(ctx.get_undo().unwrap().len(), 2);
    assert!(ctx.is_tracked(c1) && ctx.is_tracked(c2));

    // WHEN undone
    ctx.undo().unwrap();

    // THEN the list is empty and the children are detached
    assert_eq!(node.array.len(&ctx, parent).unwrap(), 0);
    assert_eq!(ctx.hierarchy().parent(c1), None);
    assert!(!ctx.is_tracked(c2));

    // WHEN redone
    ctx.redo().unwrap();

    // THEN the order is restored
    assert_eq!(children(&ctx, &node, parent), vec![c1, c2]);
    assert_eq!(ctx.hierarchy().parent(c2), Some(parent));
    assert!(ctx.is_tracked(c1));
}

#[test]
fn test_insert_and_remove_at_positions() {
    // GIVEN a list [a, c]
    let (mut ctx, node) = new_context();
    let root = ctx.root();
    let a = ctx.construct("Node").unwrap();
    let b = ctx.construct("Node").unwrap();
    let c = ctx.construct("Node").unwrap();
    node.array.append(&mut ctx, root, a).unwrap();
    node.array.append(&mut ctx, root, c).unwrap();

    // WHEN b is inserted in the middle and a is removed, in one transaction
    ctx.begin_transaction("reorder").unwrap();
    node.array.insert(&mut ctx, root, b, 1).unwrap();
    assert_eq!(node.array.remove(&mut ctx, root, a).unwrap(), Some(0));
    ctx.end_transaction().unwrap();

    // THEN the list is [b, c]
    assert_eq!(children(&ctx, &node, root), vec![b, c]);

    // AND undo restores [a, c]
    ctx.undo().unwrap();
    assert_eq!(children(&ctx, &node, root), vec![a, c]);
    assert_eq!(ctx.hierarchy().parent(b), None);
}
