#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{add_node, children, new_context};
use itemgraph_core::{ItemGraphError, PropertyKind, PropertyValue, Value};

#[test]
fn test_scalar_set_clear_and_old_value() {
    let (mut ctx, node) = new_context();
    let item = ctx.construct("Node").unwrap();

    assert_eq!(node.x.set(&mut ctx, item, 1.5).unwrap(), None);
    assert_eq!(node.x.set(&mut ctx, item, true).unwrap(), Some(Value::Float(1.5)));
    assert_eq!(node.x.clear(&mut ctx, item).unwrap(), Some(Value::Bool(true)));
    assert_eq!(node.x.get(&ctx, item).unwrap(), None);
}

#[test]
fn test_id_property_reads_the_item_id() {
    let (mut ctx, node) = new_context();
    let item = ctx.construct("Node").unwrap();

    assert_eq!(node.id.get(&ctx, item).unwrap(), item);
    assert_eq!(node.id.property().kind(), PropertyKind::Id);
    assert_eq!(
        ctx.template_of(item).unwrap().id_property().map(|p| p.name()),
        Some("id")
    );
}

#[test]
fn test_child_list_view() {
    let (mut ctx, node) = new_context();
    let root = ctx.root();
    let a = add_node(&mut ctx, &node, root);
    let b = add_node(&mut ctx, &node, root);

    let list = node.array.get(&ctx, root).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list.get(1).unwrap(), b);
    assert_eq!(list.index_of(b), Some(1));
    assert!(list.contains(a));
    assert_eq!(list.iter_rev().collect::<Vec<_>>(), vec![b, a]);
    assert!(matches!(
        list.get(2),
        Err(ItemGraphError::IndexOutOfRange { index: 2, len: 2, .. })
    ));
}

#[test]
fn test_child_list_insert_bounds() {
    let (mut ctx, node) = new_context();
    let root = ctx.root();
    let child = ctx.construct("Node").unwrap();

    let err = node.array.insert(&mut ctx, root, child, 1).unwrap_err();

    assert!(matches!(err, ItemGraphError::IndexOutOfRange { index: 1, len: 0, .. }));
    assert_eq!(ctx.hierarchy().parent(child), None);
    assert!(matches!(
        node.array.remove_at(&mut ctx, root, 0),
        Err(ItemGraphError::IndexOutOfRange { .. })
    ));
    assert_eq!(node.array.remove(&mut ctx, root, child).unwrap(), None);
}

#[test]
fn test_child_slot_replace_is_remove_then_insert() {
    // GIVEN a slot holding `first`
    let (mut ctx, node) = new_context();
    let root = ctx.root();
    let first = ctx.construct("Node").unwrap();
    let second = ctx.construct("Node").unwrap();
    node.child.set(&mut ctx, root, Some(first)).unwrap();

    // WHEN it is replaced inside a transaction
    ctx.begin_transaction("replace").unwrap();
    let old = node.child.set(&mut ctx, root, Some(second)).unwrap();
    ctx.end_transaction().unwrap();

    // THEN the old child is detached and two ops were recorded
    assert_eq!(old, Some(first));
    assert_eq!(node.child.get(&ctx, root).unwrap(), Some(second));
    assert_eq!(ctx.hierarchy().parent(first), None);
    assert!(ctx.is_tracked(second) && !ctx.is_tracked(first));
    assert_eq!(ctx.get_undo().unwrap().len(), 2);

    // AND undo swaps them back
    ctx.undo().unwrap();
    assert_eq!(node.child.get(&ctx, root).unwrap(), Some(first));
    assert_eq!(ctx.hierarchy().parent(second), None);
}

#[test]
fn test_occupied_child_slot_rejects_direct_insert() {
    let (mut ctx, node) = new_context();
    let root = ctx.root();
    let first = ctx.construct("Node").unwrap();
    let second = ctx.construct("Node").unwrap();
    node.child.set(&mut ctx, root, Some(first)).unwrap();

    let err = ctx
        .insert_element(root, node.child.property(), 0, second)
        .unwrap_err();

    assert!(matches!(err, ItemGraphError::IllegalReparent { .. }));
    assert_eq!(ctx.hierarchy().parent(second), None);
}

#[test]
fn test_property_value_by_kind() {
    let (mut ctx, node) = new_context();
    let root = ctx.root();
    let child = ctx.construct("Node").unwrap();
    node.child.set(&mut ctx, root, Some(child)).unwrap();
    node.x.set(&mut ctx, root, "v").unwrap();

    assert_eq!(
        ctx.property_value(root, &node.x.property()).unwrap(),
        PropertyValue::Scalar(Some(Value::from("v")))
    );
    assert_eq!(
        ctx.property_value(root, &node.child.property()).unwrap(),
        PropertyValue::Child(Some(child))
    );
    assert!(ctx.property_value(root, &node.array.property()).is_err());
}

#[test]
fn test_owner_of_reports_container_position() {
    let (mut ctx, node) = new_context();
    let root = ctx.root();
    let a = add_node(&mut ctx, &node, root);
    let b = add_node(&mut ctx, &node, root);

    assert_eq!(ctx.owner_of(b), Some((root, node.array.property(), 1)));
    assert_eq!(ctx.owner_of(root), None);
    assert_eq!(children(&ctx, &node, root), vec![a, b]);
}

#[test]
fn test_unknown_type_and_item() {
    let (mut ctx, node) = new_context();
    let missing = itemgraph_core::ItemId::new(999).unwrap();

    assert!(matches!(
        ctx.construct("Nope"),
        Err(ItemGraphError::UnknownType { .. })
    ));
    assert_eq!(
        node.x.get(&ctx, missing).unwrap_err(),
        ItemGraphError::ItemNotFound { item_id: missing }
    );
}
