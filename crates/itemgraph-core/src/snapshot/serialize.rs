//! Plain-tree persistence of item subtrees
//!
//! ```json
//! {
//!   "type": "Node",
//!   "id": 7,
//!   "x": 1,
//!   "reference": 9,
//!   "array": [ { "type": "Node", "id": 8 } ],
//!   "child": { "type": "Node", "id": 9 }
//! }
//! ```
//!
//! Unset scalars, references and child slots are omitted. Ids in the blob
//! are only used to re-link references on the way back in.

use std::collections::HashMap;
use std::time::Instant;

use itemgraph_core_types::ItemId;
use serde_json::{Map, Value as Json};

use crate::context::Context;
use crate::errors::{ItemGraphError, Result};
use crate::model::item::Slot;
use crate::model::{PropertyKind, Value};
use crate::{log_op_end, log_op_error, log_op_start};

/// Key holding the template type name
pub const TYPE_KEY: &str = "type";

/// Serialize `item` and everything it owns
///
/// # Errors
///
/// Returns `ItemNotFound` if the item or one of its children is missing,
/// and `Serialization` for a NaN or infinite float, which JSON cannot hold.
pub fn serialize(ctx: &Context, item: ItemId) -> Result<Json> {
    let start = Instant::now();
    log_op_start!("serialize", item_id = item.get());
    match serialize_item(ctx, item) {
        Ok(json) => {
            log_op_end!("serialize", duration_ms = start.elapsed().as_millis() as u64);
            Ok(json)
        }
        Err(e) => {
            log_op_error!(
                "serialize",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            Err(e)
        }
    }
}

fn serialize_item(ctx: &Context, id: ItemId) -> Result<Json> {
    let item = ctx.get_item(id)?;
    let template = ctx.registry.get(item.template);
    let mut object = Map::new();
    object.insert(TYPE_KEY.to_string(), Json::from(template.type_name()));

    for (property, slot) in template.properties().iter().zip(item.slots.iter()) {
        let name = property.name().to_string();
        match slot {
            Slot::Id => {
                object.insert(name, Json::from(id.get()));
            }
            Slot::Scalar(Some(Value::Float(f))) if !f.is_finite() => {
                return Err(ItemGraphError::Serialization {
                    message: format!(
                        "{}.{} on item {id} is not finite ({f})",
                        template.type_name(),
                        property.name()
                    ),
                });
            }
            Slot::Scalar(Some(value)) => {
                object.insert(name, serde_json::to_value(value)?);
            }
            Slot::Reference(Some(target)) => {
                object.insert(name, Json::from(target.get()));
            }
            Slot::ChildList(children) => {
                let array = children
                    .iter()
                    .map(|child| serialize_item(ctx, *child))
                    .collect::<Result<Vec<_>>>()?;
                object.insert(name, Json::Array(array));
            }
            Slot::ChildSlot(Some(child)) => {
                object.insert(name, serialize_item(ctx, *child)?);
            }
            Slot::Scalar(None) | Slot::Reference(None) | Slot::ChildSlot(None) => {}
        }
    }
    Ok(Json::Object(object))
}

/// Serialize to a JSON string
///
/// # Errors
///
/// Same conditions as `serialize`.
pub fn to_json_string(ctx: &Context, item: ItemId) -> Result<String> {
    Ok(serde_json::to_string(&serialize(ctx, item)?)?)
}

/// Rebuild a serialized subtree as new detached items
///
/// Every item gets a fresh id. References to items inside the blob are
/// re-linked to the new items; references to other ids are kept only if
/// that id exists in `ctx`, and are unset otherwise.
///
/// # Errors
///
/// Returns `Deserialize` for unknown types, malformed fields or an id
/// that appears twice in the blob. Items built before the failure stay in
/// the arena, detached.
pub fn deserialize(ctx: &mut Context, blob: &Json) -> Result<ItemId> {
    let start = Instant::now();
    log_op_start!("deserialize");
    let mut state = Rehome::default();
    let result = state.build(ctx, blob).map(|root| {
        state.link_references(ctx);
        ctx.hierarchy.set_children(&ctx.items, root);
        root
    });
    match &result {
        Ok(_) => {
            log_op_end!(
                "deserialize",
                duration_ms = start.elapsed().as_millis() as u64,
                item_count = state.built
            );
        }
        Err(e) => {
            log_op_error!(
                "deserialize",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
        }
    }
    result
}

/// Parse and deserialize a JSON string
///
/// # Errors
///
/// Returns `Serialization` for invalid JSON, otherwise as `deserialize`.
pub fn from_json_str(ctx: &mut Context, input: &str) -> Result<ItemId> {
    let blob: Json = serde_json::from_str(input)?;
    deserialize(ctx, &blob)
}

fn malformed(reason: impl Into<String>) -> ItemGraphError {
    ItemGraphError::Deserialize {
        reason: reason.into(),
    }
}

#[derive(Default)]
struct Rehome {
    /// blob id -> new id
    ids: HashMap<ItemId, ItemId>,
    /// (new item, slot, blob target id)
    pending: Vec<(ItemId, usize, ItemId)>,
    built: usize,
}

impl Rehome {
    fn build(&mut self, ctx: &mut Context, blob: &Json) -> Result<ItemId> {
        let object = blob
            .as_object()
            .ok_or_else(|| malformed("expected an object"))?;
        let type_name = object
            .get(TYPE_KEY)
            .and_then(Json::as_str)
            .ok_or_else(|| malformed("missing type"))?;
        let template_id = ctx
            .registry
            .lookup(type_name)
            .map_err(|_| malformed(format!("unknown type {type_name}")))?;
        let properties = ctx.registry.get(template_id).properties().to_vec();
        let id = ctx.alloc_item(template_id)?;
        self.built += 1;

        let mut slots = Vec::with_capacity(properties.len());
        for property in &properties {
            let field = object.get(property.name()).filter(|v| !v.is_null());
            let slot = match (property.kind(), field) {
                (PropertyKind::Id, Some(raw)) => {
                    let old = parse_id(raw, property.name())?;
                    if self.ids.insert(old, id).is_some() {
                        return Err(malformed(format!("duplicate id {old}")));
                    }
                    Slot::Id
                }
                (PropertyKind::Id, None) => Slot::Id,
                (PropertyKind::Scalar, Some(raw)) => {
                    let value: Value = serde_json::from_value(raw.clone()).map_err(|_| {
                        malformed(format!("{} is not a scalar", property.name()))
                    })?;
                    Slot::Scalar(Some(value))
                }
                (PropertyKind::Scalar, None) => Slot::Scalar(None),
                (PropertyKind::Reference, Some(raw)) => {
                    let target = parse_id(raw, property.name())?;
                    self.pending.push((id, property.slot(), target));
                    Slot::Reference(None)
                }
                (PropertyKind::Reference, None) => Slot::Reference(None),
                (PropertyKind::ChildList, Some(raw)) => {
                    let array = raw
                        .as_array()
                        .ok_or_else(|| malformed(format!("{} is not an array", property.name())))?;
                    let children = array
                        .iter()
                        .map(|child| self.build(ctx, child))
                        .collect::<Result<Vec<_>>>()?;
                    Slot::ChildList(children)
                }
                (PropertyKind::ChildList, None) => Slot::ChildList(Vec::new()),
                (PropertyKind::ChildSlot, Some(raw)) => Slot::ChildSlot(Some(self.build(ctx, raw)?)),
                (PropertyKind::ChildSlot, None) => Slot::ChildSlot(None),
            };
            slots.push(slot);
        }

        if let Some(item) = ctx.items.get_mut(&id) {
            item.slots = slots;
        }
        Ok(id)
    }

    fn link_references(&self, ctx: &mut Context) {
        for (item, slot, target) in &self.pending {
            let linked = self
                .ids
                .get(target)
                .copied()
                .or_else(|| ctx.contains(*target).then_some(*target));
            if let Some(Slot::Reference(value)) = ctx
                .items
                .get_mut(item)
                .and_then(|item| item.slots.get_mut(*slot))
            {
                *value = linked;
            }
        }
    }
}

fn parse_id(raw: &Json, name: &str) -> Result<ItemId> {
    raw.as_u64()
        .and_then(ItemId::new)
        .ok_or_else(|| malformed(format!("{name} is not a valid id")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Template, TemplateRegistry};
    use crate::props::{ChildListProp, ReferenceProp, ScalarProp};
    use serde_json::json;

    fn setup() -> (Context, ScalarProp, ChildListProp, ReferenceProp) {
        let mut builder = Template::builder("Node");
        let _ = builder.id("id");
        let x = builder.scalar("x");
        let array = builder.child_list("array");
        let reference = builder.reference("reference");
        let mut registry = TemplateRegistry::new();
        registry.register(builder.build()).unwrap();
        (Context::new(registry, "Node").unwrap(), x, array, reference)
    }

    #[test]
    fn test_serialize_shape() {
        let (mut ctx, x, array, reference) = setup();
        let parent = ctx.construct("Node").unwrap();
        let child = ctx.construct("Node").unwrap();
        x.set(&mut ctx, parent, "p").unwrap();
        array.append(&mut ctx, parent, child).unwrap();
        reference.set(&mut ctx, parent, Some(child)).unwrap();

        let json = serialize(&ctx, parent).unwrap();
        assert_eq!(
            json,
            json!({
                "type": "Node",
                "id": parent.get(),
                "x": "p",
                "reference": child.get(),
                "array": [ { "type": "Node", "id": child.get(), "array": [] } ]
            })
        );
    }

    #[test]
    fn test_non_finite_float_is_rejected() {
        let (mut ctx, x, array, _) = setup();
        let parent = ctx.construct("Node").unwrap();
        let child = ctx.construct("Node").unwrap();
        array.append(&mut ctx, parent, child).unwrap();

        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            x.set(&mut ctx, child, value).unwrap();
            assert!(matches!(
                serialize(&ctx, parent),
                Err(ItemGraphError::Serialization { .. })
            ));
        }
        x.set(&mut ctx, child, 1.5).unwrap();
        assert!(serialize(&ctx, parent).is_ok());
    }

    #[test]
    fn test_deserialize_rehomes_ids() {
        let (mut ctx, _, array, reference) = setup();
        let blob = json!({
            "type": "Node",
            "id": 1,
            "reference": 2,
            "array": [ { "type": "Node", "id": 2 } ]
        });
        let root = deserialize(&mut ctx, &blob).unwrap();
        assert_ne!(root, ctx.root());
        let child = array.get(&ctx, root).unwrap().get(0).unwrap();
        assert_eq!(reference.get_id(&ctx, root).unwrap(), Some(child));
        assert_eq!(ctx.hierarchy().parent(child), Some(root));
    }

    #[test]
    fn test_external_reference_checked_against_context() {
        let (mut ctx, _, _, reference) = setup();
        let existing = ctx.root();
        let kept = deserialize(&mut ctx, &json!({"type": "Node", "reference": existing.get()})).unwrap();
        assert_eq!(reference.get_id(&ctx, kept).unwrap(), Some(existing));

        let dropped = deserialize(&mut ctx, &json!({"type": "Node", "reference": 999})).unwrap();
        assert_eq!(reference.get_id(&ctx, dropped).unwrap(), None);
    }

    #[test]
    fn test_deserialize_errors() {
        let (mut ctx, _, _, _) = setup();
        for blob in [
            json!([]),
            json!({"id": 1}),
            json!({"type": "Missing"}),
            json!({"type": "Node", "x": [1]}),
            json!({"type": "Node", "array": 3}),
            json!({"type": "Node", "id": 1, "array": [ {"type": "Node", "id": 1} ]}),
        ] {
            assert!(
                matches!(
                    deserialize(&mut ctx, &blob),
                    Err(ItemGraphError::Deserialize { .. })
                ),
                "{blob}"
            );
        }
        assert!(matches!(
            from_json_str(&mut ctx, "{not json"),
            Err(ItemGraphError::Serialization { .. })
        ));
    }
}
