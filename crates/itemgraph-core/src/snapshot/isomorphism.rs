use std::collections::HashSet;

use itemgraph_core_types::ItemId;

use crate::context::Context;
use crate::model::item::Slot;

/// Structural equality of two subtrees, ignoring ids
///
/// Items match when they have the same type, equal scalar values,
/// matching children in order, and references whose targets match in
/// turn. Targets missing from their arena match only by equal id. Pairs
/// already under comparison are assumed to match, so reference cycles
/// terminate.
pub fn isomorphic(a_ctx: &Context, a: Option<ItemId>, b_ctx: &Context, b: Option<ItemId>) -> bool {
    Matcher {
        a_ctx,
        b_ctx,
        visited: HashSet::new(),
    }
    .same(a, b)
}

struct Matcher<'a> {
    a_ctx: &'a Context,
    b_ctx: &'a Context,
    visited: HashSet<(ItemId, ItemId)>,
}

impl Matcher<'_> {
    fn same(&mut self, a: Option<ItemId>, b: Option<ItemId>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.same_item(a, b),
            _ => false,
        }
    }

    fn same_item(&mut self, a: ItemId, b: ItemId) -> bool {
        if !self.visited.insert((a, b)) {
            return true;
        }
        let (a_ctx, b_ctx) = (self.a_ctx, self.b_ctx);
        let (Some(item_a), Some(item_b)) = (a_ctx.item(a), b_ctx.item(b)) else {
            return a_ctx.item(a).is_none() && b_ctx.item(b).is_none() && a == b;
        };
        let type_a = a_ctx.registry().get(item_a.template()).type_name();
        let type_b = b_ctx.registry().get(item_b.template()).type_name();
        if type_a != type_b || item_a.slots.len() != item_b.slots.len() {
            return false;
        }

        item_a
            .slots
            .iter()
            .zip(item_b.slots.iter())
            .all(|pair| match pair {
                (Slot::Id, Slot::Id) => true,
                (Slot::Scalar(x), Slot::Scalar(y)) => x == y,
                (Slot::Reference(x), Slot::Reference(y)) => self.same(*x, *y),
                (Slot::ChildSlot(x), Slot::ChildSlot(y)) => self.same(*x, *y),
                (Slot::ChildList(xs), Slot::ChildList(ys)) => {
                    xs.len() == ys.len()
                        && xs
                            .iter()
                            .zip(ys.iter())
                            .all(|(x, y)| self.same_item(*x, *y))
                }
                _ => false,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Template, TemplateRegistry};
    use crate::props::{ChildListProp, ReferenceProp, ScalarProp};

    fn setup() -> (Context, ScalarProp, ChildListProp, ReferenceProp) {
        let mut builder = Template::builder("Node");
        let x = builder.scalar("x");
        let array = builder.child_list("array");
        let reference = builder.reference("reference");
        let mut registry = TemplateRegistry::new();
        registry.register(builder.build()).unwrap();
        (Context::new(registry, "Node").unwrap(), x, array, reference)
    }

    #[test]
    fn test_identity_and_absence() {
        let (ctx, _, _, _) = setup();
        let root = ctx.root();
        assert!(isomorphic(&ctx, Some(root), &ctx, Some(root)));
        assert!(isomorphic(&ctx, None, &ctx, None));
        assert!(!isomorphic(&ctx, Some(root), &ctx, None));
    }

    #[test]
    fn test_scalar_difference() {
        let (mut ctx, x, _, _) = setup();
        let a = ctx.construct("Node").unwrap();
        let b = ctx.construct("Node").unwrap();
        assert!(isomorphic(&ctx, Some(a), &ctx, Some(b)));
        x.set(&mut ctx, a, 1).unwrap();
        assert!(!isomorphic(&ctx, Some(a), &ctx, Some(b)));
    }

    #[test]
    fn test_self_references_are_cycle_safe() {
        let (mut ctx, _, array, reference) = setup();
        let a = ctx.construct("Node").unwrap();
        let a_child = ctx.construct("Node").unwrap();
        array.append(&mut ctx, a, a_child).unwrap();
        reference.set(&mut ctx, a, Some(a)).unwrap();
        reference.set(&mut ctx, a_child, Some(a)).unwrap();

        let b = ctx.construct("Node").unwrap();
        let b_child = ctx.construct("Node").unwrap();
        array.append(&mut ctx, b, b_child).unwrap();
        reference.set(&mut ctx, b, Some(b)).unwrap();
        reference.set(&mut ctx, b_child, Some(b)).unwrap();

        assert!(isomorphic(&ctx, Some(a), &ctx, Some(b)));

        reference.set(&mut ctx, b_child, None).unwrap();
        assert!(!isomorphic(&ctx, Some(a), &ctx, Some(b)));
    }
}
