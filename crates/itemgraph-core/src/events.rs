//! Keyed publish/subscribe
//!
//! Handlers run synchronously, in registration order, for the key they were
//! registered under. Handlers only see the event payload, never the context,
//! so they cannot re-enter the transaction machinery while a change is being
//! dispatched.

use itemgraph_core_types::ItemId;

use crate::model::{PropertyRef, PropertyValue};

/// Token returned by `add_handler`, used to remove the handler again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

type Handler<A> = Box<dyn FnMut(&A)>;

/// Ordered handler lists keyed by event name
pub struct EventBus<K, A> {
    handlers: Vec<(HandlerId, K, Handler<A>)>,
    next_id: u64,
}

impl<K, A> Default for EventBus<K, A> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 1,
        }
    }
}

impl<K, A> std::fmt::Debug for EventBus<K, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl<K: PartialEq, A> EventBus<K, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler<F>(&mut self, key: K, handler: F) -> HandlerId
    where
        F: FnMut(&A) + 'static,
    {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, key, Box::new(handler)));
        id
    }

    /// Returns false if no handler with this id is registered
    pub fn remove_handler(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(h, _, _)| *h != id);
        self.handlers.len() != before
    }

    pub fn emit(&mut self, key: &K, args: &A) {
        for (_, k, handler) in self.handlers.iter_mut() {
            if k == key {
                handler(args);
            }
        }
    }

    pub fn handler_count(&self, key: &K) -> usize {
        self.handlers.iter().filter(|(_, k, _)| k == key).count()
    }
}

/// Channels carrying `Change` payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    /// Every change, after its specific channel
    Changed,
    ValueChanged,
    ElementInserted,
    ElementRemoved,
}

/// Channels carrying `TransactionNotice` payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionEvent {
    TransactionBegan,
    TransactionEnded,
    TransactionCancelled,
    DidUndo,
    DidRedo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    ValueChanged,
    ElementInserted,
    ElementRemoved,
}

impl ChangeKind {
    pub(crate) fn channel(self) -> ChangeEvent {
        match self {
            ChangeKind::ValueChanged => ChangeEvent::ValueChanged,
            ChangeKind::ElementInserted => ChangeEvent::ElementInserted,
            ChangeKind::ElementRemoved => ChangeEvent::ElementRemoved,
        }
    }
}

/// One observed mutation
///
/// | kind              | `index` | `old_value`       | `new_value`        |
/// |-------------------|---------|-------------------|--------------------|
/// | `ValueChanged`    | `None`  | previous value    | written value      |
/// | `ElementInserted` | `Some`  | `None`            | `Child(Some(new))` |
/// | `ElementRemoved`  | `Some`  | `Child(Some(old))`| `None`             |
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub kind: ChangeKind,
    pub item: ItemId,
    pub property: PropertyRef,
    pub index: Option<usize>,
    pub old_value: Option<PropertyValue>,
    pub new_value: Option<PropertyValue>,
}

impl Change {
    pub(crate) fn value_changed(
        item: ItemId,
        property: PropertyRef,
        old: PropertyValue,
        new: PropertyValue,
    ) -> Self {
        Self {
            kind: ChangeKind::ValueChanged,
            item,
            property,
            index: None,
            old_value: Some(old),
            new_value: Some(new),
        }
    }

    pub(crate) fn element_inserted(
        item: ItemId,
        property: PropertyRef,
        index: usize,
        child: ItemId,
    ) -> Self {
        Self {
            kind: ChangeKind::ElementInserted,
            item,
            property,
            index: Some(index),
            old_value: None,
            new_value: Some(PropertyValue::Child(Some(child))),
        }
    }

    /// The inserted or removed child, for element changes
    pub fn element(&self) -> Option<ItemId> {
        let value = match self.kind {
            ChangeKind::ValueChanged => return None,
            ChangeKind::ElementInserted => self.new_value.as_ref(),
            ChangeKind::ElementRemoved => self.old_value.as_ref(),
        };
        match value {
            Some(PropertyValue::Child(child)) => *child,
            _ => None,
        }
    }

    pub(crate) fn element_removed(
        item: ItemId,
        property: PropertyRef,
        index: usize,
        child: ItemId,
    ) -> Self {
        Self {
            kind: ChangeKind::ElementRemoved,
            item,
            property,
            index: Some(index),
            old_value: Some(PropertyValue::Child(Some(child))),
            new_value: None,
        }
    }
}

/// Payload of transaction lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionNotice {
    pub name: String,
    pub op_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_handlers_run_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus: EventBus<&'static str, u32> = EventBus::new();

        let s1 = Rc::clone(&seen);
        bus.add_handler("tick", move |v| s1.borrow_mut().push(("first", *v)));
        let s2 = Rc::clone(&seen);
        bus.add_handler("tick", move |v| s2.borrow_mut().push(("second", *v)));
        let s3 = Rc::clone(&seen);
        bus.add_handler("tock", move |v| s3.borrow_mut().push(("other", *v)));

        bus.emit(&"tick", &7);

        assert_eq!(*seen.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn test_remove_handler() {
        let count = Rc::new(RefCell::new(0));
        let mut bus: EventBus<&'static str, ()> = EventBus::new();
        let c = Rc::clone(&count);
        let id = bus.add_handler("e", move |_| *c.borrow_mut() += 1);

        bus.emit(&"e", &());
        assert!(bus.remove_handler(id));
        assert!(!bus.remove_handler(id));
        bus.emit(&"e", &());

        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.handler_count(&"e"), 0);
    }
}
