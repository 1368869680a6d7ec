//! Item identity
//!
//! Ids are assigned once per item by the owning context, from a counter that
//! only moves forward. Zero is reserved for "no id", which is why the id wraps
//! a `NonZeroU64` and "no id" is spelled `Option<ItemId>`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;

/// Stable identifier of an item within one context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(NonZeroU64);

impl ItemId {
    /// The first id handed out by a fresh context
    pub const FIRST: ItemId = ItemId(NonZeroU64::MIN);

    /// Create an id from its raw value; `0` means "no id" and yields `None`
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Get the raw value
    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// The id that follows this one, or `None` past `u64::MAX`
    pub fn successor(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
