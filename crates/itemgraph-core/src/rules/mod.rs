//! Structural rules over the item arena
//!
//! Before every commit, when the context is configured to, `validate_items`
//! checks the tracked graph plus the subtrees the transaction touched.
//! `validate_structure` checks the whole arena. The `find_*` functions
//! report every violation of one kind for diagnostics.

pub mod invariants;
pub mod validation;

pub use validation::{validate_items, validate_structure};
