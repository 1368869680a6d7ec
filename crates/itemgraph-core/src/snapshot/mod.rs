//! Copying and persisting item subtrees
//!
//! - `copy_items` deep-clones subtrees inside one context
//! - `serialize` / `deserialize` convert subtrees to and from a plain JSON tree
//! - `isomorphic` compares subtrees structurally, across contexts

pub mod copy;
pub mod isomorphism;
pub mod serialize;

pub use copy::{copy_items, copy_items_with_map};
pub use isomorphism::isomorphic;
pub use serialize::{deserialize, from_json_str, serialize, to_json_string};
