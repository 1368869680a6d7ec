//! Core types shared across itemgraph facilities
//!
//! This crate provides foundational types used by the kernel, its error
//! facility and its logging facility:
//!
//! - **Identity**: `ItemId`, the stable non-zero id of a graph item
//! - **Schema constants**: Canonical field keys and event names

pub mod id;
pub mod schema;

pub use id::ItemId;
