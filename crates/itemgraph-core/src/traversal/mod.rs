//! Ownership tree queries
//!
//! Lineage, height and lowest-common-ancestor over the parent map.

pub mod hierarchy;

pub use hierarchy::Hierarchy;
