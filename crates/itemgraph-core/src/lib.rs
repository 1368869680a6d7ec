//! ItemGraph Core - transactional object-graph kernel
//!
//! Items are typed records owned by a `Context` and shaped by registered
//! `Template`s. This crate provides:
//! - Typed property descriptors (scalar, id, reference, child list, child slot)
//! - Observable mutation with a keyed event bus
//! - Weak, id-based references that resolve to `None` once their target leaves the graph
//! - Parent tracking with lineage and lowest-common-ancestor queries
//! - An ordered selection set
//! - Transactions with value coalescing, consistency hooks and rollback
//! - Linear undo/redo history
//! - Deep copy, JSON serialization and structural comparison of subtrees
//!
//! # Example
//!
//! ```
//! use itemgraph_core::{Context, Template, TemplateRegistry, Value};
//!
//! let mut builder = Template::builder("Node");
//! let _id = builder.id("id");
//! let x = builder.scalar("x");
//! let children = builder.child_list("children");
//! let mut registry = TemplateRegistry::new();
//! registry.register(builder.build()).unwrap();
//!
//! let mut ctx = Context::new(registry, "Node").unwrap();
//! let root = ctx.root();
//! let child = ctx.construct("Node").unwrap();
//!
//! ctx.begin_transaction("add child").unwrap();
//! children.append(&mut ctx, root, child).unwrap();
//! x.set(&mut ctx, child, 1).unwrap();
//! x.set(&mut ctx, child, 2).unwrap();
//! ctx.end_transaction().unwrap();
//!
//! assert_eq!(ctx.get_undo().map(|t| t.len()), Some(2));
//! assert_eq!(x.get(&ctx, child).unwrap(), Some(&Value::Int(2)));
//!
//! ctx.undo().unwrap();
//! assert!(children.get(&ctx, root).unwrap().is_empty());
//! ```

pub use itemgraph_core_types as core_types;

pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod history;
pub mod hooks;
pub mod logging_facility;
pub mod model;
pub mod props;
pub mod references;
pub mod rules;
pub mod selection;
pub mod snapshot;
pub mod transaction;
pub mod traversal;

// Re-export commonly used types
pub use config::ContextConfig;
pub use context::Context;
pub use core_types::ItemId;
pub use errors::{IgError, IgErrorKind, ItemGraphError, Result};
pub use events::{Change, ChangeEvent, ChangeKind, HandlerId, TransactionEvent, TransactionNotice};
pub use hooks::{ConsistencyHook, ConsistencyVeto, NoopConsistencyHook};
pub use model::{PropertyKind, PropertyRef, PropertyValue, Template, TemplateRegistry, Value};
pub use props::{ChildList, ChildListProp, ChildSlotProp, IdProp, ReferenceProp, ScalarProp};
pub use selection::SelectionSet;
pub use transaction::{Operation, Transaction, TransactionOutcome, TransactionState};
