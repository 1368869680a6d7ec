//! Structured logging facility
//!
//! - One initialization point, `init(profile)`
//! - Lifecycle macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//!   emitting the canonical `component`/`op`/`event` fields
//! - A capture layer for asserting on log output in tests
//!
//! ```rust
//! use itemgraph_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```
//!
//! Public lifecycle operations (commit, cancel, undo, redo, copy,
//! serialize, deserialize) log start and end at `info`. Individual changes
//! log at `debug`, vetoed commits at `warn`.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
