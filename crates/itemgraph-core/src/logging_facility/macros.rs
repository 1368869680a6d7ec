//! Canonical lifecycle macros
//!
//! Every public lifecycle operation logs exactly one start event and one
//! end (or end_error) event, carrying `duration_ms`.

/// Log the start of an operation
///
/// ```
/// # use itemgraph_core::log_op_start;
/// log_op_start!("undo");
/// log_op_start!("end_transaction", transaction = "move items");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
        );
    }};
    ($op:expr, $($field:tt)*) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
            $($field)*
        );
    }};
}

/// Log the successful end of an operation
///
/// ```
/// # use itemgraph_core::log_op_end;
/// log_op_end!("undo", duration_ms = 3);
/// log_op_end!("copy_items", duration_ms = 1, item_count = 12);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    }};
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    }};
}

/// Log a failed operation with its error kind and stable code
///
/// ```
/// # use itemgraph_core::log_op_error;
/// # use itemgraph_core::errors::ItemGraphError;
/// let err = ItemGraphError::Deserialize { reason: "missing type".to_string() };
/// log_op_error!("deserialize", err, duration_ms = 0);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ig_err: $crate::errors::IgError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ig_err.kind(),
            err_code = ig_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ig_err: $crate::errors::IgError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ig_err.kind(),
            err_code = ig_err.code(),
            $($field)*
        );
    }};
}
