//! Linear undo/redo history
//!
//! Committed transactions are pushed on the undo stack. Undo replays a
//! transaction's operations in reverse and moves it to the redo stack;
//! redo replays forward and moves it back. Beginning a new transaction
//! clears the redo stack.

use std::time::Instant;

use crate::context::Context;
use crate::errors::{ItemGraphError, Result};
use crate::events::TransactionEvent;
use crate::transaction::{Transaction, TransactionState};
use crate::{log_op_end, log_op_error, log_op_start};

#[derive(Debug, Default)]
pub(crate) struct History {
    undo: Vec<Transaction>,
    redo: Vec<Transaction>,
}

#[derive(Clone, Copy)]
enum Direction {
    Undo,
    Redo,
}

impl Direction {
    fn op_name(self) -> &'static str {
        match self {
            Direction::Undo => "undo",
            Direction::Redo => "redo",
        }
    }
}

impl Context {
    /// Transaction `undo` would revert
    pub fn get_undo(&self) -> Option<&Transaction> {
        self.history.undo.last()
    }

    /// Transaction `redo` would re-apply
    pub fn get_redo(&self) -> Option<&Transaction> {
        self.history.redo.last()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.history.redo.is_empty()
    }

    /// Undo stack, oldest first
    pub fn undo_stack(&self) -> &[Transaction] {
        &self.history.undo
    }

    /// Redo stack, oldest first
    pub fn redo_stack(&self) -> &[Transaction] {
        &self.history.redo
    }

    pub fn clear_history(&mut self) {
        self.history.undo.clear();
        self.history.redo.clear();
    }

    pub(crate) fn clear_redo(&mut self) {
        self.history.redo.clear();
    }

    pub(crate) fn push_history(&mut self, transaction: Transaction) {
        self.history.undo.push(transaction);
        if let Some(max) = self.config.max_undo_depth {
            let excess = self.history.undo.len().saturating_sub(max);
            if excess > 0 {
                self.history.undo.drain(..excess);
                tracing::debug!(dropped = excess, "undo history trimmed");
            }
        }
    }

    /// Revert the most recent committed transaction
    ///
    /// Returns `Ok(false)` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` while a transaction is open and
    /// `ReplayDiverged` if the graph no longer matches the recorded
    /// operations; the transaction is dropped from history in that case.
    pub fn undo(&mut self) -> Result<bool> {
        self.step(Direction::Undo)
    }

    /// Re-apply the most recently undone transaction
    ///
    /// Returns `Ok(false)` when there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Same conditions as `undo`.
    pub fn redo(&mut self) -> Result<bool> {
        self.step(Direction::Redo)
    }

    fn step(&mut self, direction: Direction) -> Result<bool> {
        let op = direction.op_name();
        let state = self.transaction_state();
        if state != TransactionState::Idle {
            return Err(ItemGraphError::InvalidState {
                operation: op,
                state,
            });
        }
        let popped = match direction {
            Direction::Undo => self.history.undo.pop(),
            Direction::Redo => self.history.redo.pop(),
        };
        let Some(transaction) = popped else {
            return Ok(false);
        };

        let start = Instant::now();
        log_op_start!(op, transaction = transaction.name(), op_count = transaction.len());

        self.transactions.set_replaying(true);
        let result = match direction {
            Direction::Undo => transaction
                .ops()
                .iter()
                .rev()
                .try_for_each(|o| self.undo_operation(o)),
            Direction::Redo => transaction
                .ops()
                .iter()
                .try_for_each(|o| self.redo_operation(o)),
        };
        self.transactions.set_replaying(false);
        self.rebuild_hierarchy_for(&transaction.structural_items());
        self.references.rebuild(&self.items, self.root());

        if let Err(e) = result {
            log_op_error!(op, e.clone(), duration_ms = start.elapsed().as_millis() as u64);
            return Err(e);
        }

        let notice = transaction.notice();
        let event = match direction {
            Direction::Undo => {
                self.history.redo.push(transaction);
                TransactionEvent::DidUndo
            }
            Direction::Redo => {
                self.history.undo.push(transaction);
                TransactionEvent::DidRedo
            }
        };
        self.transaction_events.emit(&event, &notice);

        log_op_end!(op, duration_ms = start.elapsed().as_millis() as u64);
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::config::ContextConfig;
    use crate::context::Context;
    use crate::errors::ItemGraphError;
    use crate::model::{Template, TemplateRegistry, Value};
    use crate::props::ScalarProp;

    fn setup(config: ContextConfig) -> (Context, ScalarProp) {
        let mut builder = Template::builder("Node");
        let x = builder.scalar("x");
        let mut registry = TemplateRegistry::new();
        registry.register(builder.build()).unwrap();
        (Context::with_config(registry, "Node", config).unwrap(), x)
    }

    fn commit_set(ctx: &mut Context, x: &ScalarProp, v: i64) {
        let root = ctx.root();
        ctx.begin_transaction("set x").unwrap();
        x.set(ctx, root, v).unwrap();
        ctx.end_transaction().unwrap();
    }

    #[test]
    fn test_empty_stacks() {
        let (mut ctx, _) = setup(ContextConfig::default());
        assert!(!ctx.undo().unwrap());
        assert!(!ctx.redo().unwrap());
    }

    #[test]
    fn test_undo_redo_cycle() {
        let (mut ctx, x) = setup(ContextConfig::default());
        let root = ctx.root();
        commit_set(&mut ctx, &x, 1);
        commit_set(&mut ctx, &x, 2);

        assert!(ctx.undo().unwrap());
        assert_eq!(x.get(&ctx, root).unwrap(), Some(&Value::Int(1)));
        assert!(ctx.can_redo());
        assert!(ctx.redo().unwrap());
        assert_eq!(x.get(&ctx, root).unwrap(), Some(&Value::Int(2)));
    }

    #[test]
    fn test_new_transaction_clears_redo() {
        let (mut ctx, x) = setup(ContextConfig::default());
        commit_set(&mut ctx, &x, 1);
        ctx.undo().unwrap();
        assert!(ctx.can_redo());

        ctx.begin_transaction("t").unwrap();
        assert!(!ctx.can_redo());
        ctx.cancel_transaction().unwrap();
        assert!(!ctx.can_redo());
        assert!(!ctx.redo().unwrap());
    }

    #[test]
    fn test_undo_inside_transaction_fails() {
        let (mut ctx, x) = setup(ContextConfig::default());
        commit_set(&mut ctx, &x, 1);
        ctx.begin_transaction("t").unwrap();
        assert!(matches!(
            ctx.undo(),
            Err(ItemGraphError::InvalidState { .. })
        ));
        ctx.end_transaction().unwrap();
    }

    #[test]
    fn test_max_undo_depth() {
        let config = ContextConfig {
            max_undo_depth: Some(2),
            ..ContextConfig::default()
        };
        let (mut ctx, x) = setup(config);
        for v in 1..=4 {
            commit_set(&mut ctx, &x, v);
        }
        assert_eq!(ctx.undo_stack().len(), 2);
        assert!(ctx.undo().unwrap());
        assert!(ctx.undo().unwrap());
        assert!(!ctx.undo().unwrap());
        let root = ctx.root();
        assert_eq!(x.get(&ctx, root).unwrap(), Some(&Value::Int(2)));
    }
}
