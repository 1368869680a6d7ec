//! Transactions
//!
//! One transaction may be open per context. While it is open (and while
//! its consistency hooks run) every change is recorded as an `Operation`.
//! Scalar and reference writes are coalesced per `(item, property)`: the
//! first write records the pre-transaction value and later writes only
//! update the recorded new value. Structural changes are recorded one by
//! one.
//!
//! ```text
//! Idle --begin--> Open --end--> Ending --commit--> Idle
//!                  |              |
//!                  |              +--veto/invalid--> Cancelling --> Idle
//!                  +--cancel--> Cancelling --> Idle
//! ```

use std::collections::HashMap;
use std::time::Instant;

use itemgraph_core_types::ItemId;

use crate::context::Context;
use crate::errors::{ItemGraphError, Result};
use crate::events::{TransactionEvent, TransactionNotice};
use crate::hooks::ConsistencyVeto;
use crate::model::{PropertyRef, PropertyValue};
use crate::rules::validation::validate_items;
use crate::{log_op_end, log_op_error, log_op_start};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    Idle,
    Open,
    /// Consistency hooks are running
    Ending,
    /// Recorded operations are being rolled back
    Cancelling,
}

/// One reversible step of a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    ChangeValue {
        item: ItemId,
        property: PropertyRef,
        old: PropertyValue,
        new: PropertyValue,
    },
    InsertElement {
        item: ItemId,
        property: PropertyRef,
        index: usize,
        child: ItemId,
    },
    RemoveElement {
        item: ItemId,
        property: PropertyRef,
        index: usize,
        child: ItemId,
    },
    Selection {
        before: Vec<ItemId>,
        after: Vec<ItemId>,
    },
}

/// A named, ordered log of operations
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    name: String,
    ops: Vec<Operation>,
}

impl Transaction {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ops: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Owners and children named by structural operations
    pub(crate) fn structural_items(&self) -> Vec<ItemId> {
        self.ops
            .iter()
            .flat_map(|op| match op {
                Operation::InsertElement { item, child, .. }
                | Operation::RemoveElement { item, child, .. } => vec![*item, *child],
                Operation::ChangeValue { .. } | Operation::Selection { .. } => Vec::new(),
            })
            .collect()
    }

    pub(crate) fn notice(&self) -> TransactionNotice {
        TransactionNotice {
            name: self.name.clone(),
            op_count: self.ops.len(),
        }
    }
}

/// Result of `end_transaction`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    Committed,
    /// Vetoed by a consistency hook or structurally invalid; rolled back
    Cancelled,
}

#[derive(Debug, Default)]
pub(crate) struct TransactionManager {
    state: TransactionState,
    current: Option<Transaction>,
    /// `(item, slot)` -> index of the coalesced value op
    snapshots: HashMap<(ItemId, usize), usize>,
    starting_selection: Vec<ItemId>,
    replaying: bool,
}

impl TransactionManager {
    pub(crate) fn state(&self) -> TransactionState {
        self.state
    }

    pub(crate) fn is_recording(&self) -> bool {
        !self.replaying && matches!(self.state, TransactionState::Open | TransactionState::Ending)
    }

    pub(crate) fn is_replaying(&self) -> bool {
        self.replaying || self.state == TransactionState::Cancelling
    }

    pub(crate) fn set_replaying(&mut self, replaying: bool) {
        self.replaying = replaying;
    }

    pub(crate) fn record(&mut self, op: Operation) {
        let Some(transaction) = self.current.as_mut() else {
            return;
        };
        if let Operation::ChangeValue {
            item, property, new, ..
        } = &op
        {
            let key = (*item, property.slot());
            if let Some(index) = self.snapshots.get(&key) {
                if let Some(Operation::ChangeValue { new: recorded, .. }) =
                    transaction.ops.get_mut(*index)
                {
                    *recorded = new.clone();
                }
                return;
            }
            self.snapshots.insert(key, transaction.ops.len());
        }
        transaction.ops.push(op);
    }

    fn snapshot(&self, item: ItemId, property: &PropertyRef) -> Option<&PropertyValue> {
        let index = self.snapshots.get(&(item, property.slot()))?;
        match self.current.as_ref()?.ops.get(*index)? {
            Operation::ChangeValue { old, .. } => Some(old),
            _ => None,
        }
    }
}

fn invalid_state(operation: &'static str, state: TransactionState) -> ItemGraphError {
    ItemGraphError::InvalidState { operation, state }
}

impl Context {
    pub fn transaction_state(&self) -> TransactionState {
        self.transactions.state
    }

    pub fn in_transaction(&self) -> bool {
        self.transactions.state != TransactionState::Idle
    }

    /// The open transaction, if any
    pub fn current_transaction(&self) -> Option<&Transaction> {
        self.transactions.current.as_ref()
    }

    /// Open a transaction
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if a transaction is already open, ending or
    /// cancelling, or while history is being replayed.
    pub fn begin_transaction(&mut self, name: &str) -> Result<()> {
        let state = self.transactions.state;
        if state != TransactionState::Idle || self.transactions.replaying {
            return Err(invalid_state("begin_transaction", state));
        }
        let transaction = Transaction::new(name);
        let notice = transaction.notice();
        self.transactions.state = TransactionState::Open;
        self.transactions.current = Some(transaction);
        self.transactions.snapshots.clear();
        self.transactions.starting_selection = self.selection.contents();
        self.clear_redo();
        tracing::debug!(transaction = name, "transaction began");
        self.transaction_events
            .emit(&TransactionEvent::TransactionBegan, &notice);
        Ok(())
    }

    /// Value of the property as of `begin_transaction`
    ///
    /// Outside a transaction, or for a property not yet written in it, this
    /// is the current value.
    ///
    /// # Errors
    ///
    /// Returns `PropertyMismatch` for id and child list properties.
    pub fn get_old_value(&self, item: ItemId, property: &PropertyRef) -> Result<PropertyValue> {
        let current = self.property_value(item, property)?;
        Ok(self
            .transactions
            .snapshot(item, property)
            .cloned()
            .unwrap_or(current))
    }

    /// Commit the open transaction
    ///
    /// Consistency hooks run first, then the parent map is rebuilt and,
    /// if configured, the structure is validated. Both cover the tracked
    /// graph plus the subtrees the transaction touched. A veto or a validation
    /// failure rolls the transaction back and yields `Cancelled`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless a transaction is open, and
    /// `ReplayDiverged` if a rollback could not be applied.
    pub fn end_transaction(&mut self) -> Result<TransactionOutcome> {
        let start = Instant::now();
        let state = self.transactions.state;
        if state != TransactionState::Open {
            return Err(invalid_state("end_transaction", state));
        }
        let name = self
            .transactions
            .current
            .as_ref()
            .map(|t| t.name.clone())
            .unwrap_or_default();
        log_op_start!("end_transaction", transaction = name.as_str());

        self.transactions.state = TransactionState::Ending;
        let veto = self.run_consistency_hooks(&name);
        let touched = self
            .transactions
            .current
            .as_ref()
            .map(Transaction::structural_items)
            .unwrap_or_default();
        let scope = self.rebuild_hierarchy_for(&touched);
        let veto = veto.or_else(|| {
            if !self.config.validate_on_commit {
                return None;
            }
            validate_items(self, &scope)
                .err()
                .map(|e| ConsistencyVeto::new(e.to_string()))
        });

        if let Some(veto) = veto {
            tracing::warn!(transaction = name.as_str(), reason = %veto.reason, "transaction vetoed");
            return match self.rollback() {
                Ok(()) => {
                    log_op_end!(
                        "end_transaction",
                        duration_ms = start.elapsed().as_millis() as u64,
                        outcome = "cancelled"
                    );
                    Ok(TransactionOutcome::Cancelled)
                }
                Err(e) => {
                    log_op_error!(
                        "end_transaction",
                        e.clone(),
                        duration_ms = start.elapsed().as_millis() as u64
                    );
                    Err(e)
                }
            };
        }

        self.references.rebuild(&self.items, self.root());
        let mut transaction = self
            .transactions
            .current
            .take()
            .unwrap_or_else(|| Transaction::new(&name));
        if self.config.record_selection {
            let before = std::mem::take(&mut self.transactions.starting_selection);
            let after = self.selection.contents();
            if before != after {
                transaction.ops.push(Operation::Selection { before, after });
            }
        }
        self.transactions.snapshots.clear();
        self.transactions.starting_selection.clear();
        self.transactions.state = TransactionState::Idle;

        let notice = transaction.notice();
        self.transaction_events
            .emit(&TransactionEvent::TransactionEnded, &notice);
        self.push_history(transaction);

        log_op_end!(
            "end_transaction",
            duration_ms = start.elapsed().as_millis() as u64,
            outcome = "committed",
            op_count = notice.op_count
        );
        Ok(TransactionOutcome::Committed)
    }

    /// Roll back the open transaction
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless a transaction is open, and
    /// `ReplayDiverged` if a rollback could not be applied.
    pub fn cancel_transaction(&mut self) -> Result<()> {
        let start = Instant::now();
        let state = self.transactions.state;
        if state != TransactionState::Open {
            return Err(invalid_state("cancel_transaction", state));
        }
        log_op_start!("cancel_transaction");
        match self.rollback() {
            Ok(()) => {
                log_op_end!(
                    "cancel_transaction",
                    duration_ms = start.elapsed().as_millis() as u64
                );
                Ok(())
            }
            Err(e) => {
                log_op_error!(
                    "cancel_transaction",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                Err(e)
            }
        }
    }

    fn run_consistency_hooks(&mut self, name: &str) -> Option<ConsistencyVeto> {
        let mut hooks = std::mem::take(&mut self.hooks);
        let mut veto = None;
        for hook in hooks.iter_mut() {
            if let Err(v) = hook.transaction_ending(self, name) {
                veto = Some(v);
                break;
            }
        }
        // keep hooks registered by a hook, after the existing ones
        hooks.append(&mut self.hooks);
        self.hooks = hooks;
        veto
    }

    /// Undo everything recorded so far and return to `Idle`
    fn rollback(&mut self) -> Result<()> {
        self.transactions.state = TransactionState::Cancelling;
        let transaction = self.transactions.current.take();
        let mut result = Ok(());
        if let Some(transaction) = transaction.as_ref() {
            for op in transaction.ops.iter().rev() {
                if let Err(e) = self.undo_operation(op) {
                    tracing::error!(transaction = transaction.name(), error = %e, "rollback diverged");
                    result = Err(e);
                    break;
                }
            }
        }
        if self.config.record_selection {
            let before = std::mem::take(&mut self.transactions.starting_selection);
            self.selection.set(before);
        }
        let touched = transaction
            .as_ref()
            .map(Transaction::structural_items)
            .unwrap_or_default();
        self.rebuild_hierarchy_for(&touched);
        self.references.rebuild(&self.items, self.root());
        self.transactions.snapshots.clear();
        self.transactions.starting_selection.clear();
        self.transactions.state = TransactionState::Idle;

        if let Some(transaction) = transaction {
            self.transaction_events
                .emit(&TransactionEvent::TransactionCancelled, &transaction.notice());
        }
        result
    }

    /// Apply the inverse of one operation
    pub(crate) fn undo_operation(&mut self, op: &Operation) -> Result<()> {
        match op {
            Operation::ChangeValue {
                item,
                property,
                old,
                ..
            } => {
                self.change_value(*item, *property, old.clone())?;
            }
            Operation::InsertElement {
                item,
                property,
                index,
                child,
            } => {
                let removed = self.remove_element(*item, *property, *index)?;
                check_replayed(removed, *child)?;
            }
            Operation::RemoveElement {
                item,
                property,
                index,
                child,
            } => {
                self.insert_element(*item, *property, *index, *child)?;
            }
            Operation::Selection { before, .. } => {
                self.selection.set(before.iter().copied());
            }
        }
        Ok(())
    }

    /// Apply one operation again
    pub(crate) fn redo_operation(&mut self, op: &Operation) -> Result<()> {
        match op {
            Operation::ChangeValue {
                item,
                property,
                new,
                ..
            } => {
                self.change_value(*item, *property, new.clone())?;
            }
            Operation::InsertElement {
                item,
                property,
                index,
                child,
            } => {
                self.insert_element(*item, *property, *index, *child)?;
            }
            Operation::RemoveElement {
                item,
                property,
                index,
                child,
            } => {
                let removed = self.remove_element(*item, *property, *index)?;
                check_replayed(removed, *child)?;
            }
            Operation::Selection { after, .. } => {
                self.selection.set(after.iter().copied());
            }
        }
        Ok(())
    }
}

fn check_replayed(removed: ItemId, expected: ItemId) -> Result<()> {
    if removed == expected {
        Ok(())
    } else {
        Err(ItemGraphError::ReplayDiverged {
            message: format!("expected to remove {expected}, removed {removed}"),
        })
    }
}
