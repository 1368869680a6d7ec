//! Pre-commit consistency hooks
//!
//! Hooks run while a transaction is `Ending`. They may repair the graph
//! (their edits are recorded in the same transaction) or veto the commit,
//! in which case the transaction is cancelled in full.

use thiserror::Error;

use crate::context::Context;

/// Refusal to commit, raised by a consistency hook
///
/// Never returned to the caller of `end_transaction`; it becomes a
/// `TransactionOutcome::Cancelled`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Transaction vetoed: {reason}")]
pub struct ConsistencyVeto {
    pub reason: String,
}

impl ConsistencyVeto {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Hook invoked before a transaction commits
pub trait ConsistencyHook {
    /// Repair or veto the pending transaction
    ///
    /// # Errors
    ///
    /// Returns `ConsistencyVeto` to force cancellation.
    fn transaction_ending(
        &mut self,
        ctx: &mut Context,
        name: &str,
    ) -> std::result::Result<(), ConsistencyVeto>;
}

impl<F> ConsistencyHook for F
where
    F: FnMut(&mut Context, &str) -> std::result::Result<(), ConsistencyVeto>,
{
    fn transaction_ending(
        &mut self,
        ctx: &mut Context,
        name: &str,
    ) -> std::result::Result<(), ConsistencyVeto> {
        self(ctx, name)
    }
}

/// Always allows the commit
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopConsistencyHook;

impl ConsistencyHook for NoopConsistencyHook {
    fn transaction_ending(
        &mut self,
        _ctx: &mut Context,
        _name: &str,
    ) -> std::result::Result<(), ConsistencyVeto> {
        Ok(())
    }
}
