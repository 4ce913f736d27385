//! Allowance reconciliation.
//!
//! Decides whether the target contract may already spend the requested total
//! and, when it may not, raises the allowance to exactly that total before
//! the airdrop is allowed to proceed.

use ethers::types::{Address, U256};
use tracing::{debug, info};

use crate::error::WorkflowError;
use crate::gateway::{ChainGateway, TxHandle};
use crate::workflow::{StatusSink, WorkflowStatus};

/// What the reconciler did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowanceOutcome {
    /// The existing allowance already covered the total: pure read, no side
    /// effect, no `awaiting-approval-*` status emitted.
    AlreadySufficient,
    /// An approval for exactly the requested total was included successfully.
    Approved(TxHandle),
}

pub async fn ensure_allowance<G: ChainGateway>(
    gateway: &G,
    token: Address,
    owner: Address,
    spender: Address,
    total: U256,
    sink: &StatusSink,
) -> Result<AllowanceOutcome, WorkflowError> {
    // A failed read is a connectivity problem, never "zero allowance".
    let current = gateway
        .allowance(token, owner, spender)
        .await
        .map_err(WorkflowError::from)?;

    if current >= total {
        debug!(%current, %total, "allowance already sufficient, skipping approval");
        return Ok(AllowanceOutcome::AlreadySufficient);
    }

    sink.set(WorkflowStatus::AwaitingApprovalSignature);
    // Exactly the requested total: not unlimited, not the deficit.
    let handle = gateway
        .approve(token, spender, total)
        .await
        .map_err(WorkflowError::from)?;

    sink.set(WorkflowStatus::AwaitingApprovalInclusion);
    let outcome = gateway
        .wait_for_inclusion(handle)
        .await
        .map_err(WorkflowError::from)?;

    if !outcome.succeeded {
        return Err(WorkflowError::ApprovalReverted {
            reason: outcome.revert_reason,
        });
    }

    info!(tx = ?handle.0, %total, "approval confirmed");
    Ok(AllowanceOutcome::Approved(handle))
}
