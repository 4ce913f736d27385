//! Batch-airdrop submission: issues `airdropERC20` and awaits inclusion.

use ethers::types::Address;
use tracing::info;

use crate::amounts::ValidatedBatch;
use crate::error::WorkflowError;
use crate::gateway::{ChainGateway, TxHandle};
use crate::workflow::{StatusSink, WorkflowStatus};

/// Issue the batch call with the validated, index-paired arrays and the
/// aggregate total. The contract fails atomically on-chain for anything the
/// validation pass could not see; no re-validation happens here.
pub async fn submit_airdrop<G: ChainGateway>(
    gateway: &G,
    target: Address,
    batch: &ValidatedBatch,
    sink: &StatusSink,
) -> Result<TxHandle, WorkflowError> {
    sink.set(WorkflowStatus::AwaitingAirdropSignature);
    let handle = gateway
        .airdrop_erc20(
            target,
            batch.token,
            batch.recipients.clone(),
            batch.amounts.clone(),
            batch.total,
        )
        .await?;

    sink.set(WorkflowStatus::AwaitingAirdropInclusion);
    let outcome = gateway.wait_for_inclusion(handle).await?;

    if !outcome.succeeded {
        return Err(WorkflowError::AirdropReverted {
            reason: outcome.revert_reason,
        });
    }

    info!(tx = ?handle.0, recipients = batch.recipients.len(), "airdrop confirmed");
    Ok(handle)
}
