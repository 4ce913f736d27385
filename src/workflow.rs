//! The submission state machine.
//!
//! Collapses the three independently-arriving signals (wallet signature,
//! chain inclusion, prior allowance) into one linear user-visible status, so
//! front ends never recombine them ad hoc at display time.

use std::sync::Arc;

use ethers::types::{Address, U256};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

use crate::allowance::{ensure_allowance, AllowanceOutcome};
use crate::amounts;
use crate::chains::ChainTargets;
use crate::error::WorkflowError;
use crate::gateway::{ChainGateway, TxHandle};
use crate::submitter::submit_airdrop;

/// User-visible workflow status. Created at submit time, mutated only by the
/// state machine, discarded on the next submit or an explicit reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowStatus {
    Idle,
    Validating,
    AwaitingApprovalSignature,
    AwaitingApprovalInclusion,
    AwaitingAirdropSignature,
    AwaitingAirdropInclusion,
    Confirmed,
    Failed { message: String },
}

impl WorkflowStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Confirmed | WorkflowStatus::Failed { .. })
    }

    /// True while a submission owns the workflow. Front ends must disable the
    /// submit action for as long as this holds.
    pub fn is_in_flight(&self) -> bool {
        !matches!(self, WorkflowStatus::Idle) && !self.is_terminal()
    }

    /// Short label for front ends (the submit-button text in a UI).
    pub fn label(&self) -> &'static str {
        match self {
            WorkflowStatus::Idle => "Send Tokens",
            WorkflowStatus::Validating => "Validating...",
            WorkflowStatus::AwaitingApprovalSignature
            | WorkflowStatus::AwaitingAirdropSignature => "Confirming in wallet...",
            WorkflowStatus::AwaitingApprovalInclusion
            | WorkflowStatus::AwaitingAirdropInclusion => {
                "Waiting for transaction to be included..."
            }
            WorkflowStatus::Confirmed => "Transaction confirmed.",
            WorkflowStatus::Failed { .. } => "Error, see message.",
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowStatus::Idle => write!(f, "idle"),
            WorkflowStatus::Validating => write!(f, "validating"),
            WorkflowStatus::AwaitingApprovalSignature => write!(f, "awaiting-approval-signature"),
            WorkflowStatus::AwaitingApprovalInclusion => write!(f, "awaiting-approval-inclusion"),
            WorkflowStatus::AwaitingAirdropSignature => write!(f, "awaiting-airdrop-signature"),
            WorkflowStatus::AwaitingAirdropInclusion => write!(f, "awaiting-airdrop-inclusion"),
            WorkflowStatus::Confirmed => write!(f, "confirmed"),
            WorkflowStatus::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}

/// Setter shared with the reconciler and submitter so their sub-transitions
/// surface directly as workflow statuses.
pub struct StatusSink {
    current: Arc<Mutex<WorkflowStatus>>,
    updates: UnboundedSender<WorkflowStatus>,
}

impl StatusSink {
    pub(crate) fn set(&self, status: WorkflowStatus) {
        info!(status = %status, "workflow status");
        *self.current.lock() = status.clone();
        // Subscribers may be gone; the current status stays queryable.
        let _ = self.updates.send(status);
    }
}

/// Summary of a confirmed submission.
#[derive(Debug, Clone)]
pub struct SubmitSummary {
    pub recipients: usize,
    pub total: U256,
    pub airdrop_tx: TxHandle,
    /// `None` when the existing allowance already covered the total.
    pub approval_tx: Option<TxHandle>,
}

/// One submission workflow instance, bound to a chain and a sending address.
/// At most one submission is in flight at a time; [`Workflow::can_submit`]
/// exposes the disable condition to front ends.
pub struct Workflow<G> {
    gateway: G,
    targets: ChainTargets,
    chain_id: u64,
    sender: Address,
    current: Arc<Mutex<WorkflowStatus>>,
    sink: StatusSink,
}

impl<G: ChainGateway> Workflow<G> {
    /// Build a workflow from explicitly constructed configuration. Returns
    /// the status update stream alongside; every transition is also
    /// queryable through [`Workflow::status`].
    pub fn new(
        gateway: G,
        targets: ChainTargets,
        chain_id: u64,
        sender: Address,
    ) -> (Self, UnboundedReceiver<WorkflowStatus>) {
        let (updates, rx) = unbounded_channel();
        let current = Arc::new(Mutex::new(WorkflowStatus::Idle));
        let sink = StatusSink {
            current: Arc::clone(&current),
            updates,
        };
        (
            Self {
                gateway,
                targets,
                chain_id,
                sender,
                current,
                sink,
            },
            rx,
        )
    }

    pub fn status(&self) -> WorkflowStatus {
        self.current.lock().clone()
    }

    pub fn can_submit(&self) -> bool {
        !self.current.lock().is_in_flight()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Run one submission from raw inputs to a terminal state. Statuses are
    /// emitted as the pipeline advances; any failure lands in `failed` with
    /// its classified message and is returned as the error.
    pub async fn submit(
        &self,
        token_text: &str,
        recipients_text: &str,
        amounts_text: &str,
    ) -> Result<SubmitSummary, WorkflowError> {
        if self.current.lock().is_in_flight() {
            return Err(WorkflowError::Busy);
        }

        match self.run(token_text, recipients_text, amounts_text).await {
            Ok(summary) => {
                self.sink.set(WorkflowStatus::Confirmed);
                Ok(summary)
            }
            Err(err) => {
                self.sink.set(WorkflowStatus::Failed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        token_text: &str,
        recipients_text: &str,
        amounts_text: &str,
    ) -> Result<SubmitSummary, WorkflowError> {
        self.sink.set(WorkflowStatus::Validating);
        let batch = amounts::validate(token_text, recipients_text, amounts_text)?;

        // Looked up once per submission; absence means the user is on a chain
        // without a deployment and has to switch network.
        let target = self
            .targets
            .get(self.chain_id)
            .ok_or(WorkflowError::UnsupportedChain {
                chain_id: self.chain_id,
            })?;

        // Approval inclusion is always awaited to completion before the
        // airdrop call; the two are never raced.
        let approval = ensure_allowance(
            &self.gateway,
            batch.token,
            self.sender,
            target,
            batch.total,
            &self.sink,
        )
        .await?;

        let airdrop_tx = submit_airdrop(&self.gateway, target, &batch, &self.sink).await?;

        Ok(SubmitSummary {
            recipients: batch.recipients.len(),
            total: batch.total,
            airdrop_tx,
            approval_tx: match approval {
                AllowanceOutcome::Approved(tx) => Some(tx),
                AllowanceOutcome::AlreadySufficient => None,
            },
        })
    }

    /// Explicit reset back to `idle` from a terminal state. Clears
    /// transaction state only; the persisted draft is untouched. Ignored
    /// while a submission is in flight (there is no cancel).
    pub fn reset(&self) {
        if self.current.lock().is_in_flight() {
            warn!("ignoring reset while a submission is in flight");
            return;
        }
        self.sink.set(WorkflowStatus::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_and_in_flight_partition_the_states() {
        let failed = WorkflowStatus::Failed {
            message: "x".into(),
        };
        assert!(WorkflowStatus::Confirmed.is_terminal());
        assert!(failed.is_terminal());
        assert!(!WorkflowStatus::Idle.is_terminal());

        assert!(!WorkflowStatus::Idle.is_in_flight());
        assert!(!WorkflowStatus::Confirmed.is_in_flight());
        assert!(!failed.is_in_flight());
        assert!(WorkflowStatus::Validating.is_in_flight());
        assert!(WorkflowStatus::AwaitingApprovalSignature.is_in_flight());
        assert!(WorkflowStatus::AwaitingAirdropInclusion.is_in_flight());
    }

    #[test]
    fn statuses_serialize_kebab_case() {
        let v = serde_json::to_value(WorkflowStatus::AwaitingApprovalSignature).unwrap();
        assert_eq!(v, serde_json::json!("awaiting-approval-signature"));
        assert_eq!(
            WorkflowStatus::AwaitingAirdropInclusion.to_string(),
            "awaiting-airdrop-inclusion"
        );
    }

    #[test]
    fn labels_match_the_wallet_prompts() {
        assert_eq!(
            WorkflowStatus::AwaitingApprovalSignature.label(),
            "Confirming in wallet..."
        );
        assert_eq!(
            WorkflowStatus::AwaitingAirdropInclusion.label(),
            "Waiting for transaction to be included..."
        );
        assert_eq!(WorkflowStatus::Confirmed.label(), "Transaction confirmed.");
    }
}
