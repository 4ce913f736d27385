//! Error taxonomy for the submission workflow.
//!
//! Every failure class ends up in the single `failed` status message, but the
//! classes stay distinct on the way there: a connectivity problem must never
//! read as "allowance insufficient", and a wallet-level decline must never
//! read as an on-chain revert.

use thiserror::Error;

use crate::gateway::GatewayError;

/// Which input field a validation error should be reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    TokenAddress,
    Recipients,
    Amounts,
}

/// Input validation failures. First failing rule wins; nothing here has
/// touched the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("token address `{0}` is not a valid ERC-20 address")]
    MalformedToken(String),
    #[error("no recipients provided")]
    NoRecipients,
    #[error("no amounts provided")]
    NoAmounts,
    #[error("{recipients} recipients but {amounts} amounts")]
    LengthMismatch { recipients: usize, amounts: usize },
    #[error("recipient #{index} (`{value}`) is not a valid address")]
    MalformedRecipient { index: usize, value: String },
    #[error("amount #{index} (`{value}`) is not a positive integer")]
    NonPositiveAmount { index: usize, value: String },
    #[error("amounts overflow 256 bits when summed")]
    TotalOverflow,
}

impl ValidationError {
    /// Field class the error should be rendered next to.
    pub fn field(&self) -> Field {
        match self {
            ValidationError::MalformedToken(_) => Field::TokenAddress,
            ValidationError::NoRecipients | ValidationError::MalformedRecipient { .. } => {
                Field::Recipients
            }
            ValidationError::NoAmounts
            | ValidationError::LengthMismatch { .. }
            | ValidationError::NonPositiveAmount { .. }
            | ValidationError::TotalOverflow => Field::Amounts,
        }
    }
}

/// Workflow-level failures, one variant per recovery story.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// No batch-airdrop contract is deployed for the active chain. The user
    /// has to switch network; retrying on the same chain cannot help.
    #[error("no batch-airdrop contract deployed for chain id {chain_id}")]
    UnsupportedChain { chain_id: u64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Read or transport failure. Distinct from an insufficient allowance.
    #[error("network error: {0}")]
    Network(String),

    /// The wallet declined to sign. Not a revert.
    #[error("rejected by user")]
    Rejected,

    /// Approval was included but failed on-chain. The airdrop is never
    /// attempted after this.
    #[error("approval transaction reverted{}", reason_suffix(.reason))]
    ApprovalReverted { reason: Option<String> },

    /// Airdrop was included but failed on-chain.
    #[error("airdrop transaction reverted{}", reason_suffix(.reason))]
    AirdropReverted { reason: Option<String> },

    /// A submission is already in flight on this workflow instance.
    #[error("a submission is already in progress")]
    Busy,
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(r) => format!(": {r}"),
        None => String::new(),
    }
}

impl From<GatewayError> for WorkflowError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected => WorkflowError::Rejected,
            GatewayError::Network(msg) => WorkflowError::Network(msg),
        }
    }
}
