//! batchsend: transaction-orchestration core for batch ERC-20 airdrops.
//!
//! Parses and validates free-text recipient/amount lists, computes the exact
//! aggregate total, reconciles the spender allowance against it, and drives a
//! batch-airdrop contract call through a single linear [`WorkflowStatus`].
//! Wallet sessions, chain selection and the contract itself stay outside the
//! core behind the [`gateway::ChainGateway`] seam.

pub mod allowance;
pub mod amounts;
pub mod chains;
pub mod draft;
pub mod error;
pub mod gateway;
pub mod submitter;
pub mod workflow;

pub use error::{ValidationError, WorkflowError};
pub use workflow::{Workflow, WorkflowStatus};
