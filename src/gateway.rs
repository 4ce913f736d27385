//! Chain capability seam: the opaque token and batch-airdrop contract surface.
//!
//! The workflow only ever talks to [`ChainGateway`]. The production
//! implementation drives an ethers provider/signer stack; tests script a
//! mock. Errors come back pre-classified so the state machine never has to
//! guess whether a failure was the user declining or the network falling
//! over.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::{parse_abi, Abi};
use ethers::contract::Contract;
use ethers::providers::Middleware;
use ethers::types::{Address, TxHash, U256, U64};
use thiserror::Error;
use tokio::time::{sleep, Duration};
use tracing::debug;

/// Errors from the chain surface, classified for the workflow.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The wallet declined to sign the request.
    #[error("rejected by user")]
    Rejected,
    /// Transport, RPC or contract-read failure.
    #[error("{0}")]
    Network(String),
}

/// A broadcast transaction that has not been included yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxHandle(pub TxHash);

/// On-chain outcome of an included transaction.
#[derive(Debug, Clone)]
pub struct TxOutcome {
    pub succeeded: bool,
    /// Chain-reported reason, when one is available.
    pub revert_reason: Option<String>,
}

/// ERC-20 metadata, display-only. Missing fields degrade the preview but
/// never block submission.
#[derive(Debug, Clone, Default)]
pub struct TokenMetadata {
    pub name: Option<String>,
    pub decimals: Option<u8>,
}

/// The external collaborators as one capability: `allowance`, `approve` and
/// `airdropERC20`, plus inclusion waiting. `approve` and `airdrop_erc20`
/// return once the wallet has signed and the transaction is broadcast.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, GatewayError>;

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, GatewayError>;

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHandle, GatewayError>;

    async fn airdrop_erc20(
        &self,
        target: Address,
        token: Address,
        recipients: Vec<Address>,
        amounts: Vec<U256>,
        total: U256,
    ) -> Result<TxHandle, GatewayError>;

    async fn wait_for_inclusion(&self, tx: TxHandle) -> Result<TxOutcome, GatewayError>;
}

/// EIP-1193 user-rejection classification. Wallets phrase the decline in a
/// few known ways; everything else is a network problem.
fn classify(err: impl fmt::Display) -> GatewayError {
    let msg = err.to_string();
    let lower = msg.to_lowercase();
    if lower.contains("user rejected")
        || lower.contains("user denied")
        || lower.contains("rejected by user")
        || lower.contains("code: 4001")
    {
        GatewayError::Rejected
    } else {
        GatewayError::Network(msg)
    }
}

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(150);

/// Production gateway over an ethers middleware stack (provider + signer).
pub struct EthersGateway<M> {
    client: Arc<M>,
    erc20_abi: Abi,
    airdrop_abi: Abi,
}

impl<M: Middleware + 'static> EthersGateway<M> {
    pub fn new(client: Arc<M>) -> anyhow::Result<Self> {
        let erc20_abi = parse_abi(&[
            "function name() external view returns (string)",
            "function decimals() external view returns (uint8)",
            "function allowance(address owner, address spender) external view returns (uint256)",
            "function approve(address spender, uint256 amount) external returns (bool)",
        ])?;
        let airdrop_abi = parse_abi(&[
            "function airdropERC20(address tokenAddress, address[] recipients, uint256[] amounts, uint256 totalAmount) external",
        ])?;
        Ok(Self {
            client,
            erc20_abi,
            airdrop_abi,
        })
    }

    fn erc20(&self, token: Address) -> Contract<M> {
        Contract::new(token, self.erc20_abi.clone(), Arc::clone(&self.client))
    }

    fn airdrop_contract(&self, target: Address) -> Contract<M> {
        Contract::new(target, self.airdrop_abi.clone(), Arc::clone(&self.client))
    }
}

#[async_trait]
impl<M: Middleware + 'static> ChainGateway for EthersGateway<M> {
    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, GatewayError> {
        let contract = self.erc20(token);
        let name = match contract.method::<_, String>("name", ()) {
            Ok(call) => call.call().await.ok(),
            Err(_) => None,
        };
        let decimals = match contract.method::<_, u8>("decimals", ()) {
            Ok(call) => call.call().await.ok(),
            Err(_) => None,
        };
        Ok(TokenMetadata { name, decimals })
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, GatewayError> {
        let call = self
            .erc20(token)
            .method::<_, U256>("allowance", (owner, spender))
            .map_err(classify)?;
        call.call().await.map_err(classify)
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHandle, GatewayError> {
        let call = self
            .erc20(token)
            .method::<_, bool>("approve", (spender, amount))
            .map_err(classify)?;
        let pending = call.send().await.map_err(classify)?;
        debug!(tx = ?pending.tx_hash(), "approval broadcast");
        Ok(TxHandle(pending.tx_hash()))
    }

    async fn airdrop_erc20(
        &self,
        target: Address,
        token: Address,
        recipients: Vec<Address>,
        amounts: Vec<U256>,
        total: U256,
    ) -> Result<TxHandle, GatewayError> {
        let call = self
            .airdrop_contract(target)
            .method::<_, ()>("airdropERC20", (token, recipients, amounts, total))
            .map_err(classify)?;
        let pending = call.send().await.map_err(classify)?;
        debug!(tx = ?pending.tx_hash(), "airdrop broadcast");
        Ok(TxHandle(pending.tx_hash()))
    }

    async fn wait_for_inclusion(&self, tx: TxHandle) -> Result<TxOutcome, GatewayError> {
        loop {
            match self.client.get_transaction_receipt(tx.0).await {
                Ok(Some(receipt)) => {
                    let succeeded = receipt.status == Some(U64::one());
                    // Receipts carry no revert string; wallets/front ends that
                    // have one can surface it through their own gateway impl.
                    return Ok(TxOutcome {
                        succeeded,
                        revert_reason: None,
                    });
                }
                Ok(None) => sleep(RECEIPT_POLL_INTERVAL).await,
                Err(e) => return Err(classify(e)),
            }
        }
    }
}
