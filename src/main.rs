//! batchsend console front end.
//!
//! Plays the role of the browser page around the workflow core: collects the
//! three raw inputs (falling back to the persisted draft), shows the live
//! total preview, then drives one submission and prints every status
//! transition as it happens.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use ethers::utils::format_units;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use batchsend::amounts;
use batchsend::chains::ChainTargets;
use batchsend::draft::DraftStore;
use batchsend::gateway::{ChainGateway, EthersGateway};
use batchsend::workflow::Workflow;

#[derive(Debug, Parser)]
#[command(
    name = "batchsend",
    about = "Batch-send an ERC-20 token to many recipients through an on-chain airdrop contract"
)]
struct Args {
    /// JSON-RPC endpoint of the target chain
    #[arg(long, default_value = "http://127.0.0.1:8545")]
    rpc_url: String,

    /// Token contract address (falls back to the saved draft)
    #[arg(long)]
    token: Option<String>,

    /// Recipient addresses, comma/newline separated (falls back to the saved draft)
    #[arg(long)]
    recipients: Option<String>,

    /// Amounts in smallest token units, comma/newline separated (falls back to the saved draft)
    #[arg(long)]
    amounts: Option<String>,

    /// Data directory for the draft store and chain-target config
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Validate and preview only; do not touch the chain
    #[arg(long)]
    dry_run: bool,

    /// Clear the saved draft and exit
    #[arg(long)]
    clear_draft: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();

    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("batchsend"),
    };
    std::fs::create_dir_all(&data_dir).context("create data directory")?;

    // Storage opens before any draft read or write can happen.
    let drafts = DraftStore::open(data_dir.join("draft.db"))?;

    if args.clear_draft {
        drafts.clear()?;
        info!("draft cleared");
        return Ok(());
    }

    // CLI inputs override the draft and are persisted field by field on
    // change, like the input boxes they stand in for.
    let mut draft = drafts.load()?;
    if let Some(v) = args.token {
        if v != draft.token_address {
            drafts.set_token_address(&v)?;
        }
        draft.token_address = v;
    }
    if let Some(v) = args.recipients {
        if v != draft.recipients {
            drafts.set_recipients(&v)?;
        }
        draft.recipients = v;
    }
    if let Some(v) = args.amounts {
        if v != draft.amounts {
            drafts.set_amounts(&v)?;
        }
        draft.amounts = v;
    }

    // Live preview: lenient total, shown whether or not the inputs validate.
    let preview_total = amounts::calculate_total(&draft.amounts);
    info!(total_wei = %preview_total, "aggregate total (preview)");

    if args.dry_run {
        let batch = amounts::validate(&draft.token_address, &draft.recipients, &draft.amounts)?;
        info!(
            recipients = batch.recipients.len(),
            total = %batch.total,
            "inputs valid, not submitting (--dry-run)"
        );
        return Ok(());
    }

    let provider =
        Provider::<Http>::try_from(args.rpc_url.as_str()).context("parse rpc url")?;
    let chain_id = provider
        .get_chainid()
        .await
        .context("query chain id")?
        .as_u64();
    info!(chain_id, rpc = %args.rpc_url, "connected");

    // The wallet is an external collaborator: here a local key from the
    // environment, in a browser the injected wallet session.
    let key = std::env::var("BATCHSEND_PRIVATE_KEY")
        .context("BATCHSEND_PRIVATE_KEY is not set")?;
    let wallet: LocalWallet = key.trim().parse().context("parse private key")?;
    let wallet = wallet.with_chain_id(chain_id);
    let sender = wallet.address();
    let client = Arc::new(SignerMiddleware::new(provider, wallet));

    let targets = ChainTargets::load_or_create(data_dir.join("chains.json"))?;
    let gateway = EthersGateway::new(client)?;

    // Token metadata is display-only; fetch failures degrade the preview but
    // never block submission.
    if let Ok(token) = draft.token_address.trim().parse::<Address>() {
        match gateway.token_metadata(token).await {
            Ok(meta) => {
                info!(name = meta.name.as_deref().unwrap_or("-"), "token");
                match meta.decimals {
                    Some(decimals) => {
                        let human = format_units(preview_total, decimals as u32)
                            .unwrap_or_else(|_| "-".into());
                        info!(amount_tokens = %human, "aggregate total (tokens)");
                    }
                    None => warn!("token decimals unavailable, showing smallest units only"),
                }
            }
            Err(e) => warn!(error = %e, "token metadata unavailable"),
        }
    }

    let (workflow, mut updates) = Workflow::new(gateway, targets, chain_id, sender);
    let printer = tokio::spawn(async move {
        while let Some(status) = updates.recv().await {
            println!("status: {status}");
        }
    });

    let summary = workflow
        .submit(&draft.token_address, &draft.recipients, &draft.amounts)
        .await?;
    info!(
        tx = ?summary.airdrop_tx.0,
        recipients = summary.recipients,
        total = %summary.total,
        approval = ?summary.approval_tx.map(|t| t.0),
        "✅ airdrop confirmed"
    );

    drop(workflow);
    let _ = printer.await;
    Ok(())
}
