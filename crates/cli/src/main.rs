//! Beacon-anchored storage proof generator
//!
//! Proves a beacon block's execution state root, then collects the storage
//! proof for a contract slot at the execution block that root belongs to.

use std::path::PathBuf;

use alloy::primitives::{Address, U256};
use anyhow::{bail, Context, Result};
use clap::Parser;
use state_proof_gen::{
    BeaconClient, BeaconProofResult, ContainerLayout, ExecutionClient, Fork, ProofChain,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "generate-proof")]
#[command(about = "Generate a beacon block root -> storage slot proof chain")]
struct Args {
    /// Beacon node URL; without it only the storage proof is generated
    #[arg(long, env = "BEACON_URL")]
    beacon_url: Option<String>,

    /// Execution node JSON-RPC URL
    #[arg(long, env = "EXECUTION_URL")]
    execution_url: String,

    /// Contract whose storage is proven
    #[arg(long, env = "CONTRACT_ADDRESS", value_parser = parse_address)]
    contract: Address,

    /// Storage slot, decimal or 0x-prefixed hex
    #[arg(long, env = "STORAGE_SLOT", default_value = "0", value_parser = parse_slot)]
    storage_slot: U256,

    /// Beacon block to prove (slot, root, "head", "finalized", ...)
    #[arg(long, env = "BLOCK_ID", default_value = "finalized")]
    block_id: String,

    /// Execution block for the storage proof when no beacon node is used
    #[arg(long, env = "BLOCK_NUMBER")]
    block_number: Option<u64>,

    /// Fork of the beacon block (deneb, electra, fulu)
    #[arg(long, env = "FORK", value_parser = parse_fork)]
    fork: Fork,

    /// JSON file overriding the fork's container layout
    #[arg(long, env = "LAYOUT_FILE")]
    layout: Option<PathBuf>,

    /// Write the combined proof chain to this JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn parse_address(s: &str) -> Result<Address, String> {
    s.parse().map_err(|e| format!("invalid address: {e}"))
}

fn parse_slot(s: &str) -> Result<U256, String> {
    s.parse().map_err(|e| format!("invalid storage slot: {e}"))
}

fn parse_fork(s: &str) -> Result<Fork, String> {
    s.parse().map_err(|e: state_proof_gen::ProofError| e.to_string())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn load_layout(fork: Fork, path: Option<&PathBuf>) -> Result<ContainerLayout> {
    let Some(path) = path else {
        return Ok(ContainerLayout::for_fork(fork));
    };
    let layout = ContainerLayout::from_json_file(path)
        .with_context(|| format!("Failed to load layout from {}", path.display()))?;
    if layout.fork != fork {
        bail!(
            "Layout file is for {}, but --fork is {fork}",
            layout.fork
        );
    }
    Ok(layout)
}

async fn beacon_proof(
    beacon_url: &str,
    block_id: &str,
    layout: &ContainerLayout,
) -> Result<BeaconProofResult> {
    let client = BeaconClient::new(beacon_url);

    let block = client
        .get_block(block_id, layout.fork)
        .await
        .with_context(|| format!("Failed to fetch beacon block {block_id}"))?;

    let result = block
        .prove(Some(layout))
        .context("Failed to build beacon proof")?;
    result.log();

    // "finalized" and "head" move, so compare against the root of the slot
    // that was actually fetched.
    let node_root = client
        .get_block_root(&result.slot.to_string())
        .await
        .context("Failed to fetch beacon block root")?;
    if node_root != result.root {
        bail!(
            "Computed block root {} does not match node's {}",
            state_proof_gen::to_hex(&result.root),
            state_proof_gen::to_hex(&node_root)
        );
    }

    Ok(result)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(args.log_json);

    let layout = load_layout(args.fork, args.layout.as_ref())?;
    let gindex = layout.state_root_gindex()?;
    info!(
        fork = %layout.fork,
        gindex = %gindex,
        proof_length = layout.state_root_proof_length(),
        "Using container layout"
    );

    let beacon = match &args.beacon_url {
        Some(url) => Some(beacon_proof(url, &args.block_id, &layout).await?),
        None => {
            info!("Beacon node URL is not set, skipping beacon proof generation");
            None
        }
    };

    let block_number = match (&beacon, args.block_number) {
        (Some(beacon), Some(requested)) if beacon.block_number != requested => {
            warn!(
                requested,
                beacon = beacon.block_number,
                "Ignoring --block-number, the beacon block fixes the execution block"
            );
            Some(beacon.block_number)
        }
        (Some(beacon), _) => Some(beacon.block_number),
        (None, requested) => requested,
    };

    let execution = ExecutionClient::new(&args.execution_url)
        .context("Invalid execution URL")?
        .get_storage_proof(args.contract, args.storage_slot, block_number)
        .await
        .context("Failed to get storage proof")?;
    execution.log();

    let chain = ProofChain::new(beacon, execution);
    chain
        .check_linkage()
        .context("Beacon and storage proofs do not link")?;
    if chain.verify_beacon() == Some(false) {
        bail!("Beacon proof does not verify against its own root");
    }

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&chain)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Wrote proof chain");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_fork_is_required() {
        let err = Args::try_parse_from([
            "generate-proof",
            "--execution-url",
            "http://localhost:8545",
            "--contract",
            "0x45b924Ee3EE404E4a9E2a3AFD0AD357eFf79fC49",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn test_parse_full_args() {
        let args = Args::try_parse_from([
            "generate-proof",
            "--execution-url",
            "http://localhost:8545",
            "--contract",
            "0x45b924Ee3EE404E4a9E2a3AFD0AD357eFf79fC49",
            "--storage-slot",
            "0x10",
            "--fork",
            "fulu",
        ])
        .unwrap();
        assert_eq!(args.fork, Fork::Electra);
        assert_eq!(args.storage_slot, U256::from(16u64));
        assert_eq!(args.block_id, "finalized");
        assert!(args.beacon_url.is_none());
    }

    #[test]
    fn test_builtin_layout_without_file() {
        let layout = load_layout(Fork::Deneb, None).unwrap();
        assert_eq!(layout, ContainerLayout::for_fork(Fork::Deneb));
    }
}
