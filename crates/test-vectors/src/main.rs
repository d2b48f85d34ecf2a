//! Test Vector Generator
//!
//! Writes JSON vectors of beacon state root proofs for on-chain verifier
//! tests: valid proofs for each supported fork plus tampered copies that a
//! verifier must reject.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use state_proof_gen::beacon_block::{deneb, electra};
use state_proof_gen::{decode_signed_block, to_hex, verify_merkle_proof, BeaconProofResult, Fork};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "generate-test-vectors")]
#[command(about = "Generate beacon state root proof vectors for verifier tests")]
struct Args {
    /// Output directory for test vectors
    #[arg(short, long, default_value = "test-vectors")]
    output: PathBuf,

    /// Execution block number of the synthetic blocks
    #[arg(long, default_value = "7321055")]
    block_number: u64,

    /// Execution timestamp of the synthetic blocks
    #[arg(long, default_value = "1737000012")]
    timestamp: u64,
}

/// Test vector file format
#[derive(Debug, Serialize)]
struct TestVectorFile {
    /// Valid proofs, one per fork
    proofs: Vec<TestProof>,
    /// Tampered proofs for negative testing
    invalid_proofs: Vec<InvalidTestProof>,
}

#[derive(Debug, Serialize)]
struct TestProof {
    fork: Fork,
    #[serde(flatten)]
    result: BeaconProofResult,
}

#[derive(Debug, Serialize)]
struct InvalidTestProof {
    description: String,
    fork: Fork,
    root: String,
    leaf: String,
    index: u64,
    proof: Vec<String>,
}

impl InvalidTestProof {
    fn from_tampered(description: &str, fork: Fork, result: &BeaconProofResult) -> Result<Self> {
        if verify_merkle_proof(&result.root, &result.leaf, result.index, &result.proof) {
            anyhow::bail!("tampered vector '{description}' still verifies");
        }
        Ok(Self {
            description: description.to_string(),
            fork,
            root: to_hex(&result.root),
            leaf: to_hex(&result.leaf),
            index: result.index.value(),
            proof: result.proof.iter().map(|s| to_hex(s)).collect(),
        })
    }
}

fn state_root_for(fork: Fork) -> [u8; 32] {
    let mut root = [0u8; 32];
    for (i, byte) in root.iter_mut().enumerate() {
        *byte = (i as u8).wrapping_mul(31).wrapping_add(fork.name().len() as u8);
    }
    root
}

fn block_bytes(fork: Fork, args: &Args) -> Result<Vec<u8>> {
    let state_root = state_root_for(fork);
    let bytes = match fork {
        Fork::Deneb => {
            let mut signed = deneb::SignedBeaconBlock::default();
            signed.message.slot = 6_950_001;
            let payload = &mut signed.message.body.execution_payload;
            payload.state_root = state_root;
            payload.block_number = args.block_number;
            payload.timestamp = args.timestamp;
            ssz_rs::serialize(&signed)
        }
        Fork::Electra => {
            let mut signed = electra::SignedBeaconBlock::default();
            signed.message.slot = 11_650_001;
            let payload = &mut signed.message.body.execution_payload;
            payload.state_root = state_root;
            payload.block_number = args.block_number;
            payload.timestamp = args.timestamp;
            ssz_rs::serialize(&signed)
        }
    };
    bytes.map_err(|e| anyhow::anyhow!("Failed to serialize {fork} block: {e:?}"))
}

fn tampered(fork: Fork, result: &BeaconProofResult) -> Result<Vec<InvalidTestProof>> {
    let mut wrong_leaf = result.clone();
    wrong_leaf.leaf[0] ^= 0xff;

    let mut wrong_sibling = result.clone();
    wrong_sibling.proof[0][31] ^= 0x01;

    let mut short_proof = result.clone();
    short_proof.proof.pop();

    let mut wrong_root = result.clone();
    wrong_root.root = [0u8; 32];

    Ok(vec![
        InvalidTestProof::from_tampered("leaf modified", fork, &wrong_leaf)?,
        InvalidTestProof::from_tampered("top sibling modified", fork, &wrong_sibling)?,
        InvalidTestProof::from_tampered("proof truncated", fork, &short_proof)?,
        InvalidTestProof::from_tampered("zero root", fork, &wrong_root)?,
    ])
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    tracing::info!(
        output = %args.output.display(),
        block_number = args.block_number,
        timestamp = args.timestamp,
        "Generating test vectors"
    );

    std::fs::create_dir_all(&args.output)?;

    let mut file = TestVectorFile {
        proofs: Vec::new(),
        invalid_proofs: Vec::new(),
    };

    for fork in [Fork::Deneb, Fork::Electra] {
        let bytes = block_bytes(fork, &args)?;
        let block = decode_signed_block(fork, &bytes)
            .with_context(|| format!("Failed to decode {fork} block"))?;
        let result = block
            .prove(None)
            .with_context(|| format!("Failed to prove {fork} block"))?;

        tracing::info!(
            fork = %fork,
            root = %to_hex(&result.root),
            siblings = result.proof.len(),
            "Generated proof"
        );

        file.invalid_proofs.extend(tampered(fork, &result)?);
        file.proofs.push(TestProof { fork, result });
    }

    let output_path = args.output.join("beacon_state_root_proofs.json");
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(&output_path, json)?;

    tracing::info!(path = %output_path.display(), "Wrote test vectors");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Args {
        Args::try_parse_from(["generate-test-vectors"]).unwrap()
    }

    #[test]
    fn test_vectors_verify_and_tampered_copies_do_not() {
        let args = args();
        for fork in [Fork::Deneb, Fork::Electra] {
            let bytes = block_bytes(fork, &args).unwrap();
            let result = decode_signed_block(fork, &bytes).unwrap().prove(None).unwrap();
            assert!(result.verify());
            assert_eq!(result.leaf, state_root_for(fork));
            assert_eq!(result.block_number, 7_321_055);
            assert_eq!(tampered(fork, &result).unwrap().len(), 4);
        }
    }

    #[test]
    fn test_vector_json_shape() {
        let args = args();
        let bytes = block_bytes(Fork::Deneb, &args).unwrap();
        let result = decode_signed_block(Fork::Deneb, &bytes).unwrap().prove(None).unwrap();
        let value = serde_json::to_value(TestProof {
            fork: Fork::Deneb,
            result,
        })
        .unwrap();
        assert_eq!(value["fork"], "deneb");
        assert_eq!(value["index"], 6434);
        assert_eq!(value["proof"].as_array().unwrap().len(), 12);
    }
}
