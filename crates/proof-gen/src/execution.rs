//! Execution-layer storage proof collection.
//!
//! Gathers what an on-chain verifier needs to check a storage slot against
//! an execution state root: the RLP-encoded block header (whose hash links
//! back to the block hash), the state root, and the `eth_getProof` account
//! and storage proofs taken at that exact block.

use alloy::consensus::Header;
use alloy::eips::{BlockId, BlockNumberOrTag};
use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::EIP1186AccountProofResponse;
use alloy::transports::TransportError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Errors from execution RPC operations
#[derive(Debug, Error)]
pub enum ExecutionClientError {
    #[error("RPC request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    #[error("No code at address {address} in block {block_number}")]
    NoCode { address: Address, block_number: u64 },

    #[error("Block not found: {0}")]
    BlockNotFound(BlockNumberOrTag),

    #[error("Header RLP hashes to {computed}, node reports block hash {reported}")]
    HeaderHashMismatch { reported: B256, computed: B256 },
}

/// Everything needed to verify a storage slot against a block's state root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofData {
    pub block_hash: B256,
    pub block_number: u64,
    /// RLP encoding of the full block header; `keccak256(header_rlp) == block_hash`
    pub header_rlp: Bytes,
    pub state_root: B256,
    pub proof: EIP1186AccountProofResponse,
}

impl ProofData {
    pub fn log(&self) {
        info!(
            block_number = self.block_number,
            block_hash = %self.block_hash,
            state_root = %self.state_root,
            header_rlp = %self.header_rlp,
            "Execution storage proof"
        );
        match serde_json::to_string_pretty(&self.proof) {
            Ok(text) => info!("Proof:\n{text}"),
            Err(e) => warn!(error = %e, "Could not render account proof"),
        }
    }
}

/// The 32-byte storage key of a slot number.
#[must_use]
pub fn storage_key(slot: U256) -> B256 {
    B256::from(slot.to_be_bytes::<32>())
}

/// RLP-encode a header and check it hashes to the block hash reported
/// alongside it.
///
/// # Errors
/// Returns [`ExecutionClientError::HeaderHashMismatch`] when the encoding
/// does not reproduce `reported_hash`.
pub fn encode_header(header: &Header, reported_hash: B256) -> Result<Bytes, ExecutionClientError> {
    let rlp = alloy::rlp::encode(header);
    let computed = keccak256(&rlp);
    if computed != reported_hash {
        return Err(ExecutionClientError::HeaderHashMismatch {
            reported: reported_hash,
            computed,
        });
    }
    Ok(Bytes::from(rlp))
}

/// Client for an execution node's JSON-RPC API
#[derive(Debug, Clone)]
pub struct ExecutionClient {
    rpc_url: reqwest::Url,
}

impl ExecutionClient {
    /// Create a new execution client
    ///
    /// # Errors
    /// Returns [`ExecutionClientError::InvalidUrl`] if `rpc_url` does not parse.
    pub fn new(rpc_url: &str) -> Result<Self, ExecutionClientError> {
        let rpc_url = rpc_url
            .parse()
            .map_err(|e| ExecutionClientError::InvalidUrl(format!("{rpc_url}: {e}")))?;
        Ok(Self { rpc_url })
    }

    /// Collect a storage proof for `slot` of the contract at `address`.
    ///
    /// The block is resolved first (`block_number`, or latest when `None`)
    /// and every later query is pinned to it.
    ///
    /// # Errors
    /// - [`ExecutionClientError::BlockNotFound`] if the node has no such block
    /// - [`ExecutionClientError::HeaderHashMismatch`] if the header does not
    ///   re-encode to the reported hash
    /// - [`ExecutionClientError::NoCode`] if no contract lives at `address`
    /// - [`ExecutionClientError::Transport`] on RPC failures
    #[instrument(skip(self))]
    pub async fn get_storage_proof(
        &self,
        address: Address,
        slot: U256,
        block_number: Option<u64>,
    ) -> Result<ProofData, ExecutionClientError> {
        let provider = ProviderBuilder::new().connect_http(self.rpc_url.clone());

        let tag = block_number.map_or(BlockNumberOrTag::Latest, BlockNumberOrTag::Number);
        let block = provider
            .get_block_by_number(tag)
            .await?
            .ok_or(ExecutionClientError::BlockNotFound(tag))?;

        let header = &block.header.inner;
        let number = header.number;
        let at = BlockId::number(number);
        debug!(block_number = number, block_hash = %block.header.hash, "Resolved block");

        let code = provider.get_code_at(address).block_id(at).await?;
        if code.is_empty() {
            return Err(ExecutionClientError::NoCode {
                address,
                block_number: number,
            });
        }

        let header_rlp = encode_header(header, block.header.hash)?;

        let proof = provider
            .get_proof(address, vec![storage_key(slot)])
            .block_id(at)
            .await?;

        info!(
            block_number = number,
            storage_proofs = proof.storage_proof.len(),
            "Collected storage proof"
        );

        Ok(ProofData {
            block_hash: block.header.hash,
            block_number: number,
            header_rlp,
            state_root: header.state_root,
            proof,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::b256;

    fn sample_header() -> Header {
        Header {
            number: 19_000_000,
            timestamp: 1_700_000_000,
            gas_limit: 30_000_000,
            state_root: b256!("0x5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a"),
            base_fee_per_gas: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_encode_header_matches_block_hash() {
        let header = sample_header();
        let rlp = encode_header(&header, header.hash_slow()).unwrap();
        assert_eq!(keccak256(&rlp), header.hash_slow());

        let decoded: Header = alloy::rlp::Decodable::decode(&mut rlp.as_ref()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_encode_header_rejects_wrong_hash() {
        let header = sample_header();
        let err = encode_header(&header, B256::ZERO).unwrap_err();
        assert!(matches!(
            err,
            ExecutionClientError::HeaderHashMismatch { reported, .. } if reported == B256::ZERO
        ));
    }

    #[test]
    fn test_storage_key_is_big_endian() {
        assert_eq!(storage_key(U256::ZERO), B256::ZERO);
        let key = storage_key(U256::from(0x0102u64));
        assert_eq!(key[30], 0x01);
        assert_eq!(key[31], 0x02);
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(matches!(
            ExecutionClient::new("not a url"),
            Err(ExecutionClientError::InvalidUrl(_))
        ));
        assert!(ExecutionClient::new("http://localhost:8545").is_ok());
    }
}
