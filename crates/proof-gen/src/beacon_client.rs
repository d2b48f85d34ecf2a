//! Beacon API HTTP Client
//!
//! Fetches SSZ-encoded signed blocks and block roots from a beacon node.

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::beacon_block::{decode_signed_block, DecodedBlock};
use crate::layout::Fork;
use crate::proof::ProofError;
use crate::types::{parse_hex32, Hash32};

/// Response header naming the fork of an SSZ block.
pub const CONSENSUS_VERSION_HEADER: &str = "Eth-Consensus-Version";

/// Errors from beacon API operations
#[derive(Debug, Error)]
pub enum BeaconClientError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("Beacon node reports fork '{reported}', expected {expected}")]
    ForkMismatch { expected: Fork, reported: String },

    #[error("Block decode failed: {0}")]
    Decode(#[from] ProofError),
}

/// Raw SSZ bytes of a signed block as served by the node.
#[derive(Debug, Clone)]
pub struct SignedBlockSsz {
    pub bytes: Vec<u8>,
    /// Value of the `Eth-Consensus-Version` header, when sent.
    pub consensus_version: Option<String>,
}

/// Client for interacting with the Beacon API
#[derive(Debug, Clone)]
pub struct BeaconClient {
    client: Client,
    base_url: String,
}

impl BeaconClient {
    /// Create a new beacon client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the beacon node (e.g., `http://localhost:5052`)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a signed beacon block as SSZ bytes
    ///
    /// # Arguments
    /// * `block_id` - Block identifier (slot number, root, "head", "finalized", etc.)
    ///
    /// # Errors
    /// Returns error if the request fails or the block is not found
    #[instrument(skip(self))]
    pub async fn get_block_ssz(&self, block_id: &str) -> Result<SignedBlockSsz, BeaconClientError> {
        let url = format!("{}/eth/v2/beacon/blocks/{block_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/octet-stream")
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BeaconClientError::BlockNotFound(block_id.to_string()));
        }

        if !response.status().is_success() {
            return Err(BeaconClientError::InvalidResponse(format!(
                "Unexpected status: {}",
                response.status()
            )));
        }

        let consensus_version = response
            .headers()
            .get(CONSENSUS_VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);

        let bytes = response.bytes().await?.to_vec();
        debug!(
            bytes = bytes.len(),
            version = consensus_version.as_deref().unwrap_or("unknown"),
            "Fetched signed block"
        );

        Ok(SignedBlockSsz {
            bytes,
            consensus_version,
        })
    }

    /// Fetch and decode a signed block of a known fork
    ///
    /// # Errors
    /// Returns [`BeaconClientError::ForkMismatch`] if the node labels the
    /// block with a different fork, and [`BeaconClientError::Decode`] if the
    /// bytes are not a block of `fork`.
    #[instrument(skip(self))]
    pub async fn get_block(
        &self,
        block_id: &str,
        fork: Fork,
    ) -> Result<DecodedBlock, BeaconClientError> {
        let ssz = self.get_block_ssz(block_id).await?;
        check_consensus_version(fork, ssz.consensus_version.as_deref())?;
        Ok(decode_signed_block(fork, &ssz.bytes)?)
    }

    /// Fetch the hash tree root of a block
    ///
    /// # Errors
    /// Returns error if the request fails or the block is not found
    #[instrument(skip(self))]
    pub async fn get_block_root(&self, block_id: &str) -> Result<Hash32, BeaconClientError> {
        let url = format!("{}/eth/v1/beacon/blocks/{block_id}/root", self.base_url);

        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BeaconClientError::BlockNotFound(block_id.to_string()));
        }

        if !response.status().is_success() {
            return Err(BeaconClientError::InvalidResponse(format!(
                "Unexpected status: {}",
                response.status()
            )));
        }

        #[derive(Deserialize)]
        struct RootResponse {
            data: RootData,
        }

        #[derive(Deserialize)]
        struct RootData {
            root: String,
        }

        let resp: RootResponse = response.json().await?;
        parse_hex32(&resp.data.root).map_err(BeaconClientError::InvalidResponse)
    }
}

/// Accept a missing version header; reject one that names another fork.
fn check_consensus_version(expected: Fork, reported: Option<&str>) -> Result<(), BeaconClientError> {
    let Some(reported) = reported else {
        return Ok(());
    };
    match reported.parse::<Fork>() {
        Ok(fork) if fork == expected => Ok(()),
        _ => Err(BeaconClientError::ForkMismatch {
            expected,
            reported: reported.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon_block::deneb;
    use crate::tree::TreeNode;
    use ssz_rs::prelude::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn deneb_block_bytes() -> (Vec<u8>, [u8; 32]) {
        let mut signed = deneb::SignedBeaconBlock::default();
        signed.message.slot = 321;
        signed.message.body.execution_payload.state_root = [0x42; 32];
        let root: [u8; 32] = signed.message.hash_tree_root().unwrap().into();
        (ssz_rs::serialize(&signed).unwrap(), root)
    }

    #[test]
    fn test_check_consensus_version() {
        assert!(check_consensus_version(Fork::Deneb, None).is_ok());
        assert!(check_consensus_version(Fork::Deneb, Some("deneb")).is_ok());
        assert!(check_consensus_version(Fork::Electra, Some("fulu")).is_ok());
        assert!(matches!(
            check_consensus_version(Fork::Electra, Some("deneb")),
            Err(BeaconClientError::ForkMismatch { .. })
        ));
        assert!(matches!(
            check_consensus_version(Fork::Deneb, Some("capella")),
            Err(BeaconClientError::ForkMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_block_decodes_ssz() {
        let server = MockServer::start().await;
        let (bytes, root) = deneb_block_bytes();

        Mock::given(method("GET"))
            .and(path("/eth/v2/beacon/blocks/finalized"))
            .and(header("accept", "application/octet-stream"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(CONSENSUS_VERSION_HEADER, "deneb")
                    .set_body_bytes(bytes),
            )
            .mount(&server)
            .await;

        let client = BeaconClient::new(server.uri());
        let block = client.get_block("finalized", Fork::Deneb).await.unwrap();
        assert_eq!(block.slot, 321);
        assert_eq!(block.execution_state_root, [0x42; 32]);
        assert_eq!(block.message.merkle_root(), root);
    }

    #[tokio::test]
    async fn test_get_block_rejects_other_fork() {
        let server = MockServer::start().await;
        let (bytes, _) = deneb_block_bytes();

        Mock::given(method("GET"))
            .and(path("/eth/v2/beacon/blocks/head"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(CONSENSUS_VERSION_HEADER, "deneb")
                    .set_body_bytes(bytes),
            )
            .mount(&server)
            .await;

        let client = BeaconClient::new(server.uri());
        let err = client.get_block("head", Fork::Electra).await.unwrap_err();
        assert!(matches!(err, BeaconClientError::ForkMismatch { .. }));
    }

    #[tokio::test]
    async fn test_missing_block_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/eth/v2/beacon/blocks/12345"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = BeaconClient::new(server.uri());
        let err = client.get_block_ssz("12345").await.unwrap_err();
        assert!(matches!(err, BeaconClientError::BlockNotFound(id) if id == "12345"));
    }

    #[tokio::test]
    async fn test_server_error_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/eth/v2/beacon/blocks/head"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = BeaconClient::new(format!("{}/", server.uri()));
        let err = client.get_block_ssz("head").await.unwrap_err();
        assert!(matches!(err, BeaconClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_get_block_root() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/eth/v1/beacon/blocks/head/root"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "execution_optimistic": false,
                "finalized": false,
                "data": {
                    "root": "0x0102030405060708091011121314151617181920212223242526272829303132"
                }
            })))
            .mount(&server)
            .await;

        let client = BeaconClient::new(server.uri());
        let root = client.get_block_root("head").await.unwrap();
        assert_eq!(root[0], 0x01);
        assert_eq!(root[31], 0x32);
    }
}
