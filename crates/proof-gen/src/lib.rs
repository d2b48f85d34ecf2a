//! # State Proof Generation Library
//!
//! Builds the proof chain that lets a contract trust a storage value of
//! another chain through a beacon block root:
//! - beacon block root -> `body.execution_payload.state_root` (SSZ Merkle proof)
//! - execution state root -> account and storage slot (`eth_getProof`)
//!
//! The SSZ side works over any [`TreeNode`] and is driven by a
//! [`ContainerLayout`], so a fork that only adds fields needs new field
//! counts, not new walker code.

pub mod beacon_block;
pub mod beacon_client;
pub mod beacon_proof;
pub mod chain;
pub mod container;
pub mod execution;
pub mod gindex;
pub mod layout;
pub mod proof;
pub mod tree;
pub mod types;

pub use beacon_block::{decode_signed_block, DecodedBlock};
pub use beacon_client::BeaconClient;
pub use beacon_proof::{build_beacon_proof, BeaconProofResult};
pub use chain::{LinkageError, ProofChain};
pub use container::{ContainerView, SszContainer};
pub use execution::{ExecutionClient, ProofData};
pub use gindex::{compose, concat_gindices, GeneralizedIndex, PathStep};
pub use layout::{ContainerLayout, Fork};
pub use proof::{build_proof, extract_proof, verify_merkle_proof, MerkleProof, ProofError};
pub use tree::{BackingNode, TreeNode};
pub use types::*;
