//! Beacon root to storage slot proof chain.
//!
//! A [`ProofChain`] pairs the beacon-side proof of an execution state root
//! with the execution-side storage proof taken at the same block. The two
//! halves only compose if they agree on the block number and state root.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::beacon_proof::BeaconProofResult;
use crate::execution::ProofData;
use crate::types::to_hex;

/// The two halves of a proof chain disagree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkageError {
    #[error("Block number mismatch: beacon proof is for {beacon}, storage proof for {execution}")]
    BlockNumber { beacon: u64, execution: u64 },

    #[error("State root mismatch: beacon proof proves {beacon}, storage proof uses {execution}")]
    StateRoot { beacon: String, execution: String },
}

/// Combined output of a proof generation run.
///
/// `beacon` is absent when no beacon node was configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofChain {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub beacon: Option<BeaconProofResult>,
    pub execution: ProofData,
}

impl ProofChain {
    #[must_use]
    pub const fn new(beacon: Option<BeaconProofResult>, execution: ProofData) -> Self {
        Self { beacon, execution }
    }

    /// Check that both halves describe the same execution block.
    ///
    /// # Errors
    /// Returns the first [`LinkageError`] found. A chain without a beacon
    /// half has nothing to link and passes.
    #[instrument(skip(self), fields(block_number = self.execution.block_number))]
    pub fn check_linkage(&self) -> Result<(), LinkageError> {
        let Some(beacon) = &self.beacon else {
            return Ok(());
        };

        if beacon.block_number != self.execution.block_number {
            return Err(LinkageError::BlockNumber {
                beacon: beacon.block_number,
                execution: self.execution.block_number,
            });
        }

        if beacon.leaf != self.execution.state_root.0 {
            return Err(LinkageError::StateRoot {
                beacon: to_hex(&beacon.leaf),
                execution: to_hex(self.execution.state_root.as_slice()),
            });
        }

        info!(slot = beacon.slot, "Beacon and storage proofs are linked");
        Ok(())
    }

    /// Recompute the beacon block root from the beacon half.
    ///
    /// `None` when the chain has no beacon half.
    #[must_use]
    pub fn verify_beacon(&self) -> Option<bool> {
        self.beacon.as_ref().map(BeaconProofResult::verify)
    }
}
