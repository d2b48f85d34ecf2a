//! Beacon block state root proofs.
//!
//! Proves `body.execution_payload.state_root` against the hash tree root of
//! a `BeaconBlock` message, and reads the execution block number and
//! timestamp from the same tree so the proof can be linked to an execution
//! block.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::beacon_block::DecodedBlock;
use crate::container::ContainerView;
use crate::gindex::GeneralizedIndex;
use crate::layout::{positions, ContainerLayout};
use crate::proof::{build_proof, verify_merkle_proof, MerkleProof, ProofError};
use crate::tree::TreeNode;
use crate::types::{hex_bytes32, proof_vec_serde, to_hex, Hash32};

/// Proof that an execution state root is committed to by a beacon block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconProofResult {
    /// Hash tree root of the `BeaconBlock` message
    #[serde(with = "hex_bytes32")]
    pub root: Hash32,

    /// The execution state root
    #[serde(with = "hex_bytes32")]
    pub leaf: Hash32,

    pub index: GeneralizedIndex,

    /// Siblings, root to leaf
    #[serde(with = "proof_vec_serde")]
    pub proof: Vec<Hash32>,

    pub block_number: u64,
    pub timestamp: u64,
    pub slot: u64,
}

impl BeaconProofResult {
    #[must_use]
    pub fn verify(&self) -> bool {
        verify_merkle_proof(&self.root, &self.leaf, self.index, &self.proof)
    }

    #[must_use]
    pub fn to_merkle_proof(&self) -> MerkleProof {
        MerkleProof {
            root: self.root,
            leaf: self.leaf,
            index: self.index,
            siblings: self.proof.clone(),
        }
    }

    /// Emit the result at info level, one event for the header fields and
    /// one per sibling, then the verifier's verdict.
    pub fn log(&self) {
        info!(
            root = %to_hex(&self.root),
            leaf = %to_hex(&self.leaf),
            gindex = %self.index,
            slot = self.slot,
            block_number = self.block_number,
            timestamp = self.timestamp,
            siblings = self.proof.len(),
            "Beacon state root proof"
        );
        for (level, sibling) in self.proof.iter().enumerate() {
            info!(level, sibling = %to_hex(sibling), "Proof sibling");
        }
        info!(valid = self.verify(), "Beacon proof verification");
    }
}

/// Prove the execution state root inside a merkleized `BeaconBlock`.
///
/// `expected_state_root` is the state root as known to the decoder. The
/// node reached by the generalized index must equal it, which catches a
/// layout that does not describe the block.
///
/// # Errors
/// - [`ProofError::InvalidLayout`] if the layout cannot hold the path
/// - [`ProofError::Traversal`] if the tree is shallower than the layout
/// - [`ProofError::ProofMismatch`] if the layout addresses the wrong node
/// - [`ProofError::Decode`] if block number, timestamp or slot are not
///   `uint64` chunks
#[instrument(skip(block, expected_state_root), fields(fork = %layout.fork))]
pub fn build_beacon_proof<N: TreeNode>(
    block: &N,
    layout: &ContainerLayout,
    expected_state_root: &Hash32,
) -> Result<BeaconProofResult, ProofError> {
    layout.validate()?;
    let index = layout.state_root_gindex()?;
    let proof = build_proof(block, index, expected_state_root)?;

    let block_view = ContainerView::new(block, layout.beacon_block);
    let payload = block_view
        .container_at(positions::BEACON_BLOCK_BODY, layout.beacon_block_body)?
        .container_at(positions::EXECUTION_PAYLOAD, layout.execution_payload)?;

    let result = BeaconProofResult {
        root: proof.root,
        leaf: proof.leaf,
        index: proof.index,
        proof: proof.siblings,
        block_number: payload.uint64_at(positions::EXECUTION_BLOCK_NUMBER)?,
        timestamp: payload.uint64_at(positions::EXECUTION_TIMESTAMP)?,
        slot: block_view.uint64_at(positions::BEACON_BLOCK_SLOT)?,
    };

    info!(
        gindex = %result.index,
        slot = result.slot,
        block_number = result.block_number,
        "Built beacon state root proof"
    );

    Ok(result)
}

impl DecodedBlock {
    /// Prove this block's execution state root under `layout`, or under the
    /// built-in layout of the block's fork.
    ///
    /// # Errors
    /// See [`build_beacon_proof`].
    pub fn prove(&self, layout: Option<&ContainerLayout>) -> Result<BeaconProofResult, ProofError> {
        let layout = layout
            .copied()
            .unwrap_or_else(|| ContainerLayout::for_fork(self.fork));
        build_beacon_proof(&self.message, &layout, &self.execution_state_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Fork;
    use crate::tree::BackingNode;

    fn uint64_chunk(value: u64) -> Hash32 {
        let mut chunk = [0u8; 32];
        chunk[..8].copy_from_slice(&value.to_le_bytes());
        chunk
    }

    /// A deneb-shaped block tree built straight from field chunks.
    fn synthetic_block(state_root: Hash32, block_number: u64, timestamp: u64) -> BackingNode {
        let mut payload: Vec<BackingNode> = (0u8..17)
            .map(|i| BackingNode::leaf([i; 32]))
            .collect();
        payload[positions::EXECUTION_STATE_ROOT] = BackingNode::leaf(state_root);
        payload[positions::EXECUTION_BLOCK_NUMBER] = BackingNode::leaf(uint64_chunk(block_number));
        payload[positions::EXECUTION_TIMESTAMP] = BackingNode::leaf(uint64_chunk(timestamp));

        let mut body: Vec<BackingNode> = (0u8..12)
            .map(|i| BackingNode::leaf([0x80 | i; 32]))
            .collect();
        body[positions::EXECUTION_PAYLOAD] = BackingNode::from_fields(payload);

        BackingNode::from_fields(vec![
            BackingNode::leaf(uint64_chunk(1234)),
            BackingNode::leaf(uint64_chunk(5)),
            BackingNode::leaf([0xee; 32]),
            BackingNode::leaf([0xff; 32]),
            BackingNode::from_fields(body),
        ])
    }

    #[test]
    fn test_build_beacon_proof() {
        let state_root = [0x5a; 32];
        let block = synthetic_block(state_root, 100, 1_700_000_000);
        let layout = ContainerLayout::for_fork(Fork::Deneb);

        let result = build_beacon_proof(&block, &layout, &state_root).unwrap();
        assert_eq!(result.root, block.merkle_root());
        assert_eq!(result.leaf, state_root);
        assert_eq!(result.index.value(), 6434);
        assert_eq!(result.proof.len(), 12);
        assert_eq!(result.block_number, 100);
        assert_eq!(result.timestamp, 1_700_000_000);
        assert_eq!(result.slot, 1234);
        assert!(result.verify());
        assert!(result.to_merkle_proof().verify());
    }

    #[test]
    fn test_wrong_expected_root_is_rejected() {
        let block = synthetic_block([0x5a; 32], 1, 2);
        let layout = ContainerLayout::for_fork(Fork::Deneb);
        let err = build_beacon_proof(&block, &layout, &[0x5b; 32]).unwrap_err();
        assert!(matches!(err, ProofError::ProofMismatch { .. }));
    }

    #[test]
    fn test_shallow_payload_layout_is_a_mismatch() {
        let state_root = [0x5a; 32];
        let block = synthetic_block(state_root, 1, 2);
        // 10 payload fields -> depth 4, one level short of the real payload
        let layout = ContainerLayout {
            execution_payload: 10,
            ..ContainerLayout::for_fork(Fork::Deneb)
        };
        let err = build_beacon_proof(&block, &layout, &state_root).unwrap_err();
        assert!(matches!(err, ProofError::ProofMismatch { .. }));
    }

    #[test]
    fn test_deep_body_layout_fails_traversal() {
        let state_root = [0x5a; 32];
        let block = synthetic_block(state_root, 1, 2);
        let layout = ContainerLayout {
            beacon_block_body: 32,
            ..ContainerLayout::for_fork(Fork::Deneb)
        };
        let err = build_beacon_proof(&block, &layout, &state_root).unwrap_err();
        assert!(matches!(err, ProofError::Traversal { .. }));
    }

    #[test]
    fn test_result_json_shape() {
        let state_root = [0x5a; 32];
        let block = synthetic_block(state_root, 7, 8);
        let result =
            build_beacon_proof(&block, &ContainerLayout::for_fork(Fork::Deneb), &state_root)
                .unwrap();

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["index"], 6434);
        assert_eq!(value["leaf"], to_hex(&state_root));
        assert_eq!(value["proof"].as_array().unwrap().len(), 12);

        let decoded: BeaconProofResult = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, result);
    }

    #[test]
    fn test_tampered_result_json() {
        let state_root = [0x5a; 32];
        let block = synthetic_block(state_root, 7, 8);
        let result =
            build_beacon_proof(&block, &ContainerLayout::for_fork(Fork::Deneb), &state_root)
                .unwrap();
        let value = serde_json::to_value(&result).unwrap();

        let mut zero_index = value.clone();
        zero_index["index"] = 0.into();
        assert!(serde_json::from_value::<BeaconProofResult>(zero_index).is_err());

        let mut deepest_index = value.clone();
        deepest_index["index"] = u64::MAX.into();
        let decoded: BeaconProofResult = serde_json::from_value(deepest_index).unwrap();
        assert!(!decoded.verify());

        let mut short_proof = value;
        short_proof["proof"].as_array_mut().unwrap().truncate(11);
        let decoded: BeaconProofResult = serde_json::from_value(short_proof).unwrap();
        assert!(!decoded.verify());
    }
}
