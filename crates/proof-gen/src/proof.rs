//! Generalized-index Merkle proofs.
//!
//! [`extract_proof`] walks a tree from its root to the node addressed by a
//! generalized index, collecting the sibling of every node on the way.
//! [`verify_merkle_proof`] runs the walk backwards, hashing the leaf up with
//! those siblings, and compares the result with the claimed root.
//!
//! Generation failures are errors. A proof that does not verify is not: the
//! verifier answers `false` and leaves the decision to the caller.

use serde::{Deserialize, Serialize};
use ssz_rs::prelude::MerkleizationError;
use thiserror::Error;
use tracing::debug;

use crate::gindex::GeneralizedIndex;
use crate::tree::{hash_pair, TreeNode};
use crate::types::{hex_bytes32, proof_vec_serde, to_hex, Hash32};

/// Errors that can occur during proof generation.
#[derive(Error, Debug)]
pub enum ProofError {
    #[error("Invalid container layout: {0}")]
    InvalidLayout(String),

    #[error("Invalid generalized index {0}")]
    InvalidIndex(u64),

    #[error("Tree traversal failed at depth {depth} of generalized index {gindex}: node has no children")]
    Traversal { gindex: GeneralizedIndex, depth: u32 },

    #[error("Proof mismatch: expected leaf {}, reached {}", to_hex(.expected), to_hex(.actual))]
    ProofMismatch { expected: Hash32, actual: Hash32 },

    #[error("SSZ decode error: {0}")]
    Decode(String),

    #[error("Merkleization error: {0:?}")]
    Merkleization(MerkleizationError),
}

/// A Merkle proof addressed by generalized index.
///
/// `siblings` run from the level just below the root down to the leaf level,
/// so `siblings.len() == index.depth()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    #[serde(with = "hex_bytes32")]
    pub root: Hash32,

    #[serde(with = "hex_bytes32")]
    pub leaf: Hash32,

    pub index: GeneralizedIndex,

    #[serde(with = "proof_vec_serde")]
    pub siblings: Vec<Hash32>,
}

impl MerkleProof {
    /// Recompute the root from leaf, index and siblings.
    #[must_use]
    pub fn verify(&self) -> bool {
        verify_merkle_proof(&self.root, &self.leaf, self.index, &self.siblings)
    }
}

/// Walk from `root` to the node at `index`, collecting sibling roots.
///
/// The reached node's root becomes the proof's leaf.
///
/// # Errors
/// Returns [`ProofError::Traversal`] if the tree ends before the index does.
pub fn extract_proof<N: TreeNode>(
    root: &N,
    index: GeneralizedIndex,
) -> Result<MerkleProof, ProofError> {
    let mut siblings = Vec::with_capacity(index.depth() as usize);
    let mut node = root;

    for (depth, go_right) in (0_u32..).zip(index.path()) {
        let (complement, next) = if go_right {
            (node.left(), node.right())
        } else {
            (node.right(), node.left())
        };
        let (Some(complement), Some(next)) = (complement, next) else {
            return Err(ProofError::Traversal {
                gindex: index,
                depth,
            });
        };
        siblings.push(complement.merkle_root());
        node = next;
    }

    debug!(gindex = %index, siblings = siblings.len(), "Extracted Merkle branch");

    Ok(MerkleProof {
        root: root.merkle_root(),
        leaf: node.merkle_root(),
        index,
        siblings,
    })
}

/// Build a proof for `index` and require the reached leaf to equal
/// `expected_leaf`.
///
/// # Errors
/// Returns [`ProofError::Traversal`] as [`extract_proof`] does, and
/// [`ProofError::ProofMismatch`] if the reached node is not the expected
/// leaf. No proof is returned in either case.
pub fn build_proof<N: TreeNode>(
    root: &N,
    index: GeneralizedIndex,
    expected_leaf: &Hash32,
) -> Result<MerkleProof, ProofError> {
    let proof = extract_proof(root, index)?;
    if proof.leaf != *expected_leaf {
        return Err(ProofError::ProofMismatch {
            expected: *expected_leaf,
            actual: proof.leaf,
        });
    }
    Ok(proof)
}

/// Check that `leaf` sits at `index` under `root` given the sibling list.
///
/// `siblings` are ordered root to leaf. Returns `false` for any mismatch,
/// including a sibling count that does not match the index depth.
#[must_use]
pub fn verify_merkle_proof(
    root: &Hash32,
    leaf: &Hash32,
    index: GeneralizedIndex,
    siblings: &[Hash32],
) -> bool {
    if siblings.len() != index.depth() as usize {
        return false;
    }

    let computed = index
        .path()
        .rev()
        .zip(siblings.iter().rev())
        .fold(*leaf, |running, (went_right, sibling)| {
            if went_right {
                hash_pair(sibling, &running)
            } else {
                hash_pair(&running, sibling)
            }
        });

    computed == *root
}
