//! SSZ beacon block schemas and their conversion into a navigable tree.
//!
//! Blocks decode into typed `ssz_rs` containers. Only the containers on the
//! `block -> body -> execution_payload` path are expanded into branch
//! nodes; every other field collapses into a leaf holding its hash tree
//! root, which is all a proof along that path needs.

pub mod common;
pub mod deneb;
pub mod electra;

use ssz_rs::prelude::*;
use tracing::debug;

use crate::layout::Fork;
use crate::proof::ProofError;
use crate::tree::BackingNode;
use crate::types::Hash32;

/// A container whose fields can be turned into tree nodes in schema order.
pub trait ContainerFields {
    const FIELD_COUNT: usize;

    /// One node per field, in declaration order.
    ///
    /// # Errors
    /// Returns [`ProofError::Merkleization`] if a field cannot be hashed.
    fn field_nodes(&self) -> Result<Vec<BackingNode>, ProofError>;

    /// Merkleize the fields at the container's cover depth.
    ///
    /// # Errors
    /// Propagates [`ContainerFields::field_nodes`] failures.
    fn to_backing(&self) -> Result<BackingNode, ProofError> {
        let fields = self.field_nodes()?;
        debug_assert_eq!(fields.len(), Self::FIELD_COUNT);
        Ok(BackingNode::from_fields(fields))
    }
}

/// A block message that can report its own execution state root.
pub trait BeaconBlockMessage: ContainerFields {
    fn slot(&self) -> u64;

    /// `body.execution_payload.state_root` read from the typed value.
    fn execution_state_root(&self) -> Hash32;
}

pub(crate) fn leaf<T: HashTreeRoot>(value: &T) -> Result<BackingNode, ProofError> {
    let root = value.hash_tree_root().map_err(ProofError::Merkleization)?;
    Ok(BackingNode::leaf(root.into()))
}

/// A decoded block message, ready for proof generation.
#[derive(Debug, Clone)]
pub struct DecodedBlock {
    pub fork: Fork,
    pub slot: u64,
    /// Tree of the `BeaconBlock` message (the signature is not part of it).
    pub message: BackingNode,
    /// State root as read by the decoder, independent of any layout.
    pub execution_state_root: Hash32,
}

impl DecodedBlock {
    /// Build the tree of a typed block message.
    ///
    /// # Errors
    /// Returns [`ProofError::Merkleization`] if a field cannot be hashed.
    pub fn from_message<B: BeaconBlockMessage>(fork: Fork, block: &B) -> Result<Self, ProofError> {
        Ok(Self {
            fork,
            slot: block.slot(),
            message: block.to_backing()?,
            execution_state_root: block.execution_state_root(),
        })
    }
}

/// Decode SSZ bytes of a `SignedBeaconBlock` for `fork`.
///
/// # Errors
/// Returns [`ProofError::Decode`] if the bytes are not a valid signed block
/// of that fork.
pub fn decode_signed_block(fork: Fork, bytes: &[u8]) -> Result<DecodedBlock, ProofError> {
    let decoded = match fork {
        Fork::Deneb => {
            let signed: deneb::SignedBeaconBlock = ssz_rs::deserialize(bytes)
                .map_err(|e| ProofError::Decode(format!("deneb signed block: {e:?}")))?;
            DecodedBlock::from_message(fork, &signed.message)?
        }
        Fork::Electra => {
            let signed: electra::SignedBeaconBlock = ssz_rs::deserialize(bytes)
                .map_err(|e| ProofError::Decode(format!("electra signed block: {e:?}")))?;
            DecodedBlock::from_message(fork, &signed.message)?
        }
    };

    debug!(
        fork = %fork,
        slot = decoded.slot,
        bytes = bytes.len(),
        "Decoded signed beacon block"
    );

    Ok(decoded)
}
