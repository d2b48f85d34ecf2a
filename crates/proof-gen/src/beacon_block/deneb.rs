//! Deneb block schema.

use ssz_rs::prelude::*;

use super::common::{
    AttestationData, BlsSignature, Deposit, Eth1Data, ExecutionPayload, KzgCommitment,
    ProposerSlashing, Root, SignedBlsToExecutionChange, SignedVoluntaryExit, SyncAggregate,
    MAX_BLOB_COMMITMENTS_PER_BLOCK, MAX_BLS_TO_EXECUTION_CHANGES, MAX_DEPOSITS,
    MAX_PROPOSER_SLASHINGS, MAX_VALIDATORS_PER_COMMITTEE, MAX_VOLUNTARY_EXITS,
};
use super::{leaf, BeaconBlockMessage, ContainerFields};
use crate::proof::ProofError;
use crate::tree::BackingNode;
use crate::types::Hash32;

pub const MAX_ATTESTER_SLASHINGS: usize = 2;
pub const MAX_ATTESTATIONS: usize = 128;

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct Attestation {
    pub aggregation_bits: Bitlist<MAX_VALIDATORS_PER_COMMITTEE>,
    pub data: AttestationData,
    pub signature: BlsSignature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct IndexedAttestation {
    pub attesting_indices: List<u64, MAX_VALIDATORS_PER_COMMITTEE>,
    pub data: AttestationData,
    pub signature: BlsSignature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct AttesterSlashing {
    pub attestation_1: IndexedAttestation,
    pub attestation_2: IndexedAttestation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct BeaconBlockBody {
    pub randao_reveal: BlsSignature,
    pub eth1_data: Eth1Data,
    pub graffiti: [u8; 32],
    pub proposer_slashings: List<ProposerSlashing, MAX_PROPOSER_SLASHINGS>,
    pub attester_slashings: List<AttesterSlashing, MAX_ATTESTER_SLASHINGS>,
    pub attestations: List<Attestation, MAX_ATTESTATIONS>,
    pub deposits: List<Deposit, MAX_DEPOSITS>,
    pub voluntary_exits: List<SignedVoluntaryExit, MAX_VOLUNTARY_EXITS>,
    pub sync_aggregate: SyncAggregate,
    pub execution_payload: ExecutionPayload,
    pub bls_to_execution_changes: List<SignedBlsToExecutionChange, MAX_BLS_TO_EXECUTION_CHANGES>,
    pub blob_kzg_commitments: List<KzgCommitment, MAX_BLOB_COMMITMENTS_PER_BLOCK>,
}

impl ContainerFields for BeaconBlockBody {
    const FIELD_COUNT: usize = 12;

    fn field_nodes(&self) -> Result<Vec<BackingNode>, ProofError> {
        Ok(vec![
            leaf(&self.randao_reveal)?,
            leaf(&self.eth1_data)?,
            leaf(&self.graffiti)?,
            leaf(&self.proposer_slashings)?,
            leaf(&self.attester_slashings)?,
            leaf(&self.attestations)?,
            leaf(&self.deposits)?,
            leaf(&self.voluntary_exits)?,
            leaf(&self.sync_aggregate)?,
            self.execution_payload.to_backing()?,
            leaf(&self.bls_to_execution_changes)?,
            leaf(&self.blob_kzg_commitments)?,
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct BeaconBlock {
    pub slot: u64,
    pub proposer_index: u64,
    pub parent_root: Root,
    pub state_root: Root,
    pub body: BeaconBlockBody,
}

impl ContainerFields for BeaconBlock {
    const FIELD_COUNT: usize = 5;

    fn field_nodes(&self) -> Result<Vec<BackingNode>, ProofError> {
        Ok(vec![
            leaf(&self.slot)?,
            leaf(&self.proposer_index)?,
            leaf(&self.parent_root)?,
            leaf(&self.state_root)?,
            self.body.to_backing()?,
        ])
    }
}

impl BeaconBlockMessage for BeaconBlock {
    fn slot(&self) -> u64 {
        self.slot
    }

    fn execution_state_root(&self) -> Hash32 {
        self.body.execution_payload.state_root
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct SignedBeaconBlock {
    pub message: BeaconBlock,
    pub signature: BlsSignature,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beacon_block::common::{Transaction, Withdrawal};
    use crate::beacon_block::{decode_signed_block, DecodedBlock};
    use crate::layout::Fork;
    use crate::tree::TreeNode;

    fn sample_block() -> BeaconBlock {
        let mut block = BeaconBlock {
            slot: 8_000_000,
            proposer_index: 42,
            parent_root: [0x11; 32],
            state_root: [0x22; 32],
            ..Default::default()
        };
        block.body.graffiti = [0x67; 32];
        block.body.eth1_data.deposit_count = 5;
        let payload = &mut block.body.execution_payload;
        payload.state_root = [0xab; 32];
        payload.block_number = 19_000_000;
        payload.timestamp = 1_700_000_000;
        payload.gas_limit = 30_000_000;
        payload.base_fee_per_gas = U256::from(7u64);
        payload.extra_data = List::try_from(b"deneb".to_vec()).unwrap();
        payload.transactions =
            List::try_from(vec![Transaction::try_from(vec![0x02, 0xf8, 0x70]).unwrap()]).unwrap();
        payload.withdrawals = List::try_from(vec![Withdrawal {
            index: 1,
            validator_index: 2,
            address: [0x33; 20],
            amount: 32_000_000_000,
        }])
        .unwrap();
        block
    }

    #[test]
    fn test_backing_root_matches_hash_tree_root() {
        for block in [BeaconBlock::default(), sample_block()] {
            let expected: [u8; 32] = block.hash_tree_root().unwrap().into();
            assert_eq!(block.to_backing().unwrap().merkle_root(), expected);

            let body: [u8; 32] = block.body.hash_tree_root().unwrap().into();
            assert_eq!(block.body.to_backing().unwrap().merkle_root(), body);
        }
    }

    #[test]
    fn test_decode_signed_block() {
        let signed = SignedBeaconBlock {
            message: sample_block(),
            ..Default::default()
        };
        let bytes = ssz_rs::serialize(&signed).unwrap();
        let decoded = decode_signed_block(Fork::Deneb, &bytes).unwrap();

        let expected = DecodedBlock::from_message(Fork::Deneb, &signed.message).unwrap();
        assert_eq!(decoded.slot, 8_000_000);
        assert_eq!(decoded.execution_state_root, [0xab; 32]);
        assert_eq!(decoded.message.merkle_root(), expected.message.merkle_root());
    }

    #[test]
    fn test_decode_rejects_truncated_bytes() {
        let bytes = ssz_rs::serialize(&SignedBeaconBlock::default()).unwrap();
        let err = decode_signed_block(Fork::Deneb, &bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, ProofError::Decode(_)));
    }
}
