//! Electra block schema. Fulu blocks share it.

use ssz_rs::prelude::*;

use super::common::{
    AttestationData, BlsPublicKey, BlsSignature, Deposit, Eth1Data, ExecutionAddress,
    ExecutionPayload, KzgCommitment, ProposerSlashing, Root, SignedBlsToExecutionChange,
    SignedVoluntaryExit, SyncAggregate, MAX_BLOB_COMMITMENTS_PER_BLOCK,
    MAX_BLS_TO_EXECUTION_CHANGES, MAX_DEPOSITS, MAX_PROPOSER_SLASHINGS,
    MAX_VALIDATORS_PER_COMMITTEE, MAX_VOLUNTARY_EXITS,
};
use super::{leaf, BeaconBlockMessage, ContainerFields};
use crate::proof::ProofError;
use crate::tree::BackingNode;
use crate::types::Hash32;

pub const MAX_COMMITTEES_PER_SLOT: usize = 64;
pub const MAX_ATTESTER_SLASHINGS: usize = 1;
pub const MAX_ATTESTATIONS: usize = 8;
pub const MAX_DEPOSIT_REQUESTS_PER_PAYLOAD: usize = 8192;
pub const MAX_WITHDRAWAL_REQUESTS_PER_PAYLOAD: usize = 16;
pub const MAX_CONSOLIDATION_REQUESTS_PER_PAYLOAD: usize = 2;

/// `MAX_VALIDATORS_PER_COMMITTEE * MAX_COMMITTEES_PER_SLOT`
pub const MAX_AGGREGATION_BITS: usize = MAX_VALIDATORS_PER_COMMITTEE * MAX_COMMITTEES_PER_SLOT;

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct Attestation {
    pub aggregation_bits: Bitlist<MAX_AGGREGATION_BITS>,
    pub data: AttestationData,
    pub signature: BlsSignature,
    pub committee_bits: Bitvector<MAX_COMMITTEES_PER_SLOT>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct IndexedAttestation {
    pub attesting_indices: List<u64, MAX_AGGREGATION_BITS>,
    pub data: AttestationData,
    pub signature: BlsSignature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct AttesterSlashing {
    pub attestation_1: IndexedAttestation,
    pub attestation_2: IndexedAttestation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct DepositRequest {
    pub pubkey: BlsPublicKey,
    pub withdrawal_credentials: [u8; 32],
    pub amount: u64,
    pub signature: BlsSignature,
    pub index: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct WithdrawalRequest {
    pub source_address: ExecutionAddress,
    pub validator_pubkey: BlsPublicKey,
    pub amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct ConsolidationRequest {
    pub source_address: ExecutionAddress,
    pub source_pubkey: BlsPublicKey,
    pub target_pubkey: BlsPublicKey,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct ExecutionRequests {
    pub deposits: List<DepositRequest, MAX_DEPOSIT_REQUESTS_PER_PAYLOAD>,
    pub withdrawals: List<WithdrawalRequest, MAX_WITHDRAWAL_REQUESTS_PER_PAYLOAD>,
    pub consolidations: List<ConsolidationRequest, MAX_CONSOLIDATION_REQUESTS_PER_PAYLOAD>,
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
    pub execution_requests: ExecutionRequests,
}

impl ContainerFields for BeaconBlockBody {
    const FIELD_COUNT: usize = 13;

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
            leaf(&self.execution_requests)?,
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
