//! Containers shared by the supported forks (mainnet preset).

use ssz_rs::prelude::*;

use super::{leaf, ContainerFields};
use crate::proof::ProofError;
use crate::tree::BackingNode;

pub type Root = [u8; 32];
pub type ExecutionAddress = [u8; 20];
pub type BlsPublicKey = Vector<u8, 48>;
pub type BlsSignature = Vector<u8, 96>;
pub type KzgCommitment = Vector<u8, 48>;

pub const MAX_VALIDATORS_PER_COMMITTEE: usize = 2048;
pub const MAX_PROPOSER_SLASHINGS: usize = 16;
pub const MAX_DEPOSITS: usize = 16;
pub const MAX_VOLUNTARY_EXITS: usize = 16;
pub const MAX_BLS_TO_EXECUTION_CHANGES: usize = 16;
pub const MAX_BLOB_COMMITMENTS_PER_BLOCK: usize = 4096;
pub const SYNC_COMMITTEE_SIZE: usize = 512;
/// `DEPOSIT_CONTRACT_TREE_DEPTH + 1`
pub const DEPOSIT_PROOF_LENGTH: usize = 33;
pub const BYTES_PER_LOGS_BLOOM: usize = 256;
pub const MAX_EXTRA_DATA_BYTES: usize = 32;
pub const MAX_BYTES_PER_TRANSACTION: usize = 1_073_741_824;
pub const MAX_TRANSACTIONS_PER_PAYLOAD: usize = 1_048_576;
pub const MAX_WITHDRAWALS_PER_PAYLOAD: usize = 16;

pub type Transaction = List<u8, MAX_BYTES_PER_TRANSACTION>;

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct Eth1Data {
    pub deposit_root: Root,
    pub deposit_count: u64,
    pub block_hash: [u8; 32],
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct Checkpoint {
    pub epoch: u64,
    pub root: Root,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct AttestationData {
    pub slot: u64,
    pub index: u64,
    pub beacon_block_root: Root,
    pub source: Checkpoint,
    pub target: Checkpoint,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct BeaconBlockHeader {
    pub slot: u64,
    pub proposer_index: u64,
    pub parent_root: Root,
    pub state_root: Root,
    pub body_root: Root,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct SignedBeaconBlockHeader {
    pub message: BeaconBlockHeader,
    pub signature: BlsSignature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct ProposerSlashing {
    pub signed_header_1: SignedBeaconBlockHeader,
    pub signed_header_2: SignedBeaconBlockHeader,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct DepositData {
    pub pubkey: BlsPublicKey,
    pub withdrawal_credentials: [u8; 32],
    pub amount: u64,
    pub signature: BlsSignature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct Deposit {
    pub proof: Vector<[u8; 32], DEPOSIT_PROOF_LENGTH>,
    pub data: DepositData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct VoluntaryExit {
    pub epoch: u64,
    pub validator_index: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct SignedVoluntaryExit {
    pub message: VoluntaryExit,
    pub signature: BlsSignature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct SyncAggregate {
    pub sync_committee_bits: Bitvector<SYNC_COMMITTEE_SIZE>,
    pub sync_committee_signature: BlsSignature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct BlsToExecutionChange {
    pub validator_index: u64,
    pub from_bls_pubkey: BlsPublicKey,
    pub to_execution_address: ExecutionAddress,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct SignedBlsToExecutionChange {
    pub message: BlsToExecutionChange,
    pub signature: BlsSignature,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct Withdrawal {
    pub index: u64,
    pub validator_index: u64,
    pub address: ExecutionAddress,
    pub amount: u64,
}

/// Execution payload, unchanged from deneb through fulu.
#[derive(Debug, Clone, Default, PartialEq, Eq, SimpleSerialize)]
pub struct ExecutionPayload {
    // Field 0
    pub parent_hash: [u8; 32],
    // Field 1
    pub fee_recipient: ExecutionAddress,
    // Field 2
    pub state_root: Root,
    // Field 3
    pub receipts_root: Root,
    // Field 4
    pub logs_bloom: Vector<u8, BYTES_PER_LOGS_BLOOM>,
    // Field 5
    pub prev_randao: [u8; 32],
    // Field 6
    pub block_number: u64,
    // Field 7
    pub gas_limit: u64,
    // Field 8
    pub gas_used: u64,
    // Field 9
    pub timestamp: u64,
    // Field 10
    pub extra_data: List<u8, MAX_EXTRA_DATA_BYTES>,
    // Field 11
    pub base_fee_per_gas: U256,
    // Field 12
    pub block_hash: [u8; 32],
    // Field 13
    pub transactions: List<Transaction, MAX_TRANSACTIONS_PER_PAYLOAD>,
    // Field 14
    pub withdrawals: List<Withdrawal, MAX_WITHDRAWALS_PER_PAYLOAD>,
    // Field 15
    pub blob_gas_used: u64,
    // Field 16
    pub excess_blob_gas: u64,
}

impl ContainerFields for ExecutionPayload {
    const FIELD_COUNT: usize = 17;

    fn field_nodes(&self) -> Result<Vec<BackingNode>, ProofError> {
        Ok(vec![
            leaf(&self.parent_hash)?,
            leaf(&self.fee_recipient)?,
            leaf(&self.state_root)?,
            leaf(&self.receipts_root)?,
            leaf(&self.logs_bloom)?,
            leaf(&self.prev_randao)?,
            leaf(&self.block_number)?,
            leaf(&self.gas_limit)?,
            leaf(&self.gas_used)?,
            leaf(&self.timestamp)?,
            leaf(&self.extra_data)?,
            leaf(&self.base_fee_per_gas)?,
            leaf(&self.block_hash)?,
            leaf(&self.transactions)?,
            leaf(&self.withdrawals)?,
            leaf(&self.blob_gas_used)?,
            leaf(&self.excess_blob_gas)?,
        ])
    }
}
