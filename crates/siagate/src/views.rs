//! Response views: consensus data with derived IDs attached.
//!
//! Views are plain serde structs. Building one is pure: the caller fetches
//! blocks and state from the consensus set and hands them in.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use siagate_core::{
    Block, BlockHeight, BlockId, BlockNonce, ConsensusConstants, Currency, FileContract,
    FileContractId, FileContractRevision, Hash256, ProofStatus, SiacoinInput, SiacoinOutput,
    SiacoinOutputId, SiafundInput, SiafundOutput, SiafundOutputId, StorageProof,
    Target, Timestamp, Transaction, TransactionId, TransactionSignature, UnlockHash,
};

// ─────────────────────────────────────────────────────────────────────────────
// Tip Summary
// ─────────────────────────────────────────────────────────────────────────────

/// The current tip plus the constants table in force.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusGet {
    pub synced: bool,
    pub height: BlockHeight,
    #[serde(rename = "currentblock")]
    pub current_block: BlockId,
    pub target: Target,
    pub difficulty: Currency,

    #[serde(rename = "foundationprimaryunlockhash")]
    pub foundation_primary_unlock_hash: UnlockHash,
    #[serde(rename = "foundationfailsafeunlockhash")]
    pub foundation_failsafe_unlock_hash: UnlockHash,

    #[serde(flatten)]
    pub constants: ConsensusConstants,
}

/// Chain-side inputs to a tip summary.
#[derive(Debug, Clone)]
pub struct TipState {
    pub synced: bool,
    pub height: BlockHeight,
    pub current_block: BlockId,
    pub target: Target,
    pub foundation_primary: UnlockHash,
    pub foundation_failsafe: UnlockHash,
}

pub fn consensus_get(tip: TipState, constants: &ConsensusConstants) -> ConsensusGet {
    ConsensusGet {
        synced: tip.synced,
        height: tip.height,
        current_block: tip.current_block,
        difficulty: tip.target.difficulty(&constants.root_depth),
        target: tip.target,
        foundation_primary_unlock_hash: tip.foundation_primary,
        foundation_failsafe_unlock_hash: tip.foundation_failsafe,
        constants: constants.clone(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Lookup
// ─────────────────────────────────────────────────────────────────────────────

/// A siacoin output together with its ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiacoinOutputView {
    pub id: SiacoinOutputId,
    pub value: Currency,
    #[serde(rename = "unlockhash")]
    pub unlock_hash: UnlockHash,
}

/// A siafund output together with its ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiafundOutputView {
    pub id: SiafundOutputId,
    pub value: Currency,
    #[serde(rename = "unlockhash")]
    pub unlock_hash: UnlockHash,
    #[serde(rename = "claimstart")]
    pub claim_start: Currency,
}

/// A file contract with its ID and the IDs of both proof-output sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContractView {
    pub id: FileContractId,
    #[serde(rename = "filesize")]
    pub file_size: u64,
    #[serde(rename = "filemerkleroot")]
    pub file_merkle_root: Hash256,
    #[serde(rename = "windowstart")]
    pub window_start: BlockHeight,
    #[serde(rename = "windowend")]
    pub window_end: BlockHeight,
    pub payout: Currency,
    #[serde(rename = "validproofoutputs")]
    pub valid_proof_outputs: Vec<SiacoinOutputView>,
    #[serde(rename = "missedproofoutputs")]
    pub missed_proof_outputs: Vec<SiacoinOutputView>,
    #[serde(rename = "unlockhash")]
    pub unlock_hash: UnlockHash,
    #[serde(rename = "revisionnumber")]
    pub revision_number: u64,
}

/// A transaction with every derivable ID attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: TransactionId,
    #[serde(rename = "siacoininputs")]
    pub siacoin_inputs: Vec<SiacoinInput>,
    #[serde(rename = "siacoinoutputs")]
    pub siacoin_outputs: Vec<SiacoinOutputView>,
    #[serde(rename = "filecontracts")]
    pub file_contracts: Vec<FileContractView>,
    #[serde(rename = "filecontractrevisions")]
    pub file_contract_revisions: Vec<FileContractRevision>,
    #[serde(rename = "storageproofs")]
    pub storage_proofs: Vec<StorageProof>,
    #[serde(rename = "siafundinputs")]
    pub siafund_inputs: Vec<SiafundInput>,
    #[serde(rename = "siafundoutputs")]
    pub siafund_outputs: Vec<SiafundOutputView>,
    #[serde(rename = "minerfees")]
    pub miner_fees: Vec<Currency>,
    #[serde(rename = "arbitrarydata")]
    pub arbitrary_data: Vec<Bytes>,
    #[serde(rename = "transactionsignatures")]
    pub transaction_signatures: Vec<TransactionSignature>,
}

/// One entry of the block-level siacoin output index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedOutputId {
    /// `"<txid>_<index>"`
    pub key: String,
    pub id: SiacoinOutputId,
}

/// A block with its header, derived IDs and display aggregations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusBlocksGet {
    pub id: BlockId,
    pub height: BlockHeight,
    #[serde(rename = "parentid")]
    pub parent_id: BlockId,
    pub nonce: BlockNonce,
    pub difficulty: Currency,
    pub timestamp: Timestamp,
    /// Miner payouts carry no ID: their identity is not derived here.
    #[serde(rename = "minerpayouts")]
    pub miner_payouts: Vec<SiacoinOutput>,
    pub transactions: Vec<TransactionView>,
    #[serde(rename = "transactionids")]
    pub transaction_ids: Vec<TransactionId>,
    /// Ordered by transaction, then output position.
    #[serde(rename = "siacoinoutputids")]
    pub siacoin_output_ids: Vec<KeyedOutputId>,
}

fn siacoin_output_view(id: SiacoinOutputId, sco: &SiacoinOutput) -> SiacoinOutputView {
    SiacoinOutputView {
        id,
        value: sco.value,
        unlock_hash: sco.unlock_hash,
    }
}

fn proof_output_views(
    id: &FileContractId,
    status: ProofStatus,
    outputs: &[SiacoinOutput],
) -> Vec<SiacoinOutputView> {
    outputs
        .iter()
        .enumerate()
        .map(|(j, sco)| siacoin_output_view(id.storage_proof_output_id(status, j as u64), sco))
        .collect()
}

fn file_contract_view(id: FileContractId, fc: &FileContract) -> FileContractView {
    FileContractView {
        valid_proof_outputs: proof_output_views(&id, ProofStatus::Valid, &fc.valid_proof_outputs),
        missed_proof_outputs: proof_output_views(
            &id,
            ProofStatus::Missed,
            &fc.missed_proof_outputs,
        ),
        id,
        file_size: fc.file_size,
        file_merkle_root: fc.file_merkle_root,
        window_start: fc.window_start,
        window_end: fc.window_end,
        payout: fc.payout,
        unlock_hash: fc.unlock_hash,
        revision_number: fc.revision_number,
    }
}

/// Attach IDs to every output and contract of `txn`.
pub fn transaction_view(txn: &Transaction) -> TransactionView {
    let siacoin_outputs = txn
        .siacoin_output_ids()
        .into_iter()
        .zip(&txn.siacoin_outputs)
        .map(|(id, sco)| siacoin_output_view(id, sco))
        .collect();
    let file_contracts = txn
        .file_contract_ids()
        .into_iter()
        .zip(&txn.file_contracts)
        .map(|(id, fc)| file_contract_view(id, fc))
        .collect();
    let siafund_outputs = txn
        .siafund_output_ids()
        .into_iter()
        .zip(&txn.siafund_outputs)
        .map(|(id, sfo)| SiafundOutputView {
            id,
            value: sfo.value,
            unlock_hash: sfo.unlock_hash,
            claim_start: sfo.claim_start,
        })
        .collect();

    TransactionView {
        id: txn.id(),
        siacoin_inputs: txn.siacoin_inputs.clone(),
        siacoin_outputs,
        file_contracts,
        file_contract_revisions: txn.file_contract_revisions.clone(),
        storage_proofs: txn.storage_proofs.clone(),
        siafund_inputs: txn.siafund_inputs.clone(),
        siafund_outputs,
        miner_fees: txn.miner_fees.clone(),
        arbitrary_data: txn.arbitrary_data.clone(),
        transaction_signatures: txn.transaction_signatures.clone(),
    }
}

/// Assemble the block lookup response.
///
/// `difficulty` is the difficulty of the target the block had to meet.
pub fn consensus_blocks_get(
    block: &Block,
    height: BlockHeight,
    difficulty: Currency,
) -> ConsensusBlocksGet {
    let transactions: Vec<TransactionView> =
        block.transactions.iter().map(transaction_view).collect();

    let transaction_ids = transactions.iter().map(|txn| txn.id).collect();
    let siacoin_output_ids = transactions
        .iter()
        .flat_map(|txn| {
            txn.siacoin_outputs
                .iter()
                .enumerate()
                .map(move |(i, sco)| KeyedOutputId {
                    key: format!("{}_{}", txn.id, i),
                    id: sco.id,
                })
        })
        .collect();

    ConsensusBlocksGet {
        id: block.id(),
        height,
        parent_id: block.parent_id,
        nonce: block.nonce,
        difficulty,
        timestamp: block.timestamp,
        miner_payouts: block.miner_payouts.clone(),
        transactions,
        transaction_ids,
        siacoin_output_ids,
    }
}
