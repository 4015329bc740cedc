//! Transactions and their sub-objects.
//!
//! A transaction is an atomic component of a block. It can contain inputs and
//! outputs, file contracts, storage proofs and arbitrary data, plus signatures
//! proving that the relevant parties approved it (or a subset of it).
//!
//! Transactions can depend on earlier transactions in the same block but can
//! never spend outputs they create themselves.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::block::BlockHeight;
use crate::canonical::{
    canonical_transaction_bytes_no_signatures, canonical_unlock_conditions_bytes,
};
use crate::crypto::{Hash256, Keypair};
use crate::currency::Currency;
use crate::error::Result;
use crate::specifier::{Specifier, SPECIFIER_FOUNDATION, SPECIFIER_LEN};
use crate::types::{FileContractId, SiacoinOutputId, SiafundOutputId, UnlockHash};

/// A public key tagged with the algorithm it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiaPublicKey {
    pub algorithm: Specifier,
    pub key: Bytes,
}

/// The rules for spending an output.
///
/// An output is locked by the [`UnlockHash`] of a set of unlock conditions;
/// the spender reveals the conditions and satisfies them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnlockConditions {
    pub timelock: BlockHeight,
    #[serde(rename = "publickeys")]
    pub public_keys: Vec<SiaPublicKey>,
    #[serde(rename = "signaturesrequired")]
    pub signatures_required: u64,
}

impl UnlockConditions {
    /// Standard single-key conditions.
    pub fn single_key(key: SiaPublicKey) -> Self {
        Self {
            timelock: 0,
            public_keys: vec![key],
            signatures_required: 1,
        }
    }

    /// The unlock hash committing to these conditions.
    pub fn unlock_hash(&self) -> UnlockHash {
        UnlockHash(Hash256::hash(&canonical_unlock_conditions_bytes(self)))
    }
}

/// Consumes a siacoin output and adds its value to the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiacoinInput {
    #[serde(rename = "parentid")]
    pub parent_id: SiacoinOutputId,
    #[serde(rename = "unlockconditions")]
    pub unlock_conditions: UnlockConditions,
}

/// A volume of siacoins, spent atomically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiacoinOutput {
    pub value: Currency,
    #[serde(rename = "unlockhash")]
    pub unlock_hash: UnlockHash,
}

/// Consumes a siafund output. The accrued claim is paid to `claim_unlock_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiafundInput {
    #[serde(rename = "parentid")]
    pub parent_id: SiafundOutputId,
    #[serde(rename = "unlockconditions")]
    pub unlock_conditions: UnlockConditions,
    #[serde(rename = "claimunlockhash")]
    pub claim_unlock_hash: UnlockHash,
}

/// A volume of siafunds.
///
/// When spent, a siacoin output is created where:
///
/// ```text
/// value      := (SiafundPool - ClaimStart) / SiafundCount * Value
/// unlockhash := SiafundInput.ClaimUnlockHash
/// ```
///
/// `claim_start` must be zero inside a submitted transaction; the engine sets
/// it to the siafund pool at acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiafundOutput {
    pub value: Currency,
    #[serde(rename = "unlockhash")]
    pub unlock_hash: UnlockHash,
    #[serde(rename = "claimstart")]
    pub claim_start: Currency,
}

impl SiafundOutput {
    /// The siacoin value realized by spending this output at `pool`.
    pub fn claim_value(&self, pool: Currency, siafund_count: Currency) -> Result<Currency> {
        pool.checked_sub(self.claim_start)?
            .checked_div(siafund_count)?
            .checked_mul(self.value)
    }
}

/// An agreement to store a file until a window closes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileContract {
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
    pub valid_proof_outputs: Vec<SiacoinOutput>,
    #[serde(rename = "missedproofoutputs")]
    pub missed_proof_outputs: Vec<SiacoinOutput>,
    #[serde(rename = "unlockhash")]
    pub unlock_hash: UnlockHash,
    #[serde(rename = "revisionnumber")]
    pub revision_number: u64,
}

/// A replacement of a file contract's terms with a higher revision number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileContractRevision {
    #[serde(rename = "parentid")]
    pub parent_id: FileContractId,
    #[serde(rename = "unlockconditions")]
    pub unlock_conditions: UnlockConditions,
    #[serde(rename = "newrevisionnumber")]
    pub new_revision_number: u64,
    #[serde(rename = "newfilesize")]
    pub new_file_size: u64,
    #[serde(rename = "newfilemerkleroot")]
    pub new_file_merkle_root: Hash256,
    #[serde(rename = "newwindowstart")]
    pub new_window_start: BlockHeight,
    #[serde(rename = "newwindowend")]
    pub new_window_end: BlockHeight,
    #[serde(rename = "newvalidproofoutputs")]
    pub new_valid_proof_outputs: Vec<SiacoinOutput>,
    #[serde(rename = "newmissedproofoutputs")]
    pub new_missed_proof_outputs: Vec<SiacoinOutput>,
    #[serde(rename = "newunlockhash")]
    pub new_unlock_hash: UnlockHash,
}

/// Proof that a host is still storing a contract's file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageProof {
    #[serde(rename = "parentid")]
    pub parent_id: FileContractId,
    pub segment: Bytes,
    #[serde(rename = "hashset")]
    pub hash_set: Vec<Hash256>,
}

/// Which parts of a transaction a signature covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoveredFields {
    #[serde(rename = "wholetransaction")]
    pub whole_transaction: bool,
    #[serde(rename = "siacoininputs")]
    pub siacoin_inputs: Vec<u64>,
    #[serde(rename = "siacoinoutputs")]
    pub siacoin_outputs: Vec<u64>,
    #[serde(rename = "filecontracts")]
    pub file_contracts: Vec<u64>,
    #[serde(rename = "filecontractrevisions")]
    pub file_contract_revisions: Vec<u64>,
    #[serde(rename = "storageproofs")]
    pub storage_proofs: Vec<u64>,
    #[serde(rename = "siafundinputs")]
    pub siafund_inputs: Vec<u64>,
    #[serde(rename = "siafundoutputs")]
    pub siafund_outputs: Vec<u64>,
    #[serde(rename = "minerfees")]
    pub miner_fees: Vec<u64>,
    #[serde(rename = "arbitrarydata")]
    pub arbitrary_data: Vec<u64>,
    #[serde(rename = "transactionsignatures")]
    pub transaction_signatures: Vec<u64>,
}

impl CoveredFields {
    pub fn whole_transaction() -> Self {
        Self {
            whole_transaction: true,
            ..Self::default()
        }
    }
}

/// Authorizes a transaction on behalf of one input's unlock conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionSignature {
    #[serde(rename = "parentid")]
    pub parent_id: Hash256,
    #[serde(rename = "publickeyindex")]
    pub public_key_index: u64,
    pub timelock: BlockHeight,
    #[serde(rename = "coveredfields")]
    pub covered_fields: CoveredFields,
    pub signature: Bytes,
}

/// An atomic component of a block.
///
/// Field order is the canonical encoding order and must never change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "siacoininputs", default)]
    pub siacoin_inputs: Vec<SiacoinInput>,
    #[serde(rename = "siacoinoutputs", default)]
    pub siacoin_outputs: Vec<SiacoinOutput>,
    #[serde(rename = "filecontracts", default)]
    pub file_contracts: Vec<FileContract>,
    #[serde(rename = "filecontractrevisions", default)]
    pub file_contract_revisions: Vec<FileContractRevision>,
    #[serde(rename = "storageproofs", default)]
    pub storage_proofs: Vec<StorageProof>,
    #[serde(rename = "siafundinputs", default)]
    pub siafund_inputs: Vec<SiafundInput>,
    #[serde(rename = "siafundoutputs", default)]
    pub siafund_outputs: Vec<SiafundOutput>,
    #[serde(rename = "minerfees", default)]
    pub miner_fees: Vec<Currency>,
    #[serde(rename = "arbitrarydata", default)]
    pub arbitrary_data: Vec<Bytes>,
    #[serde(rename = "transactionsignatures", default)]
    pub transaction_signatures: Vec<TransactionSignature>,
}

impl Transaction {
    /// Sum of siacoin outputs, file contract payouts and miner fees.
    ///
    /// This must equal the sum of the siacoin inputs. Outputs created by storage
    /// proofs and siafund claims are not counted: they were paid for when the
    /// contract was funded. A pre-submission sanity check, not consensus
    /// validation.
    pub fn siacoin_output_sum(&self) -> Result<Currency> {
        let outputs = self.siacoin_outputs.iter().map(|sco| sco.value);
        let payouts = self.file_contracts.iter().map(|fc| fc.payout);
        let fees = self.miner_fees.iter().copied();
        Currency::sum(outputs.chain(payouts).chain(fees))
    }

    /// Sum of siafund output values.
    pub fn siafund_output_sum(&self) -> Result<Currency> {
        Currency::sum(self.siafund_outputs.iter().map(|sfo| sfo.value))
    }

    /// The renter's signature in a two-party renter/host exchange.
    ///
    /// Position 0 by convention; nothing here checks who actually signed it.
    pub fn renter_signature(&self) -> Option<&TransactionSignature> {
        self.transaction_signatures.first()
    }

    /// The host's signature in a two-party renter/host exchange (position 1).
    pub fn host_signature(&self) -> Option<&TransactionSignature> {
        self.transaction_signatures.get(1)
    }

    /// The hash a whole-transaction signature commits to.
    pub fn sig_hash(&self, parent_id: &Hash256, public_key_index: u64, timelock: u64) -> Hash256 {
        Hash256::hash_parts(&[
            &canonical_transaction_bytes_no_signatures(self),
            parent_id.as_bytes(),
            &public_key_index.to_le_bytes(),
            &timelock.to_le_bytes(),
        ])
    }

    /// Foundation unlock-hash updates carried in arbitrary data.
    pub fn foundation_updates(&self) -> impl Iterator<Item = FoundationUnlockHashUpdate> + '_ {
        self.arbitrary_data
            .iter()
            .filter_map(|data| FoundationUnlockHashUpdate::from_arbitrary_data(data))
    }
}

/// Directs the consensus set to replace its Foundation unlock hashes.
///
/// Submitted through a transaction's arbitrary data, prefixed with the
/// `foundation` specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FoundationUnlockHashUpdate {
    #[serde(rename = "newprimary")]
    pub new_primary: UnlockHash,
    #[serde(rename = "newfailsafe")]
    pub new_failsafe: UnlockHash,
}

impl FoundationUnlockHashUpdate {
    const ENCODED_LEN: usize = SPECIFIER_LEN + 64;

    /// Encode as an arbitrary-data blob.
    pub fn to_arbitrary_data(&self) -> Bytes {
        let mut buf = Vec::with_capacity(Self::ENCODED_LEN);
        buf.extend_from_slice(SPECIFIER_FOUNDATION.as_bytes());
        buf.extend_from_slice(self.new_primary.as_bytes());
        buf.extend_from_slice(self.new_failsafe.as_bytes());
        buf.into()
    }

    /// Decode from an arbitrary-data blob, if it carries an update.
    pub fn from_arbitrary_data(data: &[u8]) -> Option<Self> {
        if data.len() != Self::ENCODED_LEN || !data.starts_with(SPECIFIER_FOUNDATION.as_bytes()) {
            return None;
        }
        let body = &data[SPECIFIER_LEN..];
        let primary: [u8; 32] = body[..32].try_into().ok()?;
        let failsafe: [u8; 32] = body[32..].try_into().ok()?;
        Some(Self {
            new_primary: UnlockHash::from_bytes(primary),
            new_failsafe: UnlockHash::from_bytes(failsafe),
        })
    }
}

/// Builder for creating transactions.
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    txn: Transaction,
}

impl TransactionBuilder {
    /// Start building an empty transaction.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn siacoin_input(mut self, parent_id: SiacoinOutputId, uc: UnlockConditions) -> Self {
        self.txn.siacoin_inputs.push(SiacoinInput {
            parent_id,
            unlock_conditions: uc,
        });
        self
    }

    pub fn siacoin_output(mut self, value: Currency, unlock_hash: UnlockHash) -> Self {
        self.txn.siacoin_outputs.push(SiacoinOutput { value, unlock_hash });
        self
    }

    pub fn file_contract(mut self, fc: FileContract) -> Self {
        self.txn.file_contracts.push(fc);
        self
    }

    pub fn file_contract_revision(mut self, rev: FileContractRevision) -> Self {
        self.txn.file_contract_revisions.push(rev);
        self
    }

    pub fn storage_proof(mut self, proof: StorageProof) -> Self {
        self.txn.storage_proofs.push(proof);
        self
    }

    pub fn siafund_input(
        mut self,
        parent_id: SiafundOutputId,
        uc: UnlockConditions,
        claim_unlock_hash: UnlockHash,
    ) -> Self {
        self.txn.siafund_inputs.push(SiafundInput {
            parent_id,
            unlock_conditions: uc,
            claim_unlock_hash,
        });
        self
    }

    /// Add a siafund output. `claim_start` is always zero at creation.
    pub fn siafund_output(mut self, value: Currency, unlock_hash: UnlockHash) -> Self {
        self.txn.siafund_outputs.push(SiafundOutput {
            value,
            unlock_hash,
            claim_start: Currency::ZERO,
        });
        self
    }

    pub fn miner_fee(mut self, fee: Currency) -> Self {
        self.txn.miner_fees.push(fee);
        self
    }

    pub fn arbitrary_data(mut self, data: impl Into<Bytes>) -> Self {
        self.txn.arbitrary_data.push(data.into());
        self
    }

    pub fn signature(mut self, sig: TransactionSignature) -> Self {
        self.txn.transaction_signatures.push(sig);
        self
    }

    /// Finish without signing.
    pub fn build(self) -> Transaction {
        self.txn
    }

    /// Finish and sign every input and revision with `keypair` (key index 0).
    pub fn sign(self, keypair: &Keypair) -> Transaction {
        let mut txn = self.txn;
        let parents: Vec<Hash256> = txn
            .siacoin_inputs
            .iter()
            .map(|sci| sci.parent_id.0)
            .chain(txn.siafund_inputs.iter().map(|sfi| sfi.parent_id.0))
            .chain(txn.file_contract_revisions.iter().map(|rev| rev.parent_id.0))
            .collect();
        for parent in parents {
            let sig = keypair.sign_transaction(&txn, parent, 0);
            txn.transaction_signatures.push(sig);
        }
        txn
    }
}
