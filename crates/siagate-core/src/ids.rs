//! Deterministic identifier derivation.
//!
//! Every derived ID hashes a pre-image of the form
//!
//! ```text
//! specifier || canonical(parent without signatures) || u64_le(index)
//! ```
//!
//! The specifier separates entity kinds, the index separates siblings, and
//! leaving signatures out means re-signing never changes an ID.

use crate::canonical::canonical_transaction_bytes_no_signatures;
use crate::crypto::Hash256;
use crate::specifier::{
    Specifier, SPECIFIER_FILE_CONTRACT, SPECIFIER_SIACOIN_OUTPUT, SPECIFIER_SIAFUND_OUTPUT,
    SPECIFIER_STORAGE_PROOF_OUTPUT,
};
use crate::transaction::Transaction;
use crate::types::{FileContractId, SiacoinOutputId, SiafundOutputId, TransactionId};

/// Outcome of a file contract's proof window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofStatus {
    /// A storage proof was submitted in the window.
    Valid,
    /// The window closed without a proof.
    Missed,
}

impl ProofStatus {
    fn as_byte(self) -> u8 {
        match self {
            ProofStatus::Valid => 1,
            ProofStatus::Missed => 0,
        }
    }
}

/// Hash `specifier || body || u64_le(index)`.
fn derive(specifier: &Specifier, body: &[u8], index: u64) -> Hash256 {
    Hash256::hash_parts(&[specifier.as_bytes(), body, &index.to_le_bytes()])
}

impl Transaction {
    /// The transaction's identity. Signatures are not part of it.
    pub fn id(&self) -> TransactionId {
        TransactionId(Hash256::hash(&canonical_transaction_bytes_no_signatures(self)))
    }

    /// ID of the siacoin output at position `i`.
    pub fn siacoin_output_id(&self, i: u64) -> SiacoinOutputId {
        let body = canonical_transaction_bytes_no_signatures(self);
        SiacoinOutputId(derive(&SPECIFIER_SIACOIN_OUTPUT, &body, i))
    }

    /// ID of the siafund output at position `i`.
    pub fn siafund_output_id(&self, i: u64) -> SiafundOutputId {
        let body = canonical_transaction_bytes_no_signatures(self);
        SiafundOutputId(derive(&SPECIFIER_SIAFUND_OUTPUT, &body, i))
    }

    /// ID of the file contract at position `i`.
    pub fn file_contract_id(&self, i: u64) -> FileContractId {
        let body = canonical_transaction_bytes_no_signatures(self);
        FileContractId(derive(&SPECIFIER_FILE_CONTRACT, &body, i))
    }

    /// IDs of every siacoin output, in order. Encodes the transaction once.
    pub fn siacoin_output_ids(&self) -> Vec<SiacoinOutputId> {
        let body = canonical_transaction_bytes_no_signatures(self);
        (0..self.siacoin_outputs.len() as u64)
            .map(|i| SiacoinOutputId(derive(&SPECIFIER_SIACOIN_OUTPUT, &body, i)))
            .collect()
    }

    /// IDs of every siafund output, in order.
    pub fn siafund_output_ids(&self) -> Vec<SiafundOutputId> {
        let body = canonical_transaction_bytes_no_signatures(self);
        (0..self.siafund_outputs.len() as u64)
            .map(|i| SiafundOutputId(derive(&SPECIFIER_SIAFUND_OUTPUT, &body, i)))
            .collect()
    }

    /// IDs of every file contract, in order.
    pub fn file_contract_ids(&self) -> Vec<FileContractId> {
        let body = canonical_transaction_bytes_no_signatures(self);
        (0..self.file_contracts.len() as u64)
            .map(|i| FileContractId(derive(&SPECIFIER_FILE_CONTRACT, &body, i)))
            .collect()
    }
}

impl FileContractId {
    /// ID of the `j`th proof output created when the contract resolves.
    ///
    /// Hashes `"storage proof" || fcid || status || u64_le(j)`, with status 1
    /// for valid and 0 for missed. The specifier keeps these IDs apart from
    /// every other kind derived from a 32-byte parent.
    pub fn storage_proof_output_id(&self, status: ProofStatus, j: u64) -> SiacoinOutputId {
        SiacoinOutputId(Hash256::hash_parts(&[
            SPECIFIER_STORAGE_PROOF_OUTPUT.as_bytes(),
            self.as_bytes(),
            &[status.as_byte()],
            &j.to_le_bytes(),
        ]))
    }
}

impl SiafundOutputId {
    /// ID of the siacoin claim output created when this siafund output is spent.
    pub fn sia_claim_output_id(&self) -> SiacoinOutputId {
        SiacoinOutputId(Hash256::hash(self.as_bytes()))
    }
}
