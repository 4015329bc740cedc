//! Canonical CBOR encoding for deterministic identity.
//!
//! This module implements RFC 8949 Core Deterministic Encoding over a fixed
//! schema:
//! - Every struct is a map with small integer keys, in key order
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - Hash-sized values and currencies are byte strings
//!
//! Every field is always emitted, empty or not. The same object produces the
//! same bytes (and thus the same IDs) on every platform.

use ciborium::value::Value;

use crate::transaction::{
    CoveredFields, FileContract, FileContractRevision, SiaPublicKey, SiacoinInput, SiacoinOutput,
    SiafundInput, SiafundOutput, StorageProof, Transaction, TransactionSignature,
    UnlockConditions,
};

/// Transaction field keys.
///
/// The order is frozen. `SIGNATURES` appears only in the full encoding.
mod keys {
    pub const SIACOIN_INPUTS: u64 = 0;
    pub const SIACOIN_OUTPUTS: u64 = 1;
    pub const FILE_CONTRACTS: u64 = 2;
    pub const FILE_CONTRACT_REVISIONS: u64 = 3;
    pub const STORAGE_PROOFS: u64 = 4;
    pub const SIAFUND_INPUTS: u64 = 5;
    pub const SIAFUND_OUTPUTS: u64 = 6;
    pub const MINER_FEES: u64 = 7;
    pub const ARBITRARY_DATA: u64 = 8;
    pub const SIGNATURES: u64 = 9;
}

/// Encode a transaction, signatures included.
pub fn canonical_transaction_bytes(txn: &Transaction) -> Vec<u8> {
    encode_cbor_value_canonical(&transaction_to_cbor_value(txn, true))
}

/// Encode a transaction without its signature list.
///
/// This is the pre-image body for every ID derived from a transaction.
pub fn canonical_transaction_bytes_no_signatures(txn: &Transaction) -> Vec<u8> {
    encode_cbor_value_canonical(&transaction_to_cbor_value(txn, false))
}

/// Encode a set of unlock conditions (the unlock hash pre-image).
pub fn canonical_unlock_conditions_bytes(uc: &UnlockConditions) -> Vec<u8> {
    encode_cbor_value_canonical(&unlock_conditions_value(uc))
}

/// Encode a single siacoin output (a block Merkle leaf for miner payouts).
pub fn canonical_siacoin_output_bytes(sco: &SiacoinOutput) -> Vec<u8> {
    encode_cbor_value_canonical(&siacoin_output_value(sco))
}

fn uint(n: u64) -> Value {
    Value::Integer(n.into())
}

fn bytes(b: &[u8]) -> Value {
    Value::Bytes(b.to_vec())
}

fn indexed(fields: Vec<Value>) -> Value {
    Value::Map(
        fields
            .into_iter()
            .enumerate()
            .map(|(i, v)| (uint(i as u64), v))
            .collect(),
    )
}

fn array<T>(items: &[T], f: impl Fn(&T) -> Value) -> Value {
    Value::Array(items.iter().map(f).collect())
}

fn indices(list: &[u64]) -> Value {
    array(list, |&i| uint(i))
}

fn transaction_to_cbor_value(txn: &Transaction, with_signatures: bool) -> Value {
    let mut entries = vec![
        (
            uint(keys::SIACOIN_INPUTS),
            array(&txn.siacoin_inputs, siacoin_input_value),
        ),
        (
            uint(keys::SIACOIN_OUTPUTS),
            array(&txn.siacoin_outputs, siacoin_output_value),
        ),
        (
            uint(keys::FILE_CONTRACTS),
            array(&txn.file_contracts, file_contract_value),
        ),
        (
            uint(keys::FILE_CONTRACT_REVISIONS),
            array(&txn.file_contract_revisions, revision_value),
        ),
        (
            uint(keys::STORAGE_PROOFS),
            array(&txn.storage_proofs, storage_proof_value),
        ),
        (
            uint(keys::SIAFUND_INPUTS),
            array(&txn.siafund_inputs, siafund_input_value),
        ),
        (
            uint(keys::SIAFUND_OUTPUTS),
            array(&txn.siafund_outputs, siafund_output_value),
        ),
        (
            uint(keys::MINER_FEES),
            array(&txn.miner_fees, |fee| bytes(&fee.to_be_bytes())),
        ),
        (
            uint(keys::ARBITRARY_DATA),
            array(&txn.arbitrary_data, |data| bytes(data)),
        ),
    ];
    if with_signatures {
        entries.push((
            uint(keys::SIGNATURES),
            array(&txn.transaction_signatures, signature_value),
        ));
    }
    Value::Map(entries)
}

fn public_key_value(pk: &SiaPublicKey) -> Value {
    indexed(vec![bytes(pk.algorithm.as_bytes()), bytes(&pk.key)])
}

fn unlock_conditions_value(uc: &UnlockConditions) -> Value {
    indexed(vec![
        uint(uc.timelock),
        array(&uc.public_keys, public_key_value),
        uint(uc.signatures_required),
    ])
}

fn siacoin_input_value(sci: &SiacoinInput) -> Value {
    indexed(vec![
        bytes(sci.parent_id.as_bytes()),
        unlock_conditions_value(&sci.unlock_conditions),
    ])
}

fn siacoin_output_value(sco: &SiacoinOutput) -> Value {
    indexed(vec![
        bytes(&sco.value.to_be_bytes()),
        bytes(sco.unlock_hash.as_bytes()),
    ])
}

fn file_contract_value(fc: &FileContract) -> Value {
    indexed(vec![
        uint(fc.file_size),
        bytes(fc.file_merkle_root.as_bytes()),
        uint(fc.window_start),
        uint(fc.window_end),
        bytes(&fc.payout.to_be_bytes()),
        array(&fc.valid_proof_outputs, siacoin_output_value),
        array(&fc.missed_proof_outputs, siacoin_output_value),
        bytes(fc.unlock_hash.as_bytes()),
        uint(fc.revision_number),
    ])
}

fn revision_value(rev: &FileContractRevision) -> Value {
    indexed(vec![
        bytes(rev.parent_id.as_bytes()),
        unlock_conditions_value(&rev.unlock_conditions),
        uint(rev.new_revision_number),
        uint(rev.new_file_size),
        bytes(rev.new_file_merkle_root.as_bytes()),
        uint(rev.new_window_start),
        uint(rev.new_window_end),
        array(&rev.new_valid_proof_outputs, siacoin_output_value),
        array(&rev.new_missed_proof_outputs, siacoin_output_value),
        bytes(rev.new_unlock_hash.as_bytes()),
    ])
}

fn storage_proof_value(sp: &StorageProof) -> Value {
    indexed(vec![
        bytes(sp.parent_id.as_bytes()),
        bytes(&sp.segment),
        array(&sp.hash_set, |h| bytes(h.as_bytes())),
    ])
}

fn siafund_input_value(sfi: &SiafundInput) -> Value {
    indexed(vec![
        bytes(sfi.parent_id.as_bytes()),
        unlock_conditions_value(&sfi.unlock_conditions),
        bytes(sfi.claim_unlock_hash.as_bytes()),
    ])
}

fn siafund_output_value(sfo: &SiafundOutput) -> Value {
    indexed(vec![
        bytes(&sfo.value.to_be_bytes()),
        bytes(sfo.unlock_hash.as_bytes()),
        bytes(&sfo.claim_start.to_be_bytes()),
    ])
}

fn covered_fields_value(cf: &CoveredFields) -> Value {
    indexed(vec![
        Value::Bool(cf.whole_transaction),
        indices(&cf.siacoin_inputs),
        indices(&cf.siacoin_outputs),
        indices(&cf.file_contracts),
        indices(&cf.file_contract_revisions),
        indices(&cf.storage_proofs),
        indices(&cf.siafund_inputs),
        indices(&cf.siafund_outputs),
        indices(&cf.miner_fees),
        indices(&cf.arbitrary_data),
        indices(&cf.transaction_signatures),
    ])
}

fn signature_value(sig: &TransactionSignature) -> Value {
    indexed(vec![
        bytes(sig.parent_id.as_bytes()),
        uint(sig.public_key_index),
        uint(sig.timelock),
        covered_fields_value(&sig.covered_fields),
        bytes(&sig.signature),
    ])
}

/// Encode a CBOR Value to canonical bytes.
fn encode_cbor_value_canonical(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a CBOR value.
///
/// Only the value kinds built above are reachable.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            // every integer in the schema is a u64
            encode_uint(buf, 0, n as u64);
        }
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item);
            }
        }
        Value::Map(entries) => {
            encode_map_canonical(buf, entries);
        }
        Value::Bool(b) => {
            buf.push(if *b { 0xf5 } else { 0xf4 });
        }
        _ => unreachable!("unsupported CBOR value in canonical schema"),
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffffffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut key_value_pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, key_value_pairs.len() as u64);
    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}
