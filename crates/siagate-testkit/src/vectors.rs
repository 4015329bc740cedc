//! Golden test vectors for deterministic verification.
//!
//! Specifier bytes and canonical encodings are part of the compatibility
//! surface: every implementation must reproduce these exactly.

use siagate_core::canonical::{canonical_siacoin_output_bytes, canonical_unlock_conditions_bytes};
use siagate_core::specifier::{
    SPECIFIER_CLAIM_OUTPUT, SPECIFIER_ED25519, SPECIFIER_FILE_CONTRACT,
    SPECIFIER_FILE_CONTRACT_REVISION, SPECIFIER_FOUNDATION, SPECIFIER_MINER_FEE,
    SPECIFIER_MINER_PAYOUT, SPECIFIER_SIACOIN_INPUT, SPECIFIER_SIACOIN_OUTPUT,
    SPECIFIER_SIAFUND_INPUT, SPECIFIER_SIAFUND_OUTPUT, SPECIFIER_STORAGE_PROOF_OUTPUT,
};
use siagate_core::{
    canonical_transaction_bytes, canonical_transaction_bytes_no_signatures, Currency,
    SiacoinOutput, Specifier, Transaction, TransactionBuilder, UnlockConditions, UnlockHash,
};

/// Expected bytes of one specifier.
#[derive(Debug, Clone)]
pub struct SpecifierVector {
    pub specifier: Specifier,
    pub expected_hex: &'static str,
}

/// All specifier vectors.
pub fn specifier_vectors() -> Vec<SpecifierVector> {
    let v = |specifier, expected_hex| SpecifierVector {
        specifier,
        expected_hex,
    };
    vec![
        v(SPECIFIER_CLAIM_OUTPUT, "636c61696d206f757470757400000000"),
        v(SPECIFIER_FILE_CONTRACT, "66696c6520636f6e7472616374000000"),
        // truncated at 16 bytes
        v(SPECIFIER_FILE_CONTRACT_REVISION, "66696c6520636f6e7472616374207265"),
        v(SPECIFIER_MINER_FEE, "6d696e65722066656500000000000000"),
        v(SPECIFIER_MINER_PAYOUT, "6d696e6572207061796f757400000000"),
        v(SPECIFIER_SIACOIN_INPUT, "736961636f696e20696e707574000000"),
        v(SPECIFIER_SIACOIN_OUTPUT, "736961636f696e206f75747075740000"),
        v(SPECIFIER_SIAFUND_INPUT, "73696166756e6420696e707574000000"),
        v(SPECIFIER_SIAFUND_OUTPUT, "73696166756e64206f75747075740000"),
        v(SPECIFIER_STORAGE_PROOF_OUTPUT, "73746f726167652070726f6f66000000"),
        v(SPECIFIER_FOUNDATION, "666f756e646174696f6e000000000000"),
        v(SPECIFIER_ED25519, "65643235353139000000000000000000"),
    ]
}

/// Expected canonical encoding of one object.
#[derive(Debug, Clone)]
pub struct EncodingVector {
    pub name: &'static str,
    pub bytes: Vec<u8>,
    pub expected_hex: &'static str,
}

fn sample_transaction() -> Transaction {
    TransactionBuilder::new()
        .siacoin_output(Currency::from(1u64), UnlockHash::from_bytes([0x22; 32]))
        .miner_fee(Currency::from(5u64))
        .arbitrary_data(&b"siagate"[..])
        .build()
}

/// All encoding vectors.
pub fn encoding_vectors() -> Vec<EncodingVector> {
    let empty = Transaction::default();
    vec![
        EncodingVector {
            name: "empty transaction, no signatures",
            bytes: canonical_transaction_bytes_no_signatures(&empty),
            expected_hex: "a9008001800280038004800580068007800880",
        },
        EncodingVector {
            name: "empty transaction, full",
            bytes: canonical_transaction_bytes(&empty),
            expected_hex: "aa0080018002800380048005800680078008800980",
        },
        EncodingVector {
            name: "default unlock conditions",
            bytes: canonical_unlock_conditions_bytes(&UnlockConditions::default()),
            expected_hex: "a3000001800200",
        },
        EncodingVector {
            name: "siacoin output of 355",
            bytes: canonical_siacoin_output_bytes(&SiacoinOutput {
                value: Currency::from(355u64),
                unlock_hash: UnlockHash::from_bytes([0x11; 32]),
            }),
            expected_hex: concat!(
                "a2",
                "005820",
                "0000000000000000000000000000000000000000000000000000000000000163",
                "015820",
                "1111111111111111111111111111111111111111111111111111111111111111",
            ),
        },
        EncodingVector {
            name: "output, fee and arbitrary data",
            bytes: canonical_transaction_bytes_no_signatures(&sample_transaction()),
            expected_hex: concat!(
                "a9",
                "0080",
                "0181a2005820",
                "0000000000000000000000000000000000000000000000000000000000000001",
                "015820",
                "2222222222222222222222222222222222222222222222222222222222222222",
                "0280038004800580068007815820",
                "0000000000000000000000000000000000000000000000000000000000000005",
                "088147",
                "73696167617465",
            ),
        },
    ]
}

/// Check every vector, returning `(name, passed, actual_hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let specifiers = specifier_vectors().into_iter().map(|v| {
        let actual = hex::encode(v.specifier.as_bytes());
        (v.specifier.name(), actual == v.expected_hex, actual)
    });
    let encodings = encoding_vectors().into_iter().map(|v| {
        let actual = hex::encode(&v.bytes);
        (v.name.to_string(), actual == v.expected_hex, actual)
    });
    specifiers.chain(encodings).collect()
}
