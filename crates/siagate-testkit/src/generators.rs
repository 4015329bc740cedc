//! Proptest generators for property-based testing.

use proptest::prelude::*;

use siagate_core::{
    Currency, FileContract, Hash256, Keypair, SiacoinOutputId, SiafundOutputId, Transaction,
    TransactionBuilder, UnlockConditions, UnlockHash,
};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random hash.
pub fn hash() -> impl Strategy<Value = Hash256> {
    any::<[u8; 32]>().prop_map(Hash256::from_bytes)
}

pub fn unlock_hash() -> impl Strategy<Value = UnlockHash> {
    any::<[u8; 32]>().prop_map(UnlockHash::from_bytes)
}

pub fn siacoin_output_id() -> impl Strategy<Value = SiacoinOutputId> {
    any::<[u8; 32]>().prop_map(SiacoinOutputId::from_bytes)
}

pub fn siafund_output_id() -> impl Strategy<Value = SiafundOutputId> {
    any::<[u8; 32]>().prop_map(SiafundOutputId::from_bytes)
}

/// Generate an amount small enough that sums of a few never overflow.
pub fn currency() -> impl Strategy<Value = Currency> {
    any::<u128>().prop_map(Currency::from)
}

/// Generate arbitrary-data bytes of at most `max_len` bytes.
pub fn arbitrary_data(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a file contract with an open window and up to two outputs per set.
pub fn file_contract() -> impl Strategy<Value = FileContract> {
    (
        any::<u64>(),
        hash(),
        1u64..1_000_000,
        1u64..1_000,
        currency(),
        prop::collection::vec((currency(), unlock_hash()), 0..=2),
        prop::collection::vec((currency(), unlock_hash()), 0..=2),
        unlock_hash(),
    )
        .prop_map(
            |(file_size, root, window_start, window_len, payout, valid, missed, uh)| {
                let outputs = |outs: Vec<(Currency, UnlockHash)>| {
                    outs.into_iter()
                        .map(|(value, unlock_hash)| siagate_core::SiacoinOutput {
                            value,
                            unlock_hash,
                        })
                        .collect()
                };
                FileContract {
                    file_size,
                    file_merkle_root: root,
                    window_start,
                    window_end: window_start + window_len,
                    payout,
                    valid_proof_outputs: outputs(valid),
                    missed_proof_outputs: outputs(missed),
                    unlock_hash: uh,
                    revision_number: 0,
                }
            },
        )
}

/// Parameters for generating a transaction.
#[derive(Debug, Clone)]
pub struct TransactionParams {
    pub keypair: Keypair,
    pub siacoin_inputs: Vec<SiacoinOutputId>,
    pub siacoin_outputs: Vec<(Currency, UnlockHash)>,
    pub file_contracts: Vec<FileContract>,
    pub siafund_inputs: Vec<SiafundOutputId>,
    pub siafund_outputs: Vec<(Currency, UnlockHash)>,
    pub miner_fees: Vec<Currency>,
    pub arbitrary_data: Vec<Vec<u8>>,
}

impl Arbitrary for TransactionParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            keypair(),
            prop::collection::vec(siacoin_output_id(), 0..=3),
            prop::collection::vec((currency(), unlock_hash()), 0..=4),
            prop::collection::vec(file_contract(), 0..=2),
            prop::collection::vec(siafund_output_id(), 0..=2),
            prop::collection::vec((currency(), unlock_hash()), 0..=2),
            prop::collection::vec(currency(), 0..=2),
            prop::collection::vec(arbitrary_data(64), 0..=2),
        )
            .prop_map(
                |(keypair, sci, sco, fcs, sfi, sfo, fees, data)| TransactionParams {
                    keypair,
                    siacoin_inputs: sci,
                    siacoin_outputs: sco,
                    file_contracts: fcs,
                    siafund_inputs: sfi,
                    siafund_outputs: sfo,
                    miner_fees: fees,
                    arbitrary_data: data,
                },
            )
            .boxed()
    }
}

fn builder_from_params(params: &TransactionParams) -> TransactionBuilder {
    let uc = UnlockConditions::single_key(params.keypair.public_key());
    let mut builder = TransactionBuilder::new();
    for &parent in &params.siacoin_inputs {
        builder = builder.siacoin_input(parent, uc.clone());
    }
    for &(value, unlock_hash) in &params.siacoin_outputs {
        builder = builder.siacoin_output(value, unlock_hash);
    }
    for fc in &params.file_contracts {
        builder = builder.file_contract(fc.clone());
    }
    for &parent in &params.siafund_inputs {
        builder = builder.siafund_input(parent, uc.clone(), uc.unlock_hash());
    }
    for &(value, unlock_hash) in &params.siafund_outputs {
        builder = builder.siafund_output(value, unlock_hash);
    }
    for &fee in &params.miner_fees {
        builder = builder.miner_fee(fee);
    }
    for data in &params.arbitrary_data {
        builder = builder.arbitrary_data(data.clone());
    }
    builder
}

/// Build an unsigned transaction from parameters.
pub fn transaction_from_params(params: &TransactionParams) -> Transaction {
    builder_from_params(params).build()
}

/// Build a transaction from parameters, signed by the parameters' keypair.
pub fn signed_transaction_from_params(params: &TransactionParams) -> Transaction {
    builder_from_params(params).sign(&params.keypair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use siagate_core::{canonical_transaction_bytes, ProofStatus};

    proptest! {
        #[test]
        fn test_ids_deterministic(params: TransactionParams) {
            let t1 = transaction_from_params(&params);
            let t2 = transaction_from_params(&params);

            prop_assert_eq!(t1.id(), t2.id());
            prop_assert_eq!(t1.siacoin_output_ids(), t2.siacoin_output_ids());
            prop_assert_eq!(t1.file_contract_ids(), t2.file_contract_ids());
            prop_assert_eq!(t1.siafund_output_ids(), t2.siafund_output_ids());
        }

        #[test]
        fn test_ids_ignore_signatures(params: TransactionParams) {
            let unsigned = transaction_from_params(&params);
            let signed = signed_transaction_from_params(&params);

            prop_assert_eq!(unsigned.id(), signed.id());
            prop_assert_eq!(unsigned.siacoin_output_id(0), signed.siacoin_output_id(0));
            prop_assert_eq!(unsigned.file_contract_id(0), signed.file_contract_id(0));
            if !signed.transaction_signatures.is_empty() {
                prop_assert_ne!(
                    canonical_transaction_bytes(&unsigned),
                    canonical_transaction_bytes(&signed)
                );
            }
        }

        #[test]
        fn test_kinds_never_collide(params: TransactionParams, i in 0u64..16) {
            let t = transaction_from_params(&params);
            let sco = t.siacoin_output_id(i).0;
            let sfo = t.siafund_output_id(i).0;
            let fc = t.file_contract_id(i).0;

            prop_assert_ne!(sco, sfo);
            prop_assert_ne!(sco, fc);
            prop_assert_ne!(sfo, fc);
            prop_assert_ne!(sco, t.id().0);

            let fcid = t.file_contract_id(i);
            prop_assert_ne!(
                fcid.storage_proof_output_id(ProofStatus::Valid, i),
                fcid.storage_proof_output_id(ProofStatus::Missed, i)
            );
            prop_assert_ne!(t.siafund_output_id(i).sia_claim_output_id().0, sfo);
        }

        #[test]
        fn test_index_sensitivity(params: TransactionParams, i in 0u64..64, j in 0u64..64) {
            prop_assume!(i != j);
            let t = transaction_from_params(&params);

            prop_assert_ne!(t.siacoin_output_id(i), t.siacoin_output_id(j));
            prop_assert_ne!(t.siafund_output_id(i), t.siafund_output_id(j));
            prop_assert_ne!(t.file_contract_id(i), t.file_contract_id(j));

            let fcid = t.file_contract_id(0);
            prop_assert_ne!(
                fcid.storage_proof_output_id(ProofStatus::Valid, i),
                fcid.storage_proof_output_id(ProofStatus::Valid, j)
            );
        }

        #[test]
        fn test_content_changes_id(
            params: TransactionParams,
            extra in arbitrary_data(32),
        ) {
            let t1 = transaction_from_params(&params);
            let mut t2 = t1.clone();
            t2.arbitrary_data.push(extra.into());

            prop_assert_ne!(t1.id(), t2.id());
        }
    }
}
