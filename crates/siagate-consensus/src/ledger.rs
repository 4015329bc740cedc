//! Ledger state and the transaction rules that move it forward.
//!
//! Every mutation goes through [`Ledger`] methods that record a diff, so a
//! block can be reverted by replaying its diffs backwards.

use std::collections::{HashMap, HashSet};

use siagate_core::{
    BlockHeight, ConsensusConstants, Currency, FileContract, FileContractId, ProofStatus,
    SiacoinOutput, SiacoinOutputId, SiafundOutput, SiafundOutputId, Transaction, UnlockHash,
};

use crate::change::{
    DiffDirection, FileContractDiff, SiacoinOutputDiff, SiafundOutputDiff, SiafundPoolDiff,
};
use crate::error::{ConsensusError, Result};

/// Diffs produced by applying one block (or a trial transaction set).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diffs {
    pub siacoin_outputs: Vec<SiacoinOutputDiff>,
    pub file_contracts: Vec<FileContractDiff>,
    pub siafund_outputs: Vec<SiafundOutputDiff>,
    pub siafund_pool: Vec<SiafundPoolDiff>,
    /// Foundation hashes before the first update in this block, if any.
    pub foundation_before: Option<(UnlockHash, UnlockHash)>,
}

impl Diffs {
    /// The diffs that undo these, in undo order.
    pub fn inverted(&self) -> Diffs {
        Diffs {
            siacoin_outputs: self.siacoin_outputs.iter().rev().map(|d| d.inverse()).collect(),
            file_contracts: self.file_contracts.iter().rev().map(|d| d.inverse()).collect(),
            siafund_outputs: self.siafund_outputs.iter().rev().map(|d| d.inverse()).collect(),
            siafund_pool: self.siafund_pool.iter().rev().map(|d| d.inverse()).collect(),
            foundation_before: None,
        }
    }
}

/// The spendable state of the chain.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pub siacoin_outputs: HashMap<SiacoinOutputId, SiacoinOutput>,
    pub siafund_outputs: HashMap<SiafundOutputId, SiafundOutput>,
    pub file_contracts: HashMap<FileContractId, FileContract>,
    pub siafund_pool: Currency,
    pub foundation_primary: UnlockHash,
    pub foundation_failsafe: UnlockHash,
}

fn invalid(msg: impl Into<String>) -> ConsensusError {
    ConsensusError::InvalidTransaction(msg.into())
}

/// Arithmetic failures inside a transaction make the transaction invalid.
fn checked<T>(res: siagate_core::Result<T>, what: &str) -> Result<T> {
    res.map_err(|e| invalid(format!("{}: {}", what, e)))
}

impl Ledger {
    // ─────────────────────────────────────────────────────────────────────────
    // Diff-recording mutations
    // ─────────────────────────────────────────────────────────────────────────

    fn add_siacoin_output(&mut self, diffs: &mut Diffs, id: SiacoinOutputId, output: SiacoinOutput) {
        self.siacoin_outputs.insert(id, output.clone());
        diffs.siacoin_outputs.push(SiacoinOutputDiff {
            direction: DiffDirection::Apply,
            id,
            output,
        });
    }

    fn spend_siacoin_output(&mut self, diffs: &mut Diffs, id: SiacoinOutputId) -> Option<SiacoinOutput> {
        let output = self.siacoin_outputs.remove(&id)?;
        diffs.siacoin_outputs.push(SiacoinOutputDiff {
            direction: DiffDirection::Revert,
            id,
            output: output.clone(),
        });
        Some(output)
    }

    fn add_siafund_output(&mut self, diffs: &mut Diffs, id: SiafundOutputId, output: SiafundOutput) {
        self.siafund_outputs.insert(id, output.clone());
        diffs.siafund_outputs.push(SiafundOutputDiff {
            direction: DiffDirection::Apply,
            id,
            output,
        });
    }

    fn spend_siafund_output(&mut self, diffs: &mut Diffs, id: SiafundOutputId) -> Option<SiafundOutput> {
        let output = self.siafund_outputs.remove(&id)?;
        diffs.siafund_outputs.push(SiafundOutputDiff {
            direction: DiffDirection::Revert,
            id,
            output: output.clone(),
        });
        Some(output)
    }

    fn add_file_contract(&mut self, diffs: &mut Diffs, id: FileContractId, contract: FileContract) {
        self.file_contracts.insert(id, contract.clone());
        diffs.file_contracts.push(FileContractDiff {
            direction: DiffDirection::Apply,
            id,
            contract,
        });
    }

    fn remove_file_contract(&mut self, diffs: &mut Diffs, id: FileContractId) -> Option<FileContract> {
        let contract = self.file_contracts.remove(&id)?;
        diffs.file_contracts.push(FileContractDiff {
            direction: DiffDirection::Revert,
            id,
            contract: contract.clone(),
        });
        Some(contract)
    }

    fn grow_pool(&mut self, diffs: &mut Diffs, amount: Currency) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let previous = self.siafund_pool;
        let adjusted = checked(previous.checked_add(amount), "siafund pool")?;
        self.siafund_pool = adjusted;
        diffs.siafund_pool.push(SiafundPoolDiff {
            direction: DiffDirection::Apply,
            previous,
            adjusted,
        });
        Ok(())
    }

    /// Replay diffs onto the ledger in order.
    pub fn apply_diffs(&mut self, diffs: &Diffs) {
        for d in &diffs.siacoin_outputs {
            match d.direction {
                DiffDirection::Apply => {
                    self.siacoin_outputs.insert(d.id, d.output.clone());
                }
                DiffDirection::Revert => {
                    self.siacoin_outputs.remove(&d.id);
                }
            }
        }
        for d in &diffs.file_contracts {
            match d.direction {
                DiffDirection::Apply => {
                    self.file_contracts.insert(d.id, d.contract.clone());
                }
                DiffDirection::Revert => {
                    self.file_contracts.remove(&d.id);
                }
            }
        }
        for d in &diffs.siafund_outputs {
            match d.direction {
                DiffDirection::Apply => {
                    self.siafund_outputs.insert(d.id, d.output.clone());
                }
                DiffDirection::Revert => {
                    self.siafund_outputs.remove(&d.id);
                }
            }
        }
        for d in &diffs.siafund_pool {
            self.siafund_pool = d.adjusted;
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transaction rules
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate `txn` against the ledger and apply it, as if included in a
    /// block at `height`. On error the ledger may be partially modified; run
    /// against a copy.
    pub fn apply_transaction(
        &mut self,
        txn: &Transaction,
        height: BlockHeight,
        constants: &ConsensusConstants,
        diffs: &mut Diffs,
    ) -> Result<()> {
        check_no_duplicate_parents(txn)?;

        // Siacoin inputs.
        let mut input_sum = Currency::ZERO;
        let mut foundation_authorized = false;
        for (i, sci) in txn.siacoin_inputs.iter().enumerate() {
            let parent = self.siacoin_outputs.get(&sci.parent_id).ok_or_else(|| {
                invalid(format!(
                    "siacoin input {} spends nonexistent output {}",
                    i, sci.parent_id
                ))
            })?;
            if sci.unlock_conditions.unlock_hash() != parent.unlock_hash {
                return Err(invalid(format!(
                    "siacoin input {} has unlock conditions that do not match its parent",
                    i
                )));
            }
            if parent.unlock_hash == self.foundation_primary
                || parent.unlock_hash == self.foundation_failsafe
            {
                foundation_authorized = true;
            }
            input_sum = checked(input_sum.checked_add(parent.value), "siacoin inputs")?;
        }
        let output_sum = checked(txn.siacoin_output_sum(), "siacoin outputs")?;
        if input_sum != output_sum {
            return Err(invalid(format!(
                "siacoin inputs ({}) do not equal siacoin outputs ({})",
                input_sum, output_sum
            )));
        }
        for sci in &txn.siacoin_inputs {
            self.spend_siacoin_output(diffs, sci.parent_id);
        }

        // Siacoin outputs.
        for (id, sco) in txn.siacoin_output_ids().into_iter().zip(&txn.siacoin_outputs) {
            self.add_siacoin_output(diffs, id, sco.clone());
        }

        // File contracts.
        for (i, (id, fc)) in txn
            .file_contract_ids()
            .into_iter()
            .zip(&txn.file_contracts)
            .enumerate()
        {
            check_contract_terms(fc, height, constants, i)?;
            let tax = checked(constants.tax(fc.payout), "contract tax")?;
            self.add_file_contract(diffs, id, fc.clone());
            self.grow_pool(diffs, tax)?;
        }

        // File contract revisions.
        for (i, rev) in txn.file_contract_revisions.iter().enumerate() {
            let current = self.file_contracts.get(&rev.parent_id).ok_or_else(|| {
                invalid(format!(
                    "revision {} targets nonexistent contract {}",
                    i, rev.parent_id
                ))
            })?;
            if height >= current.window_start {
                return Err(invalid(format!(
                    "revision {} submitted after the proof window opened",
                    i
                )));
            }
            if rev.new_revision_number <= current.revision_number {
                return Err(invalid(format!(
                    "revision {} has revision number {} not above {}",
                    i, rev.new_revision_number, current.revision_number
                )));
            }
            if rev.unlock_conditions.unlock_hash() != current.unlock_hash {
                return Err(invalid(format!(
                    "revision {} has unlock conditions that do not match the contract",
                    i
                )));
            }
            if rev.new_window_start <= height || rev.new_window_end <= rev.new_window_start {
                return Err(invalid(format!("revision {} has an invalid window", i)));
            }
            let old_valid = checked(
                Currency::sum(current.valid_proof_outputs.iter().map(|o| o.value)),
                "valid proof outputs",
            )?;
            let old_missed = checked(
                Currency::sum(current.missed_proof_outputs.iter().map(|o| o.value)),
                "missed proof outputs",
            )?;
            let new_valid = checked(
                Currency::sum(rev.new_valid_proof_outputs.iter().map(|o| o.value)),
                "valid proof outputs",
            )?;
            let new_missed = checked(
                Currency::sum(rev.new_missed_proof_outputs.iter().map(|o| o.value)),
                "missed proof outputs",
            )?;
            if old_valid != new_valid || old_missed != new_missed {
                return Err(invalid(format!(
                    "revision {} changes the total of its proof outputs",
                    i
                )));
            }
            let revised = FileContract {
                file_size: rev.new_file_size,
                file_merkle_root: rev.new_file_merkle_root,
                window_start: rev.new_window_start,
                window_end: rev.new_window_end,
                payout: current.payout,
                valid_proof_outputs: rev.new_valid_proof_outputs.clone(),
                missed_proof_outputs: rev.new_missed_proof_outputs.clone(),
                unlock_hash: rev.new_unlock_hash,
                revision_number: rev.new_revision_number,
            };
            self.remove_file_contract(diffs, rev.parent_id);
            self.add_file_contract(diffs, rev.parent_id, revised);
        }

        // Storage proofs.
        for (i, sp) in txn.storage_proofs.iter().enumerate() {
            let contract = self.file_contracts.get(&sp.parent_id).ok_or_else(|| {
                invalid(format!(
                    "storage proof {} targets nonexistent contract {}",
                    i, sp.parent_id
                ))
            })?;
            if height < contract.window_start || height >= contract.window_end {
                return Err(invalid(format!(
                    "storage proof {} submitted outside the proof window",
                    i
                )));
            }
            let outputs = contract.valid_proof_outputs.clone();
            self.remove_file_contract(diffs, sp.parent_id);
            for (j, sco) in outputs.into_iter().enumerate() {
                let id = sp
                    .parent_id
                    .storage_proof_output_id(ProofStatus::Valid, j as u64);
                self.add_siacoin_output(diffs, id, sco);
            }
        }

        // Siafund inputs and their claims.
        let mut siafund_in = Currency::ZERO;
        for (i, sfi) in txn.siafund_inputs.iter().enumerate() {
            let parent = self.siafund_outputs.get(&sfi.parent_id).ok_or_else(|| {
                invalid(format!(
                    "siafund input {} spends nonexistent output {}",
                    i, sfi.parent_id
                ))
            })?;
            if sfi.unlock_conditions.unlock_hash() != parent.unlock_hash {
                return Err(invalid(format!(
                    "siafund input {} has unlock conditions that do not match its parent",
                    i
                )));
            }
            siafund_in = checked(siafund_in.checked_add(parent.value), "siafund inputs")?;
        }
        let siafund_out = checked(txn.siafund_output_sum(), "siafund outputs")?;
        if siafund_in != siafund_out {
            return Err(invalid(format!(
                "siafund inputs ({}) do not equal siafund outputs ({})",
                siafund_in, siafund_out
            )));
        }
        for sfi in &txn.siafund_inputs {
            if let Some(spent) = self.spend_siafund_output(diffs, sfi.parent_id) {
                let claim = checked(
                    spent.claim_value(self.siafund_pool, constants.siafund_count),
                    "siafund claim",
                )?;
                self.add_siacoin_output(
                    diffs,
                    sfi.parent_id.sia_claim_output_id(),
                    SiacoinOutput {
                        value: claim,
                        unlock_hash: sfi.claim_unlock_hash,
                    },
                );
            }
        }

        // Siafund outputs.
        for (i, (id, sfo)) in txn
            .siafund_output_ids()
            .into_iter()
            .zip(&txn.siafund_outputs)
            .enumerate()
        {
            if !sfo.claim_start.is_zero() {
                return Err(invalid(format!(
                    "siafund output {} has a nonzero claim start",
                    i
                )));
            }
            let mut output = sfo.clone();
            output.claim_start = self.siafund_pool;
            self.add_siafund_output(diffs, id, output);
        }

        // Foundation unlock hash updates.
        for update in txn.foundation_updates() {
            if !foundation_authorized {
                return Err(invalid(
                    "foundation update without an input owned by the foundation",
                ));
            }
            if diffs.foundation_before.is_none() {
                diffs.foundation_before = Some((self.foundation_primary, self.foundation_failsafe));
            }
            self.foundation_primary = update.new_primary;
            self.foundation_failsafe = update.new_failsafe;
        }

        Ok(())
    }

    /// Apply a transaction without any checks: outputs only.
    ///
    /// Used for the genesis block, whose transactions create value from nothing.
    pub fn apply_genesis_transaction(&mut self, txn: &Transaction, diffs: &mut Diffs) {
        for (id, sco) in txn.siacoin_output_ids().into_iter().zip(&txn.siacoin_outputs) {
            self.add_siacoin_output(diffs, id, sco.clone());
        }
        for (id, sfo) in txn.siafund_output_ids().into_iter().zip(&txn.siafund_outputs) {
            self.add_siafund_output(diffs, id, sfo.clone());
        }
    }

    /// Close every contract whose window ends at `height`, paying its missed
    /// proof outputs.
    pub fn expire_contracts(&mut self, height: BlockHeight, diffs: &mut Diffs) {
        let mut expired: Vec<FileContractId> = self
            .file_contracts
            .iter()
            .filter(|(_, fc)| fc.window_end == height)
            .map(|(id, _)| *id)
            .collect();
        expired.sort();
        for id in expired {
            if let Some(contract) = self.remove_file_contract(diffs, id) {
                for (j, sco) in contract.missed_proof_outputs.into_iter().enumerate() {
                    let out_id = id.storage_proof_output_id(ProofStatus::Missed, j as u64);
                    self.add_siacoin_output(diffs, out_id, sco);
                }
            }
        }
    }
}

fn check_no_duplicate_parents(txn: &Transaction) -> Result<()> {
    let mut seen = HashSet::new();
    for sci in &txn.siacoin_inputs {
        if !seen.insert(sci.parent_id.0) {
            return Err(invalid(format!(
                "siacoin output {} spent twice in one transaction",
                sci.parent_id
            )));
        }
    }
    for sfi in &txn.siafund_inputs {
        if !seen.insert(sfi.parent_id.0) {
            return Err(invalid(format!(
                "siafund output {} spent twice in one transaction",
                sfi.parent_id
            )));
        }
    }
    Ok(())
}

fn check_contract_terms(
    fc: &FileContract,
    height: BlockHeight,
    constants: &ConsensusConstants,
    index: usize,
) -> Result<()> {
    if fc.window_start <= height {
        return Err(invalid(format!(
            "file contract {} has a window that starts in the past",
            index
        )));
    }
    if fc.window_end <= fc.window_start {
        return Err(invalid(format!(
            "file contract {} has a window that ends before it starts",
            index
        )));
    }
    let tax = checked(constants.tax(fc.payout), "contract tax")?;
    let net = checked(fc.payout.checked_sub(tax), "contract payout")?;
    let valid = checked(
        Currency::sum(fc.valid_proof_outputs.iter().map(|o| o.value)),
        "valid proof outputs",
    )?;
    let missed = checked(
        Currency::sum(fc.missed_proof_outputs.iter().map(|o| o.value)),
        "missed proof outputs",
    )?;
    if valid != net || missed != net {
        return Err(invalid(format!(
            "file contract {} payout does not match its proof outputs",
            index
        )));
    }
    Ok(())
}
