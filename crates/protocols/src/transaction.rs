//! Build-sign-submit pipeline for single-use transactions.

use crate::compute_budget::{FeePatch, set_or_replace_priority_fee};
use crate::rpc::{ChainError, RpcProvider};
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::transaction::Transaction;
use tracing::debug;

/// An unsigned transaction under construction.
///
/// Built fresh for every submission and consumed by [`PendingTransaction::sign`].
/// A failed submission is never retried in place; callers build a new one.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    instructions: Vec<Instruction>,
    fee_payer: Pubkey,
}

impl PendingTransaction {
    /// Empty transaction paid by `fee_payer`.
    #[must_use]
    pub fn new(fee_payer: Pubkey) -> Self {
        Self {
            instructions: Vec::new(),
            fee_payer,
        }
    }

    /// Appends an instruction.
    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Builder form of [`push`](Self::push).
    #[must_use]
    pub fn with_instruction(mut self, instruction: Instruction) -> Self {
        self.push(instruction);
        self
    }

    /// Sets the compute unit price, replacing any existing one.
    pub fn set_priority_fee(&mut self, micro_lamports_per_cu: u64) -> FeePatch {
        set_or_replace_priority_fee(&mut self.instructions, micro_lamports_per_cu)
    }

    /// Builder form of [`set_priority_fee`](Self::set_priority_fee).
    #[must_use]
    pub fn with_priority_fee(mut self, micro_lamports_per_cu: u64) -> Self {
        self.set_priority_fee(micro_lamports_per_cu);
        self
    }

    /// Instructions in submission order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Account paying the fees.
    #[must_use]
    pub fn fee_payer(&self) -> &Pubkey {
        &self.fee_payer
    }

    /// Signs against `blockhash`.
    ///
    /// # Errors
    /// Returns [`ChainError::Signing`] if a required signer is missing.
    pub fn sign(self, blockhash: Hash, signers: &[&Keypair]) -> Result<Transaction, ChainError> {
        let mut transaction = Transaction::new_with_payer(&self.instructions, Some(&self.fee_payer));
        transaction
            .try_sign(signers, blockhash)
            .map_err(|e| ChainError::Signing(e.to_string()))?;
        Ok(transaction)
    }

    /// Fetches a fresh blockhash, signs and broadcasts.
    pub async fn submit(
        self,
        rpc: &dyn RpcProvider,
        signers: &[&Keypair],
    ) -> Result<Signature, ChainError> {
        let blockhash = rpc.get_latest_blockhash().await?;
        let transaction = self.sign(blockhash, signers)?;
        let signature = rpc.send_transaction(&transaction).await?;
        debug!(signature = %signature, endpoint = %rpc.endpoint(), "Transaction sent");
        Ok(signature)
    }

    /// Like [`submit`](Self::submit), then waits for confirmation.
    pub async fn submit_and_confirm(
        self,
        rpc: &dyn RpcProvider,
        signers: &[&Keypair],
    ) -> Result<Signature, ChainError> {
        let signature = self.submit(rpc, signers).await?;
        rpc.confirm_signature(&signature).await?;
        debug!(signature = %signature, "Transaction confirmed");
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute_budget::{COMPUTE_BUDGET_PROGRAM_ID, priority_fee_of};
    use crate::instructions::system_transfer;
    use solana_sdk::signer::Signer;

    #[test]
    fn test_fee_goes_first() {
        let payer = Keypair::new();
        let tx = PendingTransaction::new(payer.pubkey())
            .with_instruction(system_transfer(&payer.pubkey(), &Pubkey::new_unique(), 10))
            .with_priority_fee(100_000);

        assert_eq!(tx.instructions().len(), 2);
        assert_eq!(tx.instructions()[0].program_id, COMPUTE_BUDGET_PROGRAM_ID);
        assert_eq!(priority_fee_of(tx.instructions()), Some(100_000));
    }

    #[test]
    fn test_sign_with_payer() {
        let payer = Keypair::new();
        let tx = PendingTransaction::new(payer.pubkey())
            .with_instruction(system_transfer(&payer.pubkey(), &Pubkey::new_unique(), 10))
            .with_priority_fee(1);

        let signed = tx.sign(Hash::new_unique(), &[&payer]).unwrap();
        assert!(signed.is_signed());
        assert_eq!(signed.message.account_keys[0], payer.pubkey());
    }

    #[test]
    fn test_sign_without_required_signer_fails() {
        let payer = Keypair::new();
        let stranger = Keypair::new();
        let tx = PendingTransaction::new(payer.pubkey())
            .with_instruction(system_transfer(&payer.pubkey(), &Pubkey::new_unique(), 10));

        assert!(matches!(
            tx.sign(Hash::new_unique(), &[&stranger]),
            Err(ChainError::Signing(_))
        ));
    }
}
