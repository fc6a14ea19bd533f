//! Instruction builders for the System, SPL Token and Associated Token programs.

use crate::rpc::ChainError;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account_interface::address::get_associated_token_address;
use spl_associated_token_account_interface::instruction as ata_instruction;

/// System program id.
pub const SYSTEM_PROGRAM_ID: Pubkey = solana_system_interface::program::ID;

/// SPL Token program id.
pub const TOKEN_PROGRAM_ID: Pubkey = spl_token::ID;

/// Associated Token Account program id.
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey = spl_associated_token_account_interface::program::ID;

/// Wrapped SOL mint.
pub const WRAPPED_SOL_MINT: Pubkey = spl_token::native_mint::ID;

/// Native SOL transfer.
#[must_use]
pub fn system_transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    solana_system_interface::instruction::transfer(from, to, lamports)
}

/// SPL token transfer between two token accounts, signed by `authority`.
///
/// # Errors
/// Returns [`ChainError::Instruction`] if the token program rejects the
/// arguments.
pub fn token_transfer(
    source: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
    amount: u64,
) -> Result<Instruction, ChainError> {
    spl_token::instruction::transfer(&TOKEN_PROGRAM_ID, source, destination, authority, &[], amount)
        .map_err(|e| ChainError::Instruction(format!("token transfer: {e}")))
}

/// Associated token account of `owner` for `mint`.
#[must_use]
pub fn associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(owner, mint)
}

/// Creates the associated token account of `owner` for `mint`, paid by `payer`.
///
/// Fails on chain if the account already exists.
#[must_use]
pub fn create_associated_token_account(payer: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Instruction {
    ata_instruction::create_associated_token_account(payer, owner, mint, &TOKEN_PROGRAM_ID)
}

/// Like [`create_associated_token_account`] but a no-op if the account exists.
#[must_use]
pub fn create_associated_token_account_idempotent(
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Instruction {
    ata_instruction::create_associated_token_account_idempotent(payer, owner, mint, &TOKEN_PROGRAM_ID)
}
