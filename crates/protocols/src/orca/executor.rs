//! Whirlpool executor for on-chain operations.
//!
//! Provides functionality to manage a wallet's Whirlpool position:
//! - Locate the position a wallet holds in a pool
//! - Close it (withdraw liquidity, collect fees, burn the position)
//! - Open a new one and deposit liquidity

use super::whirlpool::{
    Position, WHIRLPOOL_PROGRAM_ID, Whirlpool, position_address, tick_array_address,
};
use crate::instructions::{
    SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID, ASSOCIATED_TOKEN_PROGRAM_ID, associated_token_address,
    create_associated_token_account_idempotent,
};
use crate::rpc::RpcProvider;
use crate::transaction::PendingTransaction;
use anyhow::{Context, Result, anyhow};
use clmm_keeper_domain::value_objects::TickRange;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use tracing::{debug, info};

const OPEN_POSITION: [u8; 8] = [0x87, 0x80, 0x2f, 0x4d, 0x0f, 0x98, 0xf0, 0x31];
const INCREASE_LIQUIDITY: [u8; 8] = [0x2e, 0x9c, 0xf3, 0x76, 0x0d, 0xcd, 0xfb, 0xb2];
const DECREASE_LIQUIDITY: [u8; 8] = [0xa0, 0x26, 0xd0, 0x6f, 0x68, 0x5b, 0x2c, 0x01];
const COLLECT_FEES: [u8; 8] = [0xa4, 0x98, 0xcf, 0x63, 0x1e, 0xba, 0x13, 0xb6];
const CLOSE_POSITION: [u8; 8] = [0x7b, 0x86, 0x51, 0x00, 0x31, 0x44, 0x62, 0x62];

/// Whether position transactions wait for confirmation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfirmationMode {
    /// Broadcast and move on.
    Fire,
    /// Wait until the transaction reaches the client's commitment.
    #[default]
    Confirm,
}

/// A pool account together with its decoded state.
#[derive(Debug, Clone)]
pub struct LoadedPool {
    /// Pool address.
    pub address: Pubkey,
    /// Decoded pool account.
    pub state: Whirlpool,
}

/// A position account together with its decoded state.
#[derive(Debug, Clone)]
pub struct LoadedPosition {
    /// Position PDA.
    pub address: Pubkey,
    /// Decoded position account.
    pub state: Position,
}

/// Parameters for opening a new position.
#[derive(Debug, Clone)]
pub struct OpenPositionParams {
    /// Tick bounds of the new position.
    pub range: TickRange,
    /// Liquidity units to deposit.
    pub liquidity: u128,
    /// Maximum token A amount.
    pub token_max_a: u64,
    /// Maximum token B amount.
    pub token_max_b: u64,
    /// Priority fee in micro-lamports per compute unit.
    pub priority_fee: u64,
}

/// Executor for Orca Whirlpool operations.
#[derive(Debug, Clone, Default)]
pub struct WhirlpoolExecutor {
    confirmation: ConfirmationMode,
}

impl WhirlpoolExecutor {
    /// Creates a new WhirlpoolExecutor.
    #[must_use]
    pub fn new(confirmation: ConfirmationMode) -> Self {
        Self { confirmation }
    }

    /// Reads and decodes a pool account.
    pub async fn load_pool(&self, rpc: &dyn RpcProvider, pool: &Pubkey) -> Result<LoadedPool> {
        let data = rpc
            .get_account_data(pool)
            .await?
            .ok_or_else(|| anyhow!("pool account {pool} not found"))?;
        let state = Whirlpool::parse(&data).context("Failed to decode pool account")?;
        Ok(LoadedPool {
            address: *pool,
            state,
        })
    }

    /// Finds the position `owner` holds in `pool`.
    ///
    /// Position NFTs are token accounts holding exactly one unit of a
    /// zero-decimal mint; each candidate mint's position PDA is read and
    /// matched against the pool.
    pub async fn find_position(
        &self,
        rpc: &dyn RpcProvider,
        owner: &Pubkey,
        pool: &Pubkey,
    ) -> Result<Option<LoadedPosition>> {
        let balances = rpc.get_token_balances(owner, &TOKEN_PROGRAM_ID).await?;

        for balance in balances.iter().filter(|b| b.amount == 1 && b.decimals == 0) {
            let Ok(mint) = balance.mint.parse::<Pubkey>() else {
                continue;
            };
            let (address, _bump) = position_address(&mint);
            let Some(data) = rpc.get_account_data(&address).await? else {
                continue;
            };
            let Ok(state) = Position::parse(&data) else {
                continue;
            };
            if state.whirlpool() == *pool {
                debug!(owner = %owner, position = %address, "Found position");
                return Ok(Some(LoadedPosition { address, state }));
            }
        }

        Ok(None)
    }

    /// Withdraws all liquidity, collects fees and closes the position.
    pub async fn close_position(
        &self,
        rpc: &dyn RpcProvider,
        owner: &Keypair,
        pool: &LoadedPool,
        position: &LoadedPosition,
        priority_fee: u64,
    ) -> Result<Signature> {
        info!(
            position = %position.address,
            liquidity = position.state.liquidity,
            "Closing position"
        );

        let owner_key = owner.pubkey();
        let mut tx = PendingTransaction::new(owner_key)
            .with_instruction(create_associated_token_account_idempotent(
                &owner_key,
                &owner_key,
                &pool.state.mint_a(),
            ))
            .with_instruction(create_associated_token_account_idempotent(
                &owner_key,
                &owner_key,
                &pool.state.mint_b(),
            ));

        if position.state.liquidity > 0 {
            tx.push(self.build_decrease_liquidity_instruction(
                pool,
                position,
                &owner_key,
                position.state.liquidity,
            ));
        }
        tx.push(self.build_collect_fees_instruction(pool, position, &owner_key));
        tx.push(self.build_close_position_instruction(position, &owner_key));
        tx.set_priority_fee(priority_fee);

        self.send(rpc, tx, &[owner]).await
    }

    /// Opens a new position and deposits liquidity into it.
    ///
    /// Returns the new position address and the transaction signature.
    pub async fn open_position(
        &self,
        rpc: &dyn RpcProvider,
        owner: &Keypair,
        pool: &LoadedPool,
        params: &OpenPositionParams,
    ) -> Result<(Pubkey, Signature)> {
        let position_mint = Keypair::new();
        let (position, bump) = position_address(&position_mint.pubkey());

        info!(
            pool = %pool.address,
            position = %position,
            tick_lower = params.range.lower,
            tick_upper = params.range.upper,
            "Opening new position"
        );

        let owner_key = owner.pubkey();
        let tx = PendingTransaction::new(owner_key)
            .with_instruction(self.build_open_position_instruction(
                pool,
                &params.range,
                &owner_key,
                &position_mint.pubkey(),
                &position,
                bump,
            ))
            .with_instruction(self.build_increase_liquidity_instruction(
                pool,
                &params.range,
                &position,
                &position_mint.pubkey(),
                &owner_key,
                params,
            ))
            .with_priority_fee(params.priority_fee);

        let signature = self.send(rpc, tx, &[owner, &position_mint]).await?;
        Ok((position, signature))
    }

    // Private helper methods

    async fn send(
        &self,
        rpc: &dyn RpcProvider,
        tx: PendingTransaction,
        signers: &[&Keypair],
    ) -> Result<Signature> {
        let signature = match self.confirmation {
            ConfirmationMode::Fire => tx.submit(rpc, signers).await?,
            ConfirmationMode::Confirm => tx.submit_and_confirm(rpc, signers).await?,
        };
        info!(signature = %signature, mode = ?self.confirmation, "Position transaction sent");
        Ok(signature)
    }

    fn build_open_position_instruction(
        &self,
        pool: &LoadedPool,
        range: &TickRange,
        owner: &Pubkey,
        position_mint: &Pubkey,
        position: &Pubkey,
        bump: u8,
    ) -> Instruction {
        let mut data = Vec::with_capacity(17);
        data.extend_from_slice(&OPEN_POSITION);
        data.push(bump);
        data.extend_from_slice(&range.lower.to_le_bytes());
        data.extend_from_slice(&range.upper.to_le_bytes());

        let position_token_account = associated_token_address(owner, position_mint);

        let accounts = vec![
            AccountMeta::new(*owner, true),                             // funder
            AccountMeta::new_readonly(*owner, false),                   // owner
            AccountMeta::new(*position, false),                         // position
            AccountMeta::new(*position_mint, true),                     // position_mint
            AccountMeta::new(position_token_account, false),            // position_token_account
            AccountMeta::new_readonly(pool.address, false),             // whirlpool
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),         // token_program
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),        // system_program
            AccountMeta::new_readonly(solana_sdk::sysvar::rent::ID, false), // rent
            AccountMeta::new_readonly(ASSOCIATED_TOKEN_PROGRAM_ID, false), // associated_token_program
        ];

        Instruction {
            program_id: WHIRLPOOL_PROGRAM_ID,
            accounts,
            data,
        }
    }

    fn build_increase_liquidity_instruction(
        &self,
        pool: &LoadedPool,
        range: &TickRange,
        position: &Pubkey,
        position_mint: &Pubkey,
        owner: &Pubkey,
        params: &OpenPositionParams,
    ) -> Instruction {
        let mut data = Vec::with_capacity(40);
        data.extend_from_slice(&INCREASE_LIQUIDITY);
        data.extend_from_slice(&params.liquidity.to_le_bytes());
        data.extend_from_slice(&params.token_max_a.to_le_bytes());
        data.extend_from_slice(&params.token_max_b.to_le_bytes());

        Instruction {
            program_id: WHIRLPOOL_PROGRAM_ID,
            accounts: liquidity_accounts(pool, range, position, position_mint, owner),
            data,
        }
    }

    fn build_decrease_liquidity_instruction(
        &self,
        pool: &LoadedPool,
        position: &LoadedPosition,
        owner: &Pubkey,
        liquidity: u128,
    ) -> Instruction {
        let mut data = Vec::with_capacity(40);
        data.extend_from_slice(&DECREASE_LIQUIDITY);
        data.extend_from_slice(&liquidity.to_le_bytes());
        data.extend_from_slice(&0u64.to_le_bytes()); // token_min_a
        data.extend_from_slice(&0u64.to_le_bytes()); // token_min_b

        let range = TickRange {
            lower: position.state.tick_lower_index,
            upper: position.state.tick_upper_index,
        };

        Instruction {
            program_id: WHIRLPOOL_PROGRAM_ID,
            accounts: liquidity_accounts(
                pool,
                &range,
                &position.address,
                &position.state.mint(),
                owner,
            ),
            data,
        }
    }

    fn build_collect_fees_instruction(
        &self,
        pool: &LoadedPool,
        position: &LoadedPosition,
        owner: &Pubkey,
    ) -> Instruction {
        let accounts = vec![
            AccountMeta::new_readonly(pool.address, false), // whirlpool
            AccountMeta::new_readonly(*owner, true),        // position_authority
            AccountMeta::new(position.address, false),      // position
            AccountMeta::new_readonly(associated_token_address(owner, &position.state.mint()), false),
            AccountMeta::new(associated_token_address(owner, &pool.state.mint_a()), false),
            AccountMeta::new(pool.state.vault_a(), false),
            AccountMeta::new(associated_token_address(owner, &pool.state.mint_b()), false),
            AccountMeta::new(pool.state.vault_b(), false),
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
        ];

        Instruction {
            program_id: WHIRLPOOL_PROGRAM_ID,
            accounts,
            data: COLLECT_FEES.to_vec(),
        }
    }

    fn build_close_position_instruction(
        &self,
        position: &LoadedPosition,
        owner: &Pubkey,
    ) -> Instruction {
        let mint = position.state.mint();
        let accounts = vec![
            AccountMeta::new_readonly(*owner, true),                     // position_authority
            AccountMeta::new(*owner, false),                             // receiver
            AccountMeta::new(position.address, false),                   // position
            AccountMeta::new(mint, false),                               // position_mint
            AccountMeta::new(associated_token_address(owner, &mint), false), // position_token_account
            AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),          // token_program
        ];

        Instruction {
            program_id: WHIRLPOOL_PROGRAM_ID,
            accounts,
            data: CLOSE_POSITION.to_vec(),
        }
    }
}

/// Account list shared by increase and decrease liquidity.
fn liquidity_accounts(
    pool: &LoadedPool,
    range: &TickRange,
    position: &Pubkey,
    position_mint: &Pubkey,
    owner: &Pubkey,
) -> Vec<AccountMeta> {
    let spacing = pool.state.tick_spacing;
    vec![
        AccountMeta::new(pool.address, false),
        AccountMeta::new_readonly(TOKEN_PROGRAM_ID, false),
        AccountMeta::new_readonly(*owner, true),
        AccountMeta::new(*position, false),
        AccountMeta::new_readonly(associated_token_address(owner, position_mint), false),
        AccountMeta::new(associated_token_address(owner, &pool.state.mint_a()), false),
        AccountMeta::new(associated_token_address(owner, &pool.state.mint_b()), false),
        AccountMeta::new(pool.state.vault_a(), false),
        AccountMeta::new(pool.state.vault_b(), false),
        AccountMeta::new(tick_array_address(&pool.address, range.lower, spacing), false),
        AccountMeta::new(tick_array_address(&pool.address, range.upper, spacing), false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orca::whirlpool::fixtures::{position_bytes, whirlpool_bytes};

    fn loaded_pool() -> LoadedPool {
        let data = whirlpool_bytes(100, 64, &Pubkey::new_unique(), &Pubkey::new_unique());
        LoadedPool {
            address: Pubkey::new_unique(),
            state: Whirlpool::parse(&data).unwrap(),
        }
    }

    fn loaded_position(pool: &LoadedPool, liquidity: u128) -> LoadedPosition {
        let mint = Pubkey::new_unique();
        let data = position_bytes(&pool.address, &mint, liquidity, -128, 128);
        LoadedPosition {
            address: position_address(&mint).0,
            state: Position::parse(&data).unwrap(),
        }
    }

    #[test]
    fn test_decrease_liquidity_layout() {
        let pool = loaded_pool();
        let position = loaded_position(&pool, 5_000);
        let owner = Pubkey::new_unique();
        let ix = WhirlpoolExecutor::default()
            .build_decrease_liquidity_instruction(&pool, &position, &owner, 5_000);

        assert_eq!(&ix.data[..8], &DECREASE_LIQUIDITY);
        assert_eq!(u128::from_le_bytes(ix.data[8..24].try_into().unwrap()), 5_000);
        assert_eq!(ix.accounts.len(), 11);
        assert_eq!(ix.accounts[3].pubkey, position.address);
        assert_eq!(
            ix.accounts[9].pubkey,
            tick_array_address(&pool.address, -128, 64)
        );
    }

    #[test]
    fn test_open_position_layout() {
        let pool = loaded_pool();
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let (position, bump) = position_address(&mint);
        let range = TickRange::new(-640, 640).unwrap();
        let ix = WhirlpoolExecutor::default()
            .build_open_position_instruction(&pool, &range, &owner, &mint, &position, bump);

        assert_eq!(&ix.data[..8], &OPEN_POSITION);
        assert_eq!(ix.data[8], bump);
        assert_eq!(i32::from_le_bytes(ix.data[9..13].try_into().unwrap()), -640);
        assert_eq!(i32::from_le_bytes(ix.data[13..17].try_into().unwrap()), 640);
        assert!(ix.accounts[3].is_signer);
    }

    #[test]
    fn test_close_position_burns_position_nft() {
        let pool = loaded_pool();
        let position = loaded_position(&pool, 0);
        let owner = Pubkey::new_unique();
        let ix = WhirlpoolExecutor::default().build_close_position_instruction(&position, &owner);

        assert_eq!(ix.data, CLOSE_POSITION.to_vec());
        assert_eq!(ix.accounts[3].pubkey, position.state.mint());
    }

    #[test]
    fn test_default_confirmation_mode() {
        assert_eq!(ConfirmationMode::default(), ConfirmationMode::Confirm);
    }
}
