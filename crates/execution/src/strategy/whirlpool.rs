//! Orca Whirlpool implementation of [`PositionManager`].

use super::PositionManager;
use crate::fees::FeeSchedule;
use crate::wallet::Wallet;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use clmm_keeper_domain::entities::PositionState;
use clmm_keeper_domain::enums::LiquidityShape;
use clmm_keeper_domain::value_objects::TickRange;
use clmm_keeper_protocols::instructions::TOKEN_PROGRAM_ID;
use clmm_keeper_protocols::orca::{
    ConfirmationMode, LoadedPool, LoadedPosition, OpenPositionParams, Position, WhirlpoolExecutor,
};
use clmm_keeper_protocols::rpc::RpcProvider;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use tracing::info;

/// Manages Whirlpool positions with the position priority fees.
#[derive(Debug, Clone, Default)]
pub struct WhirlpoolPositionManager {
    executor: WhirlpoolExecutor,
    fees: FeeSchedule,
}

impl WhirlpoolPositionManager {
    #[must_use]
    pub fn new(confirmation: ConfirmationMode, fees: FeeSchedule) -> Self {
        Self {
            executor: WhirlpoolExecutor::new(confirmation),
            fees,
        }
    }

    async fn load(
        &self,
        rpc: &dyn RpcProvider,
        state: &PositionState,
    ) -> Result<(LoadedPool, LoadedPosition)> {
        let pool_address: Pubkey = state.pool.parse().context("Invalid pool address")?;
        let position_address: Pubkey =
            state.position.parse().context("Invalid position address")?;

        let pool = self.executor.load_pool(rpc, &pool_address).await?;
        let data = rpc
            .get_account_data(&position_address)
            .await?
            .ok_or_else(|| anyhow!("position {position_address} no longer exists"))?;
        let position = LoadedPosition {
            address: position_address,
            state: Position::parse(&data).context("Failed to decode position account")?,
        };
        Ok((pool, position))
    }

    async fn token_total(rpc: &dyn RpcProvider, owner: &Pubkey, mint: &Pubkey) -> Result<u64> {
        let mint = mint.to_string();
        let balances = rpc.get_token_balances(owner, &TOKEN_PROGRAM_ID).await?;
        Ok(balances
            .iter()
            .filter(|b| b.mint == mint)
            .map(|b| b.amount)
            .fold(0u64, u64::saturating_add))
    }
}

#[async_trait]
impl PositionManager for WhirlpoolPositionManager {
    async fn fetch_state(
        &self,
        rpc: &dyn RpcProvider,
        wallet: &Wallet,
        pool: &Pubkey,
    ) -> Result<Option<PositionState>> {
        let owner = wallet.address();
        let Some(position) = self.executor.find_position(rpc, &owner, pool).await? else {
            return Ok(None);
        };
        let loaded = self.executor.load_pool(rpc, pool).await?;
        let range = TickRange::new(
            position.state.tick_lower_index,
            position.state.tick_upper_index,
        )?;

        Ok(Some(PositionState {
            wallet: owner.to_string(),
            pool: pool.to_string(),
            position: position.address.to_string(),
            current_tick: loaded.state.tick_current_index,
            range,
            tick_spacing: loaded.state.tick_spacing,
            liquidity: position.state.liquidity,
            shape: None,
        }))
    }

    async fn close_position(
        &self,
        rpc: &dyn RpcProvider,
        wallet: &Wallet,
        state: &PositionState,
    ) -> Result<Signature> {
        let (pool, position) = self.load(rpc, state).await?;
        self.executor
            .close_position(rpc, wallet.keypair(), &pool, &position, self.fees.position_remove)
            .await
    }

    async fn reopen_position(
        &self,
        rpc: &dyn RpcProvider,
        wallet: &Wallet,
        state: &PositionState,
        shape: LiquidityShape,
    ) -> Result<Signature> {
        let (pool, position) = self.load(rpc, state).await?;

        // The open spends what the close withdrew, so the close must land first.
        WhirlpoolExecutor::new(ConfirmationMode::Confirm)
            .close_position(rpc, wallet.keypair(), &pool, &position, self.fees.position_remove)
            .await?;

        let owner = wallet.address();
        let params = OpenPositionParams {
            range: state.reopen_range(),
            liquidity: state.liquidity,
            token_max_a: Self::token_total(rpc, &owner, &pool.state.mint_a()).await?,
            token_max_b: Self::token_total(rpc, &owner, &pool.state.mint_b()).await?,
            priority_fee: self.fees.position_create,
        };
        info!(
            wallet = %wallet.short(),
            lower = params.range.lower,
            upper = params.range.upper,
            shape = ?shape,
            "Reopening position"
        );

        let (new_position, signature) = self
            .executor
            .open_position(rpc, wallet.keypair(), &pool, &params)
            .await?;
        info!(wallet = %wallet.short(), position = %new_position, "Position reopened");
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockRpc, token, wallet};
    use clmm_keeper_protocols::orca::whirlpool::fixtures::{position_bytes, whirlpool_bytes};
    use clmm_keeper_protocols::orca::whirlpool::position_address;

    struct Fixture {
        rpc: std::sync::Arc<MockRpc>,
        wallet: std::sync::Arc<Wallet>,
        pool: Pubkey,
        mint_a: Pubkey,
        mint_b: Pubkey,
        position: Pubkey,
    }

    fn fixture(current_tick: i32) -> Fixture {
        let rpc = MockRpc::new();
        let wallet = wallet(2);
        let pool = Pubkey::new_unique();
        let mint_a = Pubkey::new_unique();
        let mint_b = Pubkey::new_unique();
        let position_mint = Pubkey::new_unique();
        let (position, _) = position_address(&position_mint);

        rpc.set_account(pool, whirlpool_bytes(current_tick, 64, &mint_a, &mint_b));
        rpc.set_account(position, position_bytes(&pool, &position_mint, 5_000, -128, 128));
        rpc.set_tokens(
            wallet.address(),
            vec![
                token(&position_mint, 1, 0),
                token(&mint_a, 700, 6),
                token(&mint_b, 900, 9),
            ],
        );

        Fixture {
            rpc,
            wallet,
            pool,
            mint_a,
            mint_b,
            position,
        }
    }

    #[tokio::test]
    async fn test_fetch_state_reads_pool_and_position() {
        let f = fixture(300);
        let manager = WhirlpoolPositionManager::default();

        let state = manager
            .fetch_state(f.rpc.as_ref(), &f.wallet, &f.pool)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(state.position, f.position.to_string());
        assert_eq!(state.current_tick, 300);
        assert_eq!(state.range, TickRange::new(-128, 128).unwrap());
        assert_eq!(state.tick_spacing, 64);
        assert_eq!(state.liquidity, 5_000);
        assert!(!state.in_range());
        assert_eq!(state.shape, None);
    }

    #[tokio::test]
    async fn test_fetch_state_without_position() {
        let f = fixture(0);
        let manager = WhirlpoolPositionManager::default();
        let other = wallet(3);

        let state = manager.fetch_state(f.rpc.as_ref(), &other, &f.pool).await.unwrap();
        assert!(state.is_none());
    }

    #[tokio::test]
    async fn test_close_sends_one_transaction() {
        let f = fixture(300);
        let manager = WhirlpoolPositionManager::new(ConfirmationMode::Fire, FeeSchedule::default());
        let state = manager
            .fetch_state(f.rpc.as_ref(), &f.wallet, &f.pool)
            .await
            .unwrap()
            .unwrap();

        manager
            .close_position(f.rpc.as_ref(), &f.wallet, &state)
            .await
            .unwrap();

        let sent = f.rpc.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(f.rpc.confirmations(), 0);
        let account_keys = &sent[0].message.account_keys;
        assert!(account_keys.contains(&f.position));
        assert!(account_keys.contains(&f.mint_a));
        assert!(account_keys.contains(&f.mint_b));
    }

    #[tokio::test]
    async fn test_reopen_confirms_close_before_open() {
        let f = fixture(300);
        let manager = WhirlpoolPositionManager::new(ConfirmationMode::Fire, FeeSchedule::default());
        let state = manager
            .fetch_state(f.rpc.as_ref(), &f.wallet, &f.pool)
            .await
            .unwrap()
            .unwrap();

        manager
            .reopen_position(f.rpc.as_ref(), &f.wallet, &state, LiquidityShape::Curve)
            .await
            .unwrap();

        let sent = f.rpc.sent();
        assert_eq!(sent.len(), 2);
        // Only the close waits for confirmation in fire mode.
        assert_eq!(f.rpc.confirmations(), 1);
        assert!(sent[0].message.account_keys.contains(&f.position));
        assert!(!sent[1].message.account_keys.contains(&f.position));
    }

    #[tokio::test]
    async fn test_close_missing_position_fails() {
        let f = fixture(300);
        let manager = WhirlpoolPositionManager::default();
        let mut state = manager
            .fetch_state(f.rpc.as_ref(), &f.wallet, &f.pool)
            .await
            .unwrap()
            .unwrap();
        state.position = Pubkey::new_unique().to_string();

        let err = manager
            .close_position(f.rpc.as_ref(), &f.wallet, &state)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no longer exists"));
        assert!(f.rpc.sent().is_empty());
    }
}
