//! Position auto-check.
//!
//! - [`AutoChecker`]: the cancellable polling loop
//! - [`ExitPolicy`]: turns a position snapshot into a decision
//! - [`PositionManager`]: reads positions and executes close/reopen

mod auto_check;
mod policy;
mod whirlpool;

pub use auto_check::{
    AutoCheckConfig, AutoCheckError, AutoCheckSummary, AutoChecker, CheckState, TickReport,
    WalletCheck,
};
pub use policy::{ExitPolicy, RangeExitPolicy};
pub use whirlpool::WhirlpoolPositionManager;

use crate::wallet::Wallet;
use async_trait::async_trait;
use clmm_keeper_domain::entities::PositionState;
use clmm_keeper_domain::enums::LiquidityShape;
use clmm_keeper_protocols::rpc::RpcProvider;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

/// Reads and acts on a wallet's position in a pool.
#[async_trait]
pub trait PositionManager: Send + Sync {
    /// Current state of the wallet's position, `None` if it holds none.
    async fn fetch_state(
        &self,
        rpc: &dyn RpcProvider,
        wallet: &Wallet,
        pool: &Pubkey,
    ) -> anyhow::Result<Option<PositionState>>;

    /// Withdraws and closes the position.
    async fn close_position(
        &self,
        rpc: &dyn RpcProvider,
        wallet: &Wallet,
        state: &PositionState,
    ) -> anyhow::Result<Signature>;

    /// Closes the position and opens a new one around the current price.
    async fn reopen_position(
        &self,
        rpc: &dyn RpcProvider,
        wallet: &Wallet,
        state: &PositionState,
        shape: LiquidityShape,
    ) -> anyhow::Result<Signature>;
}
