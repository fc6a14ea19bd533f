//! Compensating liquidation of a wallet's tokens.
//!
//! Invoked when token consolidation for a wallet fails, so that whatever
//! could not be moved is at least converted to SOL.

mod jupiter;

pub use jupiter::{JupiterLiquidator, decode_swap_transaction};

use crate::report::LiquidationReport;
use crate::wallet::Wallet;
use async_trait::async_trait;
use clmm_keeper_protocols::rpc::RpcProvider;

/// Sells every token a wallet holds.
#[async_trait]
pub trait Liquidator: Send + Sync {
    /// Attempts to sell each token balance; per-token failures go into the report.
    ///
    /// # Errors
    /// Fails only if the wallet's balances cannot be listed.
    async fn sell_all(
        &self,
        rpc: &dyn RpcProvider,
        wallet: &Wallet,
    ) -> anyhow::Result<LiquidationReport>;
}
