//! Remote data providers.

mod dexscreener;
mod jupiter;

pub use dexscreener::{DexPair, DexScreenerProvider, select_pair};
pub use jupiter::{JupiterClient, Quote};

use async_trait::async_trait;
use clmm_keeper_domain::entities::TokenInfo;
use rust_decimal::Decimal;

/// Token market lookups.
///
/// Implementations never fail past this boundary: a failed lookup yields
/// [`TokenInfo::unknown`] and a failed SOL price yields zero.
#[async_trait]
pub trait TokenInfoProvider: Send + Sync {
    /// Market snapshot for `address`.
    async fn token_info(&self, address: &str) -> TokenInfo;

    /// SOL price in USD, or zero if unavailable.
    async fn sol_price_usd(&self) -> Decimal;
}
