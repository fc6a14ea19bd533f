//! Priority fees per transaction kind.

use serde::Deserialize;

/// Compute unit prices (micro-lamports per CU) and the swap fee (lamports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    /// SPL token consolidation transfers.
    pub token_transfer: u64,
    /// Native SOL transfers.
    pub native_transfer: u64,
    /// Closing a position.
    pub position_remove: u64,
    /// Opening a position.
    pub position_create: u64,
    /// Prioritization fee for liquidation swaps, in lamports.
    pub liquidation_lamports: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            token_transfer: 500_000,
            native_transfer: 100_000,
            position_remove: 1_500_000,
            position_create: 1_500_000,
            liquidation_lamports: 300_000, // 0.0003 SOL
        }
    }
}
