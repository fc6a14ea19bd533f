//! Prelude module for convenient imports.
//!
//! ```rust
//! use clmm_keeper_execution::prelude::*;
//! ```

pub use crate::fees::FeeSchedule;
pub use crate::liquidation::{JupiterLiquidator, Liquidator};
pub use crate::pacing::PacingPolicy;
pub use crate::report::{BatchReport, ItemOutcome, LiquidationReport, OutcomeStatus, WalletReport};
pub use crate::strategy::{
    AutoCheckConfig, AutoCheckError, AutoCheckSummary, AutoChecker, CheckState, ExitPolicy,
    PositionManager, RangeExitPolicy, TickReport, WalletCheck, WhirlpoolPositionManager,
};
pub use crate::transfer::{
    DUST_THRESHOLD_UNITS, NATIVE_RESERVE, ProbeFailurePolicy, TransferEngine,
};
pub use crate::wallet::{MAIN_WALLET_ID, Wallet, WalletError, WalletRegistry};
