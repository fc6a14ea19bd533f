//! Transfer and consolidation engine.
//!
//! Every operation builds a fresh transaction per unit of work, patches the
//! priority fee, signs with the source wallet and broadcasts through a pool
//! connection. Failures are recorded per token, recipient or wallet and never
//! cancel sibling work.

mod native;
mod tokens;

pub use native::NATIVE_RESERVE;

use crate::fees::FeeSchedule;
use crate::liquidation::Liquidator;
use crate::pacing::PacingPolicy;
use crate::report::{ItemOutcome, WalletReport};
use std::sync::Arc;

/// Balances at or below this many whole tokens are left in place.
pub const DUST_THRESHOLD_UNITS: u64 = 5;

/// What to do when probing the destination token account fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeFailurePolicy {
    /// Fail the token transfer with the probe error.
    #[default]
    Propagate,
    /// Treat the account as missing and include its creation.
    AssumeAbsent,
}

/// Builds, signs and submits transfers for one wallet or a batch of wallets.
#[derive(Clone)]
pub struct TransferEngine {
    liquidator: Arc<dyn Liquidator>,
    fees: FeeSchedule,
    pacing: PacingPolicy,
    probe_policy: ProbeFailurePolicy,
}

impl TransferEngine {
    #[must_use]
    pub fn new(liquidator: Arc<dyn Liquidator>) -> Self {
        Self {
            liquidator,
            fees: FeeSchedule::default(),
            pacing: PacingPolicy::default(),
            probe_policy: ProbeFailurePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    #[must_use]
    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    #[must_use]
    pub fn with_probe_policy(mut self, policy: ProbeFailurePolicy) -> Self {
        self.probe_policy = policy;
        self
    }

    #[must_use]
    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    #[must_use]
    pub fn pacing(&self) -> &PacingPolicy {
        &self.pacing
    }
}

fn aborted_item(label: String) -> ItemOutcome {
    ItemOutcome::failed(label, "task aborted")
}

fn aborted_wallet(wallet: String) -> WalletReport {
    let mut report = WalletReport::new(wallet);
    report.fail("task aborted");
    report
}
