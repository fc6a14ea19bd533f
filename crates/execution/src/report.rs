//! Per-item, per-wallet and per-batch outcome records.

use solana_sdk::signature::Signature;
use std::fmt;

/// What happened to a single token, recipient or swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Broadcast (and confirmed, where the operation confirms).
    Succeeded {
        /// Transaction signature.
        signature: Signature,
    },
    /// Nothing to do.
    Skipped {
        /// Why.
        reason: String,
    },
    /// The attempt failed.
    Failed {
        /// Error text.
        error: String,
    },
}

/// Outcome of one unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    /// Mint, recipient or other identifier.
    pub label: String,
    pub status: OutcomeStatus,
}

impl ItemOutcome {
    pub fn succeeded(label: impl Into<String>, signature: Signature) -> Self {
        Self {
            label: label.into(),
            status: OutcomeStatus::Succeeded { signature },
        }
    }

    pub fn skipped(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            status: OutcomeStatus::Skipped {
                reason: reason.into(),
            },
        }
    }

    pub fn failed(label: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            label: label.into(),
            status: OutcomeStatus::Failed {
                error: error.to_string(),
            },
        }
    }

    /// Maps a submission result.
    pub fn from_result<E: fmt::Display>(label: impl Into<String>, result: Result<Signature, E>) -> Self {
        match result {
            Ok(signature) => Self::succeeded(label, signature),
            Err(e) => Self::failed(label, e),
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }

    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded { .. })
    }
}

/// Result of a liquidation pass over one wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiquidationReport {
    /// One entry per token sold or attempted.
    pub items: Vec<ItemOutcome>,
    /// Set if the pass could not run at all.
    pub error: Option<String>,
}

impl LiquidationReport {
    /// A pass that never got to individual tokens.
    pub fn aborted(error: impl fmt::Display) -> Self {
        Self {
            items: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

/// Everything that happened to one wallet during an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletReport {
    /// Short wallet address.
    pub wallet: String,
    pub items: Vec<ItemOutcome>,
    /// Wallet-level failure (enumeration error, failed items).
    pub error: Option<String>,
    /// Present if the wallet was liquidated.
    pub liquidation: Option<LiquidationReport>,
}

impl WalletReport {
    pub fn new(wallet: impl Into<String>) -> Self {
        Self {
            wallet: wallet.into(),
            ..Self::default()
        }
    }

    /// Report holding a single item.
    pub fn single(wallet: impl Into<String>, item: ItemOutcome) -> Self {
        Self {
            items: vec![item],
            ..Self::new(wallet)
        }
    }

    /// Marks the wallet failed.
    pub fn fail(&mut self, error: impl fmt::Display) {
        self.error = Some(error.to_string());
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.error.is_some() || self.items.iter().any(ItemOutcome::is_failed)
    }

    #[must_use]
    pub fn failed_items(&self) -> usize {
        self.items.iter().filter(|i| i.is_failed()).count()
    }
}

/// Reports for a set of wallets or recipients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub wallets: Vec<WalletReport>,
}

impl BatchReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.wallets.iter().filter(|w| !w.is_failed()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.wallets.iter().filter(|w| w.is_failed()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} wallets: {} ok, {} failed",
            self.wallets.len(),
            self.succeeded(),
            self.failed()
        )
    }
}
