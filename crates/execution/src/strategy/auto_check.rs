//! Cancellable polling loop over a set of wallets' positions.

use super::{ExitPolicy, PositionManager, RangeExitPolicy};
use crate::fanout::fan_out;
use crate::wallet::Wallet;
use clmm_keeper_domain::enums::{AutoCheckAction, Decision, LiquidityShape};
use clmm_keeper_protocols::rpc::{ConnectionPool, RpcProvider};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, info, warn};

/// Errors that prevent the loop from starting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AutoCheckError {
    #[error("no wallets selected")]
    NoWalletsSelected,
}

/// Where a wallet's check ended up during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    /// Not started, or the wallet holds no position in the pool.
    Idle,
    Polling,
    Evaluating,
    Holding,
    Closing,
    Reopening,
    /// The loop was stopped.
    Cancelled,
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Polling => "polling",
            Self::Evaluating => "evaluating",
            Self::Holding => "holding",
            Self::Closing => "closing",
            Self::Reopening => "reopening",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Loop configuration.
#[derive(Debug, Clone)]
pub struct AutoCheckConfig {
    /// Pause between ticks.
    pub interval: Duration,
    /// Stop after this many ticks. `None` runs until stopped.
    pub max_ticks: Option<u64>,
    /// Wallets checked concurrently.
    pub max_in_flight: usize,
}

impl Default for AutoCheckConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_ticks: None,
            max_in_flight: 8,
        }
    }
}

/// One wallet's result for one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletCheck {
    pub wallet: String,
    /// Last state reached.
    pub state: CheckState,
    pub decision: Option<Decision>,
    /// Signature of the close or reopen transaction.
    pub signature: Option<Signature>,
    pub error: Option<String>,
}

impl WalletCheck {
    fn new(wallet: String) -> Self {
        Self {
            wallet,
            state: CheckState::Idle,
            decision: None,
            signature: None,
            error: None,
        }
    }
}

/// Everything that happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Zero-based tick number.
    pub tick: u64,
    pub wallets: Vec<WalletCheck>,
}

impl TickReport {
    #[must_use]
    pub fn failures(&self) -> usize {
        self.wallets.iter().filter(|w| w.error.is_some()).count()
    }
}

/// Totals over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoCheckSummary {
    pub ticks: u64,
    pub wallet_failures: u64,
    pub actions: u64,
}

/// Periodically checks positions and closes or reopens those that left
/// their range.
pub struct AutoChecker {
    pool: Arc<ConnectionPool>,
    manager: Arc<dyn PositionManager>,
    policy: Option<Arc<dyn ExitPolicy>>,
    config: AutoCheckConfig,
    reports: Option<mpsc::UnboundedSender<TickReport>>,
    cancelled: AtomicBool,
    wake: Notify,
}

impl AutoChecker {
    /// Creates a checker using [`RangeExitPolicy`] with the action given to
    /// [`run_auto_check`](Self::run_auto_check).
    pub fn new(
        pool: Arc<ConnectionPool>,
        manager: Arc<dyn PositionManager>,
        config: AutoCheckConfig,
    ) -> Self {
        Self {
            pool,
            manager,
            policy: None,
            config,
            reports: None,
            cancelled: AtomicBool::new(false),
            wake: Notify::new(),
        }
    }

    /// Replaces the default range policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn ExitPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Sends every tick report to `sink`.
    #[must_use]
    pub fn with_reports(mut self, sink: mpsc::UnboundedSender<TickReport>) -> Self {
        self.reports = Some(sink);
        self
    }

    /// Stops scheduling new ticks. A tick in progress runs to completion.
    pub fn stop(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Checks every wallet's position in `pool` each interval until stopped
    /// (or `max_ticks` is reached).
    ///
    /// # Errors
    /// Returns [`AutoCheckError::NoWalletsSelected`] for an empty selection.
    pub async fn run_auto_check(
        &self,
        wallets: &[Arc<Wallet>],
        action: AutoCheckAction,
        pool: Pubkey,
        shape: LiquidityShape,
    ) -> Result<AutoCheckSummary, AutoCheckError> {
        if wallets.is_empty() {
            return Err(AutoCheckError::NoWalletsSelected);
        }

        let policy: Arc<dyn ExitPolicy> = match &self.policy {
            Some(policy) => policy.clone(),
            None => Arc::new(RangeExitPolicy::new(action)),
        };

        info!(
            wallets = wallets.len(),
            pool = %pool,
            action = ?action,
            shape = ?shape,
            interval_secs = self.config.interval.as_secs(),
            "Starting auto-check"
        );

        let mut summary = AutoCheckSummary::default();
        loop {
            if self.is_cancelled() {
                break;
            }

            let report = self.tick(summary.ticks, wallets, &policy, pool, shape).await;
            summary.ticks += 1;
            summary.wallet_failures += report.failures() as u64;
            summary.actions += report
                .wallets
                .iter()
                .filter(|w| w.signature.is_some())
                .count() as u64;

            if let Some(sink) = &self.reports {
                let _ = sink.send(report);
            }

            if self.config.max_ticks.is_some_and(|max| summary.ticks >= max) {
                break;
            }

            tokio::select! {
                () = tokio::time::sleep(self.config.interval) => {}
                () = self.wake.notified() => {}
            }
        }

        let state = if self.is_cancelled() {
            CheckState::Cancelled
        } else {
            CheckState::Idle
        };
        info!(
            ticks = summary.ticks,
            failures = summary.wallet_failures,
            actions = summary.actions,
            state = %state,
            "Auto-check stopped"
        );
        Ok(summary)
    }

    async fn tick(
        &self,
        tick: u64,
        wallets: &[Arc<Wallet>],
        policy: &Arc<dyn ExitPolicy>,
        pool: Pubkey,
        shape: LiquidityShape,
    ) -> TickReport {
        debug!(tick, wallets = wallets.len(), "Auto-check tick");

        let labels: Vec<String> = wallets.iter().map(|w| w.short()).collect();
        let jobs: Vec<_> = wallets
            .iter()
            .cloned()
            .map(|wallet| {
                let manager = self.manager.clone();
                let policy = policy.clone();
                let rpc = self.pool.get_connection();
                async move {
                    check_wallet(rpc.as_ref(), manager.as_ref(), policy.as_ref(), &wallet, pool, shape)
                        .await
                }
            })
            .collect();

        let checks = fan_out(self.config.max_in_flight, jobs, |i| {
            let mut check = WalletCheck::new(labels[i].clone());
            check.error = Some("task aborted".to_string());
            check
        })
        .await;

        TickReport {
            tick,
            wallets: checks,
        }
    }
}

async fn check_wallet(
    rpc: &dyn RpcProvider,
    manager: &dyn PositionManager,
    policy: &dyn ExitPolicy,
    wallet: &Wallet,
    pool: Pubkey,
    shape: LiquidityShape,
) -> WalletCheck {
    let mut check = WalletCheck::new(wallet.short());

    check.state = CheckState::Polling;
    let state = match manager.fetch_state(rpc, wallet, &pool).await {
        Ok(Some(state)) => state,
        Ok(None) => {
            debug!(wallet = %wallet.short(), pool = %pool, "No open position");
            check.state = CheckState::Idle;
            return check;
        }
        Err(e) => {
            let error = format!("{e:#}");
            warn!(wallet = %wallet.short(), error = %error, "Failed to fetch position");
            check.error = Some(error);
            return check;
        }
    };

    check.state = CheckState::Evaluating;
    let decision = policy.decide(&state);
    check.decision = Some(decision);
    debug!(
        wallet = %wallet.short(),
        tick = state.current_tick,
        lower = state.range.lower,
        upper = state.range.upper,
        decision = %decision,
        "Position evaluated"
    );

    let result = match decision {
        Decision::Hold => {
            check.state = CheckState::Holding;
            return check;
        }
        Decision::Close => {
            check.state = CheckState::Closing;
            info!(wallet = %wallet.short(), position = %state.position, "Position out of range, closing");
            manager.close_position(rpc, wallet, &state).await
        }
        Decision::Reopen => {
            check.state = CheckState::Reopening;
            info!(wallet = %wallet.short(), position = %state.position, "Position out of range, reopening");
            manager.reopen_position(rpc, wallet, &state, shape).await
        }
    };

    match result {
        Ok(signature) => check.signature = Some(signature),
        Err(e) => {
            let error = format!("{e:#}");
            warn!(wallet = %wallet.short(), decision = %decision, error = %error, "Position action failed");
            check.error = Some(error);
        }
    }
    check
}
