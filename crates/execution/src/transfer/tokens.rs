//! SPL token consolidation.

use super::{DUST_THRESHOLD_UNITS, ProbeFailurePolicy, TransferEngine, aborted_item, aborted_wallet};
use crate::fanout::fan_out;
use crate::report::{BatchReport, ItemOutcome, LiquidationReport, WalletReport};
use crate::wallet::Wallet;
use clmm_keeper_domain::entities::TokenBalance;
use clmm_keeper_protocols::instructions::{
    TOKEN_PROGRAM_ID, associated_token_address, create_associated_token_account, token_transfer,
};
use clmm_keeper_protocols::rpc::{AccountPresence, ChainError, ConnectionPool, RpcProvider};
use clmm_keeper_protocols::transaction::PendingTransaction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

impl TransferEngine {
    /// Moves every token balance above the dust threshold from `source` to
    /// `target`'s associated token accounts.
    ///
    /// Tokens are transferred concurrently. If the balances cannot be listed,
    /// or any token fails, the wallet is reported failed and its tokens are
    /// liquidated once after every attempt has settled.
    pub async fn consolidate_tokens(
        &self,
        rpc: Arc<dyn RpcProvider>,
        source: Arc<Wallet>,
        target: Pubkey,
    ) -> WalletReport {
        let mut report = WalletReport::new(source.short());

        let balances = match rpc
            .get_token_balances(&source.address(), &TOKEN_PROGRAM_ID)
            .await
        {
            Ok(balances) => balances,
            Err(e) => {
                error!(wallet = %source.short(), error = %e, "Failed to list token accounts");
                report.fail(format!("token listing failed: {e}"));
                report.liquidation = Some(self.liquidate(rpc.as_ref(), &source).await);
                return report;
            }
        };

        let movable: Vec<TokenBalance> = balances
            .into_iter()
            .filter(|b| b.exceeds_whole_units(DUST_THRESHOLD_UNITS))
            .collect();

        if movable.is_empty() {
            debug!(wallet = %source.short(), "No token balances above dust threshold");
            return report;
        }

        let labels: Vec<String> = movable.iter().map(|b| b.mint.clone()).collect();
        let jobs: Vec<_> = movable
            .into_iter()
            .map(|balance| {
                let rpc = rpc.clone();
                let source = source.clone();
                let fee = self.fees.token_transfer;
                let policy = self.probe_policy;
                async move {
                    let result =
                        transfer_token(rpc.as_ref(), &source, &target, &balance, fee, policy).await;
                    match &result {
                        Ok(signature) => info!(
                            wallet = %source.short(),
                            mint = %balance.mint,
                            amount = %balance.ui_amount(),
                            signature = %signature,
                            "Tokens sent"
                        ),
                        Err(e) => error!(
                            wallet = %source.short(),
                            mint = %balance.mint,
                            error = %e,
                            "Token transfer failed"
                        ),
                    }
                    ItemOutcome::from_result(balance.mint, result)
                }
            })
            .collect();

        report.items = fan_out(self.pacing.permits(), jobs, |i| aborted_item(labels[i].clone())).await;

        let failed = report.failed_items();
        if failed > 0 {
            report.fail(format!("{failed} of {} token transfers failed", report.items.len()));
            report.liquidation = Some(self.liquidate(rpc.as_ref(), &source).await);
        }

        report
    }

    /// [`consolidate_tokens`](Self::consolidate_tokens) for many wallets at
    /// once, each borrowing its own pool connection. A source equal to the
    /// target is skipped.
    pub async fn consolidate_tokens_batch(
        &self,
        pool: &ConnectionPool,
        sources: &[Arc<Wallet>],
        target: &Wallet,
    ) -> BatchReport {
        let sources: Vec<Arc<Wallet>> = sources
            .iter()
            .filter(|w| w.address() != target.address())
            .cloned()
            .collect();
        let labels: Vec<String> = sources.iter().map(|w| w.short()).collect();

        info!(wallets = sources.len(), target = %target.short(), "Consolidating tokens");

        let jobs: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let engine = self.clone();
                let rpc = pool.get_connection();
                let target = target.address();
                async move { engine.consolidate_tokens(rpc, source, target).await }
            })
            .collect();

        let report = BatchReport {
            wallets: fan_out(self.pacing.permits(), jobs, |i| aborted_wallet(labels[i].clone()))
                .await,
        };
        info!(summary = %report, "Token consolidation finished");
        report
    }

    async fn liquidate(&self, rpc: &dyn RpcProvider, wallet: &Wallet) -> LiquidationReport {
        warn!(wallet = %wallet.short(), "Liquidating wallet tokens");
        match self.liquidator.sell_all(rpc, wallet).await {
            Ok(report) => report,
            Err(e) => {
                error!(wallet = %wallet.short(), error = %format!("{e:#}"), "Liquidation failed");
                LiquidationReport::aborted(format!("{e:#}"))
            }
        }
    }
}

async fn transfer_token(
    rpc: &dyn RpcProvider,
    source: &Wallet,
    target: &Pubkey,
    balance: &TokenBalance,
    priority_fee: u64,
    policy: ProbeFailurePolicy,
) -> Result<Signature, ChainError> {
    let mint: Pubkey = balance
        .mint
        .parse()
        .map_err(|_| ChainError::Decode(format!("invalid mint {}", balance.mint)))?;
    let account: Pubkey = balance
        .account
        .parse()
        .map_err(|_| ChainError::Decode(format!("invalid token account {}", balance.account)))?;

    let owner = source.address();
    let target_ata = associated_token_address(target, &mint);
    let mut tx = PendingTransaction::new(owner);

    let create = match rpc.probe_account(&target_ata).await {
        Ok(AccountPresence::Present) => false,
        Ok(AccountPresence::Absent) => true,
        Err(e) if e.is_transport() && policy == ProbeFailurePolicy::AssumeAbsent => {
            warn!(account = %target_ata, error = %e, "Probe failed, creating account");
            true
        }
        Err(e) => return Err(e),
    };
    if create {
        tx.push(create_associated_token_account(&owner, target, &mint));
    }

    tx.push(token_transfer(&account, &target_ata, &owner, balance.amount)?);
    tx.set_priority_fee(priority_fee);
    tx.submit(rpc, &[source.keypair()]).await
}
