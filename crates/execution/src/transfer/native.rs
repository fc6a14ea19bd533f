//! Native SOL consolidation and distribution.

use super::{TransferEngine, aborted_wallet};
use crate::fanout::fan_out;
use crate::report::{BatchReport, ItemOutcome, WalletReport};
use crate::wallet::{Wallet, short_address};
use clmm_keeper_domain::value_objects::Lamports;
use clmm_keeper_protocols::instructions::system_transfer;
use clmm_keeper_protocols::rpc::{ConnectionPool, RpcProvider};
use clmm_keeper_protocols::transaction::PendingTransaction;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Left behind in every consolidated wallet to pay for future fees.
pub const NATIVE_RESERVE: Lamports = Lamports(2_000_000);

const NATIVE_LABEL: &str = "SOL";

impl TransferEngine {
    /// Sends everything above [`NATIVE_RESERVE`] from `source` to `target`.
    pub async fn consolidate_native(
        &self,
        rpc: &dyn RpcProvider,
        source: &Wallet,
        target: &Pubkey,
    ) -> WalletReport {
        let balance = match rpc.get_balance(&source.address()).await {
            Ok(lamports) => Lamports(lamports),
            Err(e) => {
                error!(wallet = %source.short(), error = %e, "Failed to read balance");
                return WalletReport::single(source.short(), ItemOutcome::failed(NATIVE_LABEL, e));
            }
        };

        let Some(amount) = balance.positive_remainder(NATIVE_RESERVE) else {
            info!(wallet = %source.short(), balance = %balance, "Balance below reserve, skipping");
            return WalletReport::single(
                source.short(),
                ItemOutcome::skipped(NATIVE_LABEL, format!("balance {balance} below reserve")),
            );
        };

        let result = PendingTransaction::new(source.address())
            .with_instruction(system_transfer(&source.address(), target, amount.get()))
            .with_priority_fee(self.fees.native_transfer)
            .submit(rpc, &[source.keypair()])
            .await;

        match &result {
            Ok(signature) => {
                info!(wallet = %source.short(), amount = %amount, signature = %signature, "SOL sent");
            }
            Err(e) => error!(wallet = %source.short(), error = %e, "Error consolidating SOL"),
        }
        WalletReport::single(source.short(), ItemOutcome::from_result(NATIVE_LABEL, result))
    }

    /// [`consolidate_native`](Self::consolidate_native) for many wallets at once.
    /// A source equal to the target is skipped.
    pub async fn consolidate_native_batch(
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

        info!(wallets = sources.len(), target = %target.short(), "Consolidating SOL");

        let jobs: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let engine = self.clone();
                let rpc = pool.get_connection();
                let target = target.address();
                async move { engine.consolidate_native(rpc.as_ref(), &source, &target).await }
            })
            .collect();

        let report = BatchReport {
            wallets: fan_out(self.pacing.permits(), jobs, |i| aborted_wallet(labels[i].clone()))
                .await,
        };
        info!(summary = %report, "SOL consolidation finished");
        report
    }

    /// Splits `total` evenly (floored) across `targets` and sends each share
    /// from `source`.
    ///
    /// Waits a random jitter first. Each recipient's transfer is confirmed and
    /// followed by the inter-transaction delay. At most
    /// [`PacingPolicy::permits`](crate::pacing::PacingPolicy::permits)
    /// transfers are being signed and broadcast at once; a slow confirmation
    /// does not hold back the remaining recipients. Each recipient gets its
    /// own entry in the report.
    pub async fn distribute_native(
        &self,
        rpc: Arc<dyn RpcProvider>,
        source: Arc<Wallet>,
        targets: &[Pubkey],
        total: Lamports,
    ) -> BatchReport {
        let Some(share) = total.split_evenly(targets.len()) else {
            warn!("No recipients selected for distribution");
            return BatchReport::default();
        };

        let labels: Vec<String> = targets.iter().map(|t| short_address(&t.to_string())).collect();

        if share == Lamports::ZERO {
            warn!(total = %total, recipients = targets.len(), "Share per recipient rounds to zero");
            return BatchReport {
                wallets: labels
                    .into_iter()
                    .map(|label| {
                        WalletReport::single(label, ItemOutcome::skipped(NATIVE_LABEL, "zero share"))
                    })
                    .collect(),
            };
        }

        self.pacing.wait_jitter().await;
        info!(
            total = %total,
            recipients = targets.len(),
            per_wallet = %share,
            "Distributing SOL"
        );

        // Only signing and broadcasting are bounded; confirmation and the
        // inter-transaction delay run outside the gate.
        let submit_gate = Arc::new(Semaphore::new(self.pacing.permits()));
        let jobs: Vec<_> = targets
            .iter()
            .zip(labels.iter().cloned())
            .map(|(target, label)| {
                let rpc = rpc.clone();
                let source = source.clone();
                let submit_gate = submit_gate.clone();
                let target = *target;
                let fee = self.fees.native_transfer;
                let pacing = self.pacing;
                async move {
                    let sent = {
                        let _permit = submit_gate.acquire().await.ok();
                        PendingTransaction::new(source.address())
                            .with_instruction(system_transfer(&source.address(), &target, share.get()))
                            .with_priority_fee(fee)
                            .submit(rpc.as_ref(), &[source.keypair()])
                            .await
                    };
                    let result = match sent {
                        Ok(signature) => rpc.confirm_signature(&signature).await.map(|()| signature),
                        Err(e) => Err(e),
                    };

                    match &result {
                        Ok(signature) => {
                            info!(wallet = %label, amount = %share, signature = %signature, "SOL sent");
                            pacing.wait_between_transactions().await;
                        }
                        Err(e) => error!(
                            wallet = %source.short(),
                            recipient = %label,
                            error = %e,
                            "Error sending SOL"
                        ),
                    }
                    WalletReport::single(label, ItemOutcome::from_result(NATIVE_LABEL, result))
                }
            })
            .collect();

        BatchReport {
            wallets: fan_out(targets.len(), jobs, |i| aborted_wallet(labels[i].clone())).await,
        }
    }
}
