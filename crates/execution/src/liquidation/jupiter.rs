//! Liquidation through Jupiter swaps into wrapped SOL.

use super::Liquidator;
use crate::report::{ItemOutcome, LiquidationReport};
use crate::wallet::Wallet;
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clmm_keeper_data::JupiterClient;
use clmm_keeper_domain::entities::TokenBalance;
use clmm_keeper_protocols::instructions::{TOKEN_PROGRAM_ID, WRAPPED_SOL_MINT};
use clmm_keeper_protocols::rpc::RpcProvider;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use tracing::{info, warn};

/// Default slippage for liquidation swaps.
pub const DEFAULT_SLIPPAGE_BPS: u16 = 500;

/// [`Liquidator`] that swaps each token into SOL through Jupiter.
#[derive(Debug, Clone)]
pub struct JupiterLiquidator {
    client: JupiterClient,
    slippage_bps: u16,
    priority_fee_lamports: u64,
}

impl JupiterLiquidator {
    #[must_use]
    pub fn new(client: JupiterClient, priority_fee_lamports: u64) -> Self {
        Self {
            client,
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            priority_fee_lamports,
        }
    }

    #[must_use]
    pub fn with_slippage_bps(mut self, slippage_bps: u16) -> Self {
        self.slippage_bps = slippage_bps;
        self
    }

    async fn sell(
        &self,
        rpc: &dyn RpcProvider,
        wallet: &Wallet,
        balance: &TokenBalance,
    ) -> Result<Signature> {
        let quote = self
            .client
            .quote(
                &balance.mint,
                &WRAPPED_SOL_MINT.to_string(),
                balance.amount,
                self.slippage_bps,
            )
            .await
            .context("quote failed")?;

        let encoded = self
            .client
            .swap_transaction(
                &quote,
                &wallet.address().to_string(),
                self.priority_fee_lamports,
            )
            .await
            .context("swap request failed")?;

        let unsigned = decode_swap_transaction(&encoded)?;
        let signed = VersionedTransaction::try_new(unsigned.message, &[wallet.keypair()])
            .context("failed to sign swap")?;

        let signature = rpc.send_versioned_transaction(&signed).await?;
        info!(
            wallet = %wallet.short(),
            mint = %balance.mint,
            out_lamports = quote.out_amount,
            signature = %signature,
            "Token sold"
        );
        Ok(signature)
    }
}

/// Decodes a base64 bincode-serialized versioned transaction.
pub fn decode_swap_transaction(encoded: &str) -> Result<VersionedTransaction> {
    let bytes = STANDARD
        .decode(encoded)
        .context("swap transaction is not valid base64")?;
    bincode::deserialize(&bytes).context("swap transaction could not be deserialized")
}

#[async_trait]
impl Liquidator for JupiterLiquidator {
    async fn sell_all(&self, rpc: &dyn RpcProvider, wallet: &Wallet) -> Result<LiquidationReport> {
        let balances = rpc
            .get_token_balances(&wallet.address(), &TOKEN_PROGRAM_ID)
            .await
            .context("failed to list token balances")?;

        let wsol = WRAPPED_SOL_MINT.to_string();
        let mut report = LiquidationReport::default();

        for balance in balances
            .iter()
            .filter(|b| b.amount > 0 && b.mint != wsol)
        {
            let outcome = self.sell(rpc, wallet, balance).await;
            if let Err(e) = &outcome {
                warn!(wallet = %wallet.short(), mint = %balance.mint, error = %e, "Sell failed");
            }
            report
                .items
                .push(ItemOutcome::from_result(balance.mint.clone(), outcome.map_err(|e| format!("{e:#}"))));
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockRpc, token, wallet};
    use clmm_keeper_protocols::instructions::system_transfer;
    use solana_sdk::hash::Hash;
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::signer::Signer;
    use solana_sdk::transaction::Transaction;

    #[test]
    fn test_decode_and_sign_swap_transaction() {
        let owner = wallet(2);
        let ix = system_transfer(&owner.address(), &Pubkey::new_unique(), 1);
        let mut legacy = Transaction::new_with_payer(&[ix], Some(&owner.address()));
        legacy.message.recent_blockhash = Hash::new_unique();
        let unsigned = VersionedTransaction::from(legacy);

        let encoded = STANDARD.encode(bincode::serialize(&unsigned).unwrap());
        let decoded = decode_swap_transaction(&encoded).unwrap();
        let signed = VersionedTransaction::try_new(decoded.message, &[owner.keypair()]).unwrap();

        assert_eq!(signed.signatures.len(), 1);
        assert!(
            signed.signatures[0]
                .verify(owner.keypair().pubkey().as_ref(), &signed.message.serialize())
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_swap_transaction("%%%").is_err());
        assert!(decode_swap_transaction(&STANDARD.encode([1u8, 2, 3])).is_err());
    }

    #[tokio::test]
    async fn test_sell_failures_are_collected_per_token() {
        let rpc = MockRpc::new();
        let owner = wallet(3);
        rpc.set_tokens(
            owner.address(),
            vec![
                token(&Pubkey::new_unique(), 10, 0),
                token(&WRAPPED_SOL_MINT, 10, 9),
                token(&Pubkey::new_unique(), 0, 6),
            ],
        );

        let client = JupiterClient::with_base_url("http://127.0.0.1:9").unwrap();
        let liquidator = JupiterLiquidator::new(client, 300_000);
        let report = liquidator.sell_all(rpc.as_ref(), &owner).await.unwrap();

        assert_eq!(report.items.len(), 1);
        assert!(report.items[0].is_failed());
        assert_eq!(rpc.sent_versioned(), 0);
    }

    #[tokio::test]
    async fn test_listing_failure_is_an_error() {
        let rpc = MockRpc::new();
        let owner = wallet(4);
        rpc.fail_token_listing(owner.address());

        let client = JupiterClient::with_base_url("http://127.0.0.1:9").unwrap();
        let liquidator = JupiterLiquidator::new(client, 300_000);
        assert!(liquidator.sell_all(rpc.as_ref(), &owner).await.is_err());
    }
}
