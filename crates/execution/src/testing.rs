//! Test doubles shared by the unit tests.

use crate::liquidation::Liquidator;
use crate::report::{ItemOutcome, LiquidationReport};
use crate::wallet::Wallet;
use async_trait::async_trait;
use clmm_keeper_domain::entities::TokenBalance;
use clmm_keeper_protocols::rpc::{ChainError, ConnectionPool, PoolConfig, RpcProvider};
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::transaction::{Transaction, VersionedTransaction};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// In-memory chain: configurable balances and accounts, records every
/// transaction it is asked to send.
#[derive(Default)]
pub struct MockRpc {
    balances: Mutex<HashMap<Pubkey, u64>>,
    tokens: Mutex<HashMap<Pubkey, Vec<TokenBalance>>>,
    token_errors: Mutex<HashSet<Pubkey>>,
    accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    probe_errors: Mutex<HashSet<Pubkey>>,
    failing_payers: Mutex<HashSet<Pubkey>>,
    sent: Mutex<Vec<Transaction>>,
    sent_versioned: Mutex<Vec<VersionedTransaction>>,
    confirmations: AtomicUsize,
    confirm_delay: Mutex<Duration>,
    send_times: Mutex<Vec<Instant>>,
}

impl MockRpc {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_balance(&self, owner: Pubkey, lamports: u64) {
        self.balances.lock().unwrap().insert(owner, lamports);
    }

    pub fn set_tokens(&self, owner: Pubkey, balances: Vec<TokenBalance>) {
        self.tokens.lock().unwrap().insert(owner, balances);
    }

    pub fn fail_token_listing(&self, owner: Pubkey) {
        self.token_errors.lock().unwrap().insert(owner);
    }

    pub fn set_account(&self, address: Pubkey, data: Vec<u8>) {
        self.accounts.lock().unwrap().insert(address, data);
    }

    pub fn fail_probe(&self, address: Pubkey) {
        self.probe_errors.lock().unwrap().insert(address);
    }

    pub fn fail_sends_from(&self, payer: Pubkey) {
        self.failing_payers.lock().unwrap().insert(payer);
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_by(&self, payer: &Pubkey) -> Vec<Transaction> {
        self.sent()
            .into_iter()
            .filter(|tx| tx.message.account_keys.first() == Some(payer))
            .collect()
    }

    pub fn sent_versioned(&self) -> usize {
        self.sent_versioned.lock().unwrap().len()
    }

    /// Makes every confirmation take `delay`.
    pub fn set_confirm_delay(&self, delay: Duration) {
        *self.confirm_delay.lock().unwrap() = delay;
    }

    /// When each accepted legacy transaction was sent.
    pub fn send_times(&self) -> Vec<Instant> {
        self.send_times.lock().unwrap().clone()
    }

    pub fn confirmations(&self) -> usize {
        self.confirmations.load(Ordering::SeqCst)
    }

    /// Pool of `size` slots all backed by this mock.
    pub fn pool(self: &Arc<Self>, size: usize) -> Arc<ConnectionPool> {
        let config = PoolConfig {
            pool_size: size,
            ..PoolConfig::default()
        };
        let endpoints = vec!["mock://rpc".to_string()];
        let pool = ConnectionPool::initialize_with(&endpoints, &[], &config, |_, _| {
            Ok(self.clone() as Arc<dyn RpcProvider>)
        })
        .unwrap();
        Arc::new(pool)
    }
}

#[async_trait]
impl RpcProvider for MockRpc {
    fn endpoint(&self) -> String {
        "mock://rpc".to_string()
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, ChainError> {
        Ok(Hash::new_unique())
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, ChainError> {
        Ok(self.balances.lock().unwrap().get(address).copied().unwrap_or(0))
    }

    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, ChainError> {
        if self.probe_errors.lock().unwrap().contains(address) {
            return Err(ChainError::Transport("connection reset".to_string()));
        }
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    async fn get_token_balances(
        &self,
        owner: &Pubkey,
        _token_program: &Pubkey,
    ) -> Result<Vec<TokenBalance>, ChainError> {
        if self.token_errors.lock().unwrap().contains(owner) {
            return Err(ChainError::RateLimited("429 Too Many Requests".to_string()));
        }
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .get(owner)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, ChainError> {
        let payer = transaction.message.account_keys[0];
        if self.failing_payers.lock().unwrap().contains(&payer) {
            return Err(ChainError::Rejected("insufficient funds for fee".to_string()));
        }
        self.sent.lock().unwrap().push(transaction.clone());
        self.send_times.lock().unwrap().push(Instant::now());
        Ok(transaction.signatures[0])
    }

    async fn send_versioned_transaction(
        &self,
        transaction: &VersionedTransaction,
    ) -> Result<Signature, ChainError> {
        self.sent_versioned.lock().unwrap().push(transaction.clone());
        Ok(transaction.signatures[0])
    }

    async fn confirm_signature(&self, _signature: &Signature) -> Result<(), ChainError> {
        let delay = *self.confirm_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.confirmations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Liquidator that only records which wallets it was asked to sell.
#[derive(Default)]
pub struct RecordingLiquidator {
    calls: Mutex<Vec<Pubkey>>,
}

impl RecordingLiquidator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Pubkey> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Liquidator for RecordingLiquidator {
    async fn sell_all(
        &self,
        _rpc: &dyn RpcProvider,
        wallet: &Wallet,
    ) -> anyhow::Result<LiquidationReport> {
        self.calls.lock().unwrap().push(wallet.address());
        Ok(LiquidationReport {
            items: vec![ItemOutcome::skipped(wallet.short(), "recorded")],
            error: None,
        })
    }
}

pub fn wallet(id: u32) -> Arc<Wallet> {
    Arc::new(Wallet::from_keypair(id, Keypair::new()))
}

pub fn token(mint: &Pubkey, amount: u64, decimals: u8) -> TokenBalance {
    TokenBalance {
        account: Pubkey::new_unique().to_string(),
        mint: mint.to_string(),
        amount,
        decimals,
    }
}
